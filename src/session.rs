//! Single-owner job state.
//!
//! A [`CamSession`] holds the drawing that is currently loaded, the parts
//! reconstructed from it and the most recent layout. Loading a new drawing
//! replaces all three; packing replaces only the layout. Toolpaths and
//! programs are derived on demand and never cached.

use signcut_camtools::{
    CamToolResult, EcoCutJoiner, HotWireEmitter, HotWireOptions, HotWireProgram, PackOptions,
    PackResult, Packer, RouterEmitter, RouterOptions, SequenceOptions, Sequencer, Sheet, Toolpath,
};
use signcut_core::{Budget, Error, PackError, Point};
use signcut_designer::{HierarchyBuilder, ImportOptions, ImportOutcome, Part};
use signcut_settings::Config;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct CamSession {
    config: Config,
    svg: Option<String>,
    outcome: Option<ImportOutcome>,
    layout: Option<PackResult>,
}

impl CamSession {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Swap the job configuration. The current layout is dropped since it
    /// was computed with the old sheet parameters; call [`Self::load_svg`]
    /// again for import settings to take effect.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
        self.layout = None;
    }

    pub fn svg(&self) -> Option<&str> {
        self.svg.as_deref()
    }

    pub fn outcome(&self) -> Option<&ImportOutcome> {
        self.outcome.as_ref()
    }

    pub fn parts(&self) -> &[Part] {
        self.outcome.as_ref().map_or(&[], |o| o.parts.as_slice())
    }

    pub fn layout(&self) -> Option<&PackResult> {
        self.layout.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.outcome.is_some()
    }

    /// Import a drawing, discarding everything from the previous one.
    ///
    /// The session is left empty when the markup cannot be parsed.
    pub fn load_svg(&mut self, svg: impl Into<String>) -> CamToolResult<&ImportOutcome> {
        self.clear();
        let svg = svg.into();

        let builder = HierarchyBuilder::new(self.import_options());
        let outcome = builder.import_with_budget(&svg, &self.deadline())?;
        info!(
            "Loaded drawing: {} parts, scale {:.4}",
            outcome.parts.len(),
            outcome.scale_factor
        );

        self.svg = Some(svg);
        Ok(self.outcome.insert(outcome))
    }

    /// Pack the loaded parts onto fresh sheets.
    pub fn pack(&mut self) -> CamToolResult<&PackResult> {
        let Some(outcome) = self.outcome.as_ref() else {
            return Err(Error::other("no drawing loaded").into());
        };

        let packer = Packer::new(self.pack_options());
        let result = packer.pack(&outcome.parts, &self.budget())?;
        Ok(self.layout.insert(result))
    }

    pub fn sheet(&self, sheet_id: u32) -> CamToolResult<&Sheet> {
        self.layout
            .as_ref()
            .and_then(|layout| layout.sheet(sheet_id))
            .ok_or_else(|| PackError::SheetNotFound { sheet_id }.into())
    }

    /// Toolpath for one sheet, continuous when EcoCut is enabled.
    pub fn toolpath(&self, sheet_id: u32) -> CamToolResult<Toolpath> {
        let sheet = self.sheet(sheet_id)?;
        let options = self.sequence_options();

        let toolpath = if self.config.toolpath.ecocut {
            EcoCutJoiner::new(self.config.toolpath.ecocut_step).toolpath(
                sheet,
                self.parts(),
                &options,
                &self.budget(),
            )?
        } else {
            Sequencer::new(options).toolpath(sheet, self.parts())
        };

        debug!(
            "Sheet {} toolpath: {} operations, {:.1} mm cut",
            sheet_id,
            toolpath.operations.len(),
            toolpath.cut_length()
        );
        Ok(toolpath)
    }

    pub fn router_gcode(&self, sheet_id: u32) -> CamToolResult<String> {
        let toolpath = self.toolpath(sheet_id)?;
        RouterEmitter::new(self.router_options())?.emit(&toolpath)
    }

    pub fn hot_wire(&self, sheet_id: u32) -> CamToolResult<HotWireProgram> {
        let toolpath = self.toolpath(sheet_id)?;
        HotWireEmitter::new(&self.hot_wire_options())?.emit(&toolpath)
    }

    /// Forget the drawing, its parts and the layout. Configuration stays.
    pub fn clear(&mut self) {
        self.svg = None;
        self.outcome = None;
        self.layout = None;
    }

    pub fn import_options(&self) -> ImportOptions {
        let import = &self.config.import;
        ImportOptions {
            real_width_cm: import.real_width_cm,
            sample_step: import.sample_step,
            remove_background: import.remove_background,
            ..Default::default()
        }
    }

    pub fn pack_options(&self) -> PackOptions {
        let sheet = &self.config.sheet;
        let packing = &self.config.packing;
        PackOptions {
            sheet_width: sheet.width,
            sheet_height: sheet.height,
            gap: sheet.gap,
            allow_rotation: packing.allow_rotation,
            fill_direction: packing.fill_direction,
            strategy: packing.strategy,
        }
    }

    pub fn sequence_options(&self) -> SequenceOptions {
        let toolpath = &self.config.toolpath;
        SequenceOptions {
            feed_rate: self.config.router.feed_rate,
            rapid_rate: toolpath.rapid_rate,
            safe_travel: toolpath.safe_travel,
            reverse_order: toolpath.reverse_order,
        }
    }

    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            feed_rate: self.config.router.feed_rate,
            park: self.park(),
        }
    }

    pub fn hot_wire_options(&self) -> HotWireOptions {
        let hot_wire = &self.config.hot_wire;
        HotWireOptions {
            preset: hot_wire.preset.clone(),
            speed: hot_wire.speed,
            temperature: hot_wire.temperature,
            heat_up_dwell: hot_wire.heat_up_dwell,
            contour_dwell: hot_wire.contour_dwell,
            park: self.park(),
        }
    }

    fn park(&self) -> Point {
        Point::new(self.config.router.park_x, self.config.router.park_y)
    }

    /// Time-only allowance, used for import.
    fn deadline(&self) -> Budget {
        match self.config.packing.timeout_ms {
            Some(ms) => Budget::unlimited().with_timeout(Duration::from_millis(ms)),
            None => Budget::unlimited(),
        }
    }

    /// Fresh allowance for one packing or EcoCut pass.
    fn budget(&self) -> Budget {
        match self.config.packing.max_steps {
            Some(steps) => self.deadline().with_max_steps(steps),
            None => self.deadline(),
        }
    }
}
