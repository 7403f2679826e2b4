//! Multi-sheet rectangle packing.
//!
//! Parts are placed greedily, longest side first, onto as many sheets as
//! needed. Each sheet keeps a list of free rectangular spaces that is split
//! on every placement. Hole spaces come from the cutouts of parts already
//! placed and receive smaller parts centered inside them.
//!
//! Packing never mutates the parts: every placement is returned as an
//! immutable [`Placement`] record, so the same input can be packed again.

use serde::{Deserialize, Serialize};
use signcut_core::{BBox, Budget, FillDirection, PackError, Point, Result, StrategyKind};
use signcut_designer::Part;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Hole rectangles smaller than this on either side are not offered
pub const MIN_HOLE_SPACE_MM: f64 = 5.0;

/// A free rectangle on a sheet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Comes from the cutout of a placed part
    pub is_hole: bool,
}

impl Space {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            is_hole: false,
        }
    }

    pub fn hole(rect: BBox) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            is_hole: true,
        }
    }

    pub fn rect(&self) -> BBox {
        BBox::new(self.x, self.y, self.w, self.h)
    }

    /// Whether a `w` x `h` footprint plus `gap` fits.
    pub fn fits(&self, w: f64, h: f64, gap: f64) -> bool {
        self.w >= w + gap && self.h >= h + gap
    }
}

/// Where one part ended up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub part_id: u32,
    pub sheet_id: u32,
    /// Top-left corner of the placed footprint
    pub fit: Point,
    pub rotated: bool,
    /// Placed inside another part's cutout
    pub in_hole: bool,
    /// Footprint width on the sheet, after rotation
    pub w: f64,
    /// Footprint height on the sheet, after rotation
    pub h: f64,
}

impl Placement {
    pub fn footprint(&self) -> BBox {
        BBox::new(self.fit.x, self.fit.y, self.w, self.h)
    }
}

/// Chosen space index and orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub index: usize,
    pub rotated: bool,
}

/// Picks a free space for a part.
///
/// Implementations see the sheet's spaces in their current sort order and
/// must only return an index whose space fits the chosen orientation.
pub trait PlacementStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn choose(
        &self,
        spaces: &[Space],
        w: f64,
        h: f64,
        gap: f64,
        allow_rotation: bool,
    ) -> Option<Candidate>;
}

/// First space that fits, unrotated tried before rotated
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFit;

impl PlacementStrategy for FirstFit {
    fn name(&self) -> &'static str {
        "first_fit"
    }

    fn choose(
        &self,
        spaces: &[Space],
        w: f64,
        h: f64,
        gap: f64,
        allow_rotation: bool,
    ) -> Option<Candidate> {
        spaces.iter().enumerate().find_map(|(index, space)| {
            if space.fits(w, h, gap) {
                Some(Candidate {
                    index,
                    rotated: false,
                })
            } else if allow_rotation && space.fits(h, w, gap) {
                Some(Candidate {
                    index,
                    rotated: true,
                })
            } else {
                None
            }
        })
    }
}

/// Space leaving the smallest short-side remainder; ties keep scan order
#[derive(Debug, Clone, Copy, Default)]
pub struct BestShortSideFit;

impl PlacementStrategy for BestShortSideFit {
    fn name(&self) -> &'static str {
        "best_short_side_fit"
    }

    fn choose(
        &self,
        spaces: &[Space],
        w: f64,
        h: f64,
        gap: f64,
        allow_rotation: bool,
    ) -> Option<Candidate> {
        let mut best: Option<(f64, Candidate)> = None;
        let mut consider = |short_side: f64, candidate: Candidate| {
            if best.map_or(true, |(s, _)| short_side < s) {
                best = Some((short_side, candidate));
            }
        };

        for (index, space) in spaces.iter().enumerate() {
            if space.fits(w, h, gap) {
                let short = (space.w - w - gap).min(space.h - h - gap);
                consider(
                    short,
                    Candidate {
                        index,
                        rotated: false,
                    },
                );
            }
            if allow_rotation && space.fits(h, w, gap) {
                let short = (space.w - h - gap).min(space.h - w - gap);
                consider(
                    short,
                    Candidate {
                        index,
                        rotated: true,
                    },
                );
            }
        }
        best.map(|(_, c)| c)
    }
}

pub fn strategy_for(kind: StrategyKind) -> Box<dyn PlacementStrategy> {
    match kind {
        StrategyKind::FirstFit => Box::new(FirstFit),
        StrategyKind::BestShortSideFit => Box::new(BestShortSideFit),
    }
}

/// One stock board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    /// 1-based, in creation order
    pub id: u32,
    pub width: f64,
    pub height: f64,
    pub gap: f64,
    pub fill_direction: FillDirection,
    pub placements: Vec<Placement>,
    #[serde(skip)]
    spaces: Vec<Space>,
}

impl Sheet {
    pub fn new(id: u32, width: f64, height: f64, gap: f64, fill_direction: FillDirection) -> Self {
        Self {
            id,
            width,
            height,
            gap,
            fill_direction,
            placements: Vec::new(),
            spaces: vec![Space::new(0.0, 0.0, width, height)],
        }
    }

    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    pub fn placement(&self, part_id: u32) -> Option<&Placement> {
        self.placements.iter().find(|p| p.part_id == part_id)
    }

    /// Share of the sheet covered by top-level placements.
    pub fn utilization(&self) -> f64 {
        let area = self.width * self.height;
        if area <= 0.0 {
            return 0.0;
        }
        let used: f64 = self
            .placements
            .iter()
            .filter(|p| !p.in_hole)
            .map(|p| p.w * p.h)
            .sum();
        used / area
    }

    /// Place `part` if any free space accepts it.
    pub fn try_place(
        &mut self,
        part: &Part,
        allow_rotation: bool,
        strategy: &dyn PlacementStrategy,
    ) -> Option<Placement> {
        let candidate = strategy.choose(&self.spaces, part.w(), part.h(), self.gap, allow_rotation)?;
        Some(self.place(part, candidate))
    }

    fn place(&mut self, part: &Part, candidate: Candidate) -> Placement {
        let space = self.spaces.remove(candidate.index);
        let rotated = candidate.rotated;
        let (pw, ph) = if rotated {
            (part.h(), part.w())
        } else {
            (part.w(), part.h())
        };

        let fit = if space.is_hole {
            Point::new(space.x + (space.w - pw) / 2.0, space.y + (space.h - ph) / 2.0)
        } else {
            Point::new(space.x, space.y)
        };

        let placement = Placement {
            part_id: part.id,
            sheet_id: self.id,
            fit,
            rotated,
            in_hole: space.is_hole,
            w: pw,
            h: ph,
        };
        self.placements.push(placement);

        // Centered placement consumes the whole hole space.
        if !space.is_hole {
            let fw = pw + self.gap;
            let fh = ph + self.gap;
            let down = Space::new(space.x, space.y + fh, space.w, space.h - fh);
            let right = Space::new(space.x + fw, space.y, space.w - fw, fh);
            for residual in [down, right] {
                if residual.w > 0.0 && residual.h > 0.0 {
                    self.spaces.push(residual);
                }
            }
        }

        for hole in &part.holes {
            let rect = part.place_rect(hole, fit, rotated);
            if rect.w >= MIN_HOLE_SPACE_MM && rect.h >= MIN_HOLE_SPACE_MM {
                self.spaces.push(Space::hole(rect));
            }
        }

        self.sort_spaces();
        placement
    }

    fn sort_spaces(&mut self) {
        match self.fill_direction {
            FillDirection::Vertical => self
                .spaces
                .sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))),
            FillDirection::Horizontal => self
                .spaces
                .sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))),
        }
    }
}

/// Sheet and packing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackOptions {
    pub sheet_width: f64,
    pub sheet_height: f64,
    pub gap: f64,
    pub allow_rotation: bool,
    pub fill_direction: FillDirection,
    pub strategy: StrategyKind,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            sheet_width: 1200.0,
            sheet_height: 600.0,
            gap: 5.0,
            allow_rotation: true,
            fill_direction: FillDirection::Vertical,
            strategy: StrategyKind::FirstFit,
        }
    }
}

impl PackOptions {
    pub fn validate(&self) -> std::result::Result<(), PackError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(self.sheet_width) || !valid(self.sheet_height) {
            return Err(PackError::InvalidSheet {
                width: self.sheet_width,
                height: self.sheet_height,
            });
        }
        if !self.gap.is_finite() || self.gap < 0.0 {
            return Err(PackError::InvalidGap { gap: self.gap });
        }
        Ok(())
    }
}

/// Outcome of one packing pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackResult {
    pub sheets: Vec<Sheet>,
    /// Ids of parts that fit on no sheet
    pub unplaced: Vec<u32>,
    pub placed_count: usize,
    pub total: usize,
    pub warnings: Vec<String>,
}

impl PackResult {
    pub fn sheet(&self, id: u32) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.id == id)
    }

    pub fn placement(&self, part_id: u32) -> Option<&Placement> {
        self.sheets.iter().find_map(|s| s.placement(part_id))
    }

    /// Every part found a sheet.
    pub fn is_complete(&self) -> bool {
        self.placed_count == self.total
    }
}

/// Greedy multi-sheet packer
pub struct Packer {
    options: PackOptions,
    strategy: Box<dyn PlacementStrategy>,
}

impl Packer {
    pub fn new(options: PackOptions) -> Self {
        let strategy = strategy_for(options.strategy);
        Self { options, strategy }
    }

    /// Packer using a custom placement strategy.
    pub fn with_strategy(options: PackOptions, strategy: Box<dyn PlacementStrategy>) -> Self {
        Self { options, strategy }
    }

    pub fn options(&self) -> &PackOptions {
        &self.options
    }

    /// Pack `parts` onto as many sheets as needed.
    ///
    /// Parts that fit on no sheet are reported in [`PackResult::unplaced`]
    /// with a warning. The budget is checked once per part.
    pub fn pack(&self, parts: &[Part], budget: &Budget) -> Result<PackResult> {
        self.options.validate()?;
        let opts = &self.options;

        let mut order: Vec<&Part> = parts.iter().collect();
        order.sort_by(|a, b| b.w().max(b.h()).total_cmp(&a.w().max(a.h())));

        let mut result = PackResult {
            total: parts.len(),
            ..Default::default()
        };

        for part in order {
            budget.checkpoint()?;

            let mut placed = result
                .sheets
                .iter_mut()
                .find_map(|sheet| sheet.try_place(part, opts.allow_rotation, self.strategy.as_ref()));

            if placed.is_none() {
                let id = result.sheets.len() as u32 + 1;
                let mut sheet = Sheet::new(
                    id,
                    opts.sheet_width,
                    opts.sheet_height,
                    opts.gap,
                    opts.fill_direction,
                );
                placed = sheet.try_place(part, opts.allow_rotation, self.strategy.as_ref());
                if placed.is_some() {
                    debug!("Opened sheet {}", id);
                    result.sheets.push(sheet);
                }
            }

            match placed {
                Some(p) => {
                    debug!(
                        "Part #{} on sheet {} at ({:.1}, {:.1}){}",
                        p.part_id,
                        p.sheet_id,
                        p.fit.x,
                        p.fit.y,
                        if p.rotated { " rotated" } else { "" }
                    );
                    result.placed_count += 1;
                }
                None => {
                    let msg = format!(
                        "Part #{} ({:.1} x {:.1} mm) is too large for a {:.0} x {:.0} mm sheet",
                        part.id,
                        part.w(),
                        part.h(),
                        opts.sheet_width,
                        opts.sheet_height
                    );
                    warn!("{}", msg);
                    result.warnings.push(msg);
                    result.unplaced.push(part.id);
                }
            }
        }

        info!(
            "Packed {}/{} parts onto {} sheet(s) using {}",
            result.placed_count,
            result.total,
            result.sheets.len(),
            self.strategy.name()
        );
        Ok(result)
    }
}

/// Index parts by id for placement lookups.
pub fn parts_by_id(parts: &[Part]) -> HashMap<u32, &Part> {
    parts.iter().map(|p| (p.id, p)).collect()
}
