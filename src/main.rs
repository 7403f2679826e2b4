//! SignCut command line front end.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use signcut::camtools::PRESETS;
use signcut::{init_logging, CamSession, Config, BUILD_DATE, VERSION};
use signcut_core::units::{format_length, format_minutes};
use signcut_core::{FillDirection, StrategyKind};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "signcut")]
#[command(about = "SVG to G-code: nest shapes on stock sheets and cut them", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (JSON or TOML); defaults to the user config dir
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct parts from a drawing and report them
    Import {
        /// Input SVG file
        svg: PathBuf,

        /// Target drawing width in cm
        #[arg(long)]
        real_width_cm: Option<f64>,

        /// Write the rebuilt SVG here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Pack a drawing onto sheets and write one program per sheet
    Nest {
        /// Input SVG file
        svg: PathBuf,

        /// Directory for the generated .nc files
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        #[arg(short, long, value_enum, default_value_t = Machine::Router)]
        machine: Machine,

        /// Target drawing width in cm
        #[arg(long)]
        real_width_cm: Option<f64>,

        /// Sheet width in mm
        #[arg(long)]
        sheet_width: Option<f64>,

        /// Sheet height in mm
        #[arg(long)]
        sheet_height: Option<f64>,

        /// Clearance between parts in mm
        #[arg(long)]
        gap: Option<f64>,

        /// Keep every part in its drawn orientation
        #[arg(long)]
        no_rotation: bool,

        /// vertical or horizontal
        #[arg(long)]
        fill: Option<FillDirection>,

        /// first_fit or best_short_side_fit
        #[arg(long)]
        strategy: Option<StrategyKind>,

        /// Join every contour of a sheet into one stroke
        #[arg(long)]
        ecocut: bool,

        /// Route rapids along the sheet border
        #[arg(long)]
        safe_travel: bool,

        /// Hot-wire material preset
        #[arg(long)]
        preset: Option<String>,

        /// Write a JSON layout report here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the effective configuration or write it to a file
    Config {
        /// Destination file (.json or .toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List hot-wire material presets
    Presets,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Machine {
    Router,
    HotWire,
}

#[derive(Serialize)]
struct LayoutReport<'a> {
    source: String,
    placed: usize,
    total: usize,
    sheets: &'a [signcut::Sheet],
    unplaced: &'a [u32],
    programs: Vec<ProgramReport>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct ProgramReport {
    sheet_id: u32,
    file: PathBuf,
    cut_length_mm: f64,
    rapid_length_mm: f64,
    estimated_seconds: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    info!("SignCut {} ({})", VERSION, BUILD_DATE);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Import {
            svg,
            real_width_cm,
            output,
        } => {
            let mut config = config;
            if real_width_cm.is_some() {
                config.import.real_width_cm = real_width_cm;
            }
            run_import(config, &svg, output.as_deref())
        }
        Commands::Nest {
            svg,
            out_dir,
            machine,
            real_width_cm,
            sheet_width,
            sheet_height,
            gap,
            no_rotation,
            fill,
            strategy,
            ecocut,
            safe_travel,
            preset,
            report,
        } => {
            let mut config = config;
            if real_width_cm.is_some() {
                config.import.real_width_cm = real_width_cm;
            }
            if let Some(w) = sheet_width {
                config.sheet.width = w;
            }
            if let Some(h) = sheet_height {
                config.sheet.height = h;
            }
            if let Some(g) = gap {
                config.sheet.gap = g;
            }
            if no_rotation {
                config.packing.allow_rotation = false;
            }
            if let Some(fill) = fill {
                config.packing.fill_direction = fill;
            }
            if let Some(strategy) = strategy {
                config.packing.strategy = strategy;
            }
            config.toolpath.ecocut |= ecocut;
            config.toolpath.safe_travel |= safe_travel;
            if let Some(preset) = preset {
                config.hot_wire.preset = preset;
            }
            config.validate().context("Invalid job parameters")?;
            run_nest(config, &svg, &out_dir, machine, report.as_deref())
        }
        Commands::Config { output } => run_config(&config, output.as_deref()),
        Commands::Presets => {
            for preset in PRESETS {
                println!(
                    "{:<8} {:<22} {:>4.0} mm/min  S{}",
                    preset.key, preset.name, preset.speed, preset.temperature
                );
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match Config::default_path() {
            Ok(path) => path,
            Err(e) => {
                warn!("Using default configuration: {}", e);
                return Ok(Config::default());
            }
        },
    };
    Config::load_or_default(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn load_session(config: Config, svg: &Path) -> Result<CamSession> {
    let text = std::fs::read_to_string(svg)
        .with_context(|| format!("Failed to read {}", svg.display()))?;
    let mut session = CamSession::new(config);
    session
        .load_svg(text)
        .with_context(|| format!("Failed to import {}", svg.display()))?;
    Ok(session)
}

fn run_import(config: Config, svg: &Path, output: Option<&Path>) -> Result<()> {
    let units = config.general.units;
    let session = load_session(config, svg)?;
    let Some(outcome) = session.outcome() else {
        bail!("No drawing loaded");
    };

    for warning in &outcome.warnings {
        warn!("{}", warning);
    }
    println!(
        "{} parts, scale factor {:.4}, {} sub-paths discarded{}",
        outcome.parts.len(),
        outcome.scale_factor,
        outcome.discarded,
        if outcome.background_removed {
            ", background removed"
        } else {
            ""
        }
    );
    for part in &outcome.parts {
        println!(
            "  Part {:>3}: {} x {}, {} holes",
            part.id,
            format_length(part.w(), units),
            format_length(part.h(), units),
            part.geometry.holes.len()
        );
    }

    if let Some(output) = output {
        std::fs::write(output, outcome.to_svg())
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!("Rebuilt drawing written to {}", output.display());
    }
    Ok(())
}

fn run_nest(
    config: Config,
    svg: &Path,
    out_dir: &Path,
    machine: Machine,
    report: Option<&Path>,
) -> Result<()> {
    let units = config.general.units;
    let mut session = load_session(config, svg)?;
    if session.parts().is_empty() {
        if let Some(outcome) = session.outcome() {
            for warning in &outcome.warnings {
                warn!("{}", warning);
            }
        }
        println!("No parts found in {}", svg.display());
        return Ok(());
    }

    let layout = session.pack().context("Packing failed")?;
    for warning in &layout.warnings {
        warn!("{}", warning);
    }
    println!(
        "Placed {} of {} parts on {} sheets",
        layout.placed_count,
        layout.total,
        layout.sheets.len()
    );

    let stem = svg
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("signcut");
    let sheet_ids: Vec<u32> = layout.sheets.iter().map(|s| s.id).collect();

    // Emit every program before writing anything.
    let mut programs = Vec::with_capacity(sheet_ids.len());
    for &sheet_id in &sheet_ids {
        let toolpath = session
            .toolpath(sheet_id)
            .with_context(|| format!("Toolpath for sheet {} failed", sheet_id))?;
        let gcode = match machine {
            Machine::Router => session.router_gcode(sheet_id),
            Machine::HotWire => session.hot_wire(sheet_id).map(|program| {
                println!(
                    "  Sheet {}: {} paths, {} cut, {}",
                    sheet_id,
                    program.stats.paths,
                    format_length(program.stats.length_mm, units),
                    program.stats.time_label()
                );
                program.gcode
            }),
        }
        .with_context(|| format!("G-code for sheet {} failed", sheet_id))?;

        let file = out_dir.join(format!("{}_sheet{}.nc", stem, sheet_id));
        programs.push((
            ProgramReport {
                sheet_id,
                file,
                cut_length_mm: toolpath.cut_length(),
                rapid_length_mm: toolpath.rapid_length(),
                estimated_seconds: toolpath.estimated_time(),
            },
            gcode,
        ));
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    for (program, gcode) in &programs {
        std::fs::write(&program.file, gcode)
            .with_context(|| format!("Failed to write {}", program.file.display()))?;
        println!(
            "  {} ({}, ~{})",
            program.file.display(),
            format_length(program.cut_length_mm, units),
            format_minutes(program.estimated_seconds / 60.0)
        );
    }

    if let Some(report) = report {
        let Some(layout) = session.layout() else {
            bail!("No layout to report");
        };
        let doc = LayoutReport {
            source: svg.display().to_string(),
            placed: layout.placed_count,
            total: layout.total,
            sheets: &layout.sheets,
            unplaced: &layout.unplaced,
            programs: programs.into_iter().map(|(program, _)| program).collect(),
            warnings: layout.warnings.clone(),
        };
        let json = serde_json::to_string_pretty(&doc).context("Failed to serialize report")?;
        std::fs::write(report, json)
            .with_context(|| format!("Failed to write {}", report.display()))?;
        info!("Layout report written to {}", report.display());
    }
    Ok(())
}

fn run_config(config: &Config, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            config
                .save_to_file(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Configuration written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}
