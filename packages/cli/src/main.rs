#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line dashboard for highway mobile signal coverage.
//!
//! Loads the configured sample and region files once, then renders a
//! selection (carrier, quality filter, precision) either from flags or
//! through an interactive menu, printing the counts and regional summary
//! and exporting the map layers as `GeoJSON`.
//!
//! Uses `indicatif-log-bridge` (via [`signal_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod interactive;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use signal_map_cli_utils::{IndicatifProgress, MultiProgress};
use signal_map_dashboard::export::export_view;
use signal_map_dashboard::{DashboardConfig, DashboardContext, DashboardView, NoticeLevel, Selection};
use signal_map_signal_models::{CarrierId, QualityFilter, Stride};

#[derive(Parser)]
#[command(name = "signal_map", about = "Highway mobile signal coverage dashboard")]
struct Cli {
    /// Dashboard config file. Defaults to the built-in configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one selection and export it
    Render(RenderArgs),
    /// Choose carrier, quality, and precision from menus (default)
    Interactive {
        /// Directory for exported files
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },
    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(Args)]
struct RenderArgs {
    /// Carrier id, e.g. "O2 LTE". Defaults to the first configured carrier.
    #[arg(long)]
    carrier: Option<String>,

    /// Quality filter: all, good, medium, or poor
    #[arg(long, default_value = "all")]
    quality: QualityFilter,

    /// Keep every Nth point. Must be a configured precision stride.
    #[arg(long)]
    precision: Option<usize>,

    /// Directory for exported files
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Print the view without writing any files
    #[arg(long)]
    no_export: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = signal_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DashboardConfig::from_path(path)?,
        None => DashboardConfig::embedded(),
    };

    match cli.command {
        Some(Commands::ShowConfig) => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Some(Commands::Render(args)) => {
            let mut ctx = load(config, &multi);
            let selection = selection_from_args(&ctx, &args)?;
            let view = ctx.render(&selection)?;
            print_view(&view);
            if !args.no_export {
                export(&view, &args.output_dir)?;
            }
        }
        Some(Commands::Interactive { output_dir }) => {
            let mut ctx = load(config, &multi);
            interactive::run(&mut ctx, &multi, &output_dir)?;
        }
        None => {
            let mut ctx = load(config, &multi);
            interactive::run(&mut ctx, &multi, Path::new("output"))?;
        }
    }

    Ok(())
}

fn load(config: DashboardConfig, multi: &MultiProgress) -> DashboardContext {
    let progress = IndicatifProgress::files_bar(multi, "Loading dataset");
    let ctx = DashboardContext::load(config, &progress);

    let dataset = ctx.dataset();
    log::info!(
        "Dataset ready: {} samples, {} regions, {} warnings",
        dataset.samples.len(),
        dataset.regions.regions.len(),
        dataset.warnings.len()
    );
    ctx
}

fn selection_from_args(
    ctx: &DashboardContext,
    args: &RenderArgs,
) -> Result<Selection, Box<dyn std::error::Error>> {
    let mut selection = Selection::initial(ctx.config())?;

    if let Some(carrier) = &args.carrier {
        selection.carrier = CarrierId::from(carrier.as_str());
    }
    selection.quality = args.quality;
    if let Some(precision) = args.precision {
        selection.stride = Stride::new(precision)?;
    }

    selection.validate(ctx.config())?;
    Ok(selection)
}

/// Prints the counts, notices, and regional summaries of a view.
fn print_view(view: &DashboardView) {
    println!();
    println!("{}", view.selection);
    for line in view.status_lines() {
        println!("  {line}");
    }

    if let Some(center) = &view.center {
        println!(
            "  Map center: {:.5}, {:.5} (zoom {})",
            center.latitude, center.longitude, view.zoom
        );
    }

    for notice in &view.notices {
        match notice.level {
            NoticeLevel::Info => println!("  [info] {}", notice.message),
            NoticeLevel::Warning => println!("  [warning] {}", notice.message),
        }
    }

    if let Some(regions) = &view.regions {
        println!();
        for region in regions {
            for line in region.summary.summary.lines() {
                println!("  {line}");
            }
            println!();
        }
    }
}

fn export(view: &DashboardView, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let files = export_view(view, dir)?;
    println!("Wrote {}", files.markers.display());
    if let Some(regions) = &files.regions {
        println!("Wrote {}", regions.display());
    }
    println!("Wrote {}", files.summary.display());
    Ok(())
}
