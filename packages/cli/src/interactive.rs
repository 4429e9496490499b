//! Interactive menu for the dashboard.
//!
//! Lets users pick the carrier, quality filter, and precision from
//! `dialoguer` menus, renders the result, and loops so the selection can
//! be changed without reloading the dataset. Region coverage is computed
//! once and reused from the cache on every pass; reloading the data files
//! replaces the dataset and drops the stale coverage.

use std::path::Path;

use dialoguer::{Confirm, Select};
use signal_map_cli_utils::{IndicatifProgress, MultiProgress};
use signal_map_dashboard::{DashboardConfig, DashboardContext, Selection};
use signal_map_signal_models::QualityFilter;

use crate::{export, print_view};

/// What to do after a rendered pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextStep {
    ChangeSelection,
    ReloadData,
    Quit,
}

impl NextStep {
    const ALL: [Self; 3] = [Self::ChangeSelection, Self::ReloadData, Self::Quit];

    const fn label(self) -> &'static str {
        match self {
            Self::ChangeSelection => "Change the selection",
            Self::ReloadData => "Reload data files",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive selection loop.
///
/// # Errors
///
/// Returns an error if a prompt fails, the selection is rejected, or
/// exporting fails.
pub fn run(
    ctx: &mut DashboardContext,
    multi: &MultiProgress,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Highway Signal Coverage");
    println!();

    let mut selection = Selection::initial(ctx.config())?;
    let mut prompt = true;

    loop {
        if prompt {
            selection = prompt_selection(ctx.config(), &selection)?;
        }
        let view = ctx.render(&selection)?;
        print_view(&view);

        let export_now = Confirm::new()
            .with_prompt(format!("Export map layers to {}?", output_dir.display()))
            .default(false)
            .interact()?;
        if export_now {
            export(&view, output_dir)?;
        }

        let labels: Vec<&str> = NextStep::ALL.iter().map(|s| s.label()).collect();
        let choice = Select::new()
            .with_prompt("Next")
            .items(&labels)
            .default(0)
            .interact()?;

        match NextStep::ALL[choice] {
            NextStep::ChangeSelection => prompt = true,
            NextStep::ReloadData => {
                let progress = IndicatifProgress::files_bar(multi, "Reloading dataset");
                ctx.reload(&progress);
                prompt = false;
            }
            NextStep::Quit => break,
        }
    }

    let (hits, misses) = ctx.cache_stats();
    log::debug!("Region coverage cache: {hits} hits, {misses} misses");

    Ok(())
}

/// Prompts for each part of the selection, defaulting to `current`.
fn prompt_selection(
    config: &DashboardConfig,
    current: &Selection,
) -> Result<Selection, Box<dyn std::error::Error>> {
    let carrier_labels: Vec<&str> = config.carriers.iter().map(|c| c.id.as_str()).collect();
    let carrier_idx = Select::new()
        .with_prompt("Carrier")
        .items(&carrier_labels)
        .default(
            config
                .carriers
                .iter()
                .position(|c| c.id == current.carrier)
                .unwrap_or(0),
        )
        .interact()?;

    let qualities = QualityFilter::options();
    let quality_labels: Vec<&str> = qualities.iter().map(|q| q.label()).collect();
    let quality_idx = Select::new()
        .with_prompt("Signal quality")
        .items(&quality_labels)
        .default(
            qualities
                .iter()
                .position(|q| *q == current.quality)
                .unwrap_or(0),
        )
        .interact()?;

    let precision_labels: Vec<&str> = config.precision.iter().map(|p| p.label.as_str()).collect();
    let precision_idx = Select::new()
        .with_prompt("Display precision")
        .items(&precision_labels)
        .default(
            config
                .precision
                .iter()
                .position(|p| p.stride == current.stride)
                .unwrap_or(0),
        )
        .interact()?;

    Ok(Selection {
        carrier: config.carriers[carrier_idx].id.clone(),
        quality: qualities[quality_idx],
        stride: config.precision[precision_idx].stride,
    })
}
