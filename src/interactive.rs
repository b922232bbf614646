use crate::error::SubextractError;
use crate::export::{build_selections, ExportSelection};
use crate::source::Source;
use console::style;
use dialoguer::{Confirm, Input, MultiSelect};
use std::path::{Path, PathBuf};

/// Choices made in the interactive wizard.
pub struct InteractiveSelection {
    pub selections: Vec<ExportSelection>,
    pub export_dir: PathBuf,
    pub overwrite: bool,
}

/// Walk the user through track selection for `source`.
///
/// Returns `Ok(None)` when the user leaves the export directory empty,
/// which cancels the run before anything is written.
pub fn run_selection_wizard(
    source: &Source,
    default_dir: &Path,
    overwrite_default: bool,
) -> anyhow::Result<Option<InteractiveSelection>> {
    print_header();

    let labels = source.labels();

    let original = MultiSelect::new()
        .with_prompt("Select subtitles to export in their original format (space to toggle)")
        .items(&labels)
        .interact()?;

    let vtt = MultiSelect::new()
        .with_prompt("Select subtitles to export as VTT")
        .items(&labels)
        .interact()?;

    let selections = build_selections(labels.len(), &original, &vtt)?;
    if selections.iter().all(|s| s.task_count() == 0) {
        return Err(SubextractError::NothingSelected.into());
    }

    let dir: String = Input::new()
        .with_prompt("Export folder (leave empty to cancel)")
        .with_initial_text(default_dir.display().to_string())
        .allow_empty(true)
        .interact_text()?;

    if dir.trim().is_empty() {
        return Ok(None);
    }

    let overwrite = Confirm::new()
        .with_prompt("Force overwrite existing files?")
        .default(overwrite_default)
        .interact()?;

    let export_dir = PathBuf::from(dir.trim());
    print_summary(&labels, &selections, &export_dir, overwrite);

    if !Confirm::new()
        .with_prompt("Proceed with these settings?")
        .default(true)
        .interact()?
    {
        return Ok(None);
    }

    println!();

    Ok(Some(InteractiveSelection {
        selections,
        export_dir,
        overwrite,
    }))
}

fn print_header() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║         subextract - Subtitle Track Exporter      ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
}

fn selection_tags(selection: &ExportSelection) -> String {
    match (selection.original, selection.vtt) {
        (true, true) => "original + VTT".to_string(),
        (true, false) => "original".to_string(),
        (false, true) => "VTT".to_string(),
        (false, false) => String::new(),
    }
}

fn print_summary(labels: &[String], selections: &[ExportSelection], export_dir: &Path, overwrite: bool) {
    println!("\n{}", style("═══ Summary ═══").bold());
    for (label, selection) in labels.iter().zip(selections) {
        let tags = selection_tags(selection);
        if !tags.is_empty() {
            println!("  {}  {}", style(tags).green(), label);
        }
    }
    println!("  Folder:    {}", style(export_dir.display()).cyan());
    println!("  Overwrite: {}", if overwrite { "yes" } else { "no" });
    println!();
}
