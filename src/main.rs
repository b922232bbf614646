use anyhow::{Context, Result};
use clap::Parser;
use console::Term;
use std::path::{Path, PathBuf};
use subextract::config::{Config, VttNaming};
use subextract::export::{build_selections, plan, plan_files, plan_names, ExportPlan, ExportRequest, PlanOptions};
use subextract::interactive::run_selection_wizard;
use subextract::probe::check_ffmpeg;
use subextract::session::{print_summary, ExportSession};
use subextract::source::{base_name, load_source, Source};
use subextract::transcoder::FfmpegTranscoder;
use subextract::SubextractError;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "subextract")]
#[command(version, about = "Extract and convert subtitle tracks")]
#[command(long_about = "Extract subtitle tracks from media containers, subtitle files, directories, or ZIP/RAR/7Z archives, exporting them in their original format and/or as WebVTT.")]
struct Cli {
    /// Media container, .srt/.ass file, directory, or archive
    input: PathBuf,

    /// Export directory (defaults to the input's directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Tracks to export in their original format (1-based, comma separated)
    #[arg(long, value_delimiter = ',')]
    original: Vec<usize>,

    /// Tracks to export as WebVTT (1-based, comma separated)
    #[arg(long, value_delimiter = ',')]
    vtt: Vec<usize>,

    /// Export every track in its original format
    #[arg(long)]
    all: bool,

    /// Export every track as WebVTT
    #[arg(long)]
    all_vtt: bool,

    /// Skip outputs that already exist instead of overwriting them
    #[arg(long)]
    no_overwrite: bool,

    /// VTT naming scheme: numbered, language
    #[arg(long)]
    vtt_naming: Option<String>,

    /// Keep intermediate SRT files in the export directory
    #[arg(long)]
    keep_intermediates: bool,

    /// List detected tracks and exit
    #[arg(short, long)]
    list: bool,

    /// Print the track list as JSON (with --list)
    #[arg(long)]
    json: bool,

    /// Choose tracks interactively
    #[arg(short, long)]
    interactive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Convert 1-based CLI positions to indices.
fn to_indices(positions: &[usize]) -> Result<Vec<usize>> {
    positions
        .iter()
        .map(|&p| {
            p.checked_sub(1)
                .ok_or_else(|| anyhow::anyhow!("Track positions start at 1"))
        })
        .collect()
}

fn print_tracks(source: &Source, json: bool) -> Result<()> {
    if json {
        let rendered = match source {
            Source::Container { tracks, .. } => serde_json::to_string_pretty(tracks)?,
            Source::Files { files, .. } => serde_json::to_string_pretty(files)?,
        };
        println!("{}", rendered);
        return Ok(());
    }

    for (i, label) in source.labels().iter().enumerate() {
        println!("  {:>2}. {}", i + 1, label);
    }
    Ok(())
}

fn build_plan(
    source: &Source,
    selections: Vec<subextract::ExportSelection>,
    export_dir: &Path,
    config: &Config,
) -> subextract::Result<ExportPlan> {
    let options = PlanOptions::from(config);
    match source {
        Source::Container { path, tracks } => {
            let request = ExportRequest::new(tracks.clone(), selections)?;
            let names = plan_names(&request, &base_name(path), config.vtt_naming);
            plan(path, &request, &names, export_dir, &options)
        }
        Source::Files { files, .. } => plan_files(files, &selections, export_dir, &options),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if cli.no_overwrite {
        config.overwrite = false;
    }
    if cli.keep_intermediates {
        config.keep_intermediates = true;
    }
    if let Some(ref naming) = cli.vtt_naming {
        config.vtt_naming = naming
            .parse::<VttNaming>()
            .map_err(|e: String| anyhow::anyhow!(e))?;
    }
    config.validate().context("Configuration validation failed")?;

    check_ffmpeg(&config.ffmpeg_path).await?;

    let source = load_source(&cli.input, &config)
        .await
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;

    if source.is_empty() {
        match &source {
            Source::Container { .. } => warn!("No subtitle streams detected."),
            Source::Files { .. } => warn!("No SRT or ASS files found."),
        }
        return Ok(());
    }

    info!("Found {} subtitle track(s)", source.len());

    if cli.list {
        return print_tracks(&source, cli.json);
    }

    let default_dir = cli
        .out_dir
        .clone()
        .or_else(|| source.origin_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let wants_wizard = cli.interactive
        || (cli.original.is_empty() && cli.vtt.is_empty() && !cli.all && !cli.all_vtt);

    let (selections, export_dir) = if wants_wizard {
        if !Term::stdout().is_term() {
            anyhow::bail!("No tracks selected. Use --original/--vtt/--all, or run in a terminal");
        }
        match run_selection_wizard(&source, &default_dir, config.overwrite)? {
            Some(choice) => {
                config.overwrite = choice.overwrite;
                (choice.selections, choice.export_dir)
            }
            None => {
                warn!("Export canceled - no folder selected.");
                return Ok(());
            }
        }
    } else {
        let all: Vec<usize> = (0..source.len()).collect();
        let original = if cli.all { all.clone() } else { to_indices(&cli.original)? };
        let vtt = if cli.all_vtt { all } else { to_indices(&cli.vtt)? };
        (build_selections(source.len(), &original, &vtt)?, default_dir)
    };

    std::fs::create_dir_all(&export_dir)
        .with_context(|| format!("Failed to create {}", export_dir.display()))?;

    let plan = match build_plan(&source, selections, &export_dir, &config) {
        Ok(plan) => plan,
        Err(SubextractError::NothingSelected) => {
            warn!("Please select at least one subtitle to export.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let session = ExportSession::new(Box::new(FfmpegTranscoder::new(config.ffmpeg_path.clone())))
        .with_progress(config.show_progress)
        .with_keep_intermediates(config.keep_intermediates);
    let summary = session.run(&plan).await;

    print_summary(&summary, &export_dir);

    Ok(())
}
