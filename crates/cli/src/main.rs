use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use timeline::{ClipId, EditorSession, EngineConfig, KeyframeProperty, TimelineDocument};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "timeline-cli")]
#[command(about = "Headless timeline operations on saved timeline documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine config JSON (defaults apply to missing fields)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report duration, overlaps, gaps, size estimate and complexity
    Analyze {
        /// Timeline document path
        input: PathBuf,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sort clips and drop duplicate keyframes
    Optimize {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a clip at a timeline time
    Split {
        input: PathBuf,

        /// Clip id
        #[arg(long)]
        clip: String,

        /// Split time in seconds
        #[arg(long)]
        at: f64,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge adjacent clips of one source
    Merge {
        input: PathBuf,

        /// Clip ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        clips: Vec<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check keyframe and clip references
    Validate {
        input: PathBuf,

        /// Exit with an error when any issue is found
        #[arg(long)]
        strict: bool,
    },

    /// Interpolated property value of a clip at a time
    Value {
        input: PathBuf,

        #[arg(long)]
        clip: String,

        /// opacity, scale, position_x, position_y, rotation, volume,
        /// brightness, contrast, saturation
        #[arg(long, value_parser = parse_property)]
        property: KeyframeProperty,

        #[arg(long)]
        time: f64,
    },
}

fn parse_property(raw: &str) -> std::result::Result<KeyframeProperty, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unknown keyframe property '{raw}'"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Analyze { input, output } => analyze_command(&input, output, config),
        Commands::Optimize { input, output } => optimize_command(&input, output, config),
        Commands::Split {
            input,
            clip,
            at,
            output,
        } => split_command(&input, &clip, at, output, config),
        Commands::Merge {
            input,
            clips,
            output,
        } => merge_command(&input, &clips, output, config),
        Commands::Validate { input, strict } => validate_command(&input, strict, config),
        Commands::Value {
            input,
            clip,
            property,
            time,
        } => value_command(&input, &clip, property, time, config),
    }
}

fn open_session(input: &Path, config: EngineConfig) -> Result<EditorSession> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let document = TimelineDocument::from_json_str(&text)
        .with_context(|| format!("{} is not a timeline document", input.display()))?;
    info!(
        "Loaded {:?}: {} tracks, {} keyframes",
        input,
        document.timeline.tracks.len(),
        document.keyframes.len()
    );
    Ok(EditorSession::from_document(document, config))
}

fn emit(json: &str, output: Option<PathBuf>) -> Result<()> {
    if let Some(output_path) = output {
        std::fs::write(&output_path, json)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        info!("Written to: {:?}", output_path);
    } else {
        println!("{}", json);
    }
    Ok(())
}

fn write_document(session: &EditorSession, output: Option<PathBuf>) -> Result<()> {
    emit(&session.document().to_json_string()?, output)
}

fn analyze_command(input: &Path, output: Option<PathBuf>, config: EngineConfig) -> Result<()> {
    let session = open_session(input, config)?;
    let analysis = session.analyze();

    if !analysis.overlaps.is_empty() {
        warn!("{} overlapping clip pairs", analysis.overlaps.len());
    }

    let report = serde_json::json!({
        "file": input,
        "analysis": analysis,
        "complexity": session.complexity(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    emit(&serde_json::to_string_pretty(&report)?, output)
}

fn optimize_command(input: &Path, output: Option<PathBuf>, config: EngineConfig) -> Result<()> {
    // Opening a document already normalizes clip order and keyframes.
    let session = open_session(input, config)?;
    info!(
        "Optimized: {} clips, {} keyframes",
        session.timeline().clip_count(),
        session.keyframes().len()
    );
    write_document(&session, output)
}

fn split_command(
    input: &Path,
    clip: &str,
    at: f64,
    output: Option<PathBuf>,
    config: EngineConfig,
) -> Result<()> {
    let mut session = open_session(input, config)?;
    let new_clip = session
        .split_clip_at(&ClipId::from(clip), at)
        .with_context(|| format!("split of {} at {}s failed", clip, at))?;
    info!("Split {} at {}s, new clip {}", clip, at, new_clip);
    write_document(&session, output)
}

fn merge_command(
    input: &Path,
    clips: &[String],
    output: Option<PathBuf>,
    config: EngineConfig,
) -> Result<()> {
    if clips.len() < 2 {
        bail!("merge needs at least two clip ids");
    }
    let mut session = open_session(input, config)?;
    let ids: Vec<ClipId> = clips.iter().map(|id| ClipId::from(id.as_str())).collect();
    let merged = session.merge_clips(&ids).context("merge failed")?;
    info!("Merged {} clips into {}", ids.len(), merged);
    write_document(&session, output)
}

fn validate_command(input: &Path, strict: bool, config: EngineConfig) -> Result<()> {
    let session = open_session(input, config)?;
    let issues = session.validate();

    if issues.is_empty() {
        info!("No reference issues");
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&issues)?);
    if strict {
        bail!("{} reference issues found", issues.len());
    }
    Ok(())
}

fn value_command(
    input: &Path,
    clip: &str,
    property: KeyframeProperty,
    time: f64,
    config: EngineConfig,
) -> Result<()> {
    let session = open_session(input, config)?;
    match session.value_at(&ClipId::from(clip), property, time)? {
        Some(value) => println!("{}", value),
        None => {
            warn!("Clip {} has no active {:?} keyframes", clip, property);
            println!("null");
        }
    }
    Ok(())
}
