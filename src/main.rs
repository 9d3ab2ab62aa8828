use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use processing_preview::runtime::{CommandRuntime, StagingCompiler};
use processing_preview::watch::FileWatcher;
use processing_preview::{
    transcode, Dimensions, PreviewConfig, PreviewResult, PreviewSession, PreviewTarget,
    RenderOutcome, SketchSource,
};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "processing-preview", version)]
#[command(about = "Live preview for Processing sketches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a sketch rewritten for a fixed-size surface.
    Transcode(TranscodeArgs),
    /// Run a sketch and re-run it whenever the file changes.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct TranscodeArgs {
    /// Sketch file, or `-` for stdin.
    file: PathBuf,

    /// Surface width in pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Surface height in pixels.
    #[arg(long, default_value_t = 600)]
    height: u32,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Sketch path or `processing-preview://` URI.
    target: String,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Surface width, overriding the config.
    #[arg(long)]
    width: Option<u32>,

    /// Surface height, overriding the config.
    #[arg(long)]
    height: Option<u32>,

    /// Directory sketches are staged in before launch.
    #[arg(long)]
    staging: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Transcode(args) => cmd_transcode(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn dimensions(width: u32, height: u32) -> Result<Dimensions> {
    Dimensions::new(width, height)
        .with_context(|| format!("surface size must be positive, got {width}x{height}"))
}

fn read_sketch(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read sketch from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sketch '{}'", path.display()))
}

fn cmd_transcode(args: TranscodeArgs) -> Result<()> {
    let dims = dimensions(args.width, args.height)?;
    let source = read_sketch(&args.file)?;
    let rewritten = transcode(&source, dims);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(rewritten.as_bytes())
        .context("Failed to write sketch to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PreviewConfig::load_from(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => PreviewConfig::default(),
    };
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    let dims = dimensions(config.width, config.height)?;

    let path = match PreviewTarget::parse(&args.target)? {
        PreviewTarget::File(path) => path,
        PreviewTarget::Editor(id) => {
            bail!("editor {id} can only be previewed from inside its editor")
        }
    };

    let grammar = PreviewConfig::grammar_for_path(&path).unwrap_or_default();
    if !config.accepts_grammar(&grammar) {
        bail!(
            "'{}' is not a previewable sketch (grammar '{grammar}', enabled: {})",
            path.display(),
            config.grammars.join(", ")
        );
    }

    let staging = args
        .staging
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("processing-preview"));
    let compiler = StagingCompiler::for_sketch(staging, &path);
    let runtime = CommandRuntime::new(config.command.clone(), dims);
    let poll_interval = Duration::from_millis(config.poll_interval_ms.max(1));

    let mut session =
        PreviewSession::new(SketchSource::File(path.clone()), config, compiler, runtime);
    tracing::info!(title = %session.title(), %dims, "starting preview");

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;

    let mut watcher = FileWatcher::new(&path);
    report(session.render().map(Some));

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(poll_interval);
        if let Some(event) = watcher.poll() {
            report(session.handle(event));
        }
        if let Err(err) = session.check() {
            tracing::error!(error = %err, "sketch stopped");
        }
    }

    session.close().context("Failed to stop sketch")?;
    tracing::info!("preview closed");
    Ok(())
}

/// A failed render is shown and the preview waits for the next change.
fn report(result: PreviewResult<Option<RenderOutcome>>) {
    match result {
        Ok(Some(RenderOutcome::Rendered)) | Ok(None) => {}
        Ok(Some(RenderOutcome::NoSource)) => tracing::warn!("nothing to render"),
        Err(err) => tracing::error!(error = %err, "render failed"),
    }
}
