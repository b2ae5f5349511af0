//! Run a PREZ guest without a window and print what it draws.
//!
//! Each recorded draw command is written to stdout as one JSON object per
//! line.  Logs go to stderr and honour `RUST_LOG`.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use prez_host::{
    BridgeConfig, CommandLog, HeadlessPage, HostInput, Session, SessionError, SessionResult,
};

#[derive(Parser)]
#[command(name = "prez-headless")]
#[command(about = "Run a PREZ guest module headlessly and dump its draw commands.", long_about = None)]
struct HeadlessArgs {
    /// Guest module (`.wasm`).
    module: PathBuf,

    /// JSON bridge config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Display refreshes to simulate after the entry point returns.
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Placeholder name the guest binds with `canvas.init`.
    #[arg(long, default_value = "screen")]
    surface: String,

    /// Host input to dispatch before the first frame, one JSON object per
    /// line.
    #[arg(long)]
    input: Option<PathBuf>,
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    setup_tracing();
    let cli = HeadlessArgs::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.bridge_error() {
                Some(violation) => eprintln!("prez-headless: guest trapped: {violation}"),
                None => eprintln!("prez-headless: {err}"),
            }
            ExitCode::from(1)
        }
    }
}

fn read_inputs(path: &Path) -> SessionResult<Vec<HostInput>> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut inputs = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let input = serde_json::from_str(&line).map_err(|e| {
            SessionError::Config(format!("{}:{}: {e}", path.display(), lineno + 1))
        })?;
        inputs.push(input);
    }
    Ok(inputs)
}

fn flush(log: &CommandLog, out: &mut impl Write) -> SessionResult<()> {
    for command in log.take() {
        let line = serde_json::to_string(&command)
            .map_err(|e| SessionError::Config(e.to_string()))?;
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn run(cli: &HeadlessArgs) -> SessionResult<()> {
    let config = match &cli.config {
        Some(path) => BridgeConfig::from_path(path)?,
        None => BridgeConfig::default(),
    };
    let inputs = match &cli.input {
        Some(path) => read_inputs(path)?,
        None => Vec::new(),
    };
    let wasm = fs::read(&cli.module)?;

    let mut page = HeadlessPage::new(config.viewport);
    let log = page.add_placeholder(cli.surface.clone());
    let mut session = Session::builder(config).page(page).build(&wasm)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    session.run_entry()?;
    flush(&log, &mut out)?;

    for input in inputs {
        let disposition = session.dispatch_input(input)?;
        tracing::debug!(?input, ?disposition, "input");
    }

    for _ in 0..cli.frames {
        let tick = session.tick()?;
        if !tick.frame_ran && tick.completed_loads == 0 {
            tracing::debug!("idle tick");
        }
        flush(&log, &mut out)?;
    }

    if let Some(status) = session.state().exit_status() {
        tracing::info!(status, "guest asked to exit");
    }
    Ok(())
}
