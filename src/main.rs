#![forbid(unsafe_code)]

//! `mediafileinfo-client` — query a `--pipe` media info server for each
//! filename on the command line and print one record per line.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use mediafileinfo_client::output::{self, OutputFormat};
use mediafileinfo_client::process::ServerProcess;
use mediafileinfo_client::{AppError, ClientConfig, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "mediafileinfo-client",
    about = "Query a mediafileinfo --pipe server for each file",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server executable (overrides `server_cmd`).
    #[arg(long)]
    server_cmd: Option<PathBuf>,

    /// Server argument; repeat for several (overrides `server_args`).
    #[arg(long = "server-arg", allow_hyphen_values = true)]
    server_args: Vec<String>,

    /// Maximum response line length in bytes (overrides `max_line_bytes`).
    #[arg(long)]
    max_line_bytes: Option<usize>,

    /// Record output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Log output format (text or json), written to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Report protocol errors and continue with the next file.
    #[arg(long)]
    keep_going: bool,

    /// Files to query, in order.
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

impl Cli {
    /// Resolve the effective configuration: file (or defaults), then CLI overrides.
    fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load_from_path(path)?,
            None => ClientConfig::default(),
        };

        if let Some(cmd) = &self.server_cmd {
            config.server_cmd.clone_from(cmd);
        }
        if !self.server_args.is_empty() {
            config.server_args.clone_from(&self.server_args);
        }
        if let Some(max) = self.max_line_bytes {
            config.max_line_bytes = max;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() {
    let args = Cli::parse();

    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    match run(&args) {
        Ok(0) => {}
        Ok(failed) => {
            eprintln!("error: {failed} of {} file(s) failed", args.files.len());
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

/// Query every file in order. Returns the number of files skipped under `--keep-going`.
fn run(args: &Cli) -> Result<usize> {
    let config = args.load_config()?;
    let mut server = ServerProcess::spawn(&config.spawn_config())?;
    info!(pid = server.id(), files = args.files.len(), "querying server");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut failed = 0usize;

    for filename in &args.files {
        match server.query(filename) {
            Ok(record) => output::write_record(&mut out, &record, args.output)?,
            Err(err) if args.keep_going && !err.is_fatal() => {
                debug!(file = %filename.display(), %err, "skipping file");
                eprintln!("{}: {err}", filename.display());
                failed += 1;
            }
            // Fatal errors leave the server unreachable; dropping it kills and reaps it.
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                // Still in sync: close stdin so the server exits on EOF.
                if let Err(shutdown_err) = server.shutdown() {
                    debug!(%shutdown_err, "server shutdown after error failed");
                }
                return Err(err);
            }
        }
    }

    out.flush()
        .map_err(|err| AppError::Io(format!("flush failed: {err}")))?;
    server.shutdown()?;
    Ok(failed)
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
