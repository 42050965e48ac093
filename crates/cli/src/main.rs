mod config;
mod interrupt;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use futures_lite::future;
use futures_util::future::AbortHandle;
use libportcopy::{CopyJob, Error, Outcome, SessionBus};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use config::Config;

/// Copy a file to a location chosen in the desktop portal's Save dialog
#[derive(Parser)]
#[command(name = "portcopy", version, about)]
struct Cli {
    /// File to copy
    source: PathBuf,

    /// Folder the dialog starts in, passed to the portal as-is [default: ~]
    target_directory: Option<String>,

    /// File name suggested in the dialog [default: base name of SOURCE]
    target_name: Option<String>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print().ok();
            return if e.kind() == clap::error::ErrorKind::DisplayHelp
                || e.kind() == clap::error::ErrorKind::DisplayVersion
            {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            };
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = Config::load();
    debug!(?config, "Config loaded");

    match run(cli, &config) {
        Ok(Outcome::Completed { destination, bytes }) => {
            debug!(destination = %destination.display(), bytes, "Done");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Cancelled(code)) => {
            debug!(%code, "Cancelled");
            ExitCode::SUCCESS
        }
        Err(Error::Interrupted) => {
            eprintln!("Interrupted");
            ExitCode::from(130)
        }
        Err(e @ Error::Usage(_)) => {
            eprintln!("Error: {e}");
            eprintln!("{}", Cli::command().render_usage());
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Validate arguments, then connect -> request -> await -> parse -> copy
fn run(cli: Cli, config: &Config) -> Result<Outcome, Error> {
    let job = CopyJob::new(
        cli.source,
        cli.target_directory.or_else(|| config.default_folder.clone()),
        cli.target_name,
    )?;

    let (abort_handle, abort_registration) = AbortHandle::new_pair();
    if let Err(e) = interrupt::watch(abort_handle) {
        warn!(error = %e, "Cannot watch for signals; the wait will not be interruptible");
    }

    future::block_on(async {
        let bus = SessionBus::connect().await?;
        libportcopy::save_copy(&bus, &job, config.dialog(), abort_registration).await
    })
}
