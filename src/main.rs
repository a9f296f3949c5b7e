#![warn(clippy::pedantic)]

mod config;
mod error;
mod format;
mod output;
mod playerctl;
mod signals;
mod watcher;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use config::{Cli, Config};
use output::Emitter;
use signals::SignalListener;
use tokio::{runtime::Runtime, sync::watch};
use watcher::Watcher;

#[macro_use]
extern crate log;

/// How long a signalled shutdown may wait for in-flight output before exiting anyway.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity.log_level().unwrap_or(log::Level::Error);
    simple_logger::init_with_level(verbosity).context("Failed to initialize logging")?;

    let config = Config::new(cli);

    let runtime = Runtime::new().context("Failed to start the tokio runtime")?;
    let result = runtime.block_on(run(config));
    // A write stuck on a full stdout pipe lives on the blocking pool; don't wait for it.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run(config: Config) -> anyhow::Result<()> {
    let mut listener = SignalListener::register(&config.signals)
        .context("Failed to install termination handlers")?;

    let (shutdown, shutdown_rx) = watch::channel(false);
    let mut watcher = tokio::spawn(Watcher::new(&config).run(shutdown_rx));

    tokio::select! {
        finished = &mut watcher => finished.context("Watcher task panicked")?,
        sig = listener.recv() => {
            info!("{sig} received, stopping");
            if shutdown.send(true).is_err() {
                debug!("Watcher already stopped");
            }

            let stopping = async {
                watcher.await.context("Watcher task panicked")??;
                if config.clear_on_exit {
                    Emitter::stdout()
                        .emit("")
                        .await
                        .context("Failed to clear the module")?;
                }
                anyhow::Ok(())
            };
            if let Ok(stopped) = tokio::time::timeout(SHUTDOWN_GRACE, stopping).await {
                stopped
            } else {
                warn!("stdout is not being read, exiting without flushing");
                Ok(())
            }
        },
    }
}
