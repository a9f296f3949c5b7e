use std::io::Write;

use anyhow::Context;
use tokio::{
    io::AsyncBufRead,
    sync::{mpsc, watch},
};

use crate::config::{Config, Mode};
use crate::error::{Error, Result};
use crate::format::{status_text, title_text, Glyphs, Status};
use crate::output::Emitter;
use crate::playerctl::{FollowStream, Playerctl, TitleQuery};

pub struct Watcher {
    playerctl: Playerctl,
    mode: Mode,
    glyphs: Glyphs,
}

impl Watcher {
    pub fn new(config: &Config) -> Self {
        Self {
            playerctl: Playerctl::new(
                &config.playerctl,
                config.player.as_deref(),
                &config.format,
            ),
            mode: config.mode,
            glyphs: config.glyphs.clone(),
        }
    }

    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        self.run_with(Emitter::stdout(), shutdown).await
    }

    /// Runs until `shutdown` fires. Returning on its own means the pipeline broke.
    pub async fn run_with<W>(
        self,
        emitter: Emitter<W>,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()>
    where
        W: Write + Send + 'static,
    {
        info!("Watching playerctl in {:?} mode", self.mode);

        match self.mode {
            Mode::Title => {
                let stream = self
                    .playerctl
                    .follow_titles()
                    .context("Failed to follow titles")?;

                follow_titles(stream, &emitter, &self.glyphs, shutdown)
                    .await
                    .context("Title follower stopped")
            }
            Mode::Status => {
                let stream = self
                    .playerctl
                    .follow_status()
                    .context("Failed to follow playback status")?;
                let (sender, receiver) = mpsc::channel(1);
                let consumer = tokio::spawn(emit_queued(receiver, emitter, shutdown.clone()));

                let produced =
                    follow_status(stream, &self.playerctl, &self.glyphs, sender, shutdown).await;
                let emitted = consumer.await.context("Emitter task panicked")?;

                emitted.context("Emitter stopped")?;
                produced.context("Status follower stopped")
            }
        }
    }
}

async fn emit<W: Write + Send + 'static>(emitter: &Emitter<W>, text: &str) -> Result<()> {
    match emitter.emit(text).await {
        Err(Error::Serialize(e)) => {
            warn!("Dropping {text:?}: {e}");
            Ok(())
        }
        emitted => emitted,
    }
}

/// Emits one record per streamed title line, in the reading task.
pub async fn follow_titles<R, W>(
    mut stream: FollowStream<R>,
    emitter: &Emitter<W>,
    glyphs: &Glyphs,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            line = stream.next_line() => line,
        };
        let Some(line) = line.inspect_err(|e| error!("Reading titles: {e}"))? else {
            return Err(Error::StreamClosed);
        };

        debug!("Title event {line:?}");
        let text = title_text(&line, glyphs);
        tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            emitted = emit(emitter, &text) => emitted.inspect_err(|e| error!("{e}"))?,
        }
    }
}

/// Producer half of status mode: one point query per status line, results go to `queue`.
pub async fn follow_status<R, Q>(
    mut stream: FollowStream<R>,
    query: &Q,
    glyphs: &Glyphs,
    queue: mpsc::Sender<String>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    Q: TitleQuery,
{
    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            () = queue.closed() => {
                emitter_gone();
                return Ok(());
            }
            line = stream.next_line() => line,
        };
        let Some(line) = line.inspect_err(|e| error!("Reading status: {e}"))? else {
            return Err(Error::StreamClosed);
        };
        let status = Status::parse(&line);
        match status {
            Status::Other(other) => debug!("Unrecognized status {other:?}, no glyph"),
            _ => debug!("Status event {status:?}"),
        }

        let title = tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            () = queue.closed() => {
                emitter_gone();
                return Ok(());
            }
            title = query.current_title() => title,
        };
        let title = title.unwrap_or_else(|e| {
            // playerctl exits non-zero when no player is running
            if matches!(e, Error::QueryStatus(_)) {
                debug!("No title: {e}");
            } else {
                warn!("Title query failed: {e}");
            }
            String::new()
        });

        let text = status_text(&status, &title, glyphs);
        tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            sent = queue.send(text) => {
                if sent.is_err() {
                    emitter_gone();
                    return Ok(());
                }
            }
        }
    }
}

fn emitter_gone() {
    debug!("Emitter is gone, stopping");
}

/// Consumer half of status mode. Ends once the producer drops its sender or `shutdown` fires.
pub async fn emit_queued<W: Write + Send + 'static>(
    mut queue: mpsc::Receiver<String>,
    emitter: Emitter<W>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        let text = tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            text = queue.recv() => text,
        };
        let Some(text) = text else {
            return Ok(());
        };

        tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            emitted = emit(&emitter, &text) => emitted.inspect_err(|e| error!("{e}"))?,
        }
    }
}
