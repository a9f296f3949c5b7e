use std::{
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The record a waybar custom module with `"return-type": "json"` reads.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Output {
    pub text: String,
}

impl Output {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn to_line(&self) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

fn write_line(sink: &mut impl Write, line: &[u8]) -> Result<()> {
    sink.write_all(line).map_err(Error::Write)?;
    sink.flush().map_err(Error::Write)
}

/// Writes records on the blocking pool. A bar that stops reading stalls one blocking
/// thread, never a runtime worker, so callers can still give up on a pending `emit`.
pub struct Emitter<W> {
    sink: Arc<Mutex<W>>,
}

impl<W> Clone for Emitter<W> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
        }
    }
}

impl Emitter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + 'static> Emitter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Writes one complete line and flushes it, so the bar never sees half a record.
    pub async fn emit(&self, text: &str) -> Result<()> {
        let line = Output::new(text).to_line()?;
        debug!("Emitting {text:?}");

        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || {
            let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
            write_line(&mut *sink, &line)
        })
        .await
        .map_err(|e| Error::Write(io::Error::other(e)))?
    }
}

#[cfg(test)]
impl<W: Clone> Emitter<W> {
    pub fn snapshot(&self) -> W {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
