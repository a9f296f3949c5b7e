use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;
use signal_hook::consts;
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::mpsc,
};

use crate::error::{Error, Result};

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    #[value(alias = "sigint")]
    #[serde(alias = "SIGINT")]
    Int,
    #[value(alias = "sigterm")]
    #[serde(alias = "SIGTERM")]
    Term,
    #[value(alias = "sighup")]
    #[serde(alias = "SIGHUP")]
    Hup,
    #[value(alias = "sigquit")]
    #[serde(alias = "SIGQUIT")]
    Quit,
    #[value(alias = "sigusr1")]
    #[serde(alias = "SIGUSR1")]
    Usr1,
    #[value(alias = "sigusr2")]
    #[serde(alias = "SIGUSR2")]
    Usr2,
}

impl Signal {
    pub fn raw(self) -> i32 {
        match self {
            Signal::Int => consts::SIGINT,
            Signal::Term => consts::SIGTERM,
            Signal::Hup => consts::SIGHUP,
            Signal::Quit => consts::SIGQUIT,
            Signal::Usr1 => consts::SIGUSR1,
            Signal::Usr2 => consts::SIGUSR2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Signal::Int => "SIGINT",
            Signal::Term => "SIGTERM",
            Signal::Hup => "SIGHUP",
            Signal::Quit => "SIGQUIT",
            Signal::Usr1 => "SIGUSR1",
            Signal::Usr2 => "SIGUSR2",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct SignalListener {
    received: mpsc::Receiver<Signal>,
}

impl SignalListener {
    /// Handlers are installed here, so call it before anything that can block.
    pub fn register(signals: &[Signal]) -> Result<Self> {
        let (sender, received) = mpsc::channel(1);

        for &sig in signals {
            let mut stream =
                signal(SignalKind::from_raw(sig.raw())).map_err(|source| Error::Signal {
                    signal: sig.name(),
                    source,
                })?;
            debug!("Listening for {sig}");

            let sender = sender.clone();
            tokio::spawn(async move {
                if stream.recv().await.is_some() && sender.send(sig).await.is_err() {
                    debug!("{sig} arrived after the listener was dropped");
                }
            });
        }

        Ok(Self { received })
    }

    /// Waits for the first registered signal. Without any registered signal this never returns.
    pub async fn recv(&mut self) -> Signal {
        match self.received.recv().await {
            Some(sig) => sig,
            None => std::future::pending().await,
        }
    }
}
