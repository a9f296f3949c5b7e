use std::{io, process::ExitStatus};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to start {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} was started without a stdout pipe")]
    MissingStdout { program: String },

    #[error("failed to read the event stream")]
    Read(#[source] io::Error),

    #[error("event stream closed, is the follower still running?")]
    StreamClosed,

    #[error("point query exited with {0}")]
    QueryStatus(ExitStatus),

    #[error("failed to serialize the display record")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write to stdout")]
    Write(#[source] io::Error),

    #[error("failed to register a handler for {signal}")]
    Signal {
        signal: &'static str,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
