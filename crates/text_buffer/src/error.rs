//! Errors surfaced by the chunk buffer and its loaders.
use std::io;

use rope::RopeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("Rope error: {0}")]
    Rope(#[from] RopeError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("Loader failed: {0}")]
    LoaderFailed(String),

    #[error("Loader disconnected before finishing")]
    LoaderDisconnected,
}

pub type Result<T> = std::result::Result<T, BufferError>;
