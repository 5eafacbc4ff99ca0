//! Buffer tuning, optionally read from environment variables.

use std::env;

use tracing::warn;

use crate::decoder::Encoding;

/// Capacity of the edit window in code points.
pub const DEFAULT_WINDOW_SIZE: usize = 1000;

/// Size of a single read from a byte source.
pub const DEFAULT_READ_CHUNK_BYTES: usize = 64 * 1024;

pub const ENV_WINDOW_SIZE: &str = "TEXT_BUFFER_WINDOW_SIZE";
pub const ENV_READ_CHUNK_BYTES: &str = "TEXT_BUFFER_READ_CHUNK_BYTES";
pub const ENV_ENCODING: &str = "TEXT_BUFFER_ENCODING";

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct BufferConfig {
    pub window_size: usize,
    pub read_chunk_bytes: usize,
    /// Encoding assumed when the source carries no byte order mark.
    /// `None` means UTF-8.
    pub encoding: Option<Encoding>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            read_chunk_bytes: DEFAULT_READ_CHUNK_BYTES,
            encoding: None,
        }
    }
}

impl BufferConfig {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size.max(1);
        self
    }

    pub fn with_read_chunk_bytes(mut self, read_chunk_bytes: usize) -> Self {
        self.read_chunk_bytes = read_chunk_bytes.max(1);
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Defaults overridden by `TEXT_BUFFER_*` variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`BufferConfig::from_env`], reading values through `lookup`.
    /// Unparsable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(size) = parse_size(&lookup, ENV_WINDOW_SIZE) {
            config = config.with_window_size(size);
        }
        if let Some(bytes) = parse_size(&lookup, ENV_READ_CHUNK_BYTES) {
            config = config.with_read_chunk_bytes(bytes);
        }
        if let Some(raw) = lookup(ENV_ENCODING) {
            match raw.parse::<Encoding>() {
                Ok(encoding) => config.encoding = Some(encoding),
                Err(err) => warn!(key = ENV_ENCODING, %err, "ignoring encoding override"),
            }
        }

        config
    }
}

fn parse_size(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse::<usize>() {
        Ok(0) => {
            warn!(key, "ignoring zero size");
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, value = %raw, %err, "ignoring invalid size");
            None
        }
    }
}
