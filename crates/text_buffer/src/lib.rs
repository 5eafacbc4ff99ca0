mod buffer;
mod buffer_builder;
pub mod config;
pub mod decoder;
mod error;
mod io;

pub use crate::buffer::{CommitMode, Direction, TextBuffer};
pub use crate::buffer_builder::TextBufferBuilder;
pub use crate::config::BufferConfig;
pub use crate::decoder::{Decoder, Encoding};
pub use crate::error::{BufferError, Result};
pub use crate::io::{LoadEvent, Loader, load_from_path, load_from_reader, spawn_loader};
pub use rope::{LineBreak, LineBreakKind, Rope, RopeError};
