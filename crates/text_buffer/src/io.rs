use std::{
    fs::File,
    io::{self, BufReader, Read},
    mem,
    path::Path,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, info, warn};

use crate::buffer::TextBuffer;
use crate::buffer_builder::TextBufferBuilder;
use crate::config::BufferConfig;
use crate::decoder::{BOM_PROBE_LEN, Decoder, detect_bom};
use crate::error::{BufferError, Result};

pub fn load_from_path<P: AsRef<Path>>(path: P, config: &BufferConfig) -> Result<TextBuffer> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!(path = %path.display(), "loading file");
    load_from_reader(BufReader::new(file), config)
}

pub fn load_from_reader<R: Read>(reader: R, config: &BufferConfig) -> Result<TextBuffer> {
    let mut builder = TextBufferBuilder::with_config(config.clone());
    let bytes = read_decoded(reader, config, |chars| {
        builder.accept_chars(chars);
        Ok(())
    })?;
    debug!(bytes, len = builder.len(), "read text");
    Ok(builder.finish())
}

/// Picks the decoder for a stream starting with `head`, returning it with
/// the length of the byte order mark to skip.
fn open_decoder(head: &[u8], config: &BufferConfig) -> (Decoder, usize) {
    let bom = detect_bom(head);
    match (config.encoding, bom) {
        (None, Some(bom)) => (Decoder::new(bom.encoding), bom.len),
        (Some(encoding), Some(bom)) if bom.encoding == encoding => {
            (Decoder::new(encoding), bom.len)
        }
        (encoding, _) => (Decoder::new(encoding.unwrap_or_default()), 0),
    }
}

/// Reads `reader` to the end in `read_chunk_bytes` pieces and hands every
/// decoded piece to `sink`. Returns the number of bytes read.
fn read_decoded<R: Read>(
    mut reader: R,
    config: &BufferConfig,
    mut sink: impl FnMut(Vec<char>) -> io::Result<()>,
) -> io::Result<u64> {
    let mut buf = vec![0u8; config.read_chunk_bytes.max(BOM_PROBE_LEN)];
    let mut head: Vec<u8> = Vec::new();
    let mut decoder: Option<Decoder> = None;
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        total += n as u64;

        let chars = if let Some(decoder) = decoder.as_mut() {
            decoder.decode(&buf[..n])
        } else {
            // Hold bytes back until the byte order mark can be recognized
            head.extend_from_slice(&buf[..n]);
            if head.len() < BOM_PROBE_LEN {
                continue;
            }
            let head = mem::take(&mut head);
            let (mut opened, skip) = open_decoder(&head, config);
            let chars = opened.decode(&head[skip..]);
            decoder = Some(opened);
            chars
        };
        if !chars.is_empty() {
            sink(chars)?;
        }
    }

    let mut decoder = match decoder {
        Some(decoder) => decoder,
        None => {
            let (mut opened, skip) = open_decoder(&head, config);
            let chars = opened.decode(&head[skip..]);
            if !chars.is_empty() {
                sink(chars)?;
            }
            opened
        }
    };
    let tail = decoder.finish();
    if !tail.is_empty() {
        sink(tail)?;
    }
    Ok(total)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    Chunk(Vec<char>),
    Done { bytes: u64 },
    Failed(String),
}

/// Handle to a background decode thread.
///
/// The worker only decodes; the pieces are appended to a builder on the
/// thread that drains the events.
#[derive(Debug)]
pub struct Loader {
    rx: Receiver<LoadEvent>,
    handle: Option<JoinHandle<()>>,
}

pub fn spawn_loader<R>(reader: R, config: BufferConfig) -> Result<Loader>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::unbounded::<LoadEvent>();
    let handle = thread::Builder::new()
        .name("text-buffer-loader".to_string())
        .spawn(move || {
            info!(read_chunk_bytes = config.read_chunk_bytes, "loader started");
            let result = read_decoded(reader, &config, |chars| {
                tx.send(LoadEvent::Chunk(chars)).map_err(|_| {
                    io::Error::new(io::ErrorKind::BrokenPipe, "load receiver dropped")
                })
            });
            let event = match result {
                Ok(bytes) => {
                    info!(bytes, "loader finished");
                    LoadEvent::Done { bytes }
                }
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("loader stopped, receiver dropped");
                    return;
                }
                Err(err) => {
                    warn!(%err, "loader failed");
                    LoadEvent::Failed(err.to_string())
                }
            };
            let _ = tx.send(event);
        })?;

    Ok(Loader {
        rx,
        handle: Some(handle),
    })
}

impl Loader {
    pub fn events(&self) -> &Receiver<LoadEvent> {
        &self.rx
    }

    /// Applies every event that is already queued. Returns the byte count
    /// once the load is complete.
    pub fn try_drain_into(&mut self, builder: &mut TextBufferBuilder) -> Result<Option<u64>> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if let Some(bytes) = self.apply(event, builder)? {
                        return Ok(Some(bytes));
                    }
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => {
                    self.join();
                    return Err(BufferError::LoaderDisconnected);
                }
            }
        }
    }

    /// Blocks until the load completes.
    pub fn drain_into(mut self, builder: &mut TextBufferBuilder) -> Result<u64> {
        loop {
            let Ok(event) = self.rx.recv() else {
                self.join();
                return Err(BufferError::LoaderDisconnected);
            };
            if let Some(bytes) = self.apply(event, builder)? {
                return Ok(bytes);
            }
        }
    }

    fn apply(&mut self, event: LoadEvent, builder: &mut TextBufferBuilder) -> Result<Option<u64>> {
        match event {
            LoadEvent::Chunk(chars) => {
                builder.accept_chars(chars);
                Ok(None)
            }
            LoadEvent::Done { bytes } => {
                self.join();
                Ok(Some(bytes))
            }
            LoadEvent::Failed(message) => {
                self.join();
                Err(BufferError::LoaderFailed(message))
            }
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("loader thread panicked");
            }
        }
    }
}
