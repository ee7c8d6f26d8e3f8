//! Asynchronous image decode
//!
//! Decoding runs on a worker thread and the completion comes back over
//! a channel, so the engine's single logical thread is never blocked.
//! Each load carries a generation number; starting a new load bumps the
//! generation, which invalidates any in-flight load. A completion for a
//! superseded generation is discarded when drained, so a rapid re-load
//! can never leave the scene showing the first image's result.

use crate::error::EngineError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use image::RgbaImage;
use std::sync::Arc;

/// Identifies one load request. Returned to the host so it can match
/// completions to the command that started them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadToken(u64);

struct LoadCompletion {
    generation: u64,
    result: Result<RgbaImage, EngineError>,
}

/// Decode worker and stale-completion filter
pub struct ImageLoader {
    generation: u64,
    pending: bool,
    tx: Sender<LoadCompletion>,
    rx: Receiver<LoadCompletion>,
}

impl ImageLoader {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            generation: 0,
            pending: false,
            tx,
            rx,
        }
    }

    /// Begin decoding image bytes on a worker thread.
    ///
    /// Supersedes any load still in flight: the older load's eventual
    /// completion will be dropped on drain.
    pub fn begin(&mut self, bytes: Vec<u8>) -> LoadToken {
        self.generation += 1;
        self.pending = true;
        let generation = self.generation;
        log::debug!("load {generation} started ({} bytes)", bytes.len());
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = image::load_from_memory(&bytes)
                .map(image::DynamicImage::into_rgba8)
                .map_err(|e| EngineError::ImageLoad(e.to_string()));
            // The receiver may be gone if the engine was dropped.
            let _ = tx.send(LoadCompletion { generation, result });
        });
        LoadToken(generation)
    }

    /// Whether a load is still in flight
    pub fn load_in_flight(&self) -> bool {
        self.pending
    }

    /// Drain arrived completions.
    ///
    /// Stale completions are logged and dropped; only the current
    /// generation's outcome is returned. Returns None while nothing for
    /// the current generation has arrived.
    pub fn poll(&mut self) -> Option<(LoadToken, Result<Arc<RgbaImage>, EngineError>)> {
        while let Ok(completion) = self.rx.try_recv() {
            if completion.generation != self.generation {
                log::debug!(
                    "discarding stale load {} (current {})",
                    completion.generation,
                    self.generation
                );
                continue;
            }
            self.pending = false;
            let token = LoadToken(completion.generation);
            return Some((token, completion.result.map(Arc::new)));
        }
        None
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}
