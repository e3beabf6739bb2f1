//! Image references and background decoding.
//!
//! Decoding happens once per source change on a worker thread. Results for a
//! source that has since been replaced are dropped, so overlapping loads can
//! never paint the wrong image.

use crate::error::{Error, Result};
use image::RgbaImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// A host-supplied image reference: a plain path or a `file://` URL.
/// Relative paths resolve against the task file's directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageSource(String);

impl ImageSource {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resolve(&self, base_dir: Option<&Path>) -> Result<PathBuf> {
        let reference = self.0.trim();
        if reference.is_empty() {
            return Err(Error::UnsupportedImageSource {
                source_ref: self.0.clone(),
            });
        }
        let raw = if let Some(rest) = reference.strip_prefix("file://") {
            rest
        } else if reference.contains("://") {
            return Err(Error::UnsupportedImageSource {
                source_ref: self.0.clone(),
            });
        } else {
            reference
        };

        let path = PathBuf::from(raw);
        Ok(match base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        })
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decoded RGBA bitmap at natural size.
#[derive(Debug)]
pub struct DecodedImage {
    pub rgba: RgbaImage,
}

impl DecodedImage {
    pub fn size(&self) -> (u32, u32) {
        self.rgba.dimensions()
    }
}

pub fn decode(path: &Path) -> Result<DecodedImage> {
    let rgba = image::open(path)?.to_rgba8();
    Ok(DecodedImage { rgba })
}

// ── Loader ──────────────────────────────────────────────────────────────────

pub type LoadResult = (ImageSource, Result<Arc<DecodedImage>>);

type Waker = Arc<dyn Fn() + Send + Sync>;

struct Finished {
    generation: u64,
    source: ImageSource,
    result: Result<Arc<DecodedImage>>,
}

pub struct ImageLoader {
    base_dir: Option<PathBuf>,
    generation: u64,
    current: Option<ImageSource>,
    tx: Sender<Finished>,
    rx: Receiver<Finished>,
    waker: Option<Waker>,
}

impl ImageLoader {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            base_dir,
            generation: 0,
            current: None,
            tx,
            rx,
            waker: None,
        }
    }

    /// Called from the worker thread once a decode finishes.
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    /// Start decoding `source` unless it is already the current request.
    /// Returns whether a new load was started.
    pub fn request(&mut self, source: &ImageSource) -> bool {
        if self.current.as_ref() == Some(source) {
            return false;
        }
        self.generation += 1;
        self.current = Some(source.clone());

        let generation = self.generation;
        let source = source.clone();
        let base_dir = self.base_dir.clone();
        let tx = self.tx.clone();
        let waker = self.waker.clone();
        log::debug!("image: loading {source} (generation {generation})");

        std::thread::spawn(move || {
            let result = source
                .resolve(base_dir.as_deref())
                .and_then(|path| decode(&path))
                .map(Arc::new);
            // The receiver only disappears when the loader is dropped.
            let _ = tx.send(Finished {
                generation,
                source,
                result,
            });
            if let Some(wake) = waker {
                wake();
            }
        });
        true
    }

    /// The newest finished load for the current source, if any.
    pub fn poll(&mut self) -> Option<LoadResult> {
        let mut latest = None;
        while let Ok(done) = self.rx.try_recv() {
            if done.generation == self.generation {
                latest = Some((done.source, done.result));
            } else {
                log::debug!("image: dropping stale load of {}", done.source);
            }
        }
        latest
    }
}
