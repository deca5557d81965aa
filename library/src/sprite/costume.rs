//! Costume images and their asynchronous loading.
//!
//! Decoding runs on the rayon pool; the result comes back through a oneshot
//! channel that the stage polls on its own thread. Decoded pixels are kept
//! in a small LRU cache keyed by source so sprites sharing an image decode
//! it once.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use once_cell::sync::Lazy;
use tiny_skia::{IntSize, Pixmap};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::LibraryError;

const IMAGE_CACHE_SIZE: usize = 32;

static IMAGE_CACHE: Lazy<Mutex<LruCache<String, Arc<Pixmap>>>> = Lazy::new(|| {
    let capacity = NonZeroUsize::new(IMAGE_CACHE_SIZE).expect("IMAGE_CACHE_SIZE must be > 0");
    Mutex::new(LruCache::new(capacity))
});

/// One decoded appearance of a sprite.
#[derive(Clone)]
pub struct Costume {
    pub name: String,
    /// Where the image came from; this is what gets serialized.
    pub source: String,
    /// Premultiplied pixels at the original resolution.
    pub pixmap: Arc<Pixmap>,
    /// Display size after clamping to the maximum costume size.
    pub width: f64,
    pub height: f64,
    pub original_width: u32,
    pub original_height: u32,
}

impl Costume {
    pub fn from_pixmap(name: &str, source: &str, pixmap: Arc<Pixmap>, max_size: f64) -> Self {
        let (original_width, original_height) = (pixmap.width(), pixmap.height());
        let (width, height) = clamp_size(original_width as f64, original_height as f64, max_size);
        Self {
            name: name.to_string(),
            source: source.to_string(),
            pixmap,
            width,
            height,
            original_width,
            original_height,
        }
    }
}

impl fmt::Debug for Costume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Costume")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("original_width", &self.original_width)
            .field("original_height", &self.original_height)
            .finish()
    }
}

/// Scales `(width, height)` down, preserving aspect ratio, so that neither
/// side exceeds `max`. Sizes already within bounds are returned unchanged.
pub fn clamp_size(width: f64, height: f64, max: f64) -> (f64, f64) {
    if width > max || height > max {
        let ratio = (max / width).min(max / height);
        (width * ratio, height * ratio)
    } else {
        (width, height)
    }
}

/// Converts straight-alpha RGBA into a premultiplied pixmap.
pub fn pixmap_from_rgba(image: &image::RgbaImage) -> Result<Pixmap, LibraryError> {
    let size = IntSize::from_wh(image.width(), image.height())
        .ok_or_else(|| LibraryError::render("image has zero size"))?;
    let mut data = image.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size).ok_or_else(|| LibraryError::render("invalid pixmap buffer"))
}

/// Decodes the image at `source` synchronously, using the shared cache.
pub fn decode_costume(source: &str, name: &str, max_size: f64) -> Result<Costume, LibraryError> {
    if let Some(pixmap) = cached(source) {
        return Ok(Costume::from_pixmap(name, source, pixmap, max_size));
    }
    let rgba = image::open(source)?.to_rgba8();
    let pixmap = Arc::new(pixmap_from_rgba(&rgba)?);
    if let Ok(mut cache) = IMAGE_CACHE.lock() {
        cache.put(source.to_string(), pixmap.clone());
    }
    Ok(Costume::from_pixmap(name, source, pixmap, max_size))
}

fn cached(source: &str) -> Option<Arc<Pixmap>> {
    IMAGE_CACHE.lock().ok()?.get(source).cloned()
}

/// Result of checking an in-flight load.
pub enum LoadPoll {
    Pending,
    Ready(Result<Costume, LibraryError>),
}

/// A costume whose image is still being decoded.
pub struct PendingCostume {
    pub name: String,
    pub source: String,
    receiver: oneshot::Receiver<Result<Costume, LibraryError>>,
}

impl PendingCostume {
    /// Starts decoding `source` on the rayon pool.
    pub fn spawn(source: &str, name: &str, max_size: f64) -> Self {
        let (tx, rx) = oneshot::channel();
        let (src, label) = (source.to_string(), name.to_string());
        rayon::spawn(move || {
            let result = decode_costume(&src, &label, max_size);
            // The receiver is gone when the sprite was removed meanwhile.
            let _ = tx.send(result);
        });
        Self {
            name: name.to_string(),
            source: source.to_string(),
            receiver: rx,
        }
    }

    /// Wraps an already-finished result; used for costumes built in memory.
    pub fn ready(name: &str, source: &str, result: Result<Costume, LibraryError>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self {
            name: name.to_string(),
            source: source.to_string(),
            receiver: rx,
        }
    }

    pub fn poll(&mut self) -> LoadPoll {
        match self.receiver.try_recv() {
            Ok(result) => LoadPoll::Ready(result),
            Err(TryRecvError::Empty) => LoadPoll::Pending,
            Err(TryRecvError::Closed) => LoadPoll::Ready(Err(LibraryError::runtime(format!(
                "costume loader for '{}' went away",
                self.source
            )))),
        }
    }

    /// Blocks until the decode finishes. Must not be called from async code.
    pub fn wait(self) -> Result<Costume, LibraryError> {
        let source = self.source;
        self.receiver.blocking_recv().unwrap_or_else(|_| {
            Err(LibraryError::runtime(format!(
                "costume loader for '{}' went away",
                source
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_preserves_aspect_ratio() {
        assert_eq!(clamp_size(400.0, 200.0, 200.0), (200.0, 100.0));
        assert_eq!(clamp_size(100.0, 800.0, 200.0), (25.0, 200.0));
        assert_eq!(clamp_size(120.0, 80.0, 200.0), (120.0, 80.0));
    }

    #[test]
    fn premultiplies_alpha() {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba([200, 100, 0, 128]));
        let pixmap = pixmap_from_rgba(&img).unwrap();
        let px = pixmap.pixel(0, 0).unwrap();
        assert_eq!(px.alpha(), 128);
        assert_eq!(px.red(), 100);
        assert_eq!(px.green(), 50);
    }

    #[test]
    fn missing_file_fails_to_load() {
        let pending = PendingCostume::spawn("/definitely/not/here.png", "ghost", 200.0);
        assert!(pending.wait().is_err());
    }
}
