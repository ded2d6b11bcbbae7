//! Bounded cache for rasterized page bitmaps
//!
//! Rendering a page at poster resolution is expensive, so page sources keep
//! the last few bitmaps keyed by requested pixel size. The cache holds at
//! most [`RenderCache::CAPACITY`] entries and evicts in insertion order.
//!
//! Lookup and insert are separate critical sections on purpose: the lock is
//! not held while a caller renders a missing entry, so two threads missing
//! on the same key may both render and both insert. That duplicate work is
//! accepted; the second insert simply replaces the first.

use std::sync::Mutex;

use image::RgbaImage;
use std::sync::Arc;

/// Insertion-ordered bitmap cache keyed by packed pixel size
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: Mutex<Vec<(u64, Arc<RgbaImage>)>>,
}

impl RenderCache {
    /// Most bitmaps kept alive at once
    pub const CAPACITY: usize = 3;

    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Look up a bitmap by key; the lock is released before returning
    pub fn get(&self, key: u64) -> Option<Arc<RgbaImage>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, image)| Arc::clone(image))
    }

    /// Insert a bitmap, trimming the oldest entries beyond capacity in the
    /// same critical section
    pub fn put(&self, key: u64, image: Arc<RgbaImage>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|(k, _)| *k != key);
        entries.push((key, image));
        while entries.len() > Self::CAPACITY {
            entries.remove(0);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
