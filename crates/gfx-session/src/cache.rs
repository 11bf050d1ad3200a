//! Bitmap cache: a slot -> pixel-block map independent of surface lifetime.

use std::collections::HashMap;

/// One cached rectangle of pixels, captured from a surface by `SurfaceToCache`.
pub struct CacheEntry {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
}

/// Session-scoped bitmap cache. Survives `DeleteSurface` and `ResetGraphics`; only
/// `EvictCacheEntry` or an explicit session reset removes an entry.
pub struct BitmapCache {
    slots: HashMap<u16, CacheEntry>,
}

impl Default for BitmapCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BitmapCache {
    pub fn new() -> Self {
        Self { slots: HashMap::new() }
    }

    /// `surfaceToCache`: insert (overwriting any previous entry at `slot`).
    pub fn insert(&mut self, slot: u16, width: u16, height: u16, pixels: Vec<u8>) {
        self.slots.insert(slot, CacheEntry { width, height, pixels });
    }

    pub fn get(&self, slot: u16) -> Option<&CacheEntry> {
        self.slots.get(&slot)
    }

    /// `evict`.
    pub fn evict(&mut self, slot: u16) {
        self.slots.remove(&slot);
    }

    /// Reset-on-session: clear everything. Never called by `ResetGraphics`, which leaves cache
    /// entries untouched; exposed for a host that wants to start a fresh session without
    /// rebuilding the whole compositor.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn contains(&self, slot: u16) -> bool {
        self.slots.contains_key(&slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_existing_slot() {
        let mut cache = BitmapCache::new();
        cache.insert(5, 2, 2, vec![1; 16]);
        cache.insert(5, 3, 3, vec![2; 36]);
        let entry = cache.get(5).unwrap();
        assert_eq!((entry.width, entry.height), (3, 3));
    }

    #[test]
    fn evict_removes_entry() {
        let mut cache = BitmapCache::new();
        cache.insert(1, 1, 1, vec![0; 4]);
        cache.evict(1);
        assert!(cache.get(1).is_none());
    }
}
