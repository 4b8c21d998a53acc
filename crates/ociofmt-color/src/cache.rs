//! Thread-safe processor caching.
//!
//! The importer compiles the same `input -> output` conversion for every
//! buffer of a session, and the preview path asks for it again on each
//! redraw. Compiled processors are kept per `(src, dst)` pair.
//!
//! ```ignore
//! use ociofmt_color::{Config, ProcessorCache};
//!
//! let config = Config::builtin();
//! let cache = ProcessorCache::new();
//! let p = cache.get_or_create(&config, "linear", "srgb_display")?;
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::ColorResult;
use crate::processor::Processor;
use crate::traits::ColorConfig;

/// Thread-safe processor cache keyed by `(src, dst)`.
#[derive(Debug, Default)]
pub struct ProcessorCache {
    cache: RwLock<HashMap<(String, String), Processor>>,
}

impl ProcessorCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached processor for `src -> dst`, compiling it on a miss.
    ///
    /// Failed compilations are not cached.
    pub fn get_or_create(
        &self,
        config: &dyn ColorConfig,
        src: &str,
        dst: &str,
    ) -> ColorResult<Processor> {
        let key = (src.to_string(), dst.to_string());

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(p) = cache.get(&key) {
                return Ok(p.clone());
            }
        }

        let processor = config.processor(src, dst)?;
        tracing::debug!(src, dst, ops = processor.num_ops(), "processor cached");

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, processor.clone());
        Ok(processor)
    }

    /// Clears all cached processors.
    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached processors.
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::config::Config;

    #[test]
    fn hit_returns_same_processor() {
        let config = Config::builtin();
        let cache = ProcessorCache::new();
        let a = cache
            .get_or_create(&config, builtin::LINEAR, builtin::SRGB_DISPLAY)
            .unwrap();
        let b = cache
            .get_or_create(&config, builtin::LINEAR, builtin::SRGB_DISPLAY)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);

        cache
            .get_or_create(&config, builtin::CINEON, builtin::LINEAR)
            .unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn failures_are_not_cached() {
        let config = Config::builtin();
        let cache = ProcessorCache::new();
        assert!(cache.get_or_create(&config, "nope", builtin::LINEAR).is_err());
        assert!(cache.is_empty());
    }
}
