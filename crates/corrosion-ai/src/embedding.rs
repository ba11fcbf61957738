//! Cached, lazily-initialised text embeddings.
//!
//! [`EmbeddingProvider`] owns the embedding backend and an exact-match LRU
//! cache keyed by normalised text. The backend is constructed on first use
//! (model loads take seconds) and then reused for the process lifetime.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::error::PredictError;

/// A model that maps text to a fixed-width dense vector.
pub trait EmbeddingBackend: Send {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, PredictError>;
}

type BackendLoader =
    Box<dyn Fn() -> Result<Box<dyn EmbeddingBackend>, PredictError> + Send + Sync>;

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct EmbeddingProvider {
    loader: BackendLoader,
    backend: OnceCell<Mutex<Box<dyn EmbeddingBackend>>>,
    cache: Mutex<LruCache<String, Arc<[f32]>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingProvider {
    /// Create a provider that builds its backend with `loader` on first use.
    ///
    /// `cache_capacity` bounds the number of cached texts; `0` disables the bound.
    pub fn new<F, B>(cache_capacity: usize, loader: F) -> Self
    where
        F: Fn() -> Result<B, PredictError> + Send + Sync + 'static,
        B: EmbeddingBackend + 'static,
    {
        let cache = match NonZeroUsize::new(cache_capacity) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        Self {
            loader: Box::new(move || loader().map(|b| Box::new(b) as Box<dyn EmbeddingBackend>)),
            backend: OnceCell::new(),
            cache: Mutex::new(cache),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Provider backed by the ONNX [`Embedder`](crate::Embedder).
    #[cfg(feature = "onnx")]
    pub fn onnx(config: &corrosion_core::EmbeddingConfig) -> Self {
        let model_dir = config.model_dir.clone();
        let max_length = config.max_length;
        Self::new(config.cache_capacity, move || {
            crate::Embedder::load(&model_dir, max_length)
                .map_err(|e| PredictError::EmbeddingBackend(format!("{e:#}")))
        })
    }

    /// Load the backend now instead of on the first embedding request.
    pub fn ensure_loaded(&self) -> Result<(), PredictError> {
        self.backend().map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        self.backend.get().is_some()
    }

    /// Embed already-normalised text, serving repeats from the cache.
    pub fn embed(&self, text: &str) -> Result<Arc<[f32]>, PredictError> {
        if let Some(hit) = self.cached(text) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(len = text.len(), "embedding cache hit");
            return Ok(hit);
        }

        let mut backend = self
            .backend()?
            .lock()
            .map_err(|_| PredictError::EmbeddingBackend("backend lock poisoned".into()))?;

        // A concurrent caller may have embedded the same text while we waited.
        if let Some(hit) = self.cached(text) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(len = text.len(), "embedding cache miss");
        let vector: Arc<[f32]> = backend.embed(text)?.into();
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(text.to_string(), Arc::clone(&vector));
        Ok(vector)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self
                .cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }

    fn cached(&self, text: &str) -> Option<Arc<[f32]>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(text)
            .cloned()
    }

    fn backend(&self) -> Result<&Mutex<Box<dyn EmbeddingBackend>>, PredictError> {
        self.backend.get_or_try_init(|| {
            info!("initialising embedding backend");
            (self.loader)().map(Mutex::new)
        })
    }
}
