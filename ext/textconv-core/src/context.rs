//! Execution and allocation settings for conversion calls

use crate::column::ConversionOutcome;
use crate::memory::{BufferAllocator, SystemAllocator};
use crate::{ConvertError, Result};
use rayon::prelude::*;
use std::sync::Arc;

// Default configuration constants
const DEFAULT_CHUNK_SIZE: usize = 4096;
const NUM_THREADS_ENV: &str = "TEXTCONV_NUM_THREADS";
const CHUNK_SIZE_ENV: &str = "TEXTCONV_CHUNK_SIZE";

/// How per-element work is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Chunks run on a rayon pool; the call returns once every chunk has drained
    #[default]
    Parallel,
    /// Chunks run one after another on the calling thread
    Sequential,
}

/// Builder for creating a configured ConvertContext
#[derive(Debug, Clone)]
pub struct ConvertContextBuilder {
    mode: ExecutionMode,
    chunk_size: usize,
    num_threads: Option<usize>,
    allocator: Arc<dyn BufferAllocator>,
}

impl Default for ConvertContextBuilder {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            chunk_size: DEFAULT_CHUNK_SIZE,
            num_threads: None,
            allocator: Arc::new(SystemAllocator),
        }
    }
}

impl ConvertContextBuilder {
    /// Create a new ConvertContextBuilder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the builder from `TEXTCONV_NUM_THREADS` and `TEXTCONV_CHUNK_SIZE`
    ///
    /// Unset or unparseable variables leave the defaults in place.
    pub fn from_env() -> Self {
        let mut builder = Self::default();
        if let Some(threads) = read_env_usize(NUM_THREADS_ENV) {
            builder = builder.with_num_threads(threads);
        }
        if let Some(chunk_size) = read_env_usize(CHUNK_SIZE_ENV) {
            builder = builder.with_chunk_size(chunk_size);
        }
        builder
    }

    /// Set the execution mode
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set how many elements one task converts
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Run parallel work on a dedicated pool of `num_threads` workers instead of the global pool
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set the allocator used for every output buffer
    pub fn with_allocator(mut self, allocator: Arc<dyn BufferAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    /// Build a ConvertContext with the configured settings
    pub fn build(self) -> Result<ConvertContext> {
        if self.chunk_size == 0 {
            return Err(ConvertError::invalid_argument("chunk size must be at least 1"));
        }
        if self.num_threads == Some(0) {
            return Err(ConvertError::invalid_argument(
                "thread count must be at least 1",
            ));
        }

        let pool = match (self.mode, self.num_threads) {
            (ExecutionMode::Parallel, Some(threads)) => Some(Arc::new(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("textconv-worker-{}", i))
                    .build()
                    .map_err(ConvertError::from)?,
            )),
            _ => None,
        };

        tracing::debug!(
            mode = ?self.mode,
            chunk_size = self.chunk_size,
            threads = ?self.num_threads,
            "built conversion context"
        );

        Ok(ConvertContext {
            mode: self.mode,
            chunk_size: self.chunk_size,
            pool,
            allocator: self.allocator,
        })
    }
}

fn read_env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok()?.trim().parse().ok()
}

/// Execution and allocation capabilities handed to every conversion call
///
/// The context carries no per-call state, so one context can be shared by any number of
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct ConvertContext {
    mode: ExecutionMode,
    chunk_size: usize,
    pool: Option<Arc<rayon::ThreadPool>>,
    allocator: Arc<dyn BufferAllocator>,
}

impl Default for ConvertContext {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            chunk_size: DEFAULT_CHUNK_SIZE,
            pool: None,
            allocator: Arc::new(SystemAllocator),
        }
    }
}

impl ConvertContext {
    pub fn builder() -> ConvertContextBuilder {
        ConvertContextBuilder::new()
    }

    /// Context that converts on the calling thread with the system allocator
    pub fn sequential() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn allocator(&self) -> &dyn BufferAllocator {
        self.allocator.as_ref()
    }

    /// Number of chunks a column of `len` elements is split into
    pub(crate) fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }

    /// Run `op` on the configured pool (or inline for the global pool)
    fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Evaluate `convert` for every index and write results into disjoint output slots
    ///
    /// `slots[i]` receives the value and `flags[i]` is set to 1 when `convert(i)` yields a
    /// value. Invalid elements leave both untouched (zero).
    pub(crate) fn for_each_slot<T, F>(&self, slots: &mut [T], flags: &mut [u8], convert: F)
    where
        T: Send,
        F: Fn(usize) -> ConversionOutcome<T> + Sync,
    {
        debug_assert_eq!(slots.len(), flags.len());
        let fill = |base: usize, slots: &mut [T], flags: &mut [u8]| {
            for (offset, (slot, flag)) in slots.iter_mut().zip(flags.iter_mut()).enumerate() {
                if let ConversionOutcome::Value(value) = convert(base + offset) {
                    *slot = value;
                    *flag = 1;
                }
            }
        };

        match self.mode {
            ExecutionMode::Sequential => fill(0, slots, flags),
            ExecutionMode::Parallel => {
                let chunk_size = self.chunk_size;
                self.install(|| {
                    slots
                        .par_chunks_mut(chunk_size)
                        .zip(flags.par_chunks_mut(chunk_size))
                        .enumerate()
                        .for_each(|(chunk, (slots, flags))| fill(chunk * chunk_size, slots, flags));
                })
            }
        }
    }

    /// Evaluate `task` for every chunk index and collect the results in chunk order
    pub(crate) fn map_chunks<R, F>(&self, chunks: usize, task: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send,
    {
        match self.mode {
            ExecutionMode::Sequential => (0..chunks).map(task).collect(),
            ExecutionMode::Parallel => {
                self.install(|| (0..chunks).into_par_iter().map(task).collect())
            }
        }
    }
}
