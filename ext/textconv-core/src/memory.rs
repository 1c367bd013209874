//! Pluggable allocation for output buffers
//!
//! Every buffer a conversion produces (values, offsets, validity) is obtained through a
//! [`BufferAllocator`] held by the [`ConvertContext`](crate::ConvertContext). Two calls may use
//! different allocators; the core never assumes a single global one.

use crate::{ConvertError, Result};
use arrow_buffer::MutableBuffer;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of zero-initialized output buffers
pub trait BufferAllocator: Send + Sync + fmt::Debug {
    /// Allocate `len` zeroed bytes
    fn allocate_zeroed(&self, len: usize) -> Result<MutableBuffer>;

    /// Allocate an empty buffer able to hold `capacity` bytes without reallocating
    fn allocate_with_capacity(&self, capacity: usize) -> Result<MutableBuffer>;
}

/// Allocator backed by the process-wide Rust allocator
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl BufferAllocator for SystemAllocator {
    fn allocate_zeroed(&self, len: usize) -> Result<MutableBuffer> {
        Ok(MutableBuffer::from_len_zeroed(len))
    }

    fn allocate_with_capacity(&self, capacity: usize) -> Result<MutableBuffer> {
        Ok(MutableBuffer::with_capacity(capacity))
    }
}

/// Allocator with a fixed byte budget
///
/// Bytes handed out are charged against the budget and never credited back, so one
/// `BudgetAllocator` bounds the total output of every call that uses it (arena style).
/// A request that would exceed the budget fails the whole call with
/// [`ConvertError::AllocationExhausted`].
#[derive(Debug)]
pub struct BudgetAllocator {
    limit: usize,
    used: AtomicUsize,
}

impl BudgetAllocator {
    /// Create an allocator that hands out at most `limit` bytes in total
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            used: AtomicUsize::new(0),
        }
    }

    /// Bytes charged so far
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }

    /// Bytes still available
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used())
    }

    /// Forget every previous charge
    pub fn reset(&self) {
        self.used.store(0, Ordering::Release);
    }

    fn charge(&self, requested: usize) -> Result<()> {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(requested)
                    .filter(|&total| total <= self.limit)
            })
            .map(|_| ())
            .map_err(|used| ConvertError::AllocationExhausted {
                requested,
                remaining: self.limit.saturating_sub(used),
            })
    }
}

impl BufferAllocator for BudgetAllocator {
    fn allocate_zeroed(&self, len: usize) -> Result<MutableBuffer> {
        self.charge(len)?;
        Ok(MutableBuffer::from_len_zeroed(len))
    }

    fn allocate_with_capacity(&self, capacity: usize) -> Result<MutableBuffer> {
        self.charge(capacity)?;
        Ok(MutableBuffer::with_capacity(capacity))
    }
}
