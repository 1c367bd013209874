//! Validity propagation
//!
//! Kernels record one success flag per element (`0` = null or invalid, anything else =
//! valid). Source nulls are recorded as `0` before conversion is attempted, so after the
//! element phase a flag of `0` means "source null OR conversion failed". This module packs
//! those flags into Arrow bitmaps.

use crate::memory::BufferAllocator;
use crate::Result;
use arrow_buffer::{bit_util, BooleanBuffer, NullBuffer};

/// Build the output validity bitmap from per-element success flags
///
/// Returns `None` when every element is valid, matching Arrow's convention of omitting the
/// null buffer for fully valid arrays.
pub fn propagate_validity(
    flags: &[u8],
    allocator: &dyn BufferAllocator,
) -> Result<Option<NullBuffer>> {
    if flags.iter().all(|&flag| flag != 0) {
        return Ok(None);
    }
    Ok(Some(NullBuffer::new(pack_flags(flags, allocator)?)))
}

/// Pack one-byte-per-element flags into a bitmap
pub(crate) fn pack_flags(flags: &[u8], allocator: &dyn BufferAllocator) -> Result<BooleanBuffer> {
    let mut bits = allocator.allocate_zeroed(bit_util::ceil(flags.len(), 8))?;
    let slice = bits.as_slice_mut();
    for (index, &flag) in flags.iter().enumerate() {
        if flag != 0 {
            bit_util::set_bit(slice, index);
        }
    }
    Ok(BooleanBuffer::new(bits.into(), 0, flags.len()))
}
