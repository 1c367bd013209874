//! Column-scale kernels shared by the codecs
//!
//! Each kernel runs one independent closure per element through the context's execution
//! backend and then assembles the output column (values + validity) from buffers obtained
//! through the context's allocator.

use crate::column::{ConversionOutcome, TextColumn};
use crate::validity::{pack_flags, propagate_validity};
use crate::{ConvertContext, ConvertError, ErrorContext, Result};
use arrow_array::{ArrowPrimitiveType, BooleanArray, PrimitiveArray, StringArray};
use arrow_buffer::{OffsetBuffer, ScalarBuffer};

/// Parse every element of `text` into a primitive column
///
/// Null elements never reach `parse`; they come out null together with every element for
/// which `parse` returns `Invalid`.
pub(crate) fn text_to_primitive<T, F>(
    text: &TextColumn<'_>,
    ctx: &ConvertContext,
    parse: F,
) -> Result<PrimitiveArray<T>>
where
    T: ArrowPrimitiveType,
    F: Fn(&str) -> ConversionOutcome<T::Native> + Sync,
{
    let len = text.len();
    let allocator = ctx.allocator();
    let mut values = allocator.allocate_zeroed(len * std::mem::size_of::<T::Native>())?;
    let mut flags = allocator.allocate_zeroed(len)?;

    ctx.for_each_slot(
        values.typed_data_mut::<T::Native>(),
        flags.as_slice_mut(),
        |i| match text.value(i) {
            Some(s) => parse(s),
            None => ConversionOutcome::Invalid,
        },
    );

    let nulls = propagate_validity(flags.as_slice(), allocator)?;
    let values = ScalarBuffer::<T::Native>::new(values.into(), 0, len);
    Ok(PrimitiveArray::<T>::try_new(values, nulls)?)
}

/// Evaluate a boolean predicate or conversion over every element of `text`
pub(crate) fn text_to_boolean<F>(
    text: &TextColumn<'_>,
    ctx: &ConvertContext,
    convert: F,
) -> Result<BooleanArray>
where
    F: Fn(&str) -> ConversionOutcome<bool> + Sync,
{
    let len = text.len();
    let allocator = ctx.allocator();
    let mut bytes = allocator.allocate_zeroed(len)?;
    let mut flags = allocator.allocate_zeroed(len)?;

    ctx.for_each_slot(bytes.as_slice_mut(), flags.as_slice_mut(), |i| {
        match text.value(i) {
            Some(s) => convert(s).map(u8::from),
            None => ConversionOutcome::Invalid,
        }
    });

    let values = pack_flags(bytes.as_slice(), allocator)?;
    let nulls = propagate_validity(flags.as_slice(), allocator)?;
    Ok(BooleanArray::new(values, nulls))
}

/// Text produced by one chunk of elements
struct RenderedChunk {
    bytes: Vec<u8>,
    ends: Vec<usize>,
    flags: Vec<u8>,
}

/// Render `len` elements into a new text column
///
/// `render(i, out)` appends the text of element `i` to `out` and returns `true`, or returns
/// `false` for a null element; anything it appended before returning `false` is discarded.
pub(crate) fn render_to_text<F>(len: usize, ctx: &ConvertContext, render: F) -> Result<StringArray>
where
    F: Fn(usize, &mut Vec<u8>) -> bool + Sync + Send,
{
    let chunk_size = ctx.chunk_size();
    let chunks = ctx.map_chunks(ctx.chunk_count(len), |chunk| {
        let start = chunk * chunk_size;
        let end = (start + chunk_size).min(len);
        let mut rendered = RenderedChunk {
            bytes: Vec::new(),
            ends: Vec::with_capacity(end - start),
            flags: Vec::with_capacity(end - start),
        };
        for i in start..end {
            let mark = rendered.bytes.len();
            if render(i, &mut rendered.bytes) {
                rendered.flags.push(1);
            } else {
                rendered.bytes.truncate(mark);
                rendered.flags.push(0);
            }
            rendered.ends.push(rendered.bytes.len());
        }
        rendered
    });

    assemble_text(len, &chunks, ctx)
}

/// Concatenate rendered chunks into offsets, values and validity buffers
fn assemble_text(
    len: usize,
    chunks: &[RenderedChunk],
    ctx: &ConvertContext,
) -> Result<StringArray> {
    let total: usize = chunks.iter().map(|c| c.bytes.len()).sum();
    if i32::try_from(total).is_err() {
        return Err(ConvertError::unsupported(format!(
            "Text output of {} bytes exceeds the Utf8 offset range",
            total
        )));
    }

    let allocator = ctx.allocator();
    let mut offsets = allocator.allocate_zeroed((len + 1) * std::mem::size_of::<i32>())?;
    let mut values = allocator.allocate_with_capacity(total)?;
    let mut flags = allocator.allocate_zeroed(len)?;

    {
        let offset_slots = offsets.typed_data_mut::<i32>();
        let flag_slots = flags.as_slice_mut();
        let mut index = 0;
        for chunk in chunks {
            let base = values.len();
            for (&end, &flag) in chunk.ends.iter().zip(chunk.flags.iter()) {
                // total fits in i32, so every running offset does too
                offset_slots[index + 1] = (base + end) as i32;
                flag_slots[index] = flag;
                index += 1;
            }
            values.extend_from_slice(&chunk.bytes);
        }
        debug_assert_eq!(index, len);
    }

    let nulls = propagate_validity(flags.as_slice(), allocator)?;
    let offsets = OffsetBuffer::new(ScalarBuffer::<i32>::new(offsets.into(), 0, len + 1));
    StringArray::try_new(offsets, values.into(), nulls).context("assembling text column")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::BudgetAllocator;
    use arrow_array::types::Int32Type;
    use arrow_array::Array;
    use std::sync::Arc;

    fn contexts() -> Vec<ConvertContext> {
        vec![
            ConvertContext::sequential(),
            ConvertContext::builder()
                .with_chunk_size(2)
                .with_num_threads(2)
                .build()
                .unwrap(),
        ]
    }

    #[test]
    fn test_text_to_primitive_keeps_length_and_nulls() {
        let input = StringArray::from(vec![Some("1"), None, Some("x"), Some("4"), Some("5")]);
        let text = TextColumn::try_new(&input).unwrap();
        for ctx in contexts() {
            let out = text_to_primitive::<Int32Type, _>(&text, &ctx, |s| {
                s.parse::<i32>().ok().into()
            })
            .unwrap();
            assert_eq!(out.len(), 5);
            assert_eq!(out.null_count(), 2);
            assert!(out.is_null(1));
            assert!(out.is_null(2));
            assert_eq!(out.value(3), 4);
        }
    }

    #[test]
    fn test_render_to_text_discards_partial_output() {
        for ctx in contexts() {
            let out = render_to_text(5, &ctx, |i, out| {
                out.extend_from_slice(format!("v{}", i).as_bytes());
                i != 2
            })
            .unwrap();
            assert_eq!(out.len(), 5);
            assert!(out.is_null(2));
            assert_eq!(out.value(1), "v1");
            assert_eq!(out.value(3), "v3");
            assert_eq!(out.value_offsets()[5], 8);
        }
    }

    #[test]
    fn test_render_to_text_empty() {
        let out = render_to_text(0, &ConvertContext::default(), |_, _| true).unwrap();
        assert_eq!(out.len(), 0);
    }

    #[test]
    fn test_allocation_budget_fails_call() {
        let ctx = ConvertContext::builder()
            .with_allocator(Arc::new(BudgetAllocator::new(4)))
            .build()
            .unwrap();
        let err = render_to_text(10, &ctx, |_, out| {
            out.push(b'a');
            true
        })
        .unwrap_err();
        assert!(matches!(err, ConvertError::AllocationExhausted { .. }));
    }
}
