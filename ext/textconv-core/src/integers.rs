//! Integer codec: text ↔ signed/unsigned fixed-width integers

use crate::column::{downcast_array, ConversionOutcome, TextColumn};
use crate::digits::{is_integer_text, parse_integer};
use crate::kernel::{render_to_text, text_to_boolean, text_to_primitive};
use crate::{ConvertContext, ConvertError, Result};
use arrow_array::types::*;
use arrow_array::{
    Array, ArrayRef, ArrowPrimitiveType, BooleanArray, Int16Array, Int32Array, Int64Array,
    Int8Array, PrimitiveArray, StringArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow_schema::DataType;
use num::PrimInt;
use std::sync::Arc;

/// Convert a text column into an integer column of `output_type`
///
/// Each element must be an optional sign followed by decimal digits, with no surrounding
/// whitespace. Malformed or out-of-range elements become null. Non-integer targets fail
/// the call.
pub fn to_integers(
    strings: &dyn Array,
    output_type: &DataType,
    ctx: &ConvertContext,
) -> Result<ArrayRef> {
    let text = TextColumn::try_new(strings)?;
    tracing::debug!(rows = text.len(), target = ?output_type, "to_integers");

    let array: ArrayRef = match output_type {
        DataType::Int8 => Arc::new(parse_column::<Int8Type>(&text, ctx)?),
        DataType::Int16 => Arc::new(parse_column::<Int16Type>(&text, ctx)?),
        DataType::Int32 => Arc::new(parse_column::<Int32Type>(&text, ctx)?),
        DataType::Int64 => Arc::new(parse_column::<Int64Type>(&text, ctx)?),
        DataType::UInt8 => Arc::new(parse_column::<UInt8Type>(&text, ctx)?),
        DataType::UInt16 => Arc::new(parse_column::<UInt16Type>(&text, ctx)?),
        DataType::UInt32 => Arc::new(parse_column::<UInt32Type>(&text, ctx)?),
        DataType::UInt64 => Arc::new(parse_column::<UInt64Type>(&text, ctx)?),
        dt => {
            return Err(ConvertError::unsupported(format!(
                "Cannot convert strings to non-integer type {:?}",
                dt
            )))
        }
    };
    Ok(array)
}

/// Convert an integer column into canonical decimal text
pub fn from_integers(integers: &dyn Array, ctx: &ConvertContext) -> Result<StringArray> {
    tracing::debug!(rows = integers.len(), source = ?integers.data_type(), "from_integers");

    match integers.data_type() {
        DataType::Int8 => format_column(downcast_array::<Int8Array>(integers)?, ctx),
        DataType::Int16 => format_column(downcast_array::<Int16Array>(integers)?, ctx),
        DataType::Int32 => format_column(downcast_array::<Int32Array>(integers)?, ctx),
        DataType::Int64 => format_column(downcast_array::<Int64Array>(integers)?, ctx),
        DataType::UInt8 => format_column(downcast_array::<UInt8Array>(integers)?, ctx),
        DataType::UInt16 => format_column(downcast_array::<UInt16Array>(integers)?, ctx),
        DataType::UInt32 => format_column(downcast_array::<UInt32Array>(integers)?, ctx),
        DataType::UInt64 => format_column(downcast_array::<UInt64Array>(integers)?, ctx),
        dt => Err(ConvertError::unsupported(format!(
            "Expected an integer column, got {:?}",
            dt
        ))),
    }
}

/// Flag which elements of a text column match the integer grammar
///
/// Range is not checked: `"99999999999999999999"` is an integer here even though it fits
/// no 64-bit type.
pub fn is_integer(strings: &dyn Array, ctx: &ConvertContext) -> Result<BooleanArray> {
    let text = TextColumn::try_new(strings)?;
    text_to_boolean(&text, ctx, |s| {
        ConversionOutcome::Value(is_integer_text(s.as_bytes()))
    })
}

fn parse_column<T>(text: &TextColumn<'_>, ctx: &ConvertContext) -> Result<PrimitiveArray<T>>
where
    T: ArrowPrimitiveType,
    T::Native: PrimInt,
{
    text_to_primitive::<T, _>(text, ctx, |s| parse_integer::<T::Native>(s.as_bytes()).into())
}

fn format_column<T>(array: &PrimitiveArray<T>, ctx: &ConvertContext) -> Result<StringArray>
where
    T: ArrowPrimitiveType,
    T::Native: itoa::Integer,
{
    render_to_text(array.len(), ctx, |i, out| {
        if array.is_null(i) {
            return false;
        }
        let mut buffer = itoa::Buffer::new();
        out.extend_from_slice(buffer.format(array.value(i)).as_bytes());
        true
    })
}
