//! Float codec: text ↔ IEEE-754 floating point
//!
//! Accepted text: an optional sign, a mantissa of digits with an optional `.` fraction (at
//! least one digit on either side of the point), and an optional exponent `e`/`E` with an
//! optional sign and at least one digit. The tokens `nan`, `inf` and `infinity` are accepted
//! in any letter case, with an optional sign. Parsing rounds correctly to the target width;
//! magnitudes beyond the target range become ±infinity rather than null.
//!
//! Formatting emits the shortest text that parses back to the same bits, and `NaN`, `Inf`,
//! `-Inf` for non-finite values.

use crate::column::{downcast_array, ConversionOutcome, TextColumn};
use crate::digits::count_digits;
use crate::kernel::{render_to_text, text_to_boolean, text_to_primitive};
use crate::{ConvertContext, ConvertError, Result};
use arrow_array::types::{Float32Type, Float64Type};
use arrow_array::{
    Array, ArrayRef, ArrowPrimitiveType, BooleanArray, Float32Array, Float64Array,
    PrimitiveArray, StringArray,
};
use arrow_schema::DataType;
use num::Float;
use std::str::FromStr;
use std::sync::Arc;

const NAN_TOKEN: &str = "NaN";
const INFINITY_TOKEN: &str = "Inf";
const NEG_INFINITY_TOKEN: &str = "-Inf";

/// Convert a text column into a float column of `output_type`
pub fn to_floats(
    strings: &dyn Array,
    output_type: &DataType,
    ctx: &ConvertContext,
) -> Result<ArrayRef> {
    let text = TextColumn::try_new(strings)?;
    tracing::debug!(rows = text.len(), target = ?output_type, "to_floats");

    let array: ArrayRef = match output_type {
        DataType::Float32 => Arc::new(parse_column::<Float32Type>(&text, ctx)?),
        DataType::Float64 => Arc::new(parse_column::<Float64Type>(&text, ctx)?),
        dt => {
            return Err(ConvertError::unsupported(format!(
                "Cannot convert strings to non-float type {:?}",
                dt
            )))
        }
    };
    Ok(array)
}

/// Convert a float column into shortest round-trip text
pub fn from_floats(floats: &dyn Array, ctx: &ConvertContext) -> Result<StringArray> {
    tracing::debug!(rows = floats.len(), source = ?floats.data_type(), "from_floats");

    match floats.data_type() {
        DataType::Float32 => format_column(downcast_array::<Float32Array>(floats)?, ctx),
        DataType::Float64 => format_column(downcast_array::<Float64Array>(floats)?, ctx),
        dt => Err(ConvertError::unsupported(format!(
            "Expected a Float32 or Float64 column, got {:?}",
            dt
        ))),
    }
}

/// Flag which elements of a text column match the float grammar
pub fn is_float(strings: &dyn Array, ctx: &ConvertContext) -> Result<BooleanArray> {
    let text = TextColumn::try_new(strings)?;
    text_to_boolean(&text, ctx, |s| {
        ConversionOutcome::Value(is_float_text(s.as_bytes()))
    })
}

fn parse_column<T>(text: &TextColumn<'_>, ctx: &ConvertContext) -> Result<PrimitiveArray<T>>
where
    T: ArrowPrimitiveType,
    T::Native: FromStr,
{
    text_to_primitive::<T, _>(text, ctx, |s| parse_float::<T::Native>(s).into())
}

fn format_column<T>(array: &PrimitiveArray<T>, ctx: &ConvertContext) -> Result<StringArray>
where
    T: ArrowPrimitiveType,
    T::Native: Float + ryu::Float,
{
    render_to_text(array.len(), ctx, |i, out| {
        if array.is_null(i) {
            return false;
        }
        write_float(out, array.value(i));
        true
    })
}

/// Parse one element, rejecting anything outside the float grammar
fn parse_float<F: FromStr>(text: &str) -> Option<F> {
    if !is_float_text(text.as_bytes()) {
        return None;
    }
    text.parse().ok()
}

fn write_float<F: Float + ryu::Float>(out: &mut Vec<u8>, value: F) {
    if value.is_nan() {
        out.extend_from_slice(NAN_TOKEN.as_bytes());
    } else if value.is_infinite() {
        let token = if value.is_sign_negative() {
            NEG_INFINITY_TOKEN
        } else {
            INFINITY_TOKEN
        };
        out.extend_from_slice(token.as_bytes());
    } else {
        let mut buffer = ryu::Buffer::new();
        out.extend_from_slice(buffer.format_finite(value).as_bytes());
    }
}

/// Whether `text` matches the float grammar
pub(crate) fn is_float_text(text: &[u8]) -> bool {
    let body = match text.first() {
        Some(b'-' | b'+') => &text[1..],
        _ => text,
    };
    if is_special_token(body) {
        return true;
    }

    let int_digits = count_digits(body, body.len());
    let mut rest = &body[int_digits..];
    let mut frac_digits = 0;
    if let Some((b'.', tail)) = rest.split_first() {
        frac_digits = count_digits(tail, tail.len());
        rest = &tail[frac_digits..];
    }
    if int_digits + frac_digits == 0 {
        return false;
    }

    match rest.split_first() {
        None => true,
        Some((b'e' | b'E', exponent)) => {
            let digits = match exponent.first() {
                Some(b'-' | b'+') => &exponent[1..],
                _ => exponent,
            };
            !digits.is_empty() && count_digits(digits, digits.len()) == digits.len()
        }
        Some(_) => false,
    }
}

fn is_special_token(body: &[u8]) -> bool {
    body.eq_ignore_ascii_case(b"nan")
        || body.eq_ignore_ascii_case(b"inf")
        || body.eq_ignore_ascii_case(b"infinity")
}
