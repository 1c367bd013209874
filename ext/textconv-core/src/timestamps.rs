//! Timestamp codec: text ↔ absolute time, driven by a [`FormatPattern`]
//!
//! Supported columns are `Date32` (days), `Date64` (milliseconds, truncated to whole days
//! when parsing) and timezone-less `Timestamp` at second, millisecond, microsecond or
//! nanosecond resolution. All values are UTC; `%z` offsets in parsed text are folded into the
//! stored instant.

use crate::column::{downcast_array, ConversionOutcome, TextColumn};
use crate::digits::{count_digits, digits_value, write_padded};
use crate::format::{Field, FieldSpec, FormatItem, FormatPattern, Width};
use crate::kernel::{render_to_text, text_to_boolean, text_to_primitive};
use crate::{ConvertContext, ConvertError, Result};
use arrow_array::types::*;
use arrow_array::{
    Array, ArrayRef, ArrowPrimitiveType, BooleanArray, Date32Array, Date64Array, PrimitiveArray,
    StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow_schema::{DataType, TimeUnit};
use jiff::civil::{self, Date};
use jiff::{Span, Unit};
use std::sync::Arc;

const SECONDS_PER_DAY: i64 = 86_400;
const UNIX_EPOCH: Date = civil::date(1970, 1, 1);

/// Storage resolution of a timestamp column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampResolution {
    Days,
    /// Milliseconds holding a whole number of days (`Date64`)
    DateMilliseconds,
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimestampResolution {
    /// Resolution of a supported timestamp data type
    pub fn from_data_type(data_type: &DataType) -> Result<Self> {
        match data_type {
            DataType::Date32 => Ok(Self::Days),
            DataType::Date64 => Ok(Self::DateMilliseconds),
            DataType::Timestamp(unit, None) => Ok(match unit {
                TimeUnit::Second => Self::Seconds,
                TimeUnit::Millisecond => Self::Milliseconds,
                TimeUnit::Microsecond => Self::Microseconds,
                TimeUnit::Nanosecond => Self::Nanoseconds,
            }),
            DataType::Timestamp(_, Some(tz)) => Err(ConvertError::unsupported(format!(
                "Timezone-aware timestamps are not supported (timezone {:?})",
                tz
            ))),
            dt => Err(ConvertError::unsupported(format!(
                "Expected a date or timestamp type, got {:?}",
                dt
            ))),
        }
    }

    /// Digits written by a plain `%f`
    fn fraction_digits(self) -> usize {
        match self {
            Self::Milliseconds | Self::DateMilliseconds => 3,
            Self::Nanoseconds => 9,
            Self::Days | Self::Seconds | Self::Microseconds => 6,
        }
    }

    /// Stored value for an instant, or `None` when it does not fit an `i64` at this resolution
    fn encode(self, seconds: i64, nanos: u32) -> Option<i64> {
        // Widened so negative instants near i64::MIN units still fit once the fraction is added
        let scaled = |per_second: i128, nanos_per_unit: u32| {
            let units = i128::from(seconds) * per_second + i128::from(nanos / nanos_per_unit);
            i64::try_from(units).ok()
        };
        match self {
            Self::Days => Some(seconds.div_euclid(SECONDS_PER_DAY)),
            Self::DateMilliseconds => seconds
                .div_euclid(SECONDS_PER_DAY)
                .checked_mul(SECONDS_PER_DAY * 1_000),
            Self::Seconds => Some(seconds),
            Self::Milliseconds => scaled(1_000, 1_000_000),
            Self::Microseconds => scaled(1_000_000, 1_000),
            Self::Nanoseconds => scaled(1_000_000_000, 1),
        }
    }

    /// Split a stored value into whole seconds and a non-negative nanosecond remainder
    fn decode(self, value: i64) -> Option<(i64, u32)> {
        let split = |per_second: i64, nanos_per_unit: i64| {
            let nanos = value.rem_euclid(per_second) * nanos_per_unit;
            (value.div_euclid(per_second), nanos as u32)
        };
        match self {
            Self::Days => value.checked_mul(SECONDS_PER_DAY).map(|s| (s, 0)),
            Self::Seconds => Some((value, 0)),
            Self::Milliseconds | Self::DateMilliseconds => Some(split(1_000, 1_000_000)),
            Self::Microseconds => Some(split(1_000_000, 1_000)),
            Self::Nanoseconds => Some(split(1_000_000_000, 1)),
        }
    }
}

/// Convert a text column into a timestamp column of `timestamp_type` using `pattern`
///
/// The pattern is compiled before any element is touched; a malformed pattern fails the
/// call. Elements that do not match the pattern, name an impossible date, or fall outside
/// the range of the target type become null.
pub fn to_timestamps(
    strings: &dyn Array,
    timestamp_type: &DataType,
    pattern: &str,
    ctx: &ConvertContext,
) -> Result<ArrayRef> {
    let text = TextColumn::try_new(strings)?;
    let resolution = TimestampResolution::from_data_type(timestamp_type)?;
    let pattern = compile(pattern)?;
    tracing::debug!(
        rows = text.len(),
        target = ?timestamp_type,
        pattern = pattern.as_str(),
        "to_timestamps"
    );

    let array: ArrayRef = match timestamp_type {
        DataType::Date32 => Arc::new(text_to_primitive::<Date32Type, _>(&text, ctx, |s| {
            parse_value(&pattern, resolution, s)
                .and_then(|days| i32::try_from(days).ok())
                .into()
        })?),
        DataType::Date64 => Arc::new(parse_column::<Date64Type>(&text, &pattern, resolution, ctx)?),
        DataType::Timestamp(TimeUnit::Second, _) => Arc::new(
            parse_column::<TimestampSecondType>(&text, &pattern, resolution, ctx)?,
        ),
        DataType::Timestamp(TimeUnit::Millisecond, _) => Arc::new(
            parse_column::<TimestampMillisecondType>(&text, &pattern, resolution, ctx)?,
        ),
        DataType::Timestamp(TimeUnit::Microsecond, _) => Arc::new(
            parse_column::<TimestampMicrosecondType>(&text, &pattern, resolution, ctx)?,
        ),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => Arc::new(
            parse_column::<TimestampNanosecondType>(&text, &pattern, resolution, ctx)?,
        ),
        dt => {
            return Err(ConvertError::internal(format!(
                "resolution accepted unexpected type {:?}",
                dt
            )))
        }
    };
    Ok(array)
}

/// Convert a timestamp column into text using `pattern`
///
/// Elements whose year falls outside 0000–9999 become null.
pub fn from_timestamps(
    timestamps: &dyn Array,
    pattern: &str,
    ctx: &ConvertContext,
) -> Result<StringArray> {
    let resolution = TimestampResolution::from_data_type(timestamps.data_type())?;
    let pattern = compile(pattern)?;
    tracing::debug!(
        rows = timestamps.len(),
        source = ?timestamps.data_type(),
        pattern = pattern.as_str(),
        "from_timestamps"
    );

    match timestamps.data_type() {
        DataType::Date32 => format_column(
            downcast_array::<Date32Array>(timestamps)?,
            &pattern,
            resolution,
            ctx,
        ),
        DataType::Date64 => format_column(
            downcast_array::<Date64Array>(timestamps)?,
            &pattern,
            resolution,
            ctx,
        ),
        DataType::Timestamp(TimeUnit::Second, _) => format_column(
            downcast_array::<TimestampSecondArray>(timestamps)?,
            &pattern,
            resolution,
            ctx,
        ),
        DataType::Timestamp(TimeUnit::Millisecond, _) => format_column(
            downcast_array::<TimestampMillisecondArray>(timestamps)?,
            &pattern,
            resolution,
            ctx,
        ),
        DataType::Timestamp(TimeUnit::Microsecond, _) => format_column(
            downcast_array::<TimestampMicrosecondArray>(timestamps)?,
            &pattern,
            resolution,
            ctx,
        ),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => format_column(
            downcast_array::<TimestampNanosecondArray>(timestamps)?,
            &pattern,
            resolution,
            ctx,
        ),
        dt => Err(ConvertError::internal(format!(
            "resolution accepted unexpected type {:?}",
            dt
        ))),
    }
}

/// Flag which elements of a text column parse under `pattern`
///
/// Calendar validity is checked; the range of any particular resolution is not.
pub fn is_timestamp(
    strings: &dyn Array,
    pattern: &str,
    ctx: &ConvertContext,
) -> Result<BooleanArray> {
    let text = TextColumn::try_new(strings)?;
    let pattern = compile(pattern)?;
    text_to_boolean(&text, ctx, |s| {
        ConversionOutcome::Value(parse_instant(&pattern, s.as_bytes()).is_some())
    })
}

fn compile(pattern: &str) -> Result<FormatPattern> {
    FormatPattern::compile(pattern).inspect_err(|err| {
        tracing::debug!(pattern, error = %err, "rejected timestamp pattern");
    })
}

fn parse_column<T>(
    text: &TextColumn<'_>,
    pattern: &FormatPattern,
    resolution: TimestampResolution,
    ctx: &ConvertContext,
) -> Result<PrimitiveArray<T>>
where
    T: ArrowPrimitiveType<Native = i64>,
{
    text_to_primitive::<T, _>(text, ctx, |s| parse_value(pattern, resolution, s).into())
}

fn format_column<T>(
    array: &PrimitiveArray<T>,
    pattern: &FormatPattern,
    resolution: TimestampResolution,
    ctx: &ConvertContext,
) -> Result<StringArray>
where
    T: ArrowPrimitiveType,
    T::Native: Into<i64>,
{
    render_to_text(array.len(), ctx, |i, out| {
        !array.is_null(i) && format_value(pattern, resolution, array.value(i).into(), out)
    })
}

fn parse_value(
    pattern: &FormatPattern,
    resolution: TimestampResolution,
    text: &str,
) -> Option<i64> {
    let (seconds, nanos) = parse_instant(pattern, text.as_bytes())?;
    resolution.encode(seconds, nanos)
}

/// Field values gathered while replaying a pattern; unset fields keep the epoch defaults
#[derive(Debug, Clone, Copy)]
struct Parts {
    year: i32,
    month: u32,
    day: u32,
    day_of_year: u32,
    hour: u32,
    hour12: Option<u32>,
    pm: bool,
    minute: u32,
    second: u32,
    nanos: u32,
    offset_seconds: i64,
}

impl Default for Parts {
    fn default() -> Self {
        Self {
            year: 1970,
            month: 1,
            day: 1,
            day_of_year: 1,
            hour: 0,
            hour12: None,
            pm: false,
            minute: 0,
            second: 0,
            nanos: 0,
            offset_seconds: 0,
        }
    }
}

/// Parse one element into seconds since the epoch plus a nanosecond remainder
fn parse_instant(pattern: &FormatPattern, text: &[u8]) -> Option<(i64, u32)> {
    let mut parts = Parts::default();
    let mut rest = text;
    for item in pattern.items() {
        rest = match item {
            FormatItem::Literal(literal) => rest.strip_prefix(literal.as_bytes())?,
            FormatItem::Field(spec) => parse_field(spec, rest, &mut parts)?,
        };
    }
    if !rest.is_empty() {
        return None;
    }
    resolve(&parts, pattern.uses_day_of_year())
}

/// Consume one field from the front of `text`, returning what is left
fn parse_field<'a>(spec: &FieldSpec, text: &'a [u8], parts: &mut Parts) -> Option<&'a [u8]> {
    match spec.field {
        Field::Meridiem => {
            let marker = text.get(..2)?;
            parts.pm = if marker.eq_ignore_ascii_case(b"PM") {
                true
            } else if marker.eq_ignore_ascii_case(b"AM") {
                false
            } else {
                return None;
            };
            Some(&text[2..])
        }
        Field::UtcOffset => {
            let (&sign, rest) = text.split_first()?;
            let digits = rest.get(..4)?;
            let hours = digits_value(&digits[..2])?;
            let minutes = digits_value(&digits[2..])?;
            if hours > 23 || minutes > 59 {
                return None;
            }
            let offset = i64::from(hours * 3600 + minutes * 60);
            parts.offset_seconds = match sign {
                b'+' => offset,
                b'-' => -offset,
                _ => return None,
            };
            Some(&rest[4..])
        }
        Field::Fraction => {
            let count = match spec.width {
                Width::Fixed(n) => n,
                Width::Variable { max, .. } => count_digits(text, max),
            };
            if let Width::Variable { min, .. } = spec.width {
                if count < min {
                    return None;
                }
            }
            let value = digits_value(text.get(..count)?)?;
            parts.nanos = value * 10u32.pow(9 - count as u32);
            Some(&text[count..])
        }
        _ => {
            let width = match spec.width {
                Width::Fixed(n) => n,
                Width::Variable { max, .. } => count_digits(text, max),
            };
            let value = digits_value(text.get(..width)?)?;
            if width == 0 || value < spec.min || value > spec.max {
                return None;
            }
            match spec.field {
                Field::Year => parts.year = value as i32,
                Field::YearOfCentury => {
                    parts.year = if value < 69 {
                        2000 + value as i32
                    } else {
                        1900 + value as i32
                    }
                }
                Field::Month => parts.month = value,
                Field::Day => parts.day = value,
                Field::DayOfYear => parts.day_of_year = value,
                Field::Hour24 => parts.hour = value,
                Field::Hour12 => parts.hour12 = Some(value),
                Field::Minute => parts.minute = value,
                Field::Second => parts.second = value,
                Field::Meridiem | Field::UtcOffset | Field::Fraction => return None,
            }
            Some(&text[width..])
        }
    }
}

/// Validate the calendar date and fold the fields into a UTC instant
fn resolve(parts: &Parts, use_day_of_year: bool) -> Option<(i64, u32)> {
    let year = i16::try_from(parts.year).ok()?;
    let date = if use_day_of_year {
        Date::new(year, 1, 1)
            .ok()?
            .with()
            .day_of_year(parts.day_of_year as i16)
            .build()
            .ok()?
    } else {
        Date::new(year, parts.month as i8, parts.day as i8).ok()?
    };

    let hour = match parts.hour12 {
        Some(h) => h % 12 + if parts.pm { 12 } else { 0 },
        None => parts.hour,
    };
    let days = UNIX_EPOCH.until((Unit::Day, date)).ok()?.get_days();
    let second_of_day = i64::from(hour * 3600 + parts.minute * 60 + parts.second);
    let seconds = i64::from(days) * SECONDS_PER_DAY + second_of_day - parts.offset_seconds;
    Some((seconds, parts.nanos))
}

/// Render one value; returns `false` when the instant cannot be expressed by the pattern
fn format_value(
    pattern: &FormatPattern,
    resolution: TimestampResolution,
    value: i64,
    out: &mut Vec<u8>,
) -> bool {
    let Some((seconds, nanos)) = resolution.decode(value) else {
        return false;
    };
    let days = seconds.div_euclid(SECONDS_PER_DAY);
    let Some(date) = Span::new()
        .try_days(days)
        .ok()
        .and_then(|span| UNIX_EPOCH.checked_add(span).ok())
    else {
        return false;
    };
    let year = date.year();
    if !(0..=9999).contains(&year) {
        return false;
    }

    let second_of_day = seconds.rem_euclid(SECONDS_PER_DAY) as u32;
    let hour = second_of_day / 3600;
    let minute = second_of_day % 3600 / 60;
    let second = second_of_day % 60;

    for item in pattern.items() {
        match item {
            FormatItem::Literal(literal) => out.extend_from_slice(literal.as_bytes()),
            FormatItem::Field(spec) => {
                let width = match spec.width {
                    Width::Fixed(n) => n,
                    Width::Variable { .. } => resolution.fraction_digits(),
                };
                match spec.field {
                    Field::Year => write_padded(out, year as u32, width),
                    Field::YearOfCentury => write_padded(out, year as u32 % 100, width),
                    Field::Month => write_padded(out, date.month() as u32, width),
                    Field::Day => write_padded(out, date.day() as u32, width),
                    Field::DayOfYear => write_padded(out, date.day_of_year() as u32, width),
                    Field::Hour24 => write_padded(out, hour, width),
                    Field::Hour12 => {
                        let h = if hour % 12 == 0 { 12 } else { hour % 12 };
                        write_padded(out, h, width)
                    }
                    Field::Meridiem => {
                        out.extend_from_slice(if hour < 12 { b"AM" } else { b"PM" })
                    }
                    Field::Minute => write_padded(out, minute, width),
                    Field::Second => write_padded(out, second, width),
                    Field::Fraction => {
                        let digits = width.min(9);
                        let scaled = nanos / 10u32.pow(9 - digits as u32);
                        write_padded(out, scaled, digits)
                    }
                    Field::UtcOffset => out.extend_from_slice(b"+0000"),
                }
            }
        }
    }
    true
}
