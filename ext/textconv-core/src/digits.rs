//! Decimal digit scanning shared by the numeric and timestamp codecs

use num::{NumCast, PrimInt};

/// Number of leading ASCII digits in `text`, capped at `max`
#[inline]
pub(crate) fn count_digits(text: &[u8], max: usize) -> usize {
    text.iter()
        .take(max)
        .take_while(|b| b.is_ascii_digit())
        .count()
}

/// Value of an all-digit slice, or `None` if it holds a non-digit or overflows `u32`
#[inline]
pub(crate) fn digits_value(digits: &[u8]) -> Option<u32> {
    digits.iter().try_fold(0u32, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(<u32 as From<u8>>::from(b - b'0'))
    })
}

/// Parse an optionally signed decimal integer into `T`
///
/// `-` is rejected for unsigned targets. The text must be a sign followed by at least one
/// digit and nothing else. Returns `None` on any grammar violation or when the magnitude
/// does not fit `T`; negative values are accumulated downwards so `T::min_value()` parses.
pub(crate) fn parse_integer<T: PrimInt>(text: &[u8]) -> Option<T> {
    let signed = T::min_value() < T::zero();
    let (negative, digits) = match text.split_first()? {
        (b'-', rest) if signed => (true, rest),
        (b'-', _) => return None,
        (b'+', rest) => (false, rest),
        _ => (false, text),
    };
    if digits.is_empty() {
        return None;
    }

    let ten = <T as NumCast>::from(10u8)?;
    digits.iter().try_fold(T::zero(), |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        let digit = <T as NumCast>::from(b - b'0')?;
        let shifted = acc.checked_mul(&ten)?;
        if negative {
            shifted.checked_sub(&digit)
        } else {
            shifted.checked_add(&digit)
        }
    })
}

/// Whether `text` matches the signed integer grammar, ignoring range
pub(crate) fn is_integer_text(text: &[u8]) -> bool {
    let digits = match text.first() {
        Some(b'-' | b'+') => &text[1..],
        _ => text,
    };
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

/// Append `value` zero-padded to at least `width` digits
#[inline]
pub(crate) fn write_padded(out: &mut Vec<u8>, value: u32, width: usize) {
    let mut buffer = itoa::Buffer::new();
    let digits = buffer.format(value);
    out.extend(std::iter::repeat(b'0').take(width.saturating_sub(digits.len())));
    out.extend_from_slice(digits.as_bytes());
}
