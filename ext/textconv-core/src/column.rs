//! Column views shared by every codec
//!
//! Input columns are Arrow arrays owned by the caller. [`TextColumn`] is a read-only view
//! over a `Utf8` or `LargeUtf8` array; typed columns are plain Arrow primitive and boolean
//! arrays reached through [`downcast_array`].

use crate::{ConvertError, Result};
use arrow_array::{Array, LargeStringArray, StringArray};
use arrow_schema::DataType;

/// Per-element conversion result
///
/// Conversions never clamp or panic on bad input: an element either produces a value or is
/// tagged `Invalid`, which the validity propagator turns into a null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionOutcome<T> {
    Value(T),
    Invalid,
}

impl<T> ConversionOutcome<T> {
    /// Whether the element produced a value
    pub fn is_valid(&self) -> bool {
        matches!(self, ConversionOutcome::Value(_))
    }

    /// Map the carried value, keeping `Invalid` as is
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ConversionOutcome<U> {
        match self {
            ConversionOutcome::Value(v) => ConversionOutcome::Value(f(v)),
            ConversionOutcome::Invalid => ConversionOutcome::Invalid,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            ConversionOutcome::Value(v) => Some(v),
            ConversionOutcome::Invalid => None,
        }
    }
}

impl<T> From<Option<T>> for ConversionOutcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => ConversionOutcome::Value(v),
            None => ConversionOutcome::Invalid,
        }
    }
}

/// Read-only view over a text column
///
/// Null elements are never inspected: [`TextColumn::value`] returns `None` for them without
/// touching the value buffer.
#[derive(Debug, Clone, Copy)]
pub enum TextColumn<'a> {
    Utf8(&'a StringArray),
    LargeUtf8(&'a LargeStringArray),
}

impl<'a> TextColumn<'a> {
    /// Wrap a `Utf8` or `LargeUtf8` array
    pub fn try_new(array: &'a dyn Array) -> Result<Self> {
        match array.data_type() {
            DataType::Utf8 => Ok(TextColumn::Utf8(downcast_array::<StringArray>(array)?)),
            DataType::LargeUtf8 => Ok(TextColumn::LargeUtf8(downcast_array::<LargeStringArray>(
                array,
            )?)),
            dt => Err(ConvertError::unsupported(format!(
                "Expected a Utf8 or LargeUtf8 column, got {:?}",
                dt
            ))),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TextColumn::Utf8(array) => array.len(),
            TextColumn::LargeUtf8(array) => array.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            TextColumn::Utf8(array) => array.null_count(),
            TextColumn::LargeUtf8(array) => array.null_count(),
        }
    }

    /// Text of element `index`, or `None` when the element is null
    #[inline]
    pub fn value(&self, index: usize) -> Option<&'a str> {
        match *self {
            TextColumn::Utf8(array) => (!array.is_null(index)).then(|| array.value(index)),
            TextColumn::LargeUtf8(array) => (!array.is_null(index)).then(|| array.value(index)),
        }
    }
}

/// Helper function to downcast an array with better error messages
pub(crate) fn downcast_array<T: 'static>(array: &dyn Array) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        ConvertError::conversion(format!("Failed to cast to {}", std::any::type_name::<T>()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::Int32Array;

    #[test]
    fn test_text_column_skips_nulls() {
        let array = StringArray::from(vec![Some("a"), None, Some("")]);
        let text = TextColumn::try_new(&array).unwrap();
        assert_eq!(text.len(), 3);
        assert_eq!(text.null_count(), 1);
        assert_eq!(text.value(0), Some("a"));
        assert_eq!(text.value(1), None);
        assert_eq!(text.value(2), Some(""));
    }

    #[test]
    fn test_text_column_large_utf8() {
        let array = LargeStringArray::from(vec!["x", "yz"]);
        let text = TextColumn::try_new(&array).unwrap();
        assert!(matches!(text, TextColumn::LargeUtf8(_)));
        assert_eq!(text.value(1), Some("yz"));
    }

    #[test]
    fn test_text_column_rejects_typed_arrays() {
        let array = Int32Array::from(vec![1, 2]);
        let err = TextColumn::try_new(&array).unwrap_err();
        assert!(matches!(err, ConvertError::Unsupported(_)));
    }

    #[test]
    fn test_outcome_from_option() {
        let ok: ConversionOutcome<i32> = Some(3).into();
        let bad: ConversionOutcome<i32> = None.into();
        assert!(ok.is_valid());
        assert!(!bad.is_valid());
        assert_eq!(ok.map(|v| v * 2), ConversionOutcome::Value(6));
        assert_eq!(bad.into_option(), None);
    }
}
