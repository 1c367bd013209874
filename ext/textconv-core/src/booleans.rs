//! Boolean codec: text ↔ boolean using caller-supplied literals
//!
//! Only the true literal is compared when parsing: any non-null text that is not exactly
//! the true literal is `false`, including the empty string and what a caller might consider
//! a false literal. Parsing therefore never produces nulls for non-null input.

use crate::column::{downcast_array, ConversionOutcome, TextColumn};
use crate::kernel::{render_to_text, text_to_boolean};
use crate::{ConvertContext, ConvertError, Result};
use arrow_array::{Array, BooleanArray, StringArray};
use arrow_schema::DataType;

/// Literal used for `true` when the caller supplies none
pub const DEFAULT_TRUE_LITERAL: &str = "true";
/// Literal used for `false` when the caller supplies none
pub const DEFAULT_FALSE_LITERAL: &str = "false";

/// Convert a text column into booleans: `true` iff the text equals `true_literal`
pub fn to_booleans(
    strings: &dyn Array,
    true_literal: &str,
    ctx: &ConvertContext,
) -> Result<BooleanArray> {
    if true_literal.is_empty() {
        return Err(ConvertError::invalid_argument("true literal must not be empty"));
    }
    let text = TextColumn::try_new(strings)?;
    tracing::debug!(rows = text.len(), true_literal, "to_booleans");

    text_to_boolean(&text, ctx, |s| ConversionOutcome::Value(s == true_literal))
}

/// Convert a boolean column into text using the given literals
pub fn from_booleans(
    booleans: &dyn Array,
    true_literal: &str,
    false_literal: &str,
    ctx: &ConvertContext,
) -> Result<StringArray> {
    if true_literal.is_empty() {
        return Err(ConvertError::invalid_argument("true literal must not be empty"));
    }
    if false_literal.is_empty() {
        return Err(ConvertError::invalid_argument("false literal must not be empty"));
    }
    if booleans.data_type() != &DataType::Boolean {
        return Err(ConvertError::unsupported(format!(
            "Expected a Boolean column, got {:?}",
            booleans.data_type()
        )));
    }
    let array = downcast_array::<BooleanArray>(booleans)?;
    tracing::debug!(rows = array.len(), true_literal, false_literal, "from_booleans");

    render_to_text(array.len(), ctx, |i, out| {
        if array.is_null(i) {
            return false;
        }
        let literal = if array.value(i) {
            true_literal
        } else {
            false_literal
        };
        out.extend_from_slice(literal.as_bytes());
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_true_literal_is_compared() {
        let input = StringArray::from(vec![
            Some("true"),
            Some("TRUE"),
            Some(""),
            Some("false"),
            Some("yes"),
            None,
        ]);
        let out = to_booleans(&input, DEFAULT_TRUE_LITERAL, &ConvertContext::sequential()).unwrap();
        assert_eq!(out.len(), 6);
        assert!(out.value(0));
        assert!(!out.value(1));
        assert!(!out.value(2));
        assert!(!out.value(3));
        assert!(!out.value(4));
        assert!(out.is_null(5));
        assert_eq!(out.null_count(), 1);
    }

    #[test]
    fn test_from_booleans_custom_literals() {
        let input = BooleanArray::from(vec![Some(true), Some(false), None]);
        let out = from_booleans(&input, "T", "F", &ConvertContext::sequential()).unwrap();
        assert_eq!(out.value(0), "T");
        assert_eq!(out.value(1), "F");
        assert!(out.is_null(2));
    }

    #[test]
    fn test_empty_literals_fail_the_call() {
        let ctx = ConvertContext::sequential();
        let strings = StringArray::from(vec!["a"]);
        assert!(matches!(
            to_booleans(&strings, "", &ctx),
            Err(ConvertError::InvalidArgument(_))
        ));

        let bools = BooleanArray::from(vec![true]);
        assert!(matches!(
            from_booleans(&bools, "yes", "", &ctx),
            Err(ConvertError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_from_booleans_rejects_strings() {
        let strings = StringArray::from(vec!["true"]);
        let err = from_booleans(
            &strings,
            DEFAULT_TRUE_LITERAL,
            DEFAULT_FALSE_LITERAL,
            &ConvertContext::sequential(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::Unsupported(_)));
    }
}
