use arrow_array::cast::AsArray;
use arrow_array::types::*;
use arrow_array::{Array, Float32Array, Float64Array, Int64Array, UInt64Array};
use arrow_schema::DataType;
use ordered_float::OrderedFloat;
use rand::Rng;
use textconv_core::*;

use test_helpers::*;

#[test]
fn test_canonical_integers_roundtrip() {
    let mut rng = seeded_rng();
    let values: Vec<Option<i64>> = (0..2000)
        .map(|i| (i % 17 != 0).then(|| rng.random::<i64>()))
        .chain([Some(i64::MIN), Some(i64::MAX), Some(0)])
        .collect();
    let input = Int64Array::from(values);

    for ctx in all_contexts() {
        let text = from_integers(&input, &ctx).unwrap();
        assert_nulls_preserved(&input, &text);

        let back = to_integers(&text, &DataType::Int64, &ctx).unwrap();
        assert_eq!(back.as_primitive::<Int64Type>(), &input);
    }
}

#[test]
fn test_unsigned_roundtrip() {
    let input = UInt64Array::from(vec![Some(0), Some(u64::MAX), None, Some(42)]);
    let ctx = ConvertContext::default();
    let text = from_integers(&input, &ctx).unwrap();
    assert_eq!(text.value(1), "18446744073709551615");

    let back = to_integers(&text, &DataType::UInt64, &ctx).unwrap();
    assert_eq!(back.as_primitive::<UInt64Type>(), &input);
}

#[test]
fn test_malformed_integers_become_null() {
    let input = text_column(&[
        Some("12a"),
        Some(""),
        Some("-"),
        Some("99999999999999999999"),
        Some(" 7"),
        Some("7"),
    ]);
    for ctx in all_contexts() {
        let out = to_integers(&input, &DataType::Int32, &ctx).unwrap();
        let out = out.as_primitive::<Int32Type>();
        assert_eq!(out.len(), 6);
        assert_eq!(out.null_count(), 5);
        assert_eq!(out.value(5), 7);
    }
}

#[test]
fn test_every_integer_width() {
    let input = text_column(&[Some("127"), Some("128"), Some("-1")]);
    let ctx = ConvertContext::sequential();
    let expectations = [
        (DataType::Int8, 1),
        (DataType::Int16, 0),
        (DataType::Int32, 0),
        (DataType::Int64, 0),
        (DataType::UInt8, 1),
        (DataType::UInt16, 1),
        (DataType::UInt32, 1),
        (DataType::UInt64, 1),
    ];
    for (data_type, nulls) in expectations {
        let out = to_integers(&input, &data_type, &ctx).unwrap();
        assert_eq!(out.data_type(), &data_type);
        assert_eq!(out.null_count(), nulls, "{:?}", data_type);
    }
}

#[test]
fn test_finite_floats_roundtrip_bit_for_bit() {
    let mut rng = seeded_rng();
    let values: Vec<f64> = (0..2000)
        .map(|_| f64::from_bits(rng.random::<u64>()))
        .filter(|v| v.is_finite())
        .chain([0.1, -0.0, f64::MIN_POSITIVE, 5e-324, f64::MAX])
        .collect();
    let input = Float64Array::from(values.clone());

    for ctx in all_contexts() {
        let text = from_floats(&input, &ctx).unwrap();
        let back = to_floats(&text, &DataType::Float64, &ctx).unwrap();
        let back = back.as_primitive::<Float64Type>();
        assert_eq!(back.null_count(), 0);
        for (i, expected) in values.iter().enumerate() {
            assert_eq!(back.value(i).to_bits(), expected.to_bits(), "Element {}", i);
        }
    }
}

#[test]
fn test_float32_roundtrip() {
    let mut rng = seeded_rng();
    let values: Vec<f32> = (0..1000)
        .map(|_| f32::from_bits(rng.random::<u32>()))
        .filter(|v| v.is_finite())
        .collect();
    let input = Float32Array::from(values.clone());
    let ctx = ConvertContext::default();

    let text = from_floats(&input, &ctx).unwrap();
    let back = to_floats(&text, &DataType::Float32, &ctx).unwrap();
    let back = back.as_primitive::<Float32Type>();
    for (i, expected) in values.iter().enumerate() {
        assert_eq!(back.value(i).to_bits(), expected.to_bits());
    }
}

#[test]
fn test_non_finite_floats_roundtrip() {
    let input = Float64Array::from(vec![
        Some(f64::NAN),
        Some(f64::INFINITY),
        Some(f64::NEG_INFINITY),
        None,
    ]);
    let ctx = ConvertContext::sequential();
    let text = from_floats(&input, &ctx).unwrap();
    assert_eq!(
        text_values(&text),
        vec![
            Some("NaN".to_string()),
            Some("Inf".to_string()),
            Some("-Inf".to_string()),
            None
        ]
    );

    let back = to_floats(&text, &DataType::Float64, &ctx).unwrap();
    let back: Vec<Option<OrderedFloat<f64>>> = back
        .as_primitive::<Float64Type>()
        .iter()
        .map(|v| v.map(OrderedFloat))
        .collect();
    let expected: Vec<Option<OrderedFloat<f64>>> =
        input.iter().map(|v| v.map(OrderedFloat)).collect();
    assert_eq!(back, expected);
}

#[test]
fn test_is_integer_and_is_float_agree_with_parsers() {
    let input = text_column(&[
        Some("1"),
        Some("-2"),
        Some("1.5"),
        Some("1e3"),
        Some("nan"),
        Some("x"),
        None,
    ]);
    let ctx = ConvertContext::default();

    let ints = is_integer(&input, &ctx).unwrap();
    let floats = is_float(&input, &ctx).unwrap();
    let parsed = to_floats(&input, &DataType::Float64, &ctx).unwrap();

    assert_eq!(
        ints.iter().collect::<Vec<_>>(),
        vec![
            Some(true),
            Some(true),
            Some(false),
            Some(false),
            Some(false),
            Some(false),
            None
        ]
    );
    for i in 0..input.len() {
        assert_eq!(floats.is_null(i), input.is_null(i));
        if !input.is_null(i) {
            assert_eq!(floats.value(i), parsed.is_valid(i), "Element {}", i);
        }
    }
}
