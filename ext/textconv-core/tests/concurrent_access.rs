use arrow_array::cast::AsArray;
use arrow_array::types::Int32Type;
use arrow_array::{ArrayRef, StringArray};
use arrow_schema::DataType;
use std::sync::Arc;
use std::thread;
use textconv_core::*;

use test_helpers::*;

#[test]
fn test_sequential_and_parallel_agree() {
    let mut rng = seeded_rng();
    let input = random_integer_text(&mut rng, 10_000);

    let results: Vec<ArrayRef> = all_contexts()
        .iter()
        .map(|ctx| to_integers(&input, &DataType::Int32, ctx).unwrap())
        .collect();
    for result in &results[1..] {
        assert_eq!(result.as_ref(), results[0].as_ref());
    }

    let texts: Vec<StringArray> = all_contexts()
        .iter()
        .map(|ctx| from_integers(results[0].as_ref(), ctx).unwrap())
        .collect();
    for text in &texts[1..] {
        assert_eq!(text, &texts[0]);
    }
}

#[test]
fn test_concurrent_calls_share_one_context() {
    let ctx = ConvertContext::builder()
        .with_chunk_size(64)
        .with_num_threads(2)
        .build()
        .unwrap();
    let mut rng = seeded_rng();
    let input = Arc::new(random_integer_text(&mut rng, 5_000));
    let expected =
        to_integers(input.as_ref(), &DataType::Int32, &ConvertContext::sequential()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctx = ctx.clone();
            let input = Arc::clone(&input);
            thread::spawn(move || to_integers(input.as_ref(), &DataType::Int32, &ctx).unwrap())
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert_eq!(result.as_ref(), expected.as_ref());
    }
}

#[test]
fn test_streams_produce_the_same_results() {
    let mut rng = seeded_rng();
    let input = Arc::new(random_integer_text(&mut rng, 3_000));
    let expected =
        to_integers(input.as_ref(), &DataType::Int32, &ConvertContext::sequential()).unwrap();

    let streams: Vec<Stream> = (0..3)
        .map(|i| Stream::new(format!("test-{}", i)).unwrap())
        .collect();
    let pending: Vec<Pending<ArrayRef>> = streams
        .iter()
        .map(|stream| {
            let input = Arc::clone(&input);
            let ctx = ConvertContext::default();
            stream.submit(move || to_integers(input.as_ref(), &DataType::Int32, &ctx))
        })
        .collect();

    for p in pending {
        let result = p.wait().unwrap();
        assert_eq!(result.as_ref(), expected.as_ref());
    }
}

#[test]
fn test_stream_orders_dependent_calls() {
    let stream = Stream::new("pipeline").unwrap();
    let input = Arc::new(text_column(&[Some("7"), None, Some("-3")]));
    let ctx = ConvertContext::default();

    let parsed = {
        let input = Arc::clone(&input);
        let ctx = ctx.clone();
        stream.submit(move || to_integers(input.as_ref(), &DataType::Int32, &ctx))
    };
    let parsed = parsed.wait().unwrap();

    let rendered = {
        let parsed = parsed.clone();
        stream.submit(move || from_integers(parsed.as_ref(), &ctx))
    };
    stream.synchronize().unwrap();

    let rendered = rendered.wait().unwrap();
    assert_eq!(rendered, *input);
    assert_eq!(parsed.as_primitive::<Int32Type>().value(2), -3);
}

#[test]
fn test_stream_reports_call_errors() {
    let stream = Stream::new("errors").unwrap();
    let input = Arc::new(text_column(&[Some("1")]));
    let pending = stream.submit(move || {
        to_integers(input.as_ref(), &DataType::Utf8, &ConvertContext::default())
    });
    assert!(matches!(pending.wait(), Err(ConvertError::Unsupported(_))));
    stream.synchronize().unwrap();
}
