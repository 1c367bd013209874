//! Columnar text conversion kernels over Arrow arrays
//!
//! `textconv-core` converts whole columns between text (`Utf8` / `LargeUtf8`) and typed
//! values: integers, floats, booleans and timestamps. Every operation works on a column at
//! a time and treats each element independently, so the work is split into chunks and run
//! in parallel.
//!
//! # Key Components
//!
//! - **Codecs**: one module per value family
//!   - [`integers`]: signed and unsigned 8–64 bit integers
//!   - [`floats`]: `Float32` / `Float64`, shortest round-trip formatting
//!   - [`booleans`]: caller-supplied true/false literals
//!   - [`timestamps`]: strftime-style patterns compiled by [`format::FormatPattern`]
//!
//! - **Execution**: [`ConvertContext`] decides how per-element work is dispatched
//!   - Global rayon pool, a dedicated pool, or the calling thread
//!   - Configurable chunk size, seeded from the environment with
//!     [`ConvertContextBuilder::from_env`]
//!   - [`stream::Stream`] orders asynchronous calls and makes synchronization explicit
//!
//! - **Memory**: every output buffer comes from a pluggable [`BufferAllocator`]
//!
//! # Nulls and errors
//!
//! A null input element always produces a null output element. A non-null element that does
//! not convert (bad syntax, out of range, impossible date) also produces a null; it is never
//! an error. A [`ConvertError`] is returned only when the whole call cannot run: unsupported
//! types, empty literals, malformed patterns, or an allocator refusing a buffer.
//!
//! # Example Usage
//!
//! ```ignore
//! use arrow_array::StringArray;
//! use arrow_schema::DataType;
//! use textconv_core::{to_integers, ConvertContext};
//!
//! let input = StringArray::from(vec![Some("42"), None, Some("x")]);
//! let ints = to_integers(&input, &DataType::Int32, &ConvertContext::default())?;
//! assert_eq!(ints.null_count(), 2);
//! ```

pub mod booleans;
pub mod column;
pub mod context;
mod digits;
pub mod error;
pub mod floats;
pub mod format;
pub mod integers;
mod kernel;
pub mod memory;
pub mod stream;
pub mod timestamps;
pub mod validity;

pub use booleans::{from_booleans, to_booleans, DEFAULT_FALSE_LITERAL, DEFAULT_TRUE_LITERAL};
pub use column::{ConversionOutcome, TextColumn};
pub use context::{ConvertContext, ConvertContextBuilder, ExecutionMode};
pub use error::{ConvertError, ErrorContext, Result};
pub use floats::{from_floats, is_float, to_floats};
pub use format::{FormatPattern, DEFAULT_TIMESTAMP_FORMAT};
pub use integers::{from_integers, is_integer, to_integers};
pub use memory::{BudgetAllocator, BufferAllocator, SystemAllocator};
pub use stream::{Pending, Stream};
pub use timestamps::{from_timestamps, is_timestamp, to_timestamps, TimestampResolution};
pub use validity::propagate_validity;
