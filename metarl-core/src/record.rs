//! Types and traits for recording metrics of meta-training and meta-testing.
//!
//! * [`Record`] - A container of key-value pairs of various data types
//! * [`RecordValue`] - Types of values that can be stored in a [`Record`]
//! * [`Recorder`] - Interface for writing records to an output destination
//! * [`BufferedRecorder`] - Keeps records in memory and aggregates stored ones
//! * [`NullRecorder`] - Discards all records
//!
//! ```rust
//! use metarl_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("iteration", RecordValue::Scalar(1.0));
//! record.insert("return_eval", RecordValue::Array1(vec![-1.0, -2.0]));
//! assert_eq!(record.get_scalar("iteration").unwrap(), 1.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
