//! History Module - Prediction Log
//!
//! Durable, append-only CSV record of every prediction, single or batch.
//! The log owns its file lifecycle: callers never check whether the file
//! exists, whether a header is due, or how writes are serialised.

pub mod entry;
pub mod writer;


pub use entry::{timestamp_now, LogEntry};
pub use writer::{LogReadError, LogWriteError, PredictionLog};
