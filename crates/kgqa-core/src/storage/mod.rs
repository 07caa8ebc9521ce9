//! Storage layer - append-only answer log
//!
//! # Usage
//!
//! ```ignore
//! use kgqa_core::storage::{AnswerLog, LoggedRecord, RecordKind};
//!
//! let log = AnswerLog::text("answers.txt");
//! log.append(&LoggedRecord::new(RecordKind::Answer, "什么是AI", "..."))?;
//! ```

pub mod answer_log;

pub use answer_log::{AnswerLog, LogFormat, LoggedRecord, RecordKind};
