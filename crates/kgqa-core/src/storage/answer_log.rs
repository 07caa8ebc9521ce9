//! Append-only question/answer log
//!
//! Every write opens the file in append mode, writes one record and closes
//! it again, so records written before a failure stay on disk.
//!
//! Two formats are supported:
//!
//! - **text**: `Q: {question}\nA: {answer}` followed by a blank line
//! - **jsonl**: one [`LoggedRecord`] per line, with kind and timestamp

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::Result;
use crate::error::Error;

/// On-disk format of the answer log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Jsonl,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(LogFormat::Text),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!(
                "Invalid log format: {}. Valid options: text, jsonl",
                other
            )),
        }
    }
}

/// What produced a logged pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A question answered from the graph
    Answer,
    /// Follow-up about a URL answer
    Link,
    /// Follow-up about an extracted keyword
    Keyword,
    /// Follow-up about a related topic
    RelatedTopic,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Answer => write!(f, "answer"),
            RecordKind::Link => write!(f, "link"),
            RecordKind::Keyword => write!(f, "keyword"),
            RecordKind::RelatedTopic => write!(f, "related_topic"),
        }
    }
}

/// A question/answer pair as stored in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedRecord {
    pub question: String,
    pub answer: String,
    /// Unknown for records read back from the text format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecordKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl LoggedRecord {
    pub fn new(kind: RecordKind, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            kind: Some(kind),
            timestamp: Some(Utc::now()),
        }
    }

    /// The text-format rendering, without the trailing separator
    pub fn to_text(&self) -> String {
        format!("Q: {}\nA: {}", self.question, self.answer)
    }
}

/// Append-only log of question/answer pairs
#[derive(Debug, Clone)]
pub struct AnswerLog {
    path: PathBuf,
    format: LogFormat,
}

impl AnswerLog {
    pub fn new(path: impl Into<PathBuf>, format: LogFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Text-format log at the given path
    pub fn text(path: impl Into<PathBuf>) -> Self {
        Self::new(path, LogFormat::Text)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Append one record, creating the file and its directory if needed
    pub fn append(&self, record: &LoggedRecord) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let line = match self.format {
            LogFormat::Text => format!("{}\n\n", record.to_text()),
            LogFormat::Jsonl => format!("{}\n", serde_json::to_string(record)?),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        debug!(
            path = %self.path.display(),
            kind = ?record.kind,
            "Appended record to answer log"
        );
        Ok(())
    }

    /// Read all records back, oldest first. A missing file is an empty log.
    pub fn records(&self) -> Result<Vec<LoggedRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;

        match self.format {
            LogFormat::Text => Ok(parse_text(&contents)),
            LogFormat::Jsonl => contents
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(index, line)| {
                    serde_json::from_str(line).map_err(|e| {
                        Error::Other(format!(
                            "{}:{}: invalid record: {}",
                            self.path.display(),
                            index + 1,
                            e
                        ))
                    })
                })
                .collect(),
        }
    }
}

/// Split text-format contents on the blank line that precedes each `Q: `
fn parse_text(contents: &str) -> Vec<LoggedRecord> {
    let Some(body) = contents.strip_prefix("Q: ") else {
        return Vec::new();
    };

    body.split("\n\nQ: ")
        .filter_map(|chunk| {
            let (question, answer) = chunk.split_once("\nA: ")?;
            Some(LoggedRecord {
                question: question.to_string(),
                answer: answer.trim_end_matches('\n').to_string(),
                kind: None,
                timestamp: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_text_append_format() {
        let dir = TempDir::new().unwrap();
        let log = AnswerLog::text(dir.path().join("answers.txt"));

        log.append(&LoggedRecord::new(RecordKind::Answer, "什么是AI", "对不起，未找到相关信息。"))
            .unwrap();
        log.append(&LoggedRecord::new(RecordKind::Keyword, "关于AI的详细信息是什么？", "AI是..."))
            .unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            contents,
            "Q: 什么是AI\nA: 对不起，未找到相关信息。\n\nQ: 关于AI的详细信息是什么？\nA: AI是...\n\n"
        );
    }

    #[test]
    fn test_text_records_roundtrip_multiline_answer() {
        let dir = TempDir::new().unwrap();
        let log = AnswerLog::text(dir.path().join("answers.txt"));

        log.append(&LoggedRecord::new(RecordKind::Link, "q1", "line one\nline two"))
            .unwrap();
        log.append(&LoggedRecord::new(RecordKind::Keyword, "q2", "a2")).unwrap();

        let records = log.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "q1");
        assert_eq!(records[0].answer, "line one\nline two");
        assert_eq!(records[1].answer, "a2");
        assert!(records[0].kind.is_none());
    }

    #[test]
    fn test_jsonl_roundtrip_keeps_kind() {
        let dir = TempDir::new().unwrap();
        let log = AnswerLog::new(dir.path().join("nested/answers.jsonl"), LogFormat::Jsonl);

        log.append(&LoggedRecord::new(RecordKind::RelatedTopic, "q", "a\n\nb"))
            .unwrap();

        let records = log.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, Some(RecordKind::RelatedTopic));
        assert_eq!(records[0].answer, "a\n\nb");
        assert!(records[0].timestamp.is_some());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = AnswerLog::text(dir.path().join("none.txt"));
        assert!(log.records().unwrap().is_empty());
    }

    #[test]
    fn test_jsonl_invalid_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, "{not json}\n").unwrap();

        let log = AnswerLog::new(&path, LogFormat::Jsonl);
        let err = log.records().unwrap_err();
        assert!(err.to_string().contains("bad.jsonl:1"));
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("jsonl".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
