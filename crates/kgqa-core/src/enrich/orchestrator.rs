//! Enrichment cascade over prior answers
//!
//! Three passes run in a fixed order, one generator call at a time:
//!
//! 1. every URL answer
//! 2. every keyword extracted from the non-URL text answers
//! 3. every related-topic name, when the relation answer is a list
//!
//! Each follow-up is appended to the answer log as soon as it completes.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::llm::Generator;
use crate::qa::{Answer, extract_keywords};
use crate::storage::{AnswerLog, LoggedRecord, RecordKind};

use super::retry::RetryPolicy;

/// Answer recorded when the generator could not be reached
pub const FAILURE_PLACEHOLDER: &str = "请求失败，未获得答案。";

/// Follow-up question about a URL answer
pub fn link_prompt(url: &str) -> String {
    format!("关于这个链接的详细信息是什么？{url}")
}

/// Follow-up question about a keyword or topic name
pub fn topic_prompt(topic: &str) -> String {
    format!("关于{topic}的详细信息是什么？")
}

/// One enrichment step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowupRecord {
    pub kind: RecordKind,
    /// The URL, keyword or topic the question is about
    pub subject: String,
    pub question: String,
    pub answer: String,
    /// False when `answer` is the failure placeholder
    pub succeeded: bool,
}

/// Drives the follow-up cascade against a generator
pub struct Enricher<G: Generator> {
    generator: Arc<G>,
    log: Option<AnswerLog>,
    retry: RetryPolicy,
    dedup: bool,
}

impl<G: Generator> Enricher<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self {
            generator,
            log: None,
            retry: RetryPolicy::default(),
            dedup: false,
        }
    }

    /// Persist every follow-up to this log
    pub fn with_log(mut self, log: AnswerLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Ask each distinct follow-up question once per cascade
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    /// Run the three passes and return the records in creation order.
    ///
    /// Generator failures become placeholder answers. A log write failure
    /// stops the cascade; records already written stay in the log.
    pub async fn enrich(
        &self,
        initial_answers: &[Answer],
        relation_answer: Option<&Answer>,
    ) -> Result<Vec<FollowupRecord>> {
        let mut records = Vec::new();
        let mut asked = HashSet::new();

        let urls: Vec<&str> = initial_answers.iter().filter_map(Answer::as_url).collect();
        for url in urls {
            self.step(RecordKind::Link, url, link_prompt(url), &mut asked, &mut records)
                .await?;
        }

        let keywords = extract_keywords(initial_answers);
        for keyword in &keywords {
            self.step(
                RecordKind::Keyword,
                keyword,
                topic_prompt(keyword),
                &mut asked,
                &mut records,
            )
            .await?;
        }

        let topics = relation_answer.and_then(Answer::as_list).unwrap_or_default();
        for topic in topics {
            self.step(
                RecordKind::RelatedTopic,
                topic,
                topic_prompt(topic),
                &mut asked,
                &mut records,
            )
            .await?;
        }

        info!(
            followups = records.len(),
            failed = records.iter().filter(|r| !r.succeeded).count(),
            "Enrichment finished"
        );
        Ok(records)
    }

    async fn step(
        &self,
        kind: RecordKind,
        subject: &str,
        question: String,
        asked: &mut HashSet<String>,
        records: &mut Vec<FollowupRecord>,
    ) -> Result<()> {
        if self.dedup && !asked.insert(question.clone()) {
            debug!(question = %question, "Skipping repeated follow-up");
            return Ok(());
        }

        info!(kind = %kind, question = %question, "Asking generator");
        let (answer, succeeded) = match self
            .retry
            .run(|| self.generator.generate(&question))
            .await
        {
            Ok(answer) => (answer, true),
            Err(e) => {
                warn!(kind = %kind, subject = %subject, error = %e, "Follow-up failed");
                (FAILURE_PLACEHOLDER.to_string(), false)
            }
        };

        if let Some(log) = &self.log {
            log.append(&LoggedRecord::new(kind, &question, &answer))?;
        }

        records.push(FollowupRecord {
            kind,
            subject: subject.to_string(),
            question,
            answer,
            succeeded,
        });
        Ok(())
    }
}
