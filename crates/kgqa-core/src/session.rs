//! Batch question answering followed by enrichment

use serde::Serialize;
use tracing::info;

use crate::enrich::{Enricher, FollowupRecord};
use crate::error::Result;
use crate::graph::GraphStore;
use crate::llm::Generator;
use crate::qa::{Intent, QaOutcome, QaPipeline};
use crate::storage::{AnswerLog, LoggedRecord, RecordKind};

/// Sample questions covering each answerable intent
pub const DEMO_QUESTIONS: [&str; 3] = [
    "什么是人工智能伦理与安全",
    "后门攻击的图片",
    "人工智能伦理与安全的关系",
];

/// Everything a session produced, in creation order
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionReport {
    pub answers: Vec<QaOutcome>,
    pub followups: Vec<FollowupRecord>,
}

/// Answers a batch of questions, logs them, then optionally enriches
pub struct QaSession<S: GraphStore, G: Generator> {
    pipeline: QaPipeline<S>,
    enricher: Enricher<G>,
    log: Option<AnswerLog>,
}

impl<S: GraphStore, G: Generator> QaSession<S, G> {
    pub fn new(pipeline: QaPipeline<S>, enricher: Enricher<G>) -> Self {
        Self {
            pipeline,
            enricher,
            log: None,
        }
    }

    /// Log every answered question here. Follow-ups go wherever the
    /// enricher was configured to log.
    pub fn with_log(mut self, log: AnswerLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Answer each question in order; with `enrich`, follow up on the
    /// answers and on the first relation answer.
    pub async fn run<Q: AsRef<str>>(&self, questions: &[Q], enrich: bool) -> Result<SessionReport> {
        let mut report = SessionReport::default();

        for question in questions {
            let outcome = self.pipeline.answer(question.as_ref()).await;
            if let Some(log) = &self.log {
                log.append(&LoggedRecord::new(
                    RecordKind::Answer,
                    &outcome.question,
                    outcome.answer.to_string(),
                ))?;
            }
            report.answers.push(outcome);
        }

        if enrich {
            let answers: Vec<_> = report.answers.iter().map(|o| o.answer.clone()).collect();
            let relation_answer = report
                .answers
                .iter()
                .find(|o| o.intent() == Intent::Relation)
                .map(|o| &o.answer);
            report.followups = self.enricher.enrich(&answers, relation_answer).await?;
        }

        info!(
            questions = report.answers.len(),
            found = report.answers.iter().filter(|o| o.answer.is_found()).count(),
            followups = report.followups.len(),
            "Session finished"
        );
        Ok(report)
    }
}
