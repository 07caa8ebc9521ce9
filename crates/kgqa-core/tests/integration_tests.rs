//! kgqa Core Integration Tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;

use kgqa_core::{
    Error, Result,
    assist::GraphAssistant,
    config::Config,
    enrich::{Enricher, FAILURE_PLACEHOLDER, RetryPolicy},
    graph::{GraphStore, ResultRow},
    llm::Generator,
    qa::{Answer, CypherQuery, Intent, NOT_FOUND_TEXT, QaPipeline, QueryPlan},
    session::{DEMO_QUESTIONS, QaSession},
    storage::{AnswerLog, LogFormat, RecordKind},
};

/// In-memory topic graph keyed by entity name
#[derive(Default)]
struct TopicGraph {
    descriptions: Vec<(&'static str, &'static str)>,
    images: Vec<(&'static str, &'static str)>,
    related: Vec<(&'static str, &'static str)>,
    queries: Mutex<Vec<CypherQuery>>,
}

impl TopicGraph {
    fn sample() -> Self {
        Self {
            descriptions: vec![("差分隐私", "差分隐私 是 一种 隐私保护技术")],
            images: vec![("后门攻击", "http://example.com/backdoor.png")],
            related: vec![
                ("人工智能伦理与安全", "隐私保护技术"),
                ("人工智能伦理与安全", "后门攻击"),
            ],
            queries: Mutex::new(Vec::new()),
        }
    }
}

fn rows(column: &str, values: impl Iterator<Item = &'static str>) -> Vec<ResultRow> {
    values
        .map(|v| {
            let mut row = ResultRow::new();
            row.insert(column.to_string(), Value::String(v.to_string()));
            row
        })
        .collect()
}

#[async_trait]
impl GraphStore for TopicGraph {
    async fn run(&self, query: &CypherQuery, _: Option<&str>) -> Result<Vec<ResultRow>> {
        self.queries.lock().unwrap().push(query.clone());
        let Some(entity) = query.entity() else {
            return Ok(Vec::new());
        };
        let matching = |table: &Vec<(&'static str, &'static str)>| {
            table
                .iter()
                .filter(|(name, _)| *name == entity)
                .map(|(_, v)| *v)
                .collect::<Vec<_>>()
                .into_iter()
        };

        let statement = &query.statement;
        Ok(if statement.contains("description") {
            rows("description", matching(&self.descriptions))
        } else if statement.contains("image_url") {
            rows("image_url", matching(&self.images))
        } else if statement.contains("related_topics") {
            rows("related_topics", matching(&self.related))
        } else {
            Vec::new()
        })
    }
}

/// Records prompts; fails for any prompt mentioning a blocked word
struct RecordingGenerator {
    blocked: Option<&'static str>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    fn new() -> Self {
        Self {
            blocked: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn blocking(word: &'static str) -> Self {
        Self {
            blocked: Some(word),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.blocked {
            Some(word) if prompt.contains(word) => {
                Err(Error::LLMError("HTTP error 400: bad request".into()))
            }
            _ => Ok(format!("详细信息：{prompt}")),
        }
    }
}

#[tokio::test]
async fn test_definition_not_found_on_empty_store() {
    let pipeline = QaPipeline::new(Arc::new(TopicGraph::default()));

    let outcome = pipeline.try_answer("什么是人工智能伦理与安全").await.unwrap();

    assert_eq!(outcome.intent(), Intent::Definition);
    assert_eq!(outcome.plan.entity.as_deref(), Some("人工智能伦理与安全"));
    assert_eq!(outcome.answer, Answer::NotFound);
    assert_eq!(outcome.answer.to_string(), NOT_FOUND_TEXT);
}

#[tokio::test]
async fn test_image_question_gets_one_link_followup() {
    let graph = Arc::new(TopicGraph::sample());
    let generator = Arc::new(RecordingGenerator::new());
    let pipeline = QaPipeline::new(graph.clone());

    let outcome = pipeline.answer("后门攻击的图片").await;
    assert_eq!(outcome.intent(), Intent::Image);
    assert_eq!(outcome.plan.entity.as_deref(), Some("后门攻击"));
    assert_eq!(outcome.answer.as_url(), Some("http://example.com/backdoor.png"));

    let followups = Enricher::new(generator.clone())
        .with_retry(RetryPolicy::none())
        .enrich(&[outcome.answer], None)
        .await
        .unwrap();

    assert_eq!(followups.len(), 1);
    assert_eq!(followups[0].kind, RecordKind::Link);
    assert_eq!(
        followups[0].question,
        "关于这个链接的详细信息是什么？http://example.com/backdoor.png"
    );
}

#[tokio::test]
async fn test_enrichment_order_url_then_keywords() {
    let generator = Arc::new(RecordingGenerator::new());
    let answers = vec![
        Answer::Text("https://example.com/a.png".into()),
        Answer::Text("对抗样本，模型窃取".into()),
    ];

    Enricher::new(generator.clone())
        .with_retry(RetryPolicy::none())
        .enrich(&answers, None)
        .await
        .unwrap();

    assert_eq!(
        *generator.prompts.lock().unwrap(),
        vec![
            "关于这个链接的详细信息是什么？https://example.com/a.png".to_string(),
            "关于对抗样本的详细信息是什么？".to_string(),
            "关于模型窃取的详细信息是什么？".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_session_logs_answers_then_followups() {
    let dir = TempDir::new().unwrap();
    let log = AnswerLog::text(dir.path().join("answers.txt"));
    let graph = Arc::new(TopicGraph::sample());
    let generator = Arc::new(RecordingGenerator::blocking("隐私保护技术"));

    let session = QaSession::new(
        QaPipeline::new(graph),
        Enricher::new(generator)
            .with_retry(RetryPolicy::none())
            .with_log(log.clone()),
    )
    .with_log(log.clone());

    let report = session.run(&DEMO_QUESTIONS, true).await.unwrap();

    assert_eq!(report.answers.len(), 3);
    assert_eq!(report.answers[0].answer, Answer::NotFound);
    assert_eq!(
        report.answers[2].answer,
        Answer::List(vec!["隐私保护技术".into(), "后门攻击".into()])
    );

    // The not-found answer feeds the keyword pass like any other text
    let kinds: Vec<RecordKind> = report.followups.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RecordKind::Link,
            RecordKind::Keyword,
            RecordKind::Keyword,
            RecordKind::RelatedTopic,
            RecordKind::RelatedTopic
        ]
    );
    assert_eq!(report.followups[1].subject, "对不起");
    assert_eq!(report.followups[3].answer, FAILURE_PLACEHOLDER);
    assert!(!report.followups[3].succeeded);
    assert!(report.followups[4].succeeded);

    let logged = log.records().unwrap();
    assert_eq!(logged.len(), 8);
    assert_eq!(logged[0].question, DEMO_QUESTIONS[0]);
    assert_eq!(logged[2].answer, "['隐私保护技术', '后门攻击']");
    assert_eq!(logged[6].answer, FAILURE_PLACEHOLDER);
}

#[tokio::test]
async fn test_definition_text_feeds_keywords() {
    let graph = Arc::new(TopicGraph::sample());
    let generator = Arc::new(RecordingGenerator::new());
    let session = QaSession::new(
        QaPipeline::new(graph),
        Enricher::new(generator).with_retry(RetryPolicy::none()),
    );

    let report = session.run(&["什么是差分隐私？"], true).await.unwrap();

    let subjects: Vec<&str> = report.followups.iter().map(|f| f.subject.as_str()).collect();
    assert_eq!(subjects, vec!["差分隐私", "是", "一种", "隐私保护技术"]);
}

#[tokio::test]
async fn test_jsonl_log_keeps_kinds() {
    let dir = TempDir::new().unwrap();
    let log = AnswerLog::new(dir.path().join("answers.jsonl"), LogFormat::Jsonl);
    let session = QaSession::new(
        QaPipeline::new(Arc::new(TopicGraph::sample())),
        Enricher::new(Arc::new(RecordingGenerator::new()))
            .with_retry(RetryPolicy::none())
            .with_log(log.clone()),
    )
    .with_log(log.clone());

    session.run(&["后门攻击的图片"], true).await.unwrap();

    let kinds: Vec<Option<RecordKind>> = log.records().unwrap().iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![Some(RecordKind::Answer), Some(RecordKind::Link)]);
}

#[test]
fn test_quoted_entity_stays_bound_as_parameter() {
    let plan = QueryPlan::for_question("O'Brien的图片");
    let query = plan.query.unwrap();

    assert_eq!(query.entity(), Some("OBrien"));
    assert!(!query.statement.contains("OBrien"));
    assert_eq!(query.parameters.get("name"), Some(&json!("OBrien")));
}

#[tokio::test]
async fn test_assistant_over_store() {
    struct TripleStore;

    #[async_trait]
    impl GraphStore for TripleStore {
        async fn run(&self, query: &CypherQuery, _: Option<&str>) -> Result<Vec<ResultRow>> {
            let value = if query.statement.starts_with("CALL db.labels()") {
                json!([{"label": "一级知识点"}])
            } else if query.statement.starts_with("CALL db.relationshipTypes()") {
                json!([{"relationshipType": "包括"}])
            } else {
                json!([{"entity_1": "隐私保护技术", "relation": "包括", "entity_2": "联邦学习"}])
            };
            Ok(value
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|v| v.as_object().cloned())
                .collect())
        }
    }

    let generator = Arc::new(RecordingGenerator::new());
    let outcome = GraphAssistant::new(Arc::new(TripleStore), generator.clone())
        .ask("隐私保护技术包括什么？")
        .await
        .unwrap();

    assert_eq!(outcome.triples.len(), 1);
    assert!(outcome.description.contains("- 实体 2：联邦学习"));
    assert_eq!(generator.prompts.lock().unwrap().len(), 2);
}

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.log.format, LogFormat::Text);
    assert_eq!(config.enrichment.max_attempts, 3);
}
