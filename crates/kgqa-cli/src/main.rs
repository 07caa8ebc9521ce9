//! kgqa CLI - ask questions against a knowledge graph

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kgqa_core::assist::{AssistOutcome, GraphAssistant};
use kgqa_core::config::Config;
use kgqa_core::enrich::{Enricher, RetryPolicy};
use kgqa_core::graph::Neo4jClient;
use kgqa_core::llm::OllamaClient;
use kgqa_core::qa::{QaPipeline, QueryPlan};
use kgqa_core::session::{DEMO_QUESTIONS, QaSession, SessionReport};
use kgqa_core::storage::AnswerLog;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "kgqa")]
#[command(author, version, about = "Question answering over a knowledge graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one or more questions from the graph
    Ask {
        /// Questions, answered in order
        #[arg(required = true)]
        questions: Vec<String>,
        /// Follow up on the answers through the language model
        #[arg(short, long)]
        enrich: bool,
        /// Don't append to the answer log
        #[arg(long)]
        no_log: bool,
    },

    /// Run the sample questions followed by enrichment
    Demo {
        #[arg(long)]
        no_log: bool,
    },

    /// Show how a question would be answered, without contacting the graph
    Explain { question: String },

    /// Let the language model write the graph query
    Assist { question: String },

    /// Interactive question loop
    Repl {
        #[arg(short, long)]
        enrich: bool,
    },

    /// Show records from the answer log
    History {
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so answers on stdout stay machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("kgqa=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ask {
            questions,
            enrich,
            no_log,
        } => cmd_ask(questions.as_slice(), enrich, no_log, cli.format, cli.quiet).await,

        Commands::Demo { no_log } => cmd_ask(DEMO_QUESTIONS.as_slice(), true, no_log, cli.format, cli.quiet).await,

        Commands::Explain { question } => cmd_explain(&question, cli.format),

        Commands::Assist { question } => cmd_assist(&question, cli.format, cli.quiet).await,

        Commands::Repl { enrich } => cmd_repl(enrich, cli.quiet).await,

        Commands::History { limit } => cmd_history(limit, cli.format),

        Commands::Config { action } => cmd_config(action, cli.quiet),
    };

    if let Err(e) = &result
        && let Some(hint) = e
            .downcast_ref::<kgqa_core::Error>()
            .and_then(kgqa_core::Error::suggestion)
    {
        eprintln!("Hint: {}", hint);
    }
    result
}

// ============================================================================
// Composition root
// ============================================================================

async fn connect_graph(config: &Config) -> anyhow::Result<Arc<Neo4jClient>> {
    let password = config.graph.resolved_password()?;
    let client = Neo4jClient::connect(config.graph.clone(), password)
        .await
        .with_context(|| format!("Failed to connect to graph at {}", config.graph.uri))?;
    Ok(Arc::new(client))
}

fn build_session(
    config: &Config,
    graph: Arc<Neo4jClient>,
    log: Option<AnswerLog>,
) -> anyhow::Result<QaSession<Neo4jClient, OllamaClient>> {
    let llm = Arc::new(OllamaClient::new(config.llm.clone())?);

    let mut enricher = Enricher::new(llm)
        .with_retry(RetryPolicy::from(&config.enrichment))
        .with_dedup(config.enrichment.dedup);
    if let Some(log) = &log {
        enricher = enricher.with_log(log.clone());
    }

    let pipeline = QaPipeline::new(graph).with_query_style(config.graph.query_style);
    let mut session = QaSession::new(pipeline, enricher);
    if let Some(log) = log {
        session = session.with_log(log);
    }
    Ok(session)
}

fn answer_log(config: &Config) -> AnswerLog {
    AnswerLog::new(config.log.path.clone(), config.log.format)
}

/// Close the graph client once every other handle is gone
fn shutdown(graph: Arc<Neo4jClient>) {
    match Arc::try_unwrap(graph) {
        Ok(client) => client.close(),
        Err(_) => debug!("Graph client still shared at shutdown"),
    }
}

/// Run `op` against the graph, then shut the graph down whether or not
/// `op` failed. Handles cloned into `op` must be dropped by the time its
/// future completes.
async fn with_graph<T, F, Fut>(graph: Arc<Neo4jClient>, op: F) -> anyhow::Result<T>
where
    F: FnOnce(Arc<Neo4jClient>) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let result = op(graph.clone()).await;
    shutdown(graph);
    result
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_ask<Q: AsRef<str>>(
    questions: &[Q],
    enrich: bool,
    no_log: bool,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let graph = connect_graph(&config).await?;
    let log = (!no_log).then(|| answer_log(&config));

    let report = with_graph(graph, |graph| async move {
        let session = build_session(&config, graph, log)?;
        anyhow::Ok(session.run(questions, enrich).await?)
    })
    .await?;

    print_report(&report, format, quiet)
}

fn print_report(report: &SessionReport, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for outcome in &report.answers {
        if quiet {
            println!("{}", outcome.answer);
        } else {
            println!("Q: {}", outcome.question);
            println!("A: {}", outcome.answer);
            println!();
        }
    }

    if !report.followups.is_empty() && !quiet {
        println!("Follow-ups:");
        for followup in &report.followups {
            println!("  [{}] {}", followup.kind, followup.question);
            println!("  {}", followup.answer);
            println!();
        }
    }
    Ok(())
}

fn cmd_explain(question: &str, format: OutputFormat) -> anyhow::Result<()> {
    let plan = QueryPlan::for_question(question);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Intent: {}", plan.intent);
    println!("Entity: {}", plan.entity.as_deref().unwrap_or("(none)"));
    match &plan.query {
        Some(query) => {
            println!("Query:  {}", query.statement);
            for (name, value) in &query.parameters {
                println!("  ${} = {}", name, value);
            }
            println!("Inline: {}", query.inline());
        }
        None => println!("Query:  (none)"),
    }
    Ok(())
}

async fn cmd_assist(question: &str, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let graph = connect_graph(&config).await?;

    let outcome: AssistOutcome = with_graph(graph, |graph| async move {
        let llm = Arc::new(OllamaClient::new(config.llm.clone())?);
        anyhow::Ok(GraphAssistant::new(graph, llm).ask(question).await?)
    })
    .await?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if !quiet {
        println!("Query:");
        println!("  {}", outcome.query);
        println!();
        println!("Triples ({}):", outcome.triples.len());
        for triple in &outcome.triples {
            println!(
                "  {} -[{}]-> {}",
                triple.entity_1, triple.relation, triple.entity_2
            );
        }
        println!();
    }
    println!("{}", outcome.description);
    Ok(())
}

async fn cmd_repl(enrich: bool, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let graph = connect_graph(&config).await?;

    with_graph(graph, |graph| async move {
        let session = build_session(&config, graph, Some(answer_log(&config)))?;
        let mut editor = DefaultEditor::new()?;

        if !quiet {
            println!("kgqa interactive mode. Type 'exit' or Ctrl-D to quit.");
        }

        loop {
            match editor.readline("kgqa> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line == "exit" || line == "quit" {
                        break;
                    }
                    let _ = editor.add_history_entry(line);

                    let report = session.run(&[line], enrich).await?;
                    print_report(&report, OutputFormat::Text, quiet)?;
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }
        anyhow::Ok(())
    })
    .await?;

    info!("Leaving interactive mode");
    Ok(())
}

fn cmd_history(limit: Option<usize>, format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::load()?;
    let log = answer_log(&config);
    let records = log
        .records()
        .with_context(|| format!("Failed to read answer log {}", log.path().display()))?;

    let skip = limit.map_or(0, |n| records.len().saturating_sub(n));
    let records = &records[skip..];

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("(No answers logged yet)");
    }
    for record in records {
        println!("{}", record.to_text());
        println!();
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.validate()?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
