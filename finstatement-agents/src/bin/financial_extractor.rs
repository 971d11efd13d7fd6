use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use finstatement_agents::financial_extractor::{FinancialExtractorAgent, DEFAULT_MODEL};
use finstatement_agents::llm::gemini::GeminiClient;
use finstatement_agents::llm::LlmClient;
use finstatement_agents::storage::{AgentStorage, InMemoryAgentStorage, SqliteAgentStorage};
use finstatement_agents::AgentsConfig;
use shared_types::ErrorResponse;

#[derive(Parser, Debug)]
#[command(
    name = "financial-extractor",
    about = "Extract revenue, COGS and net income (millions of USD) from a financial statement"
)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["text", "file", "eml_path"]),
))]
struct Cli {
    /// Statement text passed inline
    #[arg(long, group = "input")]
    text: Option<String>,

    /// Path to a plain-text file holding the statement
    #[arg(long, value_name = "PATH", group = "input")]
    file: Option<PathBuf>,

    /// Path to a .eml file whose body holds the statement
    #[arg(long, value_name = "PATH", group = "input")]
    eml_path: Option<PathBuf>,

    /// Override the Gemini model ID
    #[arg(long)]
    model: Option<String>,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Accept replies whose amounts are not well-formed decimal strings
    #[arg(long)]
    no_validate: bool,

    /// Keep the session log in memory instead of the SQLite database
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let (config, config_path) = match &cli.config {
        Some(path) => (AgentsConfig::load_from(path)?, path.clone()),
        None => AgentsConfig::load().context("Failed to load finstatement config")?,
    };

    let api_key = config.gemini_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "Missing gemini_api_key in config at {:?} (or set GEMINI_API_KEY)",
            config_path
        )
    })?;

    let text = match (&cli.text, &cli.file, &cli.eml_path) {
        (Some(text), None, None) => text.clone(),
        (None, Some(path), None) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read statement file at {:?}", path))?,
        (None, None, Some(path)) => load_statement_from_eml(path)?,
        _ => unreachable!("clap enforces exactly one input"),
    };

    let storage: Arc<dyn AgentStorage> = if cli.ephemeral {
        Arc::new(InMemoryAgentStorage::new())
    } else {
        let db_path = config.db_path()?;
        tracing::debug!(db_path = %db_path.display(), "Opening session log");
        Arc::new(SqliteAgentStorage::open(&db_path)?)
    };

    let llm_client: Arc<dyn LlmClient> = Arc::new(GeminiClient::with_options(
        api_key,
        config.gemini_base_url(),
        config.gemini_timeout(),
    )?);

    let model = cli
        .model
        .or_else(|| config.model())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let validate_output = config.validate_output() && !cli.no_validate;

    let agent = FinancialExtractorAgent::new(llm_client, storage, model)?
        .with_validation(validate_output);

    match agent.extract(&text).await {
        Ok(run) => {
            println!("{}", serde_json::to_string_pretty(&run.output)?);
            Ok(())
        }
        Err(err) => {
            let body = ErrorResponse {
                error: err.to_string(),
            };
            eprintln!("{}", serde_json::to_string(&body)?);
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_statement_from_eml(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read .eml file at {:?}", path))?;
    statement_from_eml(&bytes)
}

/// Subject and body of an e-mail, joined by a blank line
fn statement_from_eml(bytes: &[u8]) -> Result<String> {
    let parser = mail_parser::MessageParser::default();
    let parsed = parser
        .parse(bytes)
        .ok_or_else(|| anyhow::anyhow!("Failed to parse .eml file"))?;

    let subject = parsed.subject().map(|s| s.trim().to_string()).unwrap_or_default();
    let body = parsed
        .body_text(0)
        .map(|s| s.to_string())
        .or_else(|| parsed.body_html(0).map(|s| s.to_string()))
        .ok_or_else(|| anyhow::anyhow!("Email has no body text or HTML"))?;

    if subject.is_empty() {
        Ok(body)
    } else {
        Ok(format!("{}\n\n{}", subject, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN_EML: &str = "From: Investor Relations <ir@acme.example>\r\n\
To: analyst@example.com\r\n\
Subject: Acme Corp FY2023 results\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Revenue $120.456M, COGS $45.123M, Net Income $30.789M\r\n";

    #[test]
    fn test_joins_subject_and_body() {
        let statement = statement_from_eml(PLAIN_EML.as_bytes()).unwrap();
        assert!(statement.starts_with("Acme Corp FY2023 results\n\n"));
        assert!(statement.contains("Revenue $120.456M, COGS $45.123M, Net Income $30.789M"));
    }

    #[test]
    fn test_html_only_body() {
        let eml = "From: ir@acme.example\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<html><body><p>Revenue $120.456M</p></body></html>\r\n";

        let statement = statement_from_eml(eml.as_bytes()).unwrap();
        assert!(statement.contains("Revenue $120.456M"));
        assert!(!statement.contains("<p>"));
    }

    #[test]
    fn test_reads_eml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.eml");
        std::fs::write(&path, PLAIN_EML).unwrap();

        let statement = load_statement_from_eml(&path).unwrap();
        assert!(statement.contains("Net Income $30.789M"));

        assert!(load_statement_from_eml(&dir.path().join("missing.eml")).is_err());
    }
}
