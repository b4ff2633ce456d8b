//! CLI Commands
//!
//! Thin glue between the argument surface and the orchestrator: builds the
//! component stack from configuration, maps files to request content, and
//! renders reports. All generation semantics live in `crate::ai`.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::output::Output;
use crate::ai::client::GeminiClient;
use crate::ai::{GenerationCall, KeyPool, Orchestrator, ResilientCaller};
use crate::config::{Config, ConfigLoader};
use crate::types::{
    GenerationMode, GenerationReport, GenerationRequest, GenerationStatus, OutputLanguage,
    QuizError, RequestContent, Result,
};

/// Rendering format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Assemble the orchestrator stack from configuration
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let pool = Arc::new(KeyPool::new(config.keys.clone())?);
    info!(keys = pool.len(), model = %config.llm.model, "Credential pool ready");

    let client: Arc<dyn GenerationCall> = Arc::new(GeminiClient::new(config.client_config())?);
    let caller = ResilientCaller::new(pool, client);
    Ok(Orchestrator::new(caller, config.orchestrator_config()))
}

/// Generate from a raw topic string
pub async fn ask(
    config: &Config,
    topic: String,
    count: usize,
    mode: GenerationMode,
    language: OutputLanguage,
    format: ReportFormat,
) -> Result<GenerationStatus> {
    let orchestrator = build_orchestrator(config)?;
    let request =
        GenerationRequest::new(mode, count, RequestContent::Topic(topic)).with_language(language);

    let report = orchestrator.generate(request).await?;
    render_report(&report, format)?;
    Ok(report.status)
}

/// Generate from a document on disk
pub async fn file(
    config: &Config,
    path: &Path,
    count: usize,
    mode: GenerationMode,
    language: OutputLanguage,
    format: ReportFormat,
) -> Result<GenerationStatus> {
    let content = load_content(path)?;
    let orchestrator = build_orchestrator(config)?;
    let request = GenerationRequest::new(mode, count, content).with_language(language);

    let report = orchestrator.generate(request).await?;
    render_report(&report, format)?;
    Ok(report.status)
}

/// Show effective configuration and probe upstream reachability
pub async fn status(config: &Config) -> Result<()> {
    let out = Output::new();

    out.section("Configuration");
    out.info(&format!("model: {}", config.llm.model));
    out.info(&format!("api base: {}", config.llm.api_base));
    out.info(&format!(
        "items: {}..={} ({} per call)",
        config.generation.min_items, config.generation.max_items,
        config.generation.max_items_per_call
    ));
    out.info(&format!("failure policy: {:?}", config.generation.policy));

    let pool = Arc::new(KeyPool::new(config.keys.clone())?);
    out.info(&format!("keys configured: {}", pool.len()));

    out.section("Upstream");
    let client = GeminiClient::new(config.client_config())?;
    if client.health_check(pool.next()).await? {
        out.success("upstream reachable");
    } else {
        out.error("upstream unreachable");
    }

    Ok(())
}

/// Print the effective (merged) configuration
pub fn config_show(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| QuizError::config(format!("failed to render config: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

/// Print configuration file paths
pub fn config_path() {
    let out = Output::new();
    match ConfigLoader::global_config_path() {
        Some(path) => out.info(&format!("global: {}", path.display())),
        None => out.warning("global: not resolvable (HOME unset)"),
    }
    out.info(&format!(
        "project: {}",
        ConfigLoader::project_config_path().display()
    ));
}

/// Map a file on disk to request content
///
/// Plain-text formats are read as text (the extraction boundary); everything
/// else the upstream model accepts is passed through as inline binary.
pub fn load_content(path: &Path) -> Result<RequestContent> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" | "text" => {
            let text = std::fs::read_to_string(path)?;
            Ok(RequestContent::Text(text))
        }
        "pdf" => load_binary(path, "application/pdf"),
        "png" => load_binary(path, "image/png"),
        "jpg" | "jpeg" => load_binary(path, "image/jpeg"),
        "webp" => load_binary(path, "image/webp"),
        other => Err(QuizError::config(format!(
            "unsupported file type '{}' (txt, md, pdf, png, jpg, webp)",
            other
        ))),
    }
}

fn load_binary(path: &Path, media_type: &str) -> Result<RequestContent> {
    let data = std::fs::read(path)?;
    Ok(RequestContent::Binary {
        data,
        media_type: media_type.to_string(),
    })
}

/// Render a finished report to the terminal
fn render_report(report: &GenerationReport, format: ReportFormat) -> Result<()> {
    let out = Output::new();

    match format {
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        ReportFormat::Text => {
            out.section(&format!("{} ({})", report.mode.label(), report.request_id));
            for (i, item) in report.items.iter().enumerate() {
                render_item(&out, report.mode, i, item);
            }
            out.report_status(report);
        }
    }
    Ok(())
}

fn render_item(out: &Output, mode: GenerationMode, index: usize, item: &Value) {
    match mode {
        GenerationMode::Questions => {
            let question = item["q"].as_str().unwrap_or("<missing question>");
            println!("\n{}. {}", index + 1, question);
            if let Some(options) = item["options"].as_array() {
                let answer = item["answer"].as_u64().unwrap_or(u64::MAX) as usize;
                for (i, option) in options.iter().enumerate() {
                    let text = option.as_str().unwrap_or("");
                    if i == answer {
                        out.success(&format!("  {}", text));
                    } else {
                        println!("    {}", text);
                    }
                }
            }
        }
        GenerationMode::Summary => {
            let title = item["title"].as_str().unwrap_or("<untitled>");
            let body = item["body"].as_str().unwrap_or("");
            println!("\n{}. {}\n{}", index + 1, title, body);
        }
        GenerationMode::Flashcards => {
            let front = item["front"].as_str().unwrap_or("<blank>");
            let back = item["back"].as_str().unwrap_or("");
            println!("\n{}. {} — {}", index + 1, front, back);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_text_file_loads_as_text() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "mitochondria are the powerhouse").unwrap();

        let content = load_content(file.path()).unwrap();
        match content {
            RequestContent::Text(text) => assert!(text.contains("mitochondria")),
            other => panic!("expected text content, got {:?}", other),
        }
    }

    #[test]
    fn test_pdf_loads_as_binary() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();

        let content = load_content(file.path()).unwrap();
        match content {
            RequestContent::Binary { media_type, data } => {
                assert_eq!(media_type, "application/pdf");
                assert!(!data.is_empty());
            }
            other => panic!("expected binary content, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = load_content(Path::new("notes.docx")).unwrap_err();
        assert!(matches!(err, QuizError::Config(_)));
    }
}
