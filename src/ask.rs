//! `vsearch ask` and `vsearch annotate` command implementations.

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::annotate::annotate;
use crate::backend::{SearchBackend, VectaraBackend};
use crate::config::Config;
use crate::models::{SearchResult, SearchStatus, Segment};
use crate::render::{citations, to_html, to_terminal};
use crate::store::ResultStore;
use crate::submitter::QuerySubmitter;

/// Output format for rendered summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Html,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "Unknown format: {}. Use text, html, or json.",
                other
            )),
        }
    }
}

pub async fn run_ask(config: &Config, query: &str, format: OutputFormat) -> Result<()> {
    let backend = VectaraBackend::new(&config.backend, &config.query)?;
    let result = ask(config, Arc::new(backend), query).await?;
    print_result(query, &result, format)
}

/// Submits `query` and waits for it to settle.
///
/// The wait is bounded slightly above the HTTP timeout, so a hung backend
/// surfaces as an error rather than blocking forever.
pub async fn ask(
    config: &Config,
    backend: Arc<dyn SearchBackend>,
    query: &str,
) -> Result<SearchResult> {
    let store = Arc::new(ResultStore::new());
    let submitter = QuerySubmitter::new(store.clone(), backend);

    submitter.submit(query)?;

    let limit = Duration::from_secs(config.backend.timeout_secs + 5);
    let result = store.wait_settled(query, limit).await;
    if result.status == SearchStatus::Loading {
        bail!("search did not finish within {}s", limit.as_secs());
    }
    Ok(result)
}

fn print_result(query: &str, result: &SearchResult, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let segments = (result.status == SearchStatus::Loaded).then(|| annotate(&result.summary));
        let out = serde_json::json!({
            "query": query,
            "result": result,
            "segments": segments,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return ensure_loaded(result);
    }

    ensure_loaded(result)?;

    let segments = annotate(&result.summary);
    match format {
        OutputFormat::Html => println!("{}", to_html(&segments)),
        _ => {
            println!("{}", to_terminal(&segments));

            let cited = citations(&segments, &result.references, &result.documents);
            if !cited.is_empty() {
                println!();
                println!("Sources:");
            }
            for c in cited {
                let title = c
                    .document
                    .map(|d| d.metadata_value("title").unwrap_or(&d.id))
                    .unwrap_or("-");
                println!("  [{}] {} (score: {:.2})", c.number, title, c.snippet.score);
                println!("      {}", c.snippet.text.trim());
            }
        }
    }

    Ok(())
}

/// Fails with the stored detail when the search ended in `error`.
fn ensure_loaded(result: &SearchResult) -> Result<()> {
    if result.status == SearchStatus::Error {
        bail!(
            "Search failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Prints the annotation of `text` without contacting any backend.
pub fn run_annotate(text: &str, format: OutputFormat) -> Result<()> {
    let segments = annotate(text);
    match format {
        OutputFormat::Text => {
            for segment in &segments {
                match segment {
                    Segment::PlainText { content } => {
                        println!("text  {:?}", content)
                    }
                    Segment::ReferenceLink { label, target } => {
                        println!("link  {} -> {}", label, target)
                    }
                }
            }
        }
        OutputFormat::Html => println!("{}", to_html(&segments)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&segments)?),
    }
    Ok(())
}
