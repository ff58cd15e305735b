//! Search backend abstraction and the Vectara implementation.
//!
//! Defines the [`SearchBackend`] trait and its concrete implementation:
//! - **[`VectaraBackend`]** — calls the Vectara `v1/query` API with a
//!   single summarized query per call.
//!
//! Also provides the pure helpers used by the implementation:
//! - [`build_request_body`] — the JSON query envelope for one query
//! - [`parse_response`] — bounds-checked extraction of the summary,
//!   response snippets, and documents of the first result set
//!
//! # Failure Policy
//!
//! Every call performs exactly one HTTP request. There is no retry:
//! - Network errors and timeouts → [`SearchError::Network`]
//! - Non-2xx status → [`SearchError::Network`] carrying the status and body
//! - Unexpected JSON shape → [`SearchError::Parse`]

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::{BackendConfig, QueryConfig};
use crate::error::{Result, SearchError};
use crate::models::{ResponseSnippet, SearchAnswer, SourceDocument};

/// A remote service that answers a query with a summary and its sources.
///
/// The submitter only depends on this trait, so tests and alternative
/// deployments can provide their own implementation.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short identifier used in log lines.
    fn name(&self) -> &str;

    /// Runs one query. Called from a background task.
    async fn search(&self, query: &str) -> Result<SearchAnswer>;
}

// ============ Vectara Backend ============

/// Backend calling the Vectara query API.
///
/// Sends `POST {endpoint}` with the `x-api-key` and `customer-id` headers.
/// The API key comes from `VECTARA_API_KEY` or `backend.api_key`.
pub struct VectaraBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    customer_id: u64,
    corpus_id: u64,
    query: QueryConfig,
}

impl VectaraBackend {
    /// Create a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured or the HTTP client
    /// cannot be built.
    pub fn new(backend: &BackendConfig, query: &QueryConfig) -> anyhow::Result<Self> {
        let api_key = backend.resolve_api_key().ok_or_else(|| {
            anyhow::anyhow!(
                "no API key: set {} or backend.api_key",
                crate::config::API_KEY_ENV
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(backend.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: backend.endpoint.clone(),
            api_key,
            customer_id: backend.customer_id,
            corpus_id: backend.corpus_id,
            query: query.clone(),
        })
    }
}

#[async_trait]
impl SearchBackend for VectaraBackend {
    fn name(&self) -> &str {
        "vectara"
    }

    async fn search(&self, query: &str) -> Result<SearchAnswer> {
        let body = build_request_body(query, self.customer_id, self.corpus_id, &self.query);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("x-api-key", &self.api_key)
            .header("customer-id", self.customer_id.to_string())
            .json(&body)
            .send()
            .await
            .map_err(describe_transport_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::Network(format!("failed to read response body: {}", e)))?;

        tracing::debug!(status = %status, body = %text, "search backend response");

        if !status.is_success() {
            return Err(SearchError::Network(format!(
                "search API error {}: {}",
                status,
                text.trim()
            )));
        }

        parse_response(&text)
    }
}

fn describe_transport_error(e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        SearchError::Network(format!("request timed out: {}", e))
    } else if e.is_connect() {
        SearchError::Network(format!("connection failed: {}", e))
    } else {
        SearchError::Network(e.to_string())
    }
}

/// Build the query envelope for a single query.
pub fn build_request_body(query: &str, customer_id: u64, corpus_id: u64, q: &QueryConfig) -> Value {
    serde_json::json!({
        "query": [{
            "query": query,
            "queryContext": "",
            "start": 0,
            "numResults": q.num_results,
            "contextConfig": {
                "charsBefore": q.chars_before,
                "charsAfter": q.chars_after,
                "sentencesBefore": q.sentences_before,
                "sentencesAfter": q.sentences_after,
            },
            "rerankingConfig": {
                "rerankerId": q.reranker_id,
                "mmrConfig": { "diversityBias": q.diversity_bias },
            },
            "corpusKey": [{
                "customerId": customer_id,
                "corpusId": corpus_id,
                "semantics": 0,
                "metadataFilter": "",
                "lexicalInterpolationConfig": { "lambda": q.lambda },
                "dim": [],
            }],
            "summary": [{
                "maxSummarizedResults": q.max_summarized_results,
                "responseLang": q.response_lang,
                "summarizerPromptName": q.summarizer_prompt_name,
            }],
        }]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    response_set: Vec<ResponseSet>,
}

#[derive(Debug, Deserialize)]
struct ResponseSet {
    #[serde(default)]
    response: Vec<ResponseSnippet>,
    #[serde(default)]
    document: Vec<SourceDocument>,
    #[serde(default)]
    summary: Vec<SummaryText>,
}

#[derive(Debug, Deserialize)]
struct SummaryText {
    #[serde(default)]
    text: String,
}

/// Parse a query API response body.
///
/// Reads `responseSet[0].summary[0].text`, `responseSet[0].response`, and
/// `responseSet[0].document`. Everything else is ignored.
pub fn parse_response(body: &str) -> Result<SearchAnswer> {
    let parsed: QueryResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::Parse(format!("malformed JSON: {}", e)))?;

    let set = parsed
        .response_set
        .into_iter()
        .next()
        .ok_or_else(|| SearchError::Parse("responseSet is empty".to_string()))?;

    let summary = set
        .summary
        .into_iter()
        .next()
        .ok_or_else(|| SearchError::Parse("responseSet[0].summary is empty".to_string()))?;

    Ok(SearchAnswer {
        summary: summary.text,
        references: set.response,
        documents: set.document,
    })
}
