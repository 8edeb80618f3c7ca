//! 基于Gemini google_search工具的grounded search

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::config::LLMConfig;
use crate::llm::client::types::{BackendError, GroundingChunk, ModelSettings, SearchResponse};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<WebChunk>,
    #[serde(default)]
    grounding_supports: Vec<Support>,
}

#[derive(Debug, Default, Deserialize)]
struct WebChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Default, Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Support {
    segment: Option<Segment>,
    #[serde(default)]
    grounding_chunk_indices: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Segment {
    start_index: Option<usize>,
    end_index: Option<usize>,
}

/// Gemini grounded search客户端
#[derive(Clone)]
pub struct GroundedSearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout_seconds: u64,
}

impl GroundedSearchClient {
    pub fn new(config: &LLMConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_seconds));
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.search_api_base_url.trim_end_matches('/').to_string(),
            api_key: config.search_key().to_string(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    pub async fn search(
        &self,
        prompt: &str,
        settings: &ModelSettings,
    ) -> Result<SearchResponse, BackendError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, settings.model
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "tools": [{ "google_search": {} }],
            "generationConfig": { "temperature": settings.temperature },
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout {
                        seconds: self.timeout_seconds,
                    }
                } else {
                    BackendError::request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BackendError::request(format!(
                "search returned HTTP {}: {}",
                status, detail
            )));
        }

        let payload: GenerateContentResponse =
            response.json().await.map_err(BackendError::request)?;
        flatten_response(payload)
    }
}

/// 将Gemini响应展开为文本与逐条grounding记录
fn flatten_response(payload: GenerateContentResponse) -> Result<SearchResponse, BackendError> {
    let candidate = payload
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::request("search response contains no candidates"))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    let Some(metadata) = candidate.grounding_metadata else {
        return Ok(SearchResponse {
            text,
            grounding_chunks: Vec::new(),
        });
    };

    let mut grounding_chunks = Vec::new();
    for support in &metadata.grounding_supports {
        let Some(segment) = &support.segment else {
            continue;
        };
        let Some(end_index) = segment.end_index else {
            continue;
        };
        let start_offset = byte_to_char_offset(&text, segment.start_index.unwrap_or(0));
        let end_offset = byte_to_char_offset(&text, end_index);

        for &index in &support.grounding_chunk_indices {
            let Some(web) = metadata
                .grounding_chunks
                .get(index)
                .and_then(|chunk| chunk.web.as_ref())
            else {
                continue;
            };
            let Some(uri) = &web.uri else {
                continue;
            };
            grounding_chunks.push(GroundingChunk {
                start_offset,
                end_offset,
                source_label: source_label(web.title.as_deref().unwrap_or_default()),
                source_url: uri.clone(),
            });
        }
    }

    Ok(SearchResponse {
        text,
        grounding_chunks,
    })
}

/// Gemini返回UTF-8字节偏移，转换为字符偏移；越界的偏移保持越界
fn byte_to_char_offset(text: &str, byte_offset: usize) -> usize {
    if byte_offset > text.len() {
        return text.chars().count() + (byte_offset - text.len());
    }
    let mut boundary = byte_offset;
    while !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    text[..boundary].chars().count()
}

/// 来源标签：去掉域名形式标题的最后一段，如 "wikipedia.org" -> "wikipedia"
fn source_label(title: &str) -> String {
    let parts: Vec<&str> = title.split('.').collect();
    if parts.len() >= 2 && !parts[0].is_empty() {
        parts[0].to_string()
    } else {
        title.to_string()
    }
}
