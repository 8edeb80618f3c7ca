//! LLM客户端 - 为调研引擎提供生成与检索服务

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use tracing::{debug, warn};

use crate::config::LLMConfig;
use crate::llm::backend::ResearchBackend;
use crate::prompts;

mod grounding;
mod providers;
pub mod types;

use grounding::GroundedSearchClient;
use providers::{ProviderClient, classify_extraction_error};
use types::{BackendError, ModelSettings, SearchResponse};

const SYSTEM_PROMPT: &str = "You are a careful research assistant.";

/// LLM客户端 - 结构化生成、文本生成与grounded search
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
    search: GroundedSearchClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.generation_api_key().trim().is_empty() {
            anyhow::bail!(
                "API key for the {} provider is not configured, set llm.api_key or --api-key",
                config.provider
            );
        }
        if config.search_key().trim().is_empty() {
            anyhow::bail!(
                "grounded search needs a Gemini API key, set GEMINI_API_KEY or llm.search_api_key"
            );
        }
        let client = ProviderClient::new(&config)?;
        let search = GroundedSearchClient::new(&config)?;
        Ok(Self {
            config,
            client,
            search,
        })
    }

    /// 通用重试逻辑，首次调用之外最多重试`retry_attempts`次
    async fn retry_with_backoff<T, F, Fut>(
        &self,
        operation: &str,
        call: F,
    ) -> Result<T, BackendError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let max_attempts = self.config.retry_attempts + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match call().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if attempt >= max_attempts {
                        return Err(err);
                    }
                    warn!(
                        "❌ 调用模型服务出错，重试中 ({} 第 {} / {} 次尝试): {}",
                        operation, attempt, max_attempts, err
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(
                        self.config.retry_delay_ms,
                    ))
                    .await;
                }
            }
        }
    }

    /// 数据提取方法
    pub async fn extract<T>(
        &self,
        prompt: &str,
        settings: &ModelSettings,
    ) -> Result<T, BackendError>
    where
        T: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static,
    {
        let extractor = self
            .client
            .create_extractor::<T>(SYSTEM_PROMPT, settings, &self.config)?;

        self.retry_with_backoff("extract", || async {
            extractor
                .extract(prompt)
                .await
                .map_err(classify_extraction_error)
        })
        .await
    }

    /// 单轮对话方法
    pub async fn prompt(
        &self,
        prompt: &str,
        settings: &ModelSettings,
    ) -> Result<String, BackendError> {
        let agent = self
            .client
            .create_agent(SYSTEM_PROMPT, settings, &self.config)?;

        self.retry_with_backoff("prompt", || async {
            agent.prompt(prompt).await.map_err(BackendError::request)
        })
        .await
    }
}

#[async_trait]
impl ResearchBackend for LLMClient {
    async fn generate_structured<T>(
        &self,
        prompt: &str,
        settings: &ModelSettings,
    ) -> Result<T, BackendError>
    where
        T: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static,
    {
        debug!("结构化生成，模型: {}", settings.model);
        self.extract::<T>(prompt, settings).await
    }

    async fn generate_text(
        &self,
        prompt: &str,
        settings: &ModelSettings,
    ) -> Result<String, BackendError> {
        debug!("文本生成，模型: {}", settings.model);
        self.prompt(prompt, settings).await
    }

    async fn search(
        &self,
        query: &str,
        settings: &ModelSettings,
    ) -> Result<SearchResponse, BackendError> {
        debug!("grounded search: {}", query);
        let prompt = prompts::web_searcher(query);
        self.retry_with_backoff("search", || self.search.search(&prompt, settings))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LLMProvider;

    fn openai_config() -> LLMConfig {
        LLMConfig {
            provider: LLMProvider::OpenAI,
            api_key: "sk-openai".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_openai_client_requires_gemini_search_key() {
        let error = LLMClient::new(openai_config()).err().unwrap();
        assert!(error.to_string().contains("GEMINI_API_KEY"));

        let config = LLMConfig {
            search_api_key: "gemini-key".to_string(),
            ..openai_config()
        };
        assert!(LLMClient::new(config).is_ok());
    }

    #[test]
    fn test_client_requires_generation_key() {
        let config = LLMConfig {
            provider: LLMProvider::OpenAI,
            search_api_key: "gemini-key".to_string(),
            ..Default::default()
        };
        let error = LLMClient::new(config).err().unwrap();
        assert!(error.to_string().contains("openai"));
    }
}
