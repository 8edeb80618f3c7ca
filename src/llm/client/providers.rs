//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::{Prompt, PromptError},
    extractor::{ExtractionError, Extractor},
    providers::gemini::completion::gemini_api_types::{AdditionalParameters, GenerationConfig},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{LLMConfig, LLMProvider};
use crate::llm::client::types::{BackendError, ModelSettings};

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    Gemini(rig::providers::gemini::Client),
    OpenAI(rig::providers::openai::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        match config.provider {
            LLMProvider::Gemini => {
                let client =
                    rig::providers::gemini::Client::builder(config.generation_api_key())
                        .base_url(config.generation_base_url())
                        .build()?;
                Ok(ProviderClient::Gemini(client))
            }
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(config.generation_api_key())
                    .base_url(config.generation_base_url())
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
        }
    }

    /// 创建不带工具的Agent
    pub fn create_agent(
        &self,
        system_prompt: &str,
        settings: &ModelSettings,
        config: &LLMConfig,
    ) -> Result<ProviderAgent, BackendError> {
        match self {
            ProviderClient::Gemini(client) => {
                let agent = client
                    .agent(&settings.model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(settings.temperature)
                    .additional_params(gemini_params(settings.temperature)?)
                    .build();
                Ok(ProviderAgent::Gemini(agent))
            }
            ProviderClient::OpenAI(client) => {
                let agent = client
                    .completion_model(&settings.model)
                    .completions_api()
                    .into_agent_builder()
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(settings.temperature)
                    .build();
                Ok(ProviderAgent::OpenAI(agent))
            }
        }
    }

    /// 创建Extractor
    pub fn create_extractor<T>(
        &self,
        system_prompt: &str,
        settings: &ModelSettings,
        config: &LLMConfig,
    ) -> Result<ProviderExtractor<T>, BackendError>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        match self {
            ProviderClient::Gemini(client) => {
                let extractor = client
                    .extractor::<T>(&settings.model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .additional_params(gemini_params(settings.temperature)?)
                    .build();
                Ok(ProviderExtractor::Gemini(extractor))
            }
            ProviderClient::OpenAI(client) => {
                let extractor = client
                    .extractor_completions_api::<T>(&settings.model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                Ok(ProviderExtractor::OpenAI(extractor))
            }
        }
    }
}

fn gemini_params(temperature: f64) -> Result<serde_json::Value, BackendError> {
    let gen_cfg = GenerationConfig {
        temperature: Some(temperature),
        ..Default::default()
    };
    let cfg = AdditionalParameters::default().with_config(gen_cfg);
    serde_json::to_value(cfg).map_err(BackendError::request)
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    Gemini(Agent<rig::providers::gemini::completion::CompletionModel>),
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
}

impl ProviderAgent {
    /// 执行prompt
    pub async fn prompt(&self, prompt: &str) -> Result<String, PromptError> {
        match self {
            ProviderAgent::Gemini(agent) => agent.prompt(prompt).await,
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await,
        }
    }
}

/// 统一的Extractor枚举
pub enum ProviderExtractor<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
{
    Gemini(Extractor<rig::providers::gemini::completion::CompletionModel, T>),
    OpenAI(Extractor<rig::providers::openai::CompletionModel, T>),
}

impl<T> ProviderExtractor<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
{
    /// 执行提取
    pub async fn extract(&self, prompt: &str) -> Result<T, ExtractionError> {
        match self {
            ProviderExtractor::Gemini(extractor) => extractor.extract(prompt).await,
            ProviderExtractor::OpenAI(extractor) => extractor.extract(prompt).await,
        }
    }
}

/// 区分“输出不符合Schema”与其他调用失败
pub fn classify_extraction_error(error: ExtractionError) -> BackendError {
    match error {
        ExtractionError::NoData => BackendError::schema("model returned no structured data"),
        ExtractionError::DeserializationError(e) => BackendError::schema(e),
        other => BackendError::request(other),
    }
}
