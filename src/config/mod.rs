use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use crate::llm::client::types::ModelSettings;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "pro-search.toml";

const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "gemini")]
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::OpenAI => write!(f, "openai"),
        }
    }
}

impl LLMProvider {
    /// 未配置`api_base_url`时生成服务使用的地址
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::Gemini => GEMINI_API_BASE_URL,
            LLMProvider::OpenAI => "https://api.openai.com/v1",
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(LLMProvider::Gemini),
            "openai" => Ok(LLMProvider::OpenAI),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// LLM模型配置
    pub llm: LLMConfig,

    /// 调研流程配置
    pub research: ResearchConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// 生成服务的Provider类型，检索固定走Gemini的google_search
    pub provider: LLMProvider,

    /// 生成服务的API KEY，gemini provider下为空时使用`search_api_key`
    pub api_key: String,

    /// 生成服务API基地址，未配置时取provider的默认地址
    pub api_base_url: Option<String>,

    /// grounded search使用的Gemini API KEY，为空时gemini provider沿用`api_key`
    pub search_api_key: String,

    /// Gemini REST API基地址，用于grounded search
    pub search_api_base_url: String,

    /// 查询生成与网络检索使用的模型
    pub query_generator_model: String,

    /// 反思阶段使用的模型
    pub reflection_model: String,

    /// 最终回答使用的模型
    pub answer_model: String,

    /// 查询生成温度
    pub query_temperature: f64,

    /// 网络检索温度
    pub search_temperature: f64,

    /// 反思温度
    pub reflection_temperature: f64,

    /// 回答温度
    pub answer_temperature: f64,

    /// 最大tokens
    pub max_tokens: u32,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 单次调用的超时时间（秒）
    pub timeout_seconds: u64,

    /// 同一批次中同时执行的检索分支上限
    pub max_parallels: usize,
}

/// 调研流程配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ResearchConfig {
    /// 初始生成的检索查询数量
    pub number_of_initial_queries: usize,

    /// 最大反思轮数
    pub max_research_loops: u32,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 使用环境变量覆盖配置，变量名为字段名的大写形式
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// 使用任意来源覆盖配置，便于测试
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.llm.search_api_key.is_empty()
            && let Some(api_key) = non_empty("GEMINI_API_KEY")
        {
            self.llm.search_api_key = api_key;
        }
        if let Some(model) = non_empty("QUERY_GENERATOR_MODEL") {
            self.llm.query_generator_model = model;
        }
        if let Some(model) = non_empty("REFLECTION_MODEL") {
            self.llm.reflection_model = model;
        }
        if let Some(model) = non_empty("ANSWER_MODEL") {
            self.llm.answer_model = model;
        }
        if let Some(count) = non_empty("NUMBER_OF_INITIAL_QUERIES").and_then(|v| v.parse().ok()) {
            self.research.number_of_initial_queries = count;
        }
        if let Some(loops) = non_empty("MAX_RESEARCH_LOOPS").and_then(|v| v.parse().ok()) {
            self.research.max_research_loops = loops;
        }
    }
}

impl LLMConfig {
    /// 生成服务实际使用的API基地址
    pub fn generation_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    /// 生成服务实际使用的API KEY
    pub fn generation_api_key(&self) -> &str {
        match self.provider {
            LLMProvider::Gemini if self.api_key.is_empty() => &self.search_api_key,
            _ => &self.api_key,
        }
    }

    /// grounded search实际使用的Gemini API KEY；openai provider的key不会被发往Gemini
    pub fn search_key(&self) -> &str {
        match self.provider {
            LLMProvider::Gemini if self.search_api_key.is_empty() => &self.api_key,
            _ => &self.search_api_key,
        }
    }

    pub fn query_settings(&self) -> ModelSettings {
        ModelSettings::new(&self.query_generator_model, self.query_temperature)
    }

    pub fn search_settings(&self) -> ModelSettings {
        ModelSettings::new(&self.query_generator_model, self.search_temperature)
    }

    /// 反思模型，`reasoning_model`存在时优先
    pub fn reflection_settings(&self, reasoning_model: Option<&str>) -> ModelSettings {
        let model = reasoning_model.unwrap_or(&self.reflection_model);
        ModelSettings::new(model, self.reflection_temperature)
    }

    /// 回答模型，`reasoning_model`存在时优先
    pub fn answer_settings(&self, reasoning_model: Option<&str>) -> ModelSettings {
        let model = reasoning_model.unwrap_or(&self.answer_model);
        ModelSettings::new(model, self.answer_temperature)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: String::new(),
            api_base_url: None,
            search_api_key: String::new(),
            search_api_base_url: String::from(GEMINI_API_BASE_URL),
            query_generator_model: String::from("gemini-2.5-flash"),
            reflection_model: String::from("gemini-2.5-flash"),
            answer_model: String::from("gemini-2.5-pro"),
            query_temperature: 1.0,
            search_temperature: 0.0,
            reflection_temperature: 1.0,
            answer_temperature: 0.0,
            max_tokens: 8192,
            retry_attempts: 2,
            retry_delay_ms: 1000,
            timeout_seconds: 120,
            max_parallels: 8,
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            number_of_initial_queries: 3,
            max_research_loops: 2,
        }
    }
}
