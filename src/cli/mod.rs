use crate::config::{Config, DEFAULT_CONFIG_FILE, LLMProvider};
use crate::research::ResearchRequest;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Pro-Search-RS - 基于grounded search的迭代式调研引擎
#[derive(Parser, Debug)]
#[command(name = "pro-search-rs")]
#[command(
    about = "Iterative web research engine: generates search queries, researches them in parallel with grounded search, reflects on knowledge gaps and writes a cited answer."
)]
#[command(version)]
pub struct Args {
    /// 调研问题
    pub question: String,

    /// 初始检索查询数量
    #[arg(long)]
    pub initial_queries: Option<usize>,

    /// 最大反思轮数
    #[arg(long)]
    pub max_loops: Option<u32>,

    /// 推理模型，用于反思与最终回答
    #[arg(long)]
    pub reasoning_model: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// LLM Provider (gemini, openai)
    #[arg(long)]
    pub provider: Option<String>,

    /// 生成服务API KEY
    #[arg(long)]
    pub api_key: Option<String>,

    /// 生成服务API基地址，默认取provider的官方地址
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// grounded search使用的Gemini API KEY
    #[arg(long)]
    pub search_api_key: Option<String>,

    /// 单次模型调用超时（秒），0表示不限
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// 最大并发检索分支数
    #[arg(long)]
    pub max_parallels: Option<usize>,
}

impl Args {
    /// 将CLI参数转换为配置：配置文件 < 环境变量 < 命令行参数
    pub fn into_config(&self) -> Result<Config> {
        self.build_config(|name| std::env::var(name).ok())
    }

    pub(crate) fn build_config<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定的配置文件必须可读
            Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path))?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path).with_context(|| {
                    format!("无法读取默认配置文件 {:?}", default_config_path)
                })?
            } else {
                Config::default()
            }
        };

        config.apply_overrides_from(lookup);

        if let Some(provider_str) = &self.provider {
            config.llm.provider = provider_str
                .parse::<LLMProvider>()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        if let Some(api_key) = &self.api_key {
            config.llm.api_key = api_key.clone();
        }
        if let Some(api_base_url) = &self.api_base_url {
            config.llm.api_base_url = Some(api_base_url.clone());
        }
        if let Some(search_api_key) = &self.search_api_key {
            config.llm.search_api_key = search_api_key.clone();
        }
        if let Some(timeout_seconds) = self.timeout_seconds {
            config.llm.timeout_seconds = timeout_seconds;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.llm.max_parallels = max_parallels;
        }
        if let Some(initial_queries) = self.initial_queries {
            config.research.number_of_initial_queries = initial_queries;
        }
        if let Some(max_loops) = self.max_loops {
            config.research.max_research_loops = max_loops;
        }
        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }

    /// 构造调研请求，数量与轮数已合并进配置
    pub fn research_request(&self) -> ResearchRequest {
        ResearchRequest {
            question: self.question.clone(),
            initial_query_count: None,
            max_loops: None,
            reasoning_model: self.reasoning_model.clone(),
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
