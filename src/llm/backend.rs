//! 研究引擎依赖的外部协作服务接口

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};

use crate::llm::client::types::{BackendError, ModelSettings, SearchResponse};

/// 生成与检索服务的统一接口，引擎只通过它访问模型。
///
/// 重试、退避等策略属于实现方的职责，引擎本身不做重试。
#[async_trait]
pub trait ResearchBackend: Send + Sync + 'static {
    /// 按照`T`的JSON Schema生成结构化输出
    async fn generate_structured<T>(
        &self,
        prompt: &str,
        settings: &ModelSettings,
    ) -> Result<T, BackendError>
    where
        T: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static;

    /// 生成纯文本
    async fn generate_text(
        &self,
        prompt: &str,
        settings: &ModelSettings,
    ) -> Result<String, BackendError>;

    /// 带grounding的网络检索
    async fn search(
        &self,
        query: &str,
        settings: &ModelSettings,
    ) -> Result<SearchResponse, BackendError>;
}
