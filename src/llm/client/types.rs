use serde::{Deserialize, Serialize};

/// 单次模型调用的参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// 模型名称
    pub model: String,
    /// 温度
    pub temperature: f64,
}

impl ModelSettings {
    pub fn new(model: impl Into<String>, temperature: f64) -> Self {
        Self {
            model: model.into(),
            temperature,
        }
    }
}

/// 检索后端返回的一条grounding记录，偏移量为字符位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    pub start_offset: usize,
    pub end_offset: usize,
    pub source_label: String,
    pub source_url: String,
}

/// 带grounding元数据的检索结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub text: String,
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// 协作服务（生成、检索）调用失败
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed: {message}")]
    Request { message: String },

    #[error("backend call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("structured output does not match the expected schema: {message}")]
    SchemaValidation { message: String },
}

impl BackendError {
    pub fn request(message: impl std::fmt::Display) -> Self {
        BackendError::Request {
            message: message.to_string(),
        }
    }

    pub fn schema(message: impl std::fmt::Display) -> Self {
        BackendError::SchemaValidation {
            message: message.to_string(),
        }
    }
}
