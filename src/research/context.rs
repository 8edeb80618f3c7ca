use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::citation::SourceResolver;
use crate::config::Config;
use crate::llm::ResearchBackend;
use crate::llm::client::types::BackendError;
use crate::research::error::ResearchError;
use crate::research::types::Node;

/// 一次调研的执行上下文，随调研结束一起释放
pub struct ResearchContext<B: ResearchBackend> {
    /// 生成与检索服务
    pub backend: Arc<B>,
    /// 配置
    pub config: Config,
    /// 本次调研共享的短链接解析器
    pub resolver: Arc<SourceResolver>,
    /// 调研ID，仅用于日志
    pub run_id: Uuid,
}

impl<B: ResearchBackend> Clone for ResearchContext<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            config: self.config.clone(),
            resolver: self.resolver.clone(),
            run_id: self.run_id,
        }
    }
}

impl<B: ResearchBackend> ResearchContext<B> {
    pub fn new(backend: Arc<B>, config: Config) -> Self {
        Self {
            backend,
            config,
            resolver: Arc::new(SourceResolver::new()),
            run_id: Uuid::new_v4(),
        }
    }

    /// 单次调用的截止时间，0表示不限
    pub fn call_deadline(&self) -> Option<Duration> {
        match self.config.llm.timeout_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }

    /// 在截止时间内执行一次协作服务调用，超时与调用失败同等处理
    pub async fn call<T, F>(&self, node: Node, call: F) -> Result<T, ResearchError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        let result = match self.call_deadline() {
            Some(deadline) => match tokio::time::timeout(deadline, call).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::Timeout {
                    seconds: deadline.as_secs(),
                }),
            },
            None => call.await,
        };

        result.map_err(|error| ResearchError::from_backend(node, error))
    }
}
