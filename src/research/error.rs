use crate::llm::client::types::BackendError;
use crate::research::types::Node;

/// 调研失败，每个变体都能定位到失败的步骤
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("{node} failed: {source}")]
    Collaborator {
        node: Node,
        #[source]
        source: BackendError,
    },

    #[error("{node} returned output that does not match its schema: {message}")]
    SchemaValidation { node: Node, message: String },

    #[error("web_research branch {branch_id} for query \"{query}\" failed: {source}")]
    Branch {
        branch_id: usize,
        query: String,
        #[source]
        source: Box<ResearchError>,
    },

    #[error("web_research branch terminated abnormally: {message}")]
    BranchAborted { message: String },

    #[error("invalid research request: {reason}")]
    InvalidRequest { reason: String },
}

impl ResearchError {
    /// 将协作服务错误归类到对应步骤
    pub fn from_backend(node: Node, error: BackendError) -> Self {
        match error {
            BackendError::SchemaValidation { message } => {
                ResearchError::SchemaValidation { node, message }
            }
            other => ResearchError::Collaborator {
                node,
                source: other,
            },
        }
    }

    /// 失败的步骤
    pub fn node(&self) -> Option<Node> {
        match self {
            ResearchError::Collaborator { node, .. } => Some(*node),
            ResearchError::SchemaValidation { node, .. } => Some(*node),
            ResearchError::Branch { .. } | ResearchError::BranchAborted { .. } => {
                Some(Node::WebResearch)
            }
            ResearchError::InvalidRequest { .. } => None,
        }
    }
}
