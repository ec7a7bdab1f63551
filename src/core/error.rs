//! 对话错误类型与恢复动作
//!
//! 与 RecoveryEngine 配合：根据 ConversationError 决定写回对话（SurfaceAsTurn）还是终止（Abort）。

use thiserror::Error;

use crate::conversation::RoleId;
use crate::llm::LlmError;

/// 路由、调度、应答过程中可能出现的错误
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Missing argument `{argument}` for operation {operation}")]
    MissingArgument { operation: String, argument: String },

    #[error("Invalid argument `{argument}` for operation {operation}: {value}")]
    InvalidArgument {
        operation: String,
        argument: String,
        value: String,
    },

    #[error("Backend failure in {operation}: {message}")]
    BackendFailure { operation: String, message: String },

    #[error("Malformed function call: {0}")]
    MalformedFunctionCall(String),

    #[error("Turn addressed to its own sender: {0}")]
    SelfAddressed(RoleId),

    #[error("No responder bound to role {0}")]
    UnboundRole(RoleId),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Human input error: {0}")]
    HumanInput(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Conversation has no turns")]
    EmptyConversation,
}

impl ConversationError {
    /// 调度/后端层面的错误（对单次调用不可恢复，但不影响对话继续）
    pub fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            ConversationError::UnknownOperation(_)
                | ConversationError::MissingArgument { .. }
                | ConversationError::InvalidArgument { .. }
                | ConversationError::BackendFailure { .. }
                | ConversationError::MalformedFunctionCall(_)
        )
    }
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 以错误内容轮次写回对话，路由照常继续
    SurfaceAsTurn(String),
    /// 终止本次会话并把错误交给调用方
    Abort,
}
