//! 对话数据模型：角色、轮次、只追加日志与持久化

pub mod log;
pub mod persistence;
pub mod turn;

pub use log::ConversationLog;
pub use persistence::TranscriptStore;
pub use turn::{
    parse_function_call, FunctionCall, RoleId, Turn, TurnContent, ERROR_PREFIX,
    FUNCTION_CALL_MARKER,
};
