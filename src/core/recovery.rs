//! 错误恢复引擎
//!
//! 根据 ConversationError 类型返回 RecoveryAction，供编排器决定把错误写回对话还是终止会话。

use crate::conversation::ERROR_PREFIX;
use crate::core::{ConversationError, RecoveryAction};

/// 调度类错误以可见的错误轮次写回对话；应答方、输入、配置错误终止会话
#[derive(Debug, Default)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, err: &ConversationError) -> RecoveryAction {
        if err.is_dispatch_error() {
            RecoveryAction::SurfaceAsTurn(format!("{ERROR_PREFIX} {err}"))
        } else {
            RecoveryAction::Abort
        }
    }
}
