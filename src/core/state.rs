//! 编排器状态机：Running / AwaitingHuman / Terminated

use std::fmt;

use serde::Serialize;

/// 会话终止原因
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum TerminationReason {
    /// 人类输入了退出信号
    HumanExit,
    /// 内容包含显式停止信号
    StopSignal(String),
    /// 内容包含结束模板的特征句
    Completed(String),
    /// 超出最大轮次（未完成）
    RoundLimit { max_rounds: usize },
}

impl TerminationReason {
    /// 是否属于正常结束（而非轮次耗尽）
    pub fn is_complete(&self) -> bool {
        !matches!(self, TerminationReason::RoundLimit { .. })
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::HumanExit => write!(f, "ended by user"),
            TerminationReason::StopSignal(signal) => write!(f, "stop signal `{signal}`"),
            TerminationReason::Completed(_) => write!(f, "resolved"),
            TerminationReason::RoundLimit { max_rounds } => {
                write!(f, "incomplete - round limit reached ({max_rounds} turns)")
            }
        }
    }
}

/// 编排器所处阶段；Terminated 为吸收态
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ConversationState {
    Running,
    AwaitingHuman,
    Terminated(TerminationReason),
}

impl ConversationState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, ConversationState::Terminated(_))
    }

    pub fn termination_reason(&self) -> Option<&TerminationReason> {
        match self {
            ConversationState::Terminated(reason) => Some(reason),
            _ => None,
        }
    }
}
