//! 核心编排层：错误与恢复、路由、终止判定、状态机、编排器与结论提取

pub mod builder;
pub mod error;
pub mod human;
pub mod orchestrator;
pub mod outcome;
pub mod recovery;
pub mod router;
pub mod state;
pub mod termination;

pub use builder::{OrchestratorBuilder, DEFAULT_MAX_ROUNDS};
pub use error::{ConversationError, RecoveryAction};
pub use human::{ConversationObserver, HumanInput, ScriptedInput, NO_INPUT};
pub use orchestrator::Orchestrator;
pub use outcome::{summarize, ConversationOutcome, Summary};
pub use recovery::RecoveryEngine;
pub use router::{RouteCondition, RouteDecision, RouteRule, Router, RoutingTable};
pub use state::{ConversationState, TerminationReason};
pub use termination::TerminationPolicy;
