//! 编排器构建器：统一组装路由、调度、应答方、人类输入与终止策略
//!
//! 控制台入口与测试共用同一套组装逻辑，只替换应答方与输入通道。

use crate::agents::{completion_markers, ResponderSet};
use crate::backend::{Dispatcher, OperationRegistry};
use crate::config::AppConfig;
use crate::conversation::ConversationLog;
use crate::core::{
    ConversationError, ConversationObserver, ConversationState, HumanInput, Orchestrator,
    RecoveryEngine, Router, RoutingTable, TerminationPolicy,
};

/// 默认轮次上限
pub const DEFAULT_MAX_ROUNDS: usize = 30;

pub struct OrchestratorBuilder {
    registry: OperationRegistry,
    routing: RoutingTable,
    responders: Option<ResponderSet>,
    human: Option<Box<dyn HumanInput>>,
    observer: Option<Box<dyn ConversationObserver>>,
    termination: TerminationPolicy,
    exit_signals: Vec<String>,
    max_rounds: usize,
    log: ConversationLog,
}

impl OrchestratorBuilder {
    /// 使用默认路由表、终止策略（结束模板特征句 + TERMINATE）与退出信号
    pub fn new(registry: OperationRegistry) -> Self {
        Self {
            registry,
            routing: RoutingTable::default(),
            responders: None,
            human: None,
            observer: None,
            termination: TerminationPolicy::new(vec!["TERMINATE".to_string()], completion_markers()),
            exit_signals: vec!["exit".to_string(), "quit".to_string()],
            max_rounds: DEFAULT_MAX_ROUNDS,
            log: ConversationLog::new(),
        }
    }

    /// 按 [app] / [routing] 配置段设置路由、终止、退出信号与轮次上限
    pub fn from_config(config: &AppConfig, registry: OperationRegistry) -> Self {
        let routing = &config.routing;
        let mut markers = completion_markers();
        markers.extend(routing.completion_markers.iter().cloned());

        Self::new(registry)
            .with_routing(routing.table())
            .with_termination(TerminationPolicy::new(routing.stop_signals.clone(), markers))
            .with_exit_signals(routing.exit_signals.clone())
            .with_max_rounds(config.app.max_rounds)
    }

    pub fn with_routing(mut self, routing: RoutingTable) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_responders(mut self, responders: ResponderSet) -> Self {
        self.responders = Some(responders);
        self
    }

    pub fn with_human_input(mut self, human: impl HumanInput + 'static) -> Self {
        self.human = Some(Box::new(human));
        self
    }

    pub fn with_observer(mut self, observer: impl ConversationObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn with_termination(mut self, termination: TerminationPolicy) -> Self {
        self.termination = termination;
        self
    }

    pub fn with_exit_signals(mut self, signals: Vec<String>) -> Self {
        self.exit_signals = signals
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    /// 至少为 1
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    /// 从已有日志（例如读回的会话记录）继续
    pub fn with_log(mut self, log: ConversationLog) -> Self {
        self.log = log;
        self
    }

    pub fn build(self) -> Result<Orchestrator, ConversationError> {
        let responders = self
            .responders
            .ok_or_else(|| ConversationError::Config("responders not set".to_string()))?;
        let human = self
            .human
            .ok_or_else(|| ConversationError::Config("human input not set".to_string()))?;

        Ok(Orchestrator {
            router: Router::new(self.routing),
            dispatcher: Dispatcher::new(self.registry),
            responders,
            human,
            termination: self.termination,
            recovery: RecoveryEngine::new(),
            exit_signals: self.exit_signals,
            max_rounds: self.max_rounds,
            log: self.log,
            state: ConversationState::Running,
            observer: self.observer,
        })
    }
}
