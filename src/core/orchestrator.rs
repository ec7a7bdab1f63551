//! 编排器：驱动会话的状态机
//!
//! Running：取最后一轮已路由的接收方。接收方为 HumanProxy 时转入 AwaitingHuman，
//! 否则由该角色的应答方（FunctionExecutor 与已带完整函数调用的网关轮次则为 Dispatcher）产出内容并追加新一轮。
//! AwaitingHuman：等待一行人类输入，是整个系统唯一的阻塞点。
//! 每追加一轮都会检查终止条件与轮次上限；Terminated 为吸收态。

use crate::agents::ResponderSet;
use crate::backend::Dispatcher;
use crate::conversation::{ConversationLog, FunctionCall, RoleId, Turn, TurnContent};
use crate::core::{
    summarize, ConversationError, ConversationObserver, ConversationOutcome, ConversationState,
    HumanInput, RecoveryAction, RecoveryEngine, Router, TerminationPolicy, TerminationReason,
    NO_INPUT,
};

pub struct Orchestrator {
    pub(crate) router: Router,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) responders: ResponderSet,
    pub(crate) human: Box<dyn HumanInput>,
    pub(crate) termination: TerminationPolicy,
    pub(crate) recovery: RecoveryEngine,
    /// 小写、去空白后的退出信号
    pub(crate) exit_signals: Vec<String>,
    pub(crate) max_rounds: usize,
    pub(crate) log: ConversationLog,
    pub(crate) state: ConversationState,
    pub(crate) observer: Option<Box<dyn ConversationObserver>>,
}

impl Orchestrator {
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// 以人类的开场白启动会话并运行到终止
    pub async fn run(&mut self, opening: &str) -> Result<ConversationOutcome, ConversationError> {
        if self.log.is_empty() {
            let opening = opening.trim();
            let content = if opening.is_empty() { NO_INPUT } else { opening };
            self.append(RoleId::HumanProxy, TurnContent::text(content))?;
        }
        tracing::info!(max_rounds = self.max_rounds, "conversation started");

        loop {
            if let Some(outcome) = self.outcome() {
                tracing::info!(reason = %outcome.reason, turns = outcome.turns, "conversation terminated");
                return Ok(outcome);
            }
            self.step().await?;
        }
    }

    /// 推进一步；已终止时不做任何事
    pub async fn step(&mut self) -> Result<(), ConversationError> {
        match self.state {
            ConversationState::Terminated(_) => Ok(()),
            ConversationState::AwaitingHuman => self.await_human().await,
            ConversationState::Running => {
                let receiver = self
                    .log
                    .last()
                    .map(Turn::receiver)
                    .ok_or(ConversationError::EmptyConversation)?;
                if receiver == RoleId::HumanProxy {
                    self.state = ConversationState::AwaitingHuman;
                    return Ok(());
                }
                let content = self.produce(receiver).await?;
                self.append(receiver, content)
            }
        }
    }

    /// 终止后的结果；尚未终止时为 None
    pub fn outcome(&self) -> Option<ConversationOutcome> {
        let reason = self.state.termination_reason()?;
        Some(ConversationOutcome {
            reason: reason.clone(),
            summary: summarize(self.log.turns()),
            turns: self.log.len(),
        })
    }

    async fn await_human(&mut self) -> Result<(), ConversationError> {
        let prompt = self.log.last().cloned().ok_or(ConversationError::EmptyConversation)?;
        let line = self.human.read_line(&prompt).await?;

        let Some(line) = line else {
            tracing::info!("human input closed");
            self.state = ConversationState::Terminated(TerminationReason::HumanExit);
            return Ok(());
        };
        let line = line.trim();
        if self.exit_signals.iter().any(|s| s.eq_ignore_ascii_case(line)) {
            tracing::info!(signal = line, "human requested exit");
            self.state = ConversationState::Terminated(TerminationReason::HumanExit);
            return Ok(());
        }

        let content = if line.is_empty() { NO_INPUT } else { line };
        self.append(RoleId::HumanProxy, TurnContent::text(content))
    }

    /// 由接收方产出下一轮内容
    async fn produce(&mut self, role: RoleId) -> Result<TurnContent, ConversationError> {
        if role == RoleId::FunctionExecutor {
            let call = self
                .log
                .last()
                .and_then(|t| t.content().as_function_call())
                .ok_or_else(|| {
                    ConversationError::MalformedFunctionCall(
                        "routed to function executor without a function call".to_string(),
                    )
                });
            return call.and_then(|c| self.dispatch(&c)).or_else(|e| self.recover(e));
        }

        // 寻址网关的轮次若已是完整的函数调用，网关不再转述，直接执行并以网关名义回报
        if role == RoleId::BackendGateway {
            if let Some(call) = self.log.last().and_then(|t| t.content().as_function_call()) {
                return self.dispatch(&call).or_else(|e| self.recover(e));
            }
        }

        let responder = self
            .responders
            .get(role)
            .cloned()
            .ok_or(ConversationError::UnboundRole(role))?;
        let content = match responder.respond(self.log.turns()).await {
            Ok(content) => content,
            Err(e) => return self.recover(e),
        };

        // TicketIssuer 直接面向工单后端：其函数调用就地执行，结果作为它自己的一轮
        match content.as_function_call() {
            Some(call) if role == RoleId::TicketIssuer => {
                self.dispatch(&call).or_else(|e| self.recover(e))
            }
            _ => Ok(content),
        }
    }

    fn dispatch(&self, call: &FunctionCall) -> Result<TurnContent, ConversationError> {
        let record = self.dispatcher.execute(call)?;
        Ok(TurnContent::Text(record.to_content()))
    }

    fn recover(&self, err: ConversationError) -> Result<TurnContent, ConversationError> {
        match self.recovery.handle(&err) {
            RecoveryAction::SurfaceAsTurn(message) => {
                tracing::warn!(error = %err, "surfacing error as turn");
                Ok(TurnContent::Text(message))
            }
            RecoveryAction::Abort => {
                tracing::error!(error = %err, "aborting conversation");
                Err(err)
            }
        }
    }

    /// 路由并追加一轮，然后检查终止条件
    fn append(&mut self, sender: RoleId, content: TurnContent) -> Result<(), ConversationError> {
        let decision = self.router.resolve(sender, &content);
        let reason = self.termination.check(&content);
        let turn = Turn::new(sender, decision.receiver, content)?;
        let index = self.log.append(turn);
        if let (Some(observer), Some(turn)) = (self.observer.as_mut(), self.log.get(index)) {
            observer.on_turn(index, turn);
        }

        self.state = match reason {
            Some(reason) => ConversationState::Terminated(reason),
            None if self.log.len() >= self.max_rounds => {
                tracing::warn!(max_rounds = self.max_rounds, "round limit reached");
                ConversationState::Terminated(TerminationReason::RoundLimit {
                    max_rounds: self.max_rounds,
                })
            }
            None => ConversationState::Running,
        };
        Ok(())
    }
}
