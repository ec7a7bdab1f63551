//! 应答方抽象与 LLM 应答方
//!
//! 编排器把应答方当黑盒：给定完整对话历史，返回纯文本或函数调用。
//! 每个角色在构造时绑定一个应答方，之后不再更换。

use std::sync::Arc;

use async_trait::async_trait;

use crate::conversation::{RoleId, Turn, TurnContent};
use crate::core::ConversationError;
use crate::llm::{LlmClient, Message};

#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, history: &[Turn]) -> Result<TurnContent, ConversationError>;
}

/// 角色 -> 应答方绑定（Specialist / BackendGateway / TicketIssuer）
#[derive(Clone)]
pub struct ResponderSet {
    specialist: Arc<dyn Responder>,
    gateway: Arc<dyn Responder>,
    ticket_issuer: Arc<dyn Responder>,
}

impl ResponderSet {
    pub fn new(
        specialist: Arc<dyn Responder>,
        gateway: Arc<dyn Responder>,
        ticket_issuer: Arc<dyn Responder>,
    ) -> Self {
        Self {
            specialist,
            gateway,
            ticket_issuer,
        }
    }

    /// HumanProxy 与 FunctionExecutor 不由应答方驱动，返回 None
    pub fn get(&self, role: RoleId) -> Option<&Arc<dyn Responder>> {
        match role {
            RoleId::Specialist => Some(&self.specialist),
            RoleId::BackendGateway => Some(&self.gateway),
            RoleId::TicketIssuer => Some(&self.ticket_issuer),
            RoleId::HumanProxy | RoleId::FunctionExecutor => None,
        }
    }
}

/// 由 LLM 驱动的应答方：自己的轮次作为 assistant，其他角色的轮次作为带发送方前缀的 user
pub struct LlmResponder {
    role: RoleId,
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl LlmResponder {
    pub fn new(role: RoleId, llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            role,
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    fn to_messages(&self, history: &[Turn]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        for turn in history {
            let content = turn.content().render();
            if turn.sender() == self.role {
                messages.push(Message::assistant(content.into_owned()));
            } else {
                messages.push(Message::user(format!("[{}] {}", turn.sender(), content)));
            }
        }
        messages
    }
}

#[async_trait]
impl Responder for LlmResponder {
    async fn respond(&self, history: &[Turn]) -> Result<TurnContent, ConversationError> {
        let output = self.llm.complete(&self.to_messages(history)).await?;
        // Specialist 的输出保留原文，寻址标记要留给路由器
        Ok(match self.role {
            RoleId::Specialist => TurnContent::text(output.trim()),
            _ => TurnContent::parse(&output),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLlmClient, Role};

    #[tokio::test]
    async fn test_llm_responder_parses_function_call() {
        let llm = Arc::new(MockLlmClient::with_replies([
            "FUNCTION_CALL:check_listing_status\n{\"listing_id\": \"FSN1\"}",
        ]));
        let responder = LlmResponder::new(RoleId::BackendGateway, llm.clone(), "gateway");
        let history = vec![
            Turn::new(RoleId::Specialist, RoleId::BackendGateway, "@gateway listing_status:FSN1").unwrap(),
        ];

        let content = responder.respond(&history).await.unwrap();
        let call = content.as_function_call().unwrap();
        assert_eq!(call.name, "check_listing_status");
        assert_eq!(call.arg("listing_id"), Some("FSN1"));

        let sent = &llm.requests()[0];
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[1].content, "[SIA] @gateway listing_status:FSN1");
    }

    #[tokio::test]
    async fn test_own_turns_are_assistant_messages() {
        let llm = Arc::new(MockLlmClient::with_replies(["Please provide your listing ID."]));
        let responder = LlmResponder::new(RoleId::Specialist, llm.clone(), "sia");
        let history = vec![
            Turn::new(RoleId::HumanProxy, RoleId::Specialist, "hi").unwrap(),
            Turn::new(RoleId::Specialist, RoleId::HumanProxy, "Please provide your seller ID.").unwrap(),
            Turn::new(RoleId::HumanProxy, RoleId::Specialist, "S1").unwrap(),
        ];

        let content = responder.respond(&history).await.unwrap();
        assert_eq!(content, TurnContent::text("Please provide your listing ID."));
        let sent = &llm.requests()[0];
        assert_eq!(sent[2].role, Role::Assistant);
        assert_eq!(sent[3].content, "[User] S1");
    }

    #[tokio::test]
    async fn test_specialist_keeps_addressed_call_as_text() {
        let raw = "@gateway FUNCTION_CALL:check_account_status {\"seller_id\": \"S1\"}";
        let llm = Arc::new(MockLlmClient::with_replies([raw]));
        let responder = LlmResponder::new(RoleId::Specialist, llm, "sia");
        let history = vec![Turn::new(RoleId::HumanProxy, RoleId::Specialist, "S1").unwrap()];

        let content = responder.respond(&history).await.unwrap();
        assert_eq!(content, TurnContent::text(raw));
        assert_eq!(content.as_function_call().unwrap().name, "check_account_status");
    }
}
