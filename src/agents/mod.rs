//! 角色应答方：Responder 抽象、LLM 应答方、剧本应答方、指令文本与回复模板

pub mod playbook;
pub mod prompts;
pub mod responder;
pub mod templates;

pub use playbook::{playbook_responders, PlaybookGateway, PlaybookSpecialist, PlaybookTicketIssuer};
pub use prompts::system_prompt;
pub use responder::{LlmResponder, Responder, ResponderSet};
pub use templates::{completion_markers, Template};
