//! 各角色的指令文本（LLM 应答方的 system prompt）
//!
//! 优先读取 config/prompts/<role>.txt，找不到时使用内置文本。网关指令会拼入后端操作清单与 FunctionCall schema。

use crate::backend::{function_call_schema_json, OperationRegistry};
use crate::conversation::RoleId;

const SPECIALIST_PROMPT: &str = "\
You are SIA, a Seller Integration Assistant helping a seller whose listing is blocked or inactive.
Follow these steps exactly:
1. When the user first connects, ask for their seller ID.
2. When the user provides the ID, reply only: \"@gateway account_status:[SELLER_ID]\"
3. After receiving the account status:
   - If ACTIVE, say exactly \"Your account is active. Please provide your listing ID.\"
   - If ONBOARDING or ON_HOLD, explain the status with the matching template and stop.
4. When the user provides a listing ID, reply only: \"@gateway listing_status:[LISTING_ID]\"
5. For BLOCKED listings reply \"@gateway block_reason:[LISTING_ID]\" and then:
   - SELLER_STATE_CHANGE: explain that no ticket is needed and stop.
   - POLICY_VIOLATION: \"@gateway override_status:[LISTING_ID]\"; if an override exists,
     \"@ticketing create_ticket:[SELLER_ID]:[LISTING_ID]:[REASON]\".
   - TRADEMARK_VIOLATION: ask for the brand ID, then \"@gateway brand_approval:[BRAND_ID]\".
     APPROVED -> raise a ticket; PENDING -> explain and stop;
     REJECTED -> \"@ticketing enroll:BRAND_ASSURE:[LISTING_ID]\".
6. Present ticket and enrollment results clearly to the user, then reply TERMINATE.";

const GATEWAY_PROMPT: &str = "\
You are the API Gateway. Translate each @gateway request into exactly one function call,
formatted exactly as:
FUNCTION_CALL:<operation_name>
{\"<argument>\": \"<value>\"}
Use only the operations listed below, with every required argument.";

const TICKET_ISSUER_PROMPT: &str = "\
You are the Ticket Agent. Translate each @ticketing request into exactly one function call:
- create_ticket:[SELLER_ID]:[LISTING_ID]:[REASON] ->
FUNCTION_CALL:create_support_ticket
{\"seller_id\": \"[SELLER_ID]\", \"listing_id\": \"[LISTING_ID]\", \"reason\": \"[REASON]\"}
- enroll:[PROGRAM_ID]:[LISTING_ID] ->
FUNCTION_CALL:enroll_brand_program
{\"program_id\": \"[PROGRAM_ID]\", \"listing_id\": \"[LISTING_ID]\"}";

fn prompt_file(role: RoleId) -> Option<&'static str> {
    match role {
        RoleId::Specialist => Some("specialist"),
        RoleId::BackendGateway => Some("gateway"),
        RoleId::TicketIssuer => Some("ticket_issuer"),
        RoleId::HumanProxy | RoleId::FunctionExecutor => None,
    }
}

fn builtin(role: RoleId) -> &'static str {
    match role {
        RoleId::BackendGateway => GATEWAY_PROMPT,
        RoleId::TicketIssuer => TICKET_ISSUER_PROMPT,
        _ => SPECIALIST_PROMPT,
    }
}

/// 角色指令文本；网关附带操作清单与 schema
pub fn system_prompt(role: RoleId, registry: &OperationRegistry) -> String {
    let base = prompt_file(role)
        .and_then(|name| {
            [
                format!("config/prompts/{name}.txt"),
                format!("../config/prompts/{name}.txt"),
            ]
            .into_iter()
            .find_map(|p| std::fs::read_to_string(p).ok())
        })
        .unwrap_or_else(|| builtin(role).to_string());

    if role == RoleId::BackendGateway {
        format!(
            "{base}\n\nAvailable operations:\n{}\n\nFunction call schema:\n{}",
            registry.to_schema_json(),
            function_call_schema_json()
        )
    } else {
        base
    }
}
