//! 剧本应答方：不依赖 LLM 的确定性 Specialist / Gateway / TicketIssuer
//!
//! 未配置 API Key 或 provider = "playbook" 时使用，也是端到端场景测试的应答方。
//! Specialist 只看最近一轮与此前自己提过的问题来决定下一步，状态全部来自对话历史。
//! 三者的寻址标记都取自 RoutingTable，与路由器保持一致。

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::agents::templates::{self, Template};
use crate::agents::{Responder, ResponderSet};
use crate::backend::{AccountStatus, BackendRecord, BlockReason, BrandApproval, ListingStatus};
use crate::conversation::{FunctionCall, RoleId, Turn, TurnContent};
use crate::core::{ConversationError, RoutingTable, NO_INPUT};

pub const GREETING: &str =
    "Hello! I'm SIA, your Seller Integration Assistant. Please provide your seller ID.";
pub const ASK_LISTING_ID: &str = "Your account is active. Please provide your listing ID.";
pub const ASK_BRAND_ID: &str = "To check your options, please provide the brand ID for this listing.";
/// 品牌保护计划
pub const BRAND_ASSURE: &str = "BRAND_ASSURE";

/// 从回复中取出标识：最后一个词，去掉首尾标点
fn extract_id(reply: &str) -> Option<String> {
    let token = reply
        .split_whitespace()
        .last()?
        .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_');
    (!token.is_empty() && reply.trim() != NO_INPUT).then(|| token.to_string())
}

/// 倒序查找满足条件的后端记录
fn find_record<T>(history: &[Turn], pick: impl Fn(BackendRecord) -> Option<T>) -> Option<T> {
    history
        .iter()
        .rev()
        .filter(|t| {
            matches!(
                t.sender(),
                RoleId::FunctionExecutor | RoleId::BackendGateway | RoleId::TicketIssuer
            )
        })
        .filter_map(|t| BackendRecord::parse(&t.content().render()).ok())
        .find_map(pick)
}

fn known_seller(history: &[Turn]) -> String {
    find_record(history, |r| match r {
        BackendRecord::AccountStatus { seller_id, .. } => Some(seller_id),
        _ => None,
    })
    .unwrap_or_else(|| "UNKNOWN".to_string())
}

fn known_listing(history: &[Turn]) -> String {
    find_record(history, |r| match r {
        BackendRecord::ListingStatus { listing_id, .. }
        | BackendRecord::BlockReason { listing_id, .. }
        | BackendRecord::OverrideStatus { listing_id, .. } => Some(listing_id),
        _ => None,
    })
    .unwrap_or_else(|| "UNKNOWN".to_string())
}

fn primary_marker(markers: &[String], fallback: &str) -> String {
    markers
        .iter()
        .map(|m| m.trim())
        .find(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// 剧本 Specialist：用各组的第一个标记寻址网关与工单方
#[derive(Debug, Clone)]
pub struct PlaybookSpecialist {
    gateway_marker: String,
    ticket_marker: String,
}

impl Default for PlaybookSpecialist {
    fn default() -> Self {
        Self::new(&RoutingTable::default())
    }
}

impl PlaybookSpecialist {
    pub fn new(table: &RoutingTable) -> Self {
        Self {
            gateway_marker: primary_marker(&table.gateway_markers, "@gateway"),
            ticket_marker: primary_marker(&table.ticket_markers, "@ticketing"),
        }
    }

    fn to_gateway(&self, request: String) -> String {
        format!("{} {request}", self.gateway_marker)
    }

    fn to_ticketing(&self, request: String) -> String {
        format!("{} {request}", self.ticket_marker)
    }

    fn handle_reply(&self, history: &[Turn], reply: &str) -> String {
        let last_ask = history
            .iter()
            .rev()
            .find(|t| t.sender() == RoleId::Specialist)
            .map(|t| t.content().render().into_owned());

        let Some(ask) = last_ask else {
            return GREETING.to_string();
        };
        let id = extract_id(reply);

        if ask.contains(ASK_BRAND_ID) {
            return match id {
                Some(brand) => self.to_gateway(format!("brand_approval:{brand}")),
                None => ASK_BRAND_ID.to_string(),
            };
        }
        if ask.contains("listing ID") || ask.contains("Listing ID") {
            return match id {
                Some(listing) if listing.to_ascii_uppercase().starts_with("FSN") => {
                    self.to_gateway(format!("listing_status:{}", listing.to_ascii_uppercase()))
                }
                _ => Template::ListingIdHelp.text().to_string(),
            };
        }
        if ask.contains("seller ID") {
            return match id {
                Some(seller) => self.to_gateway(format!("account_status:{seller}")),
                None => GREETING.to_string(),
            };
        }
        Template::GeneralHelp.text().to_string()
    }

    fn interpret(&self, history: &[Turn], result: &TurnContent) -> String {
        if result.is_error() {
            return Template::ApiFailure.text().to_string();
        }
        let record = match BackendRecord::parse(&result.render()) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(error = %e, "result is not a backend record");
                return Template::GeneralHelp.text().to_string();
            }
        };

        match record {
            BackendRecord::AccountStatus { status, .. } => match status {
                AccountStatus::Active => ASK_LISTING_ID.to_string(),
                AccountStatus::Onboarding => Template::OnboardingEducation.text().to_string(),
                AccountStatus::OnHold => Template::AccountOnHold.text().to_string(),
            },
            BackendRecord::ListingStatus { listing_id, status, .. } => match status {
                ListingStatus::Active => Template::ActiveListing.text().to_string(),
                ListingStatus::Inactive => Template::InactiveListing.text().to_string(),
                ListingStatus::Archived => Template::ArchivedListing.text().to_string(),
                ListingStatus::ReadyForActivation => Template::ReadyForActivation.text().to_string(),
                ListingStatus::Blocked => self.to_gateway(format!("block_reason:{listing_id}")),
            },
            BackendRecord::BlockReason { listing_id, reason, .. } => match reason {
                BlockReason::SellerStateChange => Template::SellerStateChange.text().to_string(),
                BlockReason::PolicyViolation => {
                    self.to_gateway(format!("override_status:{listing_id}"))
                }
                BlockReason::TrademarkViolation => {
                    format!("{}\n{ASK_BRAND_ID}", Template::BrandTrademarkIssue.text())
                }
            },
            BackendRecord::OverrideStatus { listing_id, overrides, .. } => match overrides.first() {
                Some(reason) => self.to_ticketing(format!(
                    "create_ticket:{}:{listing_id}:{reason}",
                    known_seller(history)
                )),
                None => templates::render_blocked_listing(
                    "a policy review",
                    "no override available",
                    "update the listing to meet the policy and resubmit it for review",
                ),
            },
            BackendRecord::Reactivation { block_reason, reactivatable } => {
                if reactivatable {
                    self.to_ticketing(format!(
                        "create_ticket:{}:{}:{block_reason}",
                        known_seller(history),
                        known_listing(history)
                    ))
                } else {
                    templates::render_blocked_listing(
                        block_reason.as_str(),
                        "not reactivatable",
                        "resolve the account state change first",
                    )
                }
            }
            BackendRecord::BrandApproval { status, .. } => match status {
                BrandApproval::Approved => self.to_ticketing(format!(
                    "create_ticket:{}:{}:{}",
                    known_seller(history),
                    known_listing(history),
                    BlockReason::TrademarkViolation
                )),
                BrandApproval::Pending => Template::BrandApprovalPending.text().to_string(),
                BrandApproval::Rejected => {
                    self.to_ticketing(format!("enroll:{BRAND_ASSURE}:{}", known_listing(history)))
                }
            },
            BackendRecord::Ticket(ticket) => templates::render_ticket_raised(&ticket),
            BackendRecord::Enrollment(enrollment) => templates::render_enrollment(&enrollment),
        }
    }
}

#[async_trait]
impl Responder for PlaybookSpecialist {
    async fn respond(&self, history: &[Turn]) -> Result<TurnContent, ConversationError> {
        let Some(last) = history.last() else {
            return Ok(TurnContent::text(GREETING));
        };
        let text = match last.sender() {
            RoleId::FunctionExecutor | RoleId::BackendGateway | RoleId::TicketIssuer => {
                self.interpret(history, last.content())
            }
            RoleId::HumanProxy => self.handle_reply(history, &last.content().render()),
            RoleId::Specialist => Template::GeneralHelp.text().to_string(),
        };
        Ok(TurnContent::Text(text))
    }
}

/// 解析 `<marker> op:arg1:arg2...` 指令；返回 (op, args)
struct DirectiveParser {
    pattern: Regex,
}

impl DirectiveParser {
    fn new(markers: &[String]) -> Result<Self, ConversationError> {
        let alternatives: Vec<String> = markers
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Err(ConversationError::Config("no addressing markers configured".to_string()));
        }
        let pattern = Regex::new(&format!(
            r"(?i)(?:{})\s+([a-z_]+)(?::(\S+))?",
            alternatives.join("|")
        ))
        .map_err(|e| ConversationError::Config(e.to_string()))?;
        Ok(Self { pattern })
    }

    fn parse(&self, text: &str) -> Option<(String, Vec<String>)> {
        let caps = self.pattern.captures(text)?;
        let op = caps.get(1)?.as_str().to_ascii_lowercase();
        let args = caps
            .get(2)
            .map(|m| m.as_str().split(':').map(str::to_string).collect())
            .unwrap_or_default();
        Some((op, args))
    }
}

fn latest_request<'a>(history: &'a [Turn], to: RoleId) -> Option<&'a Turn> {
    history.iter().rev().find(|t| t.receiver() == to)
}

/// 剧本网关：把 `@gateway op:arg` 翻译为函数调用
pub struct PlaybookGateway {
    parser: DirectiveParser,
}

impl PlaybookGateway {
    pub fn new(markers: &[String]) -> Result<Self, ConversationError> {
        Ok(Self {
            parser: DirectiveParser::new(markers)?,
        })
    }

    fn translate(&self, op: &str, args: &[String]) -> FunctionCall {
        let first = args.first().cloned().unwrap_or_default();
        match op {
            "account_status" | "user_status" => {
                FunctionCall::new("check_account_status").with_arg("seller_id", first)
            }
            "listing_status" => FunctionCall::new("check_listing_status").with_arg("listing_id", first),
            "block_reason" => FunctionCall::new("get_block_reason").with_arg("listing_id", first),
            "override_status" => FunctionCall::new("get_override_status").with_arg("listing_id", first),
            "brand_approval" => FunctionCall::new("check_brand_approval").with_arg("brand_id", first),
            "reactivate" => FunctionCall::new("can_reactivate_listing").with_arg("block_reason", first),
            // 未知请求原样转发，由调度器报告 UnknownOperation
            other => FunctionCall::new(other),
        }
    }
}

#[async_trait]
impl Responder for PlaybookGateway {
    async fn respond(&self, history: &[Turn]) -> Result<TurnContent, ConversationError> {
        let request = latest_request(history, RoleId::BackendGateway)
            .and_then(|t| self.parser.parse(&t.content().render()));
        Ok(match request {
            Some((op, args)) => self.translate(&op, &args).into(),
            None => TurnContent::text("Unable to read the gateway request."),
        })
    }
}

/// 剧本工单方：把 `@ticketing create_ticket:...` / `@ticketing enroll:...` 翻译为函数调用
pub struct PlaybookTicketIssuer {
    parser: DirectiveParser,
}

impl PlaybookTicketIssuer {
    pub fn new(markers: &[String]) -> Result<Self, ConversationError> {
        Ok(Self {
            parser: DirectiveParser::new(markers)?,
        })
    }
}

#[async_trait]
impl Responder for PlaybookTicketIssuer {
    async fn respond(&self, history: &[Turn]) -> Result<TurnContent, ConversationError> {
        let request = latest_request(history, RoleId::TicketIssuer)
            .and_then(|t| self.parser.parse(&t.content().render()));
        let arg = |args: &[String], i: usize| args.get(i).cloned().unwrap_or_default();
        Ok(match request {
            Some((op, args)) if op == "create_ticket" => FunctionCall::new("create_support_ticket")
                .with_arg("seller_id", arg(&args, 0))
                .with_arg("listing_id", arg(&args, 1))
                .with_arg("reason", arg(&args, 2))
                .into(),
            Some((op, args)) if op == "enroll" => FunctionCall::new("enroll_brand_program")
                .with_arg("program_id", arg(&args, 0))
                .with_arg("listing_id", arg(&args, 1))
                .into(),
            Some((op, _)) => FunctionCall::new(op).into(),
            None => TurnContent::text("Unable to read the ticket request."),
        })
    }
}

/// 按路由表组装三个剧本应答方
pub fn playbook_responders(table: &RoutingTable) -> Result<ResponderSet, ConversationError> {
    Ok(ResponderSet::new(
        Arc::new(PlaybookSpecialist::new(table)),
        Arc::new(PlaybookGateway::new(&table.gateway_markers)?),
        Arc::new(PlaybookTicketIssuer::new(&table.ticket_markers)?),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(sender: RoleId, receiver: RoleId, text: &str) -> Turn {
        Turn::new(sender, receiver, text).unwrap()
    }

    fn record_turn(json: &str) -> Turn {
        turn(RoleId::FunctionExecutor, RoleId::Specialist, json)
    }

    #[test]
    fn test_extract_id() {
        assert_eq!(extract_id("my seller id is S123."), Some("S123".to_string()));
        assert_eq!(extract_id("FSN1"), Some("FSN1".to_string()));
        assert_eq!(extract_id(NO_INPUT), None);
        assert_eq!(extract_id("   "), None);
    }

    #[tokio::test]
    async fn test_specialist_greets_first() {
        let history = vec![turn(RoleId::HumanProxy, RoleId::Specialist, "I need help with my listing")];
        let content = PlaybookSpecialist::default().respond(&history).await.unwrap();
        assert_eq!(content, TurnContent::text(GREETING));
    }

    #[tokio::test]
    async fn test_specialist_addresses_gateway_with_seller_id() {
        let history = vec![
            turn(RoleId::HumanProxy, RoleId::Specialist, "help"),
            turn(RoleId::Specialist, RoleId::HumanProxy, GREETING),
            turn(RoleId::HumanProxy, RoleId::Specialist, "S1"),
        ];
        let content = PlaybookSpecialist::default().respond(&history).await.unwrap();
        assert_eq!(content, TurnContent::text("@gateway account_status:S1"));
    }

    #[tokio::test]
    async fn test_specialist_explains_listing_id_format() {
        let history = vec![
            turn(RoleId::Specialist, RoleId::HumanProxy, ASK_LISTING_ID),
            turn(RoleId::HumanProxy, RoleId::Specialist, "where do I find it?"),
        ];
        let content = PlaybookSpecialist::default().respond(&history).await.unwrap();
        assert_eq!(content, TurnContent::text(Template::ListingIdHelp.text()));
    }

    #[tokio::test]
    async fn test_specialist_raises_ticket_from_override() {
        let history = vec![
            record_turn(r#"{"kind":"account_status","seller_id":"S1","status":"ACTIVE","timestamp":"t"}"#),
            record_turn(r#"{"kind":"override_status","listing_id":"FSN1","overrides":["POLICY_VIOLATION"],"count":1,"timestamp":"t"}"#),
        ];
        let content = PlaybookSpecialist::default().respond(&history).await.unwrap();
        assert_eq!(
            content,
            TurnContent::text("@ticketing create_ticket:S1:FSN1:POLICY_VIOLATION")
        );
    }

    #[tokio::test]
    async fn test_specialist_reports_api_failure() {
        let history = vec![record_turn("ERROR: Unknown operation: get_user_status")];
        let content = PlaybookSpecialist::default().respond(&history).await.unwrap();
        assert_eq!(content, TurnContent::text(Template::ApiFailure.text()));
    }

    #[tokio::test]
    async fn test_gateway_translates_request() {
        let history = vec![turn(RoleId::Specialist, RoleId::BackendGateway, "@API_Agent listing_status:FSN1")];
        let content = PlaybookGateway::new(&RoutingTable::default().gateway_markers).unwrap().respond(&history).await.unwrap();
        assert_eq!(
            content,
            TurnContent::FunctionCall(FunctionCall::new("check_listing_status").with_arg("listing_id", "FSN1"))
        );
    }

    #[tokio::test]
    async fn test_gateway_forwards_unknown_operation() {
        let history = vec![turn(RoleId::Specialist, RoleId::BackendGateway, "@gateway refund_status:FSN1")];
        let content = PlaybookGateway::new(&RoutingTable::default().gateway_markers).unwrap().respond(&history).await.unwrap();
        assert_eq!(content.as_function_call().map(|c| c.name), Some("refund_status".to_string()));
    }

    #[tokio::test]
    async fn test_ticket_issuer_translates_enrollment() {
        let history = vec![turn(RoleId::Specialist, RoleId::TicketIssuer, "@ticketing enroll:BRAND_ASSURE:FSN1")];
        let content = PlaybookTicketIssuer::new(&RoutingTable::default().ticket_markers).unwrap().respond(&history).await.unwrap();
        let call = content.as_function_call().unwrap();
        assert_eq!(call.name, "enroll_brand_program");
        assert_eq!(call.arg("program_id"), Some("BRAND_ASSURE"));
        assert_eq!(call.arg("listing_id"), Some("FSN1"));
    }

    #[tokio::test]
    async fn test_specialist_reads_gateway_records() {
        let history = vec![turn(
            RoleId::BackendGateway,
            RoleId::Specialist,
            r#"{"kind":"account_status","seller_id":"S1","status":"ONBOARDING","timestamp":"t"}"#,
        )];
        let content = PlaybookSpecialist::default().respond(&history).await.unwrap();
        assert!(content.render().contains("onboarding phase"));
    }

    #[tokio::test]
    async fn test_configured_markers_drive_all_playbook_roles() {
        let table = RoutingTable {
            gateway_markers: vec!["@backend".to_string()],
            ticket_markers: vec!["@desk+".to_string()],
            ..RoutingTable::default()
        };
        let history = vec![
            turn(RoleId::HumanProxy, RoleId::Specialist, "help"),
            turn(RoleId::Specialist, RoleId::HumanProxy, GREETING),
            turn(RoleId::HumanProxy, RoleId::Specialist, "S1"),
        ];
        let request = PlaybookSpecialist::new(&table).respond(&history).await.unwrap();
        assert_eq!(request, TurnContent::text("@backend account_status:S1"));

        let gateway = PlaybookGateway::new(&table.gateway_markers).unwrap();
        let asked = vec![turn(RoleId::Specialist, RoleId::BackendGateway, &request.render())];
        let call = gateway.respond(&asked).await.unwrap().as_function_call().unwrap();
        assert_eq!(call.name, "check_account_status");

        // 标记按字面匹配："+" 不被当作正则量词
        let issuer = PlaybookTicketIssuer::new(&table.ticket_markers).unwrap();
        let asked = vec![turn(RoleId::Specialist, RoleId::TicketIssuer, "@desk+ enroll:BRAND_ASSURE:FSN1")];
        assert!(issuer.respond(&asked).await.unwrap().is_function_call());
        let asked = vec![turn(RoleId::Specialist, RoleId::TicketIssuer, "@deskk enroll:BRAND_ASSURE:FSN1")];
        assert!(!issuer.respond(&asked).await.unwrap().is_function_call());
    }

    #[test]
    fn test_directive_parser_rejects_empty_markers() {
        assert!(DirectiveParser::new(&[]).is_err());
        assert!(DirectiveParser::new(&["  ".to_string()]).is_err());
    }
}
