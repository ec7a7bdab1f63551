//! Outcome Extractor：会话结束后从日志中倒序找出最近一条工单 / 报名记录
//!
//! 只看 TicketIssuer 发出的轮次；某条内容解析失败或不是结果类记录时视为不存在，继续向前扫描，从不报错。
//! 整个日志都没有可解析的记录时返回 None（例如入驻未完成而提前结束的会话）。

use std::fmt::Write as _;

use serde::Serialize;

use crate::backend::{BackendRecord, EnrollmentOutcome, TicketOutcome};
use crate::conversation::{RoleId, Turn};
use crate::core::TerminationReason;

/// 结构化结论
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    Enrollment(EnrollmentOutcome),
    Ticket(TicketOutcome),
}

impl Summary {
    pub fn listing_id(&self) -> &str {
        match self {
            Summary::Enrollment(e) => &e.listing_id,
            Summary::Ticket(t) => &t.listing_id,
        }
    }

    /// 人类可读的摘要
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            Summary::Enrollment(e) => {
                let _ = writeln!(out, "Brand program enrollment");
                let _ = writeln!(out, "  Program ID:      {}", e.program_id);
                let _ = writeln!(out, "  Enrollment link: {}", e.enrollment_link);
                let _ = writeln!(out, "  Listing ID:      {}", e.listing_id);
            }
            Summary::Ticket(t) => {
                let _ = writeln!(out, "Support ticket");
                let _ = writeln!(out, "  Ticket ID:   {}", t.ticket_id);
                let _ = writeln!(out, "  Status:      {}", t.status);
                let _ = writeln!(out, "  Ticket type: {}", t.ticket_type);
                let _ = writeln!(out, "  Listing ID:  {}", t.listing_id);
                let _ = writeln!(out, "  Reason code: {}", t.reason_code);
            }
        }
        out
    }
}

/// 倒序扫描日志，返回最近一条可解析的工单 / 报名结论
pub fn summarize(log: &[Turn]) -> Option<Summary> {
    log.iter()
        .enumerate()
        .rev()
        .filter(|(_, turn)| turn.sender() == RoleId::TicketIssuer)
        .find_map(|(index, turn)| {
            match BackendRecord::parse(&turn.content().render()) {
                Ok(BackendRecord::Ticket(ticket)) => Some(Summary::Ticket(ticket)),
                Ok(BackendRecord::Enrollment(enrollment)) => Some(Summary::Enrollment(enrollment)),
                Ok(other) => {
                    tracing::debug!(index, kind = %other.kind(), "ticket issuer turn is not an outcome record");
                    None
                }
                Err(e) => {
                    tracing::debug!(index, error = %e, "skipping unparseable ticket issuer turn");
                    None
                }
            }
        })
}

/// 会话最终结果：终止原因 + 可选结论 + 轮次数
#[derive(Clone, Debug, Serialize)]
pub struct ConversationOutcome {
    pub reason: TerminationReason,
    pub summary: Option<Summary>,
    pub turns: usize,
}

impl ConversationOutcome {
    pub fn is_complete(&self) -> bool {
        self.reason.is_complete()
    }

    pub fn render(&self) -> String {
        let mut out = format!("Conversation {} after {} turns.\n", self.reason, self.turns);
        match &self.summary {
            Some(summary) => out.push_str(&summary.render()),
            None => out.push_str("No ticket or enrollment was created.\n"),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::FunctionCall;

    fn issuer_turn(text: &str) -> Turn {
        Turn::new(RoleId::TicketIssuer, RoleId::Specialist, text).unwrap()
    }

    fn ticket_json() -> &'static str {
        r#"{"kind":"ticket","ticket_id":"T1","status":"CREATED","ticket_type":"L2_INFRINGEMENT","listing_id":"FSN1","reason_code":"TRADEMARK_VIOLATION"}"#
    }

    #[test]
    fn test_summarize_ticket_fields() {
        let log = vec![
            Turn::new(RoleId::HumanProxy, RoleId::Specialist, "help").unwrap(),
            issuer_turn(ticket_json()),
            Turn::new(RoleId::Specialist, RoleId::HumanProxy, "Your support ticket has been raised.").unwrap(),
        ];
        let summary = summarize(&log);
        assert_eq!(
            summary,
            Some(Summary::Ticket(TicketOutcome {
                ticket_id: "T1".into(),
                status: "CREATED".into(),
                ticket_type: "L2_INFRINGEMENT".into(),
                listing_id: "FSN1".into(),
                reason_code: "TRADEMARK_VIOLATION".into(),
            }))
        );
    }

    #[test]
    fn test_summarize_skips_bad_records() {
        let log = vec![
            issuer_turn(ticket_json()),
            issuer_turn("{\"kind\": \"ticket\", \"ticket_id\": "),
            issuer_turn("Sorry, I could not create the ticket."),
            Turn::new(
                RoleId::TicketIssuer,
                RoleId::FunctionExecutor,
                FunctionCall::new("create_support_ticket"),
            )
            .unwrap(),
        ];
        assert!(matches!(summarize(&log), Some(Summary::Ticket(t)) if t.ticket_id == "T1"));
    }

    #[test]
    fn test_summarize_prefers_latest_record() {
        let enrollment = r#"{"kind":"enrollment","program_id":"BRAND_ASSURE","enrollment_link":"https://x/enroll","listing_id":"FSN1"}"#;
        let log = vec![issuer_turn(ticket_json()), issuer_turn(enrollment)];
        assert!(matches!(summarize(&log), Some(Summary::Enrollment(e)) if e.program_id == "BRAND_ASSURE"));
    }

    #[test]
    fn test_summarize_ignores_other_senders() {
        let log = vec![Turn::new(RoleId::FunctionExecutor, RoleId::Specialist, ticket_json()).unwrap()];
        assert_eq!(summarize(&log), None);
    }

    #[test]
    fn test_summarize_empty_log() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn test_render_surfaces_all_fields() {
        let summary = Summary::Enrollment(EnrollmentOutcome {
            program_id: "BRAND_ASSURE".into(),
            enrollment_link: "https://x/enroll".into(),
            listing_id: "FSN1".into(),
        });
        let text = summary.render();
        assert!(text.contains("BRAND_ASSURE"));
        assert!(text.contains("https://x/enroll"));
        assert!(text.contains("FSN1"));
    }
}
