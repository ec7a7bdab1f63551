//! 后端记录：各操作返回的结构化结果
//!
//! BackendRecord 以 `kind` 字段做内部标签，Outcome Extractor 据此区分工单与报名结果。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 卖家账号状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Onboarding,
    OnHold,
}

/// 商品状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Active,
    Inactive,
    Archived,
    ReadyForActivation,
    Blocked,
}

/// 商品被封禁的原因
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    SellerStateChange,
    PolicyViolation,
    TrademarkViolation,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::SellerStateChange => "SELLER_STATE_CHANGE",
            BlockReason::PolicyViolation => "POLICY_VIOLATION",
            BlockReason::TrademarkViolation => "TRADEMARK_VIOLATION",
        }
    }

    /// 可申请人工复核（override）的原因
    pub fn allows_override(&self) -> bool {
        matches!(
            self,
            BlockReason::PolicyViolation | BlockReason::TrademarkViolation
        )
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SELLER_STATE_CHANGE" => Some(BlockReason::SellerStateChange),
            "POLICY_VIOLATION" => Some(BlockReason::PolicyViolation),
            "TRADEMARK_VIOLATION" => Some(BlockReason::TrademarkViolation),
            _ => None,
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 品牌 x 类目授权状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BrandApproval {
    Approved,
    Pending,
    Rejected,
}

/// 工单结果
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketOutcome {
    pub ticket_id: String,
    pub status: String,
    pub ticket_type: String,
    pub listing_id: String,
    pub reason_code: String,
}

/// 品牌计划报名结果
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentOutcome {
    pub program_id: String,
    pub enrollment_link: String,
    pub listing_id: String,
}

/// 后端操作的结构化结果
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendRecord {
    AccountStatus {
        seller_id: String,
        status: AccountStatus,
        timestamp: String,
    },
    ListingStatus {
        listing_id: String,
        status: ListingStatus,
        timestamp: String,
    },
    BlockReason {
        listing_id: String,
        reason: BlockReason,
        details: String,
        timestamp: String,
    },
    BrandApproval {
        brand_id: String,
        status: BrandApproval,
        timestamp: String,
    },
    OverrideStatus {
        listing_id: String,
        overrides: Vec<BlockReason>,
        count: usize,
        timestamp: String,
    },
    Reactivation {
        block_reason: BlockReason,
        reactivatable: bool,
    },
    Ticket(TicketOutcome),
    Enrollment(EnrollmentOutcome),
}

/// 记录种类（即 `kind` 标签），注册表据此声明每个操作的返回类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    AccountStatus,
    ListingStatus,
    BlockReason,
    BrandApproval,
    OverrideStatus,
    Reactivation,
    Ticket,
    Enrollment,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::AccountStatus => "account_status",
            RecordKind::ListingStatus => "listing_status",
            RecordKind::BlockReason => "block_reason",
            RecordKind::BrandApproval => "brand_approval",
            RecordKind::OverrideStatus => "override_status",
            RecordKind::Reactivation => "reactivation",
            RecordKind::Ticket => "ticket",
            RecordKind::Enrollment => "enrollment",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BackendRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            BackendRecord::AccountStatus { .. } => RecordKind::AccountStatus,
            BackendRecord::ListingStatus { .. } => RecordKind::ListingStatus,
            BackendRecord::BlockReason { .. } => RecordKind::BlockReason,
            BackendRecord::BrandApproval { .. } => RecordKind::BrandApproval,
            BackendRecord::OverrideStatus { .. } => RecordKind::OverrideStatus,
            BackendRecord::Reactivation { .. } => RecordKind::Reactivation,
            BackendRecord::Ticket(_) => RecordKind::Ticket,
            BackendRecord::Enrollment(_) => RecordKind::Enrollment,
        }
    }

    /// 序列化为写入对话的 JSON 文本
    pub fn to_content(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{{\"kind\":\"{}\"}}", self.kind()))
    }

    /// 从对话内容中解析记录：允许 JSON 前后夹带说明文字或 ```json 代码块
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let trimmed = content.trim();
        let json = match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if start < end => &trimmed[start..=end],
            _ => trimmed,
        };
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_tagged_by_kind() {
        let record = BackendRecord::Ticket(TicketOutcome {
            ticket_id: "T1".into(),
            status: "CREATED".into(),
            ticket_type: "L2_INFRINGEMENT".into(),
            listing_id: "FSN1".into(),
            reason_code: "TRADEMARK_VIOLATION".into(),
        });
        let value: serde_json::Value = serde_json::from_str(&record.to_content()).unwrap();
        assert_eq!(value["kind"], "ticket");
        assert_eq!(value["ticket_id"], "T1");
    }

    #[test]
    fn test_parse_tolerates_surrounding_text() {
        let content = "Result:\n```json\n{\"kind\":\"listing_status\",\"listing_id\":\"FSN1\",\"status\":\"BLOCKED\",\"timestamp\":\"t\"}\n```";
        let record = BackendRecord::parse(content).unwrap();
        assert_eq!(record.kind(), RecordKind::ListingStatus);
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert!(BackendRecord::parse("{\"kind\":\"refund\",\"id\":\"1\"}").is_err());
        assert!(BackendRecord::parse("not a record").is_err());
    }

    #[test]
    fn test_block_reason_override_eligibility() {
        assert!(BlockReason::TrademarkViolation.allows_override());
        assert!(BlockReason::PolicyViolation.allows_override());
        assert!(!BlockReason::SellerStateChange.allows_override());
        assert_eq!(BlockReason::parse("trademark_violation"), Some(BlockReason::TrademarkViolation));
    }
}
