//! 模拟的商品后端：状态查询、封禁原因、品牌授权、复核、工单与品牌计划报名
//!
//! 除固定场景配置外无状态；工单/报名每次调用都生成新的标识（不保证幂等）。
//! 配置在 faults 中的操作会模拟下游故障。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Deserialize;

use crate::backend::{
    AccountStatus, BackendOperation, BackendRecord, BlockReason, BrandApproval,
    EnrollmentOutcome, ListingStatus, OperationRegistry, RecordKind, TicketOutcome,
};
use crate::core::ConversationError;

/// [backend] 段：各查询返回的固定状态
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendScenario {
    pub account_status: AccountStatus,
    pub listing_status: ListingStatus,
    pub block_reason: BlockReason,
    pub brand_approval: BrandApproval,
    /// 模拟下游故障的操作名
    pub faults: Vec<String>,
    /// 品牌计划报名链接前缀
    pub enrollment_base_url: String,
}

impl Default for BackendScenario {
    fn default() -> Self {
        Self {
            account_status: AccountStatus::Active,
            listing_status: ListingStatus::Active,
            block_reason: BlockReason::SellerStateChange,
            brand_approval: BrandApproval::Pending,
            faults: Vec::new(),
            enrollment_base_url: "https://seller.flipkart.com/brand-programs".to_string(),
        }
    }
}

#[derive(Debug)]
struct BackendState {
    scenario: BackendScenario,
    tickets_issued: AtomicUsize,
    enrollments_issued: AtomicUsize,
}

/// 商品后端句柄；clone 共享同一份场景与计数
#[derive(Debug, Clone)]
pub struct ListingBackend {
    state: Arc<BackendState>,
}

impl ListingBackend {
    pub fn new(scenario: BackendScenario) -> Self {
        Self {
            state: Arc::new(BackendState {
                scenario,
                tickets_issued: AtomicUsize::new(0),
                enrollments_issued: AtomicUsize::new(0),
            }),
        }
    }

    pub fn scenario(&self) -> &BackendScenario {
        &self.state.scenario
    }

    pub fn tickets_issued(&self) -> usize {
        self.state.tickets_issued.load(Ordering::SeqCst)
    }

    pub fn enrollments_issued(&self) -> usize {
        self.state.enrollments_issued.load(Ordering::SeqCst)
    }

    /// 注册全部商品后端操作
    pub fn registry(&self) -> OperationRegistry {
        let mut registry = OperationRegistry::new();
        for op in ListingOp::ALL {
            registry.register(ListingOperation {
                op,
                state: self.state.clone(),
            });
        }
        registry
    }
}

#[derive(Debug, Clone, Copy)]
enum ListingOp {
    CheckAccountStatus,
    CheckListingStatus,
    GetBlockReason,
    CheckBrandApproval,
    GetOverrideStatus,
    CanReactivateListing,
    CreateSupportTicket,
    EnrollBrandProgram,
}

impl ListingOp {
    const ALL: [ListingOp; 8] = [
        ListingOp::CheckAccountStatus,
        ListingOp::CheckListingStatus,
        ListingOp::GetBlockReason,
        ListingOp::CheckBrandApproval,
        ListingOp::GetOverrideStatus,
        ListingOp::CanReactivateListing,
        ListingOp::CreateSupportTicket,
        ListingOp::EnrollBrandProgram,
    ];
}

struct ListingOperation {
    op: ListingOp,
    state: Arc<BackendState>,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn short_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    id.get(..8).unwrap_or(&id).to_string()
}

/// 按封禁原因确定工单队列
fn ticket_type_for(reason: &str) -> &'static str {
    match BlockReason::parse(reason) {
        Some(BlockReason::TrademarkViolation) => "L2_INFRINGEMENT",
        Some(BlockReason::PolicyViolation) => "L1_POLICY_REVIEW",
        Some(BlockReason::SellerStateChange) => "L1_ACCOUNT_STATE",
        None => "L1_GENERAL",
    }
}

impl ListingOperation {
    fn arg<'a>(&self, args: &'a BTreeMap<String, String>, key: &str) -> &'a str {
        args.get(key).map(|v| v.trim()).unwrap_or_default()
    }
}

impl BackendOperation for ListingOperation {
    fn name(&self) -> &'static str {
        match self.op {
            ListingOp::CheckAccountStatus => "check_account_status",
            ListingOp::CheckListingStatus => "check_listing_status",
            ListingOp::GetBlockReason => "get_block_reason",
            ListingOp::CheckBrandApproval => "check_brand_approval",
            ListingOp::GetOverrideStatus => "get_override_status",
            ListingOp::CanReactivateListing => "can_reactivate_listing",
            ListingOp::CreateSupportTicket => "create_support_ticket",
            ListingOp::EnrollBrandProgram => "enroll_brand_program",
        }
    }

    fn description(&self) -> &'static str {
        match self.op {
            ListingOp::CheckAccountStatus => "Seller account status (ACTIVE / ONBOARDING / ON_HOLD)",
            ListingOp::CheckListingStatus => "Listing status (ACTIVE / INACTIVE / ARCHIVED / READY_FOR_ACTIVATION / BLOCKED)",
            ListingOp::GetBlockReason => "Why a blocked listing was blocked",
            ListingOp::CheckBrandApproval => "BrandXVertical approval status for a brand",
            ListingOp::GetOverrideStatus => "Block reasons on the listing that are eligible for manual override",
            ListingOp::CanReactivateListing => "Whether a listing blocked for the given reason can be reactivated",
            ListingOp::CreateSupportTicket => "Raise a support ticket to review a blocked listing",
            ListingOp::EnrollBrandProgram => "Create an enrollment link for a brand protection program",
        }
    }

    fn required_args(&self) -> &'static [&'static str] {
        match self.op {
            ListingOp::CheckAccountStatus => &["seller_id"],
            ListingOp::CheckListingStatus
            | ListingOp::GetBlockReason
            | ListingOp::GetOverrideStatus => &["listing_id"],
            ListingOp::CheckBrandApproval => &["brand_id"],
            ListingOp::CanReactivateListing => &["block_reason"],
            ListingOp::CreateSupportTicket => &["seller_id", "listing_id", "reason"],
            ListingOp::EnrollBrandProgram => &["program_id", "listing_id"],
        }
    }

    fn kind(&self) -> RecordKind {
        match self.op {
            ListingOp::CheckAccountStatus => RecordKind::AccountStatus,
            ListingOp::CheckListingStatus => RecordKind::ListingStatus,
            ListingOp::GetBlockReason => RecordKind::BlockReason,
            ListingOp::CheckBrandApproval => RecordKind::BrandApproval,
            ListingOp::GetOverrideStatus => RecordKind::OverrideStatus,
            ListingOp::CanReactivateListing => RecordKind::Reactivation,
            ListingOp::CreateSupportTicket => RecordKind::Ticket,
            ListingOp::EnrollBrandProgram => RecordKind::Enrollment,
        }
    }

    fn invoke(&self, args: &BTreeMap<String, String>) -> Result<BackendRecord, ConversationError> {
        let scenario = &self.state.scenario;
        if scenario.faults.iter().any(|f| f == self.name()) {
            return Err(ConversationError::BackendFailure {
                operation: self.name().to_string(),
                message: "simulated downstream fault".to_string(),
            });
        }

        let record = match self.op {
            ListingOp::CheckAccountStatus => BackendRecord::AccountStatus {
                seller_id: self.arg(args, "seller_id").to_string(),
                status: scenario.account_status,
                timestamp: now(),
            },
            ListingOp::CheckListingStatus => BackendRecord::ListingStatus {
                listing_id: self.arg(args, "listing_id").to_string(),
                status: scenario.listing_status,
                timestamp: now(),
            },
            ListingOp::GetBlockReason => BackendRecord::BlockReason {
                listing_id: self.arg(args, "listing_id").to_string(),
                reason: scenario.block_reason,
                details: "Simulated block reason response".to_string(),
                timestamp: now(),
            },
            ListingOp::CheckBrandApproval => BackendRecord::BrandApproval {
                brand_id: self.arg(args, "brand_id").to_string(),
                status: scenario.brand_approval,
                timestamp: now(),
            },
            ListingOp::GetOverrideStatus => {
                let overrides: Vec<BlockReason> = if scenario.block_reason.allows_override() {
                    vec![scenario.block_reason]
                } else {
                    Vec::new()
                };
                BackendRecord::OverrideStatus {
                    listing_id: self.arg(args, "listing_id").to_string(),
                    count: overrides.len(),
                    overrides,
                    timestamp: now(),
                }
            }
            ListingOp::CanReactivateListing => {
                let raw = self.arg(args, "block_reason");
                let block_reason =
                    BlockReason::parse(raw).ok_or_else(|| ConversationError::InvalidArgument {
                        operation: self.name().to_string(),
                        argument: "block_reason".to_string(),
                        value: raw.to_string(),
                    })?;
                BackendRecord::Reactivation {
                    reactivatable: block_reason != BlockReason::SellerStateChange,
                    block_reason,
                }
            }
            ListingOp::CreateSupportTicket => {
                let reason = self.arg(args, "reason").to_ascii_uppercase();
                self.state.tickets_issued.fetch_add(1, Ordering::SeqCst);
                BackendRecord::Ticket(TicketOutcome {
                    ticket_id: format!("TKT-{}", short_id()),
                    status: "CREATED".to_string(),
                    ticket_type: ticket_type_for(&reason).to_string(),
                    listing_id: self.arg(args, "listing_id").to_string(),
                    reason_code: reason,
                })
            }
            ListingOp::EnrollBrandProgram => {
                let program_id = self.arg(args, "program_id").to_string();
                let listing_id = self.arg(args, "listing_id").to_string();
                self.state.enrollments_issued.fetch_add(1, Ordering::SeqCst);
                let enrollment_link = format!(
                    "{}/{}/enroll?listing={}&token={}",
                    scenario.enrollment_base_url.trim_end_matches('/'),
                    program_id.to_ascii_lowercase(),
                    listing_id,
                    short_id().to_ascii_lowercase(),
                );
                BackendRecord::Enrollment(EnrollmentOutcome {
                    program_id,
                    enrollment_link,
                    listing_id,
                })
            }
        };
        tracing::debug!(operation = self.name(), kind = %record.kind(), "backend operation completed");
        Ok(record)
    }
}
