//! 端到端会话场景测试：剧本应答方 + 预置人类输入 + 模拟商品后端

use std::sync::Arc;

use async_trait::async_trait;
use sia::agents::{
    playbook_responders, LlmResponder, PlaybookSpecialist, PlaybookTicketIssuer, Responder,
    ResponderSet,
};
use sia::backend::{
    AccountStatus, BackendRecord, BackendScenario, BlockReason, BrandApproval, ListingBackend,
    ListingStatus,
};
use sia::conversation::{FunctionCall, RoleId, TranscriptStore, Turn, TurnContent};
use sia::core::{
    ConversationError, ConversationOutcome, Orchestrator, OrchestratorBuilder, ScriptedInput,
    RoutingTable, Summary, TerminationReason,
};
use sia::llm::MockLlmClient;

const OPENING: &str = "I need help with my listing";

fn playbook() -> ResponderSet {
    playbook_responders(&RoutingTable::default()).unwrap()
}

fn orchestrator(backend: &ListingBackend, responders: ResponderSet, inputs: &[&str]) -> Orchestrator {
    OrchestratorBuilder::new(backend.registry())
        .with_responders(responders)
        .with_human_input(ScriptedInput::new(inputs.iter().copied()))
        .build()
        .unwrap()
}

async fn run(backend: &ListingBackend, inputs: &[&str]) -> (Orchestrator, ConversationOutcome) {
    let mut orch = orchestrator(backend, playbook(), inputs);
    let outcome = orch.run(OPENING).await.unwrap();
    (orch, outcome)
}

fn blocked(reason: BlockReason, brand: BrandApproval) -> ListingBackend {
    ListingBackend::new(BackendScenario {
        listing_status: ListingStatus::Blocked,
        block_reason: reason,
        brand_approval: brand,
        ..Default::default()
    })
}

fn assert_well_formed(turns: &[Turn]) {
    for (i, turn) in turns.iter().enumerate() {
        assert_ne!(turn.sender(), turn.receiver(), "turn {i} is self-addressed");
    }
}

#[tokio::test]
async fn test_onboarding_account_ends_without_summary() {
    let backend = ListingBackend::new(BackendScenario {
        account_status: AccountStatus::Onboarding,
        ..Default::default()
    });
    let (orch, outcome) = run(&backend, &["S1"]).await;

    assert!(matches!(outcome.reason, TerminationReason::Completed(_)));
    assert!(outcome.summary.is_none());
    assert_eq!(outcome.turns, 7);
    let last = orch.log().last().unwrap();
    assert_eq!(last.sender(), RoleId::Specialist);
    assert!(last.content().render().contains("onboarding phase"));
    assert_well_formed(orch.log().turns());
}

#[tokio::test]
async fn test_trademark_rejected_enrolls_brand_program() {
    let backend = blocked(BlockReason::TrademarkViolation, BrandApproval::Rejected);
    let (orch, outcome) = run(&backend, &["S1", "FSN1", "BRAND9"]).await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.turns, 22);
    assert_eq!(backend.enrollments_issued(), 1);
    assert_eq!(backend.tickets_issued(), 0);

    let issued = orch
        .log()
        .iter()
        .rev()
        .find(|t| t.sender() == RoleId::TicketIssuer)
        .unwrap();
    let enrollment = match BackendRecord::parse(&issued.content().render()).unwrap() {
        BackendRecord::Enrollment(e) => e,
        other => panic!("Expected enrollment record, got {other:?}"),
    };
    assert_eq!(enrollment.listing_id, "FSN1");
    assert_eq!(enrollment.program_id, "BRAND_ASSURE");
    assert_eq!(outcome.summary, Some(Summary::Enrollment(enrollment)));
    assert_well_formed(orch.log().turns());
}

#[tokio::test]
async fn test_seller_state_change_never_reaches_ticket_issuer() {
    let backend = blocked(BlockReason::SellerStateChange, BrandApproval::Pending);
    let (orch, outcome) = run(&backend, &["S1", "FSN1"]).await;

    assert!(matches!(outcome.reason, TerminationReason::Completed(_)));
    assert!(outcome.summary.is_none());
    assert_eq!(backend.tickets_issued(), 0);
    assert!(orch
        .log()
        .iter()
        .all(|t| t.sender() != RoleId::TicketIssuer && t.receiver() != RoleId::TicketIssuer));
    let last = orch.log().last().unwrap();
    assert!(last.content().render().contains("change in your seller account state"));
}

#[tokio::test]
async fn test_policy_violation_raises_ticket() {
    let backend = blocked(BlockReason::PolicyViolation, BrandApproval::Pending);
    let (orch, outcome) = run(&backend, &["S1", "FSN1"]).await;

    assert_eq!(backend.tickets_issued(), 1);
    match outcome.summary {
        Some(Summary::Ticket(ticket)) => {
            assert!(ticket.ticket_id.starts_with("TKT-"));
            assert_eq!(ticket.status, "CREATED");
            assert_eq!(ticket.ticket_type, "L1_POLICY_REVIEW");
            assert_eq!(ticket.listing_id, "FSN1");
            assert_eq!(ticket.reason_code, "POLICY_VIOLATION");
        }
        other => panic!("Expected ticket summary, got {other:?}"),
    }
    assert!(orch.log().last().unwrap().content().render().contains("Your support ticket has been raised"));
}

#[tokio::test]
async fn test_round_limit_is_incomplete() {
    let backend = blocked(BlockReason::TrademarkViolation, BrandApproval::Rejected);
    let mut orch = OrchestratorBuilder::new(backend.registry())
        .with_responders(playbook())
        .with_human_input(ScriptedInput::new(["S1", "FSN1", "BRAND9"]))
        .with_max_rounds(5)
        .build()
        .unwrap();
    let outcome = orch.run(OPENING).await.unwrap();

    assert_eq!(outcome.reason, TerminationReason::RoundLimit { max_rounds: 5 });
    assert!(!outcome.is_complete());
    assert_eq!(outcome.turns, 5);
    assert!(outcome.render().contains("round limit reached"));
}

/// 总是请求一个不存在的后端操作
struct HallucinatingGateway;

#[async_trait]
impl Responder for HallucinatingGateway {
    async fn respond(&self, _history: &[Turn]) -> Result<TurnContent, ConversationError> {
        Ok(FunctionCall::new("get_user_status").with_arg("seller_id", "S1").into())
    }
}

#[tokio::test]
async fn test_unknown_operation_surfaces_error_turn() {
    let backend = ListingBackend::new(BackendScenario::default());
    let responders = ResponderSet::new(
        Arc::new(PlaybookSpecialist::default()),
        Arc::new(HallucinatingGateway),
        Arc::new(PlaybookTicketIssuer::new(&RoutingTable::default().ticket_markers).unwrap()),
    );
    let mut orch = orchestrator(&backend, responders, &["S1"]);
    let outcome = orch.run(OPENING).await.unwrap();

    let error_turn = orch.log().get(5).unwrap();
    assert_eq!(error_turn.sender(), RoleId::FunctionExecutor);
    assert_eq!(error_turn.receiver(), RoleId::Specialist);
    assert!(error_turn.content().is_error());
    assert!(error_turn.content().render().contains("get_user_status"));

    assert!(matches!(outcome.reason, TerminationReason::Completed(_)));
    assert!(orch.log().last().unwrap().content().render().contains("technical difficulties"));
}

#[tokio::test]
async fn test_backend_fault_surfaces_error_turn() {
    let backend = ListingBackend::new(BackendScenario {
        faults: vec!["check_listing_status".to_string()],
        ..Default::default()
    });
    let (orch, outcome) = run(&backend, &["S1", "FSN1"]).await;

    let error_turn = orch
        .log()
        .iter()
        .find(|t| t.content().is_error())
        .unwrap();
    assert!(error_turn.content().render().contains("simulated downstream fault"));
    assert!(outcome.is_complete());
    assert!(outcome.summary.is_none());
}

#[tokio::test]
async fn test_llm_responders_drive_conversation() {
    let backend = ListingBackend::new(BackendScenario {
        account_status: AccountStatus::Onboarding,
        ..Default::default()
    });
    let specialist = Arc::new(MockLlmClient::with_replies([
        "Hello! Please provide your seller ID.",
        "@gateway account_status:S1",
        "Your account is still in the onboarding phase. To complete the process:\n1. Complete all verification steps",
    ]));
    let gateway = Arc::new(MockLlmClient::with_replies([
        "FUNCTION_CALL:check_account_status\n{\"seller_id\": \"S1\"}",
    ]));
    let responders = ResponderSet::new(
        Arc::new(LlmResponder::new(RoleId::Specialist, specialist.clone(), "sia")),
        Arc::new(LlmResponder::new(RoleId::BackendGateway, gateway, "gateway")),
        Arc::new(LlmResponder::new(RoleId::TicketIssuer, Arc::new(MockLlmClient::new()), "ticket")),
    );
    let mut orch = orchestrator(&backend, responders, &["S1"]);
    let outcome = orch.run(OPENING).await.unwrap();

    assert!(matches!(outcome.reason, TerminationReason::Completed(_)));
    assert_eq!(outcome.turns, 7);
    assert_eq!(orch.log().get(4).unwrap().receiver(), RoleId::FunctionExecutor);
    assert_eq!(specialist.requests().len(), 3);
}

#[tokio::test]
async fn test_transcript_round_trip_after_run() {
    let backend = blocked(BlockReason::PolicyViolation, BrandApproval::Pending);
    let (orch, outcome) = run(&backend, &["S1", "FSN1"]).await;

    let dir = tempfile::tempdir().unwrap();
    let store = TranscriptStore::in_dir(dir.path());
    store.save(orch.log()).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded.turns(), orch.log().turns());
    assert_eq!(sia::core::summarize(loaded.turns()), outcome.summary);
}

/// 第一次回复就带上停止信号
struct SignOffSpecialist;

#[async_trait]
impl Responder for SignOffSpecialist {
    async fn respond(&self, _history: &[Turn]) -> Result<TurnContent, ConversationError> {
        Ok(TurnContent::text("Glad I could help. TERMINATE"))
    }
}

#[tokio::test]
async fn test_stop_signal_ends_conversation() {
    let backend = ListingBackend::new(BackendScenario::default());
    let responders = ResponderSet::new(
        Arc::new(SignOffSpecialist),
        Arc::new(HallucinatingGateway),
        Arc::new(HallucinatingGateway),
    );
    let mut orch = orchestrator(&backend, responders, &["S1"]);
    let outcome = orch.run(OPENING).await.unwrap();

    assert_eq!(outcome.reason, TerminationReason::StopSignal("TERMINATE".to_string()));
    assert_eq!(outcome.turns, 2);
    assert!(outcome.summary.is_none());

    orch.step().await.unwrap();
    assert_eq!(orch.log().len(), 2);
    assert!(orch.state().is_terminated());
}

#[tokio::test]
async fn test_gateway_executes_addressed_function_call() {
    let backend = ListingBackend::new(BackendScenario {
        account_status: AccountStatus::Onboarding,
        ..Default::default()
    });
    let specialist = Arc::new(MockLlmClient::with_replies([
        "@gateway FUNCTION_CALL:check_account_status {\"seller_id\": \"S1\"}",
        "Your account is still in the onboarding phase. To complete the process:\n1. Complete all verification steps",
    ]));
    let gateway = Arc::new(MockLlmClient::new());
    let responders = ResponderSet::new(
        Arc::new(LlmResponder::new(RoleId::Specialist, specialist, "sia")),
        Arc::new(LlmResponder::new(RoleId::BackendGateway, gateway.clone(), "gateway")),
        Arc::new(LlmResponder::new(RoleId::TicketIssuer, Arc::new(MockLlmClient::new()), "ticket")),
    );
    let mut orch = orchestrator(&backend, responders, &[]);
    let outcome = orch.run(OPENING).await.unwrap();

    assert!(matches!(outcome.reason, TerminationReason::Completed(_)));
    assert_eq!(outcome.turns, 4);
    assert!(gateway.requests().is_empty());

    let record_turn = orch.log().get(2).unwrap();
    assert_eq!(record_turn.sender(), RoleId::BackendGateway);
    assert_eq!(record_turn.receiver(), RoleId::Specialist);
    match BackendRecord::parse(&record_turn.content().render()).unwrap() {
        BackendRecord::AccountStatus { seller_id, status, .. } => {
            assert_eq!(seller_id, "S1");
            assert_eq!(status, AccountStatus::Onboarding);
        }
        other => panic!("Expected account status record, got {other:?}"),
    }
    assert_well_formed(orch.log().turns());
}

#[tokio::test]
async fn test_configured_markers_reach_backend() {
    let table = RoutingTable {
        gateway_markers: vec!["@backend".to_string()],
        ticket_markers: vec!["@desk".to_string()],
        ..RoutingTable::default()
    };
    let backend = blocked(BlockReason::PolicyViolation, BrandApproval::Pending);
    let mut orch = OrchestratorBuilder::new(backend.registry())
        .with_routing(table.clone())
        .with_responders(playbook_responders(&table).unwrap())
        .with_human_input(ScriptedInput::new(["S1", "FSN1"]))
        .build()
        .unwrap();
    let outcome = orch.run(OPENING).await.unwrap();

    assert!(matches!(outcome.summary, Some(Summary::Ticket(_))));
    assert_eq!(backend.tickets_issued(), 1);
    assert!(orch
        .log()
        .iter()
        .any(|t| t.receiver() == RoleId::BackendGateway && t.content().render().starts_with("@backend ")));
    assert!(orch
        .log()
        .iter()
        .all(|t| !t.content().render().contains("@gateway")));
    assert_well_formed(orch.log().turns());
}
