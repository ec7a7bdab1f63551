//! 后端层：结构化记录、操作注册表、调度器与模拟商品后端

pub mod dispatcher;
pub mod listing;
pub mod record;
pub mod registry;
pub mod schema;

pub use dispatcher::Dispatcher;
pub use listing::{BackendScenario, ListingBackend};
pub use record::{
    AccountStatus, BackendRecord, BlockReason, BrandApproval, EnrollmentOutcome, ListingStatus,
    RecordKind, TicketOutcome,
};
pub use registry::{BackendOperation, OperationRegistry};
pub use schema::function_call_schema_json;
