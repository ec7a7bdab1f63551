//! 后端操作注册表
//!
//! 每个后端操作实现 BackendOperation（name / description / required_args / kind / invoke），
//! 由 OperationRegistry 按名注册与查找；Dispatcher 在调用前依据 required_args 校验参数。

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backend::{BackendRecord, RecordKind};
use crate::core::ConversationError;

/// 后端操作 trait：名称、描述（供 LLM 理解）、必填参数、返回记录种类、同步执行
pub trait BackendOperation: Send + Sync {
    /// 操作名（即 FunctionCall.name）
    fn name(&self) -> &'static str;

    /// 操作描述（注入网关角色的指令文本）
    fn description(&self) -> &'static str;

    /// 必填参数名
    fn required_args(&self) -> &'static [&'static str];

    /// 返回的记录种类
    fn kind(&self) -> RecordKind;

    /// 执行操作；调用方保证必填参数已存在
    fn invoke(&self, args: &BTreeMap<String, String>) -> Result<BackendRecord, ConversationError>;
}

/// 操作注册表：按名称存储 Arc<dyn BackendOperation>，按名有序便于生成稳定的 schema
#[derive(Default, Clone)]
pub struct OperationRegistry {
    operations: BTreeMap<String, Arc<dyn BackendOperation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operation: impl BackendOperation + 'static) {
        let name = operation.name().to_string();
        self.operations.insert(name, Arc::new(operation));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn BackendOperation>> {
        self.operations.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn operation_names(&self) -> Vec<String> {
        self.operations.keys().cloned().collect()
    }

    /// 生成 prompt 中的 Available operations 段落：名称、必填参数、描述
    pub fn to_schema_json(&self) -> String {
        let ops: Vec<serde_json::Value> = self
            .operations
            .values()
            .map(|op| {
                serde_json::json!({
                    "name": op.name(),
                    "description": op.description(),
                    "required_args": op.required_args(),
                    "returns": op.kind().as_str(),
                })
            })
            .collect();
        serde_json::to_string_pretty(&ops).unwrap_or_else(|_| "[]".to_string())
    }
}
