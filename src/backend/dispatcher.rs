//! 函数调用调度器
//!
//! 持有 OperationRegistry：按名查找操作、校验必填参数、同步调用并核对返回记录种类；
//! 每次调用输出结构化审计日志（JSON）。校验失败时不会触达后端。

use std::time::Instant;

use crate::backend::{BackendRecord, OperationRegistry};
use crate::conversation::FunctionCall;
use crate::core::ConversationError;

pub struct Dispatcher {
    registry: OperationRegistry,
}

impl Dispatcher {
    pub fn new(registry: OperationRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// 执行函数调用：未注册返回 UnknownOperation，缺参返回 MissingArgument（空白值视为缺失）
    pub fn execute(&self, call: &FunctionCall) -> Result<BackendRecord, ConversationError> {
        let operation = self
            .registry
            .get(&call.name)
            .ok_or_else(|| ConversationError::UnknownOperation(call.name.clone()))?;

        if let Some(missing) = operation
            .required_args()
            .iter()
            .find(|arg| call.arg(arg).map_or(true, |v| v.trim().is_empty()))
        {
            return Err(ConversationError::MissingArgument {
                operation: call.name.clone(),
                argument: (*missing).to_string(),
            });
        }

        let start = Instant::now();
        let result = operation.invoke(&call.arguments).and_then(|record| {
            if record.kind() == operation.kind() {
                Ok(record)
            } else {
                Err(ConversationError::BackendFailure {
                    operation: call.name.clone(),
                    message: format!(
                        "returned {} record, expected {}",
                        record.kind(),
                        operation.kind()
                    ),
                })
            }
        });

        let duration_ms = start.elapsed().as_millis() as u64;
        let outcome = result.as_ref().map(|r| r.kind().as_str()).unwrap_or("error");
        let audit = serde_json::json!({
            "event": "dispatch_audit",
            "operation": call.name,
            "ok": result.is_ok(),
            "outcome": outcome,
            "duration_ms": duration_ms,
            "args_preview": args_preview(call),
        });
        tracing::info!(audit = %audit, "dispatch");

        result
    }
}

fn args_preview(call: &FunctionCall) -> String {
    let s = serde_json::to_string(&call.arguments).unwrap_or_default();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
