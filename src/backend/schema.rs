//! 函数调用 JSON Schema 生成（schemars）
//!
//! 将合法 FunctionCall 的结构注入网关角色的指令文本，减少 LLM 输出格式错误。

use schemars::schema_for;

use crate::conversation::FunctionCall;

/// 返回 FunctionCall 的 JSON Schema 字符串，可拼入 system prompt
pub fn function_call_schema_json() -> String {
    let schema = schema_for!(FunctionCall);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mentions_fields() {
        let schema = function_call_schema_json();
        assert!(schema.contains("\"name\""));
        assert!(schema.contains("\"arguments\""));
    }
}
