//! 对话轮次：角色、函数调用指令、轮次内容
//!
//! Turn 一经构造即不可变（字段私有，仅提供只读访问），且保证 sender != receiver；
//! 反序列化同样经过校验，持久化的对话记录无法绕过该约束。

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::ConversationError;

/// 函数调用指令前缀：`FUNCTION_CALL:<name>` 之后跟 JSON 参数对象
pub const FUNCTION_CALL_MARKER: &str = "FUNCTION_CALL:";

/// 错误内容前缀：调度失败时 FunctionExecutor 写回对话的文本以此开头
pub const ERROR_PREFIX: &str = "ERROR:";

/// 固定的对话参与者
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleId {
    HumanProxy,
    Specialist,
    BackendGateway,
    TicketIssuer,
    FunctionExecutor,
}

impl RoleId {
    pub const ALL: [RoleId; 5] = [
        RoleId::HumanProxy,
        RoleId::Specialist,
        RoleId::BackendGateway,
        RoleId::TicketIssuer,
        RoleId::FunctionExecutor,
    ];

    /// 控制台与 LLM 上下文中展示的名字
    pub fn display_name(&self) -> &'static str {
        match self {
            RoleId::HumanProxy => "User",
            RoleId::Specialist => "SIA",
            RoleId::BackendGateway => "API_Agent",
            RoleId::TicketIssuer => "Ticket_Agent",
            RoleId::FunctionExecutor => "FunctionExecutor",
        }
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 结构化函数调用：操作名 + 字符串参数表
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FunctionCall {
    /// 后端操作名，如 check_listing_status
    pub name: String,
    /// 参数名 -> 参数值（均为字符串）
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).map(String::as_str)
    }

    /// 渲染为 `FUNCTION_CALL:<name>\n{json}` 文本形式
    pub fn render(&self) -> String {
        let args = serde_json::to_string(&self.arguments).unwrap_or_else(|_| "{}".to_string());
        format!("{FUNCTION_CALL_MARKER}{}\n{args}", self.name)
    }
}

/// 轮次内容：纯文本或函数调用
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TurnContent {
    Text(String),
    FunctionCall(FunctionCall),
}

impl TurnContent {
    pub fn text(content: impl Into<String>) -> Self {
        TurnContent::Text(content.into())
    }

    /// 解析 Responder 的原始输出：含可解析的函数调用指令则为 FunctionCall，否则为 Text
    pub fn parse(raw: &str) -> Self {
        match parse_function_call(raw) {
            Some(call) => TurnContent::FunctionCall(call),
            None => TurnContent::Text(raw.trim().to_string()),
        }
    }

    /// 内容是否呈函数调用形态（已结构化，或文本中带有指令前缀）
    pub fn is_function_call(&self) -> bool {
        match self {
            TurnContent::FunctionCall(_) => true,
            TurnContent::Text(text) => text.contains(FUNCTION_CALL_MARKER),
        }
    }

    /// 取出函数调用；文本形态会尝试解析，格式错误返回 None
    pub fn as_function_call(&self) -> Option<FunctionCall> {
        match self {
            TurnContent::FunctionCall(call) => Some(call.clone()),
            TurnContent::Text(text) => parse_function_call(text),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TurnContent::Text(text) if text.trim_start().starts_with(ERROR_PREFIX))
    }

    /// 路由与终止判断所依据的文本
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            TurnContent::Text(text) => Cow::Borrowed(text.as_str()),
            TurnContent::FunctionCall(call) => Cow::Owned(call.render()),
        }
    }
}

impl From<FunctionCall> for TurnContent {
    fn from(call: FunctionCall) -> Self {
        TurnContent::FunctionCall(call)
    }
}

/// 从文本中提取 `FUNCTION_CALL:<name>` 及其后的 JSON 参数对象
///
/// 参数对象缺失时视为空参数；JSON 存在但无法解析、或操作名为空时返回 None。
/// 非字符串的 JSON 值按其 JSON 文本保存。
pub fn parse_function_call(text: &str) -> Option<FunctionCall> {
    let start = text.find(FUNCTION_CALL_MARKER)?;
    let rest = &text[start + FUNCTION_CALL_MARKER.len()..];

    let name: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() {
        return None;
    }

    let mut call = FunctionCall::new(name);
    let Some(open) = rest.find('{') else {
        return Some(call);
    };
    let close = rest.rfind('}')?;
    if close < open {
        return None;
    }

    let parsed: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&rest[open..=close]).ok()?;
    for (key, value) in parsed {
        let value = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        call.arguments.insert(key, value);
    }
    Some(call)
}

/// 对话中的一轮：发送方、目标接收方、内容
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TurnRecord")]
pub struct Turn {
    sender: RoleId,
    receiver: RoleId,
    content: TurnContent,
}

impl Turn {
    /// 构造轮次；sender 与 receiver 相同时返回 SelfAddressed
    pub fn new(
        sender: RoleId,
        receiver: RoleId,
        content: impl Into<TurnContent>,
    ) -> Result<Self, ConversationError> {
        if sender == receiver {
            return Err(ConversationError::SelfAddressed(sender));
        }
        Ok(Self {
            sender,
            receiver,
            content: content.into(),
        })
    }

    pub fn sender(&self) -> RoleId {
        self.sender
    }

    pub fn receiver(&self) -> RoleId {
        self.receiver
    }

    pub fn content(&self) -> &TurnContent {
        &self.content
    }
}

impl From<String> for TurnContent {
    fn from(text: String) -> Self {
        TurnContent::Text(text)
    }
}

impl From<&str> for TurnContent {
    fn from(text: &str) -> Self {
        TurnContent::Text(text.to_string())
    }
}

#[derive(Deserialize)]
struct TurnRecord {
    sender: RoleId,
    receiver: RoleId,
    content: TurnContent,
}

impl TryFrom<TurnRecord> for Turn {
    type Error = ConversationError;

    fn try_from(record: TurnRecord) -> Result<Self, Self::Error> {
        Turn::new(record.sender, record.receiver, record.content)
    }
}
