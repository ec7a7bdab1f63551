//! 对话渲染
//!
//! 每追加一轮就按发送方着色输出一段：`[序号] 发送方 -> 接收方` 标题行，正文缩进。
//! 后端记录等原始 JSON 过长时折叠，避免刷屏。

use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
};

use crate::conversation::{RoleId, Turn};
use crate::core::{ConversationObserver, ConversationOutcome};

/// 单轮正文显示的最大字符数
const MAX_DISPLAY_CHARS: usize = 600;
/// 后端记录 / 函数调用的显示上限
const MAX_RECORD_DISPLAY_CHARS: usize = 400;

fn role_color(role: RoleId) -> Color {
    match role {
        RoleId::HumanProxy => Color::Cyan,
        RoleId::Specialist => Color::Green,
        RoleId::BackendGateway => Color::Yellow,
        RoleId::TicketIssuer => Color::Magenta,
        RoleId::FunctionExecutor => Color::DarkGrey,
    }
}

/// 对过长内容做折叠：保留前 N 字 + 省略提示
fn truncate_for_display(content: &str, limit: usize) -> String {
    let total = content.chars().count();
    if total <= limit {
        return content.to_string();
    }
    let head: String = content.chars().take(limit).collect();
    format!("{head}\n... [{} more chars]", total - limit)
}

/// 一轮的纯文本形式（不含颜色）
pub fn format_turn(index: usize, turn: &Turn) -> String {
    let raw = turn.content().render();
    let limit = if turn.content().is_function_call() || turn.sender() == RoleId::FunctionExecutor {
        MAX_RECORD_DISPLAY_CHARS
    } else {
        MAX_DISPLAY_CHARS
    };
    let body = truncate_for_display(&raw, limit)
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("[{index}] {} -> {}\n{body}", turn.sender(), turn.receiver())
}

fn write_turn(out: &mut impl Write, index: usize, turn: &Turn) -> io::Result<()> {
    let text = format_turn(index, turn);
    let (header, body) = text.split_once('\n').unwrap_or((text.as_str(), ""));
    queue!(
        out,
        SetForegroundColor(role_color(turn.sender())),
        SetAttribute(Attribute::Bold),
        Print(header),
        SetAttribute(Attribute::Reset),
        ResetColor,
        Print("\n"),
        Print(body),
        Print("\n\n"),
    )?;
    out.flush()
}

/// 把会话结果写到 stdout
pub fn print_outcome(outcome: &ConversationOutcome) -> io::Result<()> {
    let mut out = io::stdout();
    let color = if outcome.is_complete() { Color::Green } else { Color::Red };
    queue!(
        out,
        SetForegroundColor(color),
        SetAttribute(Attribute::Bold),
        Print("== Outcome ==\n"),
        SetAttribute(Attribute::Reset),
        ResetColor,
        Print(outcome.render()),
    )?;
    out.flush()
}

/// 控制台观察者：每追加一轮即输出
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl ConversationObserver for ConsoleObserver {
    fn on_turn(&mut self, index: usize, turn: &Turn) {
        if let Err(e) = write_turn(&mut io::stdout(), index, turn) {
            tracing::warn!(error = %e, "failed to render turn");
        }
    }
}
