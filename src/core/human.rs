//! 人类输入通道与对话观察者
//!
//! HumanInput 是系统中唯一的阻塞点：编排器在 AwaitingHuman 阶段等待一行输入。
//! 返回 None 表示输入已关闭（EOF），按退出处理。

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::conversation::Turn;

/// 人类直接回车（跳过）时写入对话的内容
pub const NO_INPUT: &str = "(no additional input)";

#[async_trait]
pub trait HumanInput: Send {
    /// 读取一行输入；prompt 为促使等待的那一轮
    async fn read_line(&mut self, prompt: &Turn) -> std::io::Result<Option<String>>;
}

/// 预先写好的输入序列（测试与批处理使用）；耗尽后返回 None
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl HumanInput for ScriptedInput {
    async fn read_line(&mut self, _prompt: &Turn) -> std::io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// 每追加一轮时同步回调（控制台渲染等）
pub trait ConversationObserver: Send {
    fn on_turn(&mut self, index: usize, turn: &Turn);
}
