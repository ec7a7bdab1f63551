//! 对话日志：只追加的有序轮次序列
//!
//! 下标顺序即对话顺序，是唯一的排序依据；已追加的轮次不可修改或删除，更正通过追加新轮次表达。

use serde::{Deserialize, Serialize};

use crate::conversation::Turn;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由已校验的轮次重建日志（如从持久化记录加载）
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// 追加一轮，返回其下标
    pub fn append(&mut self, turn: Turn) -> usize {
        self.turns.push(turn);
        self.turns.len() - 1
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Turn> {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::RoleId;

    #[test]
    fn test_append_preserves_order_and_prior_turns() {
        let mut log = ConversationLog::new();
        let first = Turn::new(RoleId::HumanProxy, RoleId::Specialist, "hello").unwrap();
        let snapshot = first.clone();
        assert_eq!(log.append(first), 0);
        let second = Turn::new(RoleId::Specialist, RoleId::HumanProxy, "Please provide your seller ID.").unwrap();
        assert_eq!(log.append(second), 1);

        assert_eq!(log.len(), 2);
        assert_eq!(log.get(0), Some(&snapshot));
        assert_eq!(log.last().map(|t| t.sender()), Some(RoleId::Specialist));
    }
}
