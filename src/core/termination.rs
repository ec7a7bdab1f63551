//! 终止判定：每追加一轮即检查，命中停止信号或已渲染的结束模板即终止

use crate::conversation::TurnContent;
use crate::core::TerminationReason;

#[derive(Debug, Clone, Default)]
pub struct TerminationPolicy {
    /// 显式停止信号（区分大小写，如 TERMINATE）
    stop_signals: Vec<String>,
    /// 结束模板的特征句（不区分大小写）
    completion_markers: Vec<String>,
}

impl TerminationPolicy {
    pub fn new(stop_signals: Vec<String>, completion_markers: Vec<String>) -> Self {
        Self {
            stop_signals: stop_signals
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .collect(),
            completion_markers: completion_markers
                .into_iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn check(&self, content: &TurnContent) -> Option<TerminationReason> {
        let text = content.render();
        if let Some(signal) = self.stop_signals.iter().find(|s| text.contains(s.as_str())) {
            return Some(TerminationReason::StopSignal(signal.clone()));
        }
        let lowered = text.to_lowercase();
        self.completion_markers
            .iter()
            .find(|m| lowered.contains(m.as_str()))
            .map(|m| TerminationReason::Completed(m.clone()))
    }
}
