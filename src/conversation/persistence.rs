//! 对话记录持久化
//!
//! 会话结束后将完整日志写入 JSON 文件，亦可读回（读回时逐轮校验 sender != receiver）。

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::conversation::ConversationLog;

/// 单文件 JSON 持久化
#[derive(Debug)]
pub struct TranscriptStore {
    path: PathBuf,
}

impl TranscriptStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 在目录下按时间戳生成新文件名
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
        let id = uuid::Uuid::new_v4().simple().to_string();
        let short = id.get(..8).unwrap_or(&id);
        Self::new(dir.as_ref().join(format!("conversation-{stamp}-{short}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取对话记录；文件不存在时返回空日志
    pub fn load(&self) -> anyhow::Result<ConversationLog> {
        if !self.path.exists() {
            return Ok(ConversationLog::new());
        }
        let data = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading transcript {}", self.path.display()))?;
        let log: ConversationLog = serde_json::from_str(&data)
            .with_context(|| format!("parsing transcript {}", self.path.display()))?;
        Ok(log)
    }

    /// 写入对话记录；父目录不存在时自动创建
    pub fn save(&self, log: &ConversationLog) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(log)?)
            .with_context(|| format!("writing transcript {}", self.path.display()))?;
        Ok(())
    }
}
