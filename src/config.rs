//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SIA__*` 覆盖（双下划线表示嵌套，如 `SIA__BACKEND__LISTING_STATUS=BLOCKED`）。
//! 列表键用逗号分隔，如 `SIA__BACKEND__FAULTS=check_listing_status,create_support_ticket`。

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::backend::BackendScenario;
use crate::core::{RoutingTable, DEFAULT_MAX_ROUNDS};
use crate::llm::{LlmClient, LlmSettings, OpenAiClient};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub routing: RoutingSection,
    pub backend: BackendScenario,
}

/// [app] 段：应用名、轮次上限、开场白、会话记录目录
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 单次会话最多追加的轮次
    pub max_rounds: usize,
    /// 人类的开场白
    pub opening_message: String,
    /// 设置后在会话结束时写入 JSON 记录
    pub transcript_dir: Option<PathBuf>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            opening_message: "I need help with my listing".to_string(),
            transcript_dir: None,
        }
    }
}

/// [llm] 段：应答方后端选择与请求参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// playbook / openai
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    /// 保存 API Key 的环境变量名
    pub api_key_env: String,
    pub temperature: f32,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "playbook".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 120 }
    }
}

/// [routing] 段：寻址标记、索取话术、退出与停止信号
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingSection {
    pub gateway_markers: Vec<String>,
    pub ticket_markers: Vec<String>,
    pub solicitation_phrases: Vec<String>,
    /// 人类输入这些词之一即结束会话（不区分大小写）
    pub exit_signals: Vec<String>,
    /// 内容包含即终止（区分大小写）
    pub stop_signals: Vec<String>,
    /// 附加的结束特征句（模板特征句总是生效）
    pub completion_markers: Vec<String>,
}

impl Default for RoutingSection {
    fn default() -> Self {
        let table = RoutingTable::default();
        Self {
            gateway_markers: table.gateway_markers,
            ticket_markers: table.ticket_markers,
            solicitation_phrases: table.solicitation_phrases,
            exit_signals: vec!["exit".into(), "quit".into()],
            stop_signals: vec!["TERMINATE".into()],
            completion_markers: Vec::new(),
        }
    }
}

impl RoutingSection {
    pub fn table(&self) -> RoutingTable {
        RoutingTable {
            gateway_markers: self.gateway_markers.clone(),
            ticket_markers: self.ticket_markers.clone(),
            solicitation_phrases: self.solicitation_phrases.clone(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 SIA__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SIA__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default"] {
        if std::path::Path::new(&format!("{name}.toml")).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(environment());

    builder.build()?.try_deserialize()
}

/// 按逗号拆分的列表键（环境变量中无法直接写数组）
const LIST_KEYS: &[&str] = &[
    "backend.faults",
    "routing.gateway_markers",
    "routing.ticket_markers",
    "routing.solicitation_phrases",
    "routing.exit_signals",
    "routing.stop_signals",
    "routing.completion_markers",
];

fn environment() -> config::Environment {
    LIST_KEYS.iter().fold(
        config::Environment::with_prefix("SIA")
            .separator("__")
            .list_separator(",")
            .try_parsing(true),
        |env, key| env.with_list_parse_key(key),
    )
}

/// 按 [llm] 段创建 LLM 客户端；provider 不是 openai 或缺少 API Key 时返回 None（使用剧本应答方）
pub fn create_llm(cfg: &AppConfig) -> Option<Arc<dyn LlmClient>> {
    if !cfg.llm.provider.eq_ignore_ascii_case("openai") {
        tracing::info!(provider = %cfg.llm.provider, "using playbook responders");
        return None;
    }
    let Ok(api_key) = std::env::var(&cfg.llm.api_key_env) else {
        tracing::warn!(env = %cfg.llm.api_key_env, "API key not set, falling back to playbook responders");
        return None;
    };

    tracing::info!(model = %cfg.llm.model, "using OpenAI-compatible LLM");
    let settings = LlmSettings {
        model: cfg.llm.model.clone(),
        base_url: cfg.llm.base_url.clone(),
        api_key,
        temperature: cfg.llm.temperature,
        request_timeout_secs: cfg.llm.timeouts.request,
    };
    Some(Arc::new(OpenAiClient::new(&settings)))
}
