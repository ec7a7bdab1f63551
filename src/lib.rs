//! SIA - Seller Integration Assistant：多角色对话路由与后端函数调度引擎
//!
//! 模块划分：
//! - **agents**: 应答方（LLM / 剧本）、角色指令文本、预置回复模板
//! - **backend**: 后端记录、操作注册表、调度器、模拟商品后端
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **conversation**: 角色、轮次、只追加日志与会话记录持久化
//! - **core**: 路由、终止判定、状态机、编排器、错误恢复、结论提取
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **observability**: tracing 初始化
//! - **ui**: 控制台渲染与人类输入

pub mod agents;
pub mod backend;
pub mod config;
pub mod conversation;
pub mod core;
pub mod llm;
pub mod observability;
pub mod ui;
