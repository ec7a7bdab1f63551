//! SIA - Seller Integration Assistant
//!
//! 入口：初始化日志、加载配置、组装应答方与编排器，在控制台运行一次会话并输出结论。
//! 用法见 [`USAGE`]。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use sia::{
    agents::{playbook_responders, system_prompt, LlmResponder, ResponderSet},
    backend::{ListingBackend, OperationRegistry},
    config::{create_llm, load_config, AppConfig},
    conversation::{RoleId, TranscriptStore},
    core::{OrchestratorBuilder, RoutingTable},
    llm::LlmClient,
    observability,
    ui::{print_outcome, ConsoleInput, ConsoleObserver},
};

const USAGE: &str = "\
Usage: sia [--pick-scenario] [config.toml]

  --pick-scenario   choose the simulated backend scenario interactively before the conversation
  -h, --help        print this help

The backend scenario can also be set through environment variables, e.g.
  SIA__BACKEND__ACCOUNT_STATUS=ACTIVE
  SIA__BACKEND__LISTING_STATUS=BLOCKED
  SIA__BACKEND__BLOCK_REASON=TRADEMARK_VIOLATION
  SIA__BACKEND__BRAND_APPROVAL=REJECTED
  SIA__BACKEND__FAULTS=check_listing_status,create_support_ticket
";

struct CliArgs {
    config_path: Option<PathBuf>,
    pick_scenario: bool,
    help: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> CliArgs {
    let mut cli = CliArgs {
        config_path: None,
        pick_scenario: false,
        help: false,
    };
    for arg in args {
        match arg.as_str() {
            "--pick-scenario" => cli.pick_scenario = true,
            "-h" | "--help" => cli.help = true,
            _ => cli.config_path = Some(PathBuf::from(arg)),
        }
    }
    cli
}

fn build_responders(
    llm: Option<Arc<dyn LlmClient>>,
    registry: &OperationRegistry,
    table: &RoutingTable,
) -> anyhow::Result<ResponderSet> {
    let responders = match llm {
        Some(llm) => {
            let bind = |role: RoleId| {
                Arc::new(LlmResponder::new(role, llm.clone(), system_prompt(role, registry)))
            };
            ResponderSet::new(
                bind(RoleId::Specialist),
                bind(RoleId::BackendGateway),
                bind(RoleId::TicketIssuer),
            )
        }
        None => playbook_responders(table)?,
    };
    Ok(responders)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cli = parse_args(std::env::args().skip(1));
    if cli.help {
        print!("{USAGE}");
        return Ok(());
    }
    let mut cfg = load_config(cli.config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let mut input = ConsoleInput::new();
    if cli.pick_scenario {
        cfg.backend = input
            .pick_scenario(cfg.backend.clone())
            .await
            .context("Failed to read backend scenario")?;
        tracing::info!(scenario = ?cfg.backend, "backend scenario picked");
    }

    let backend = ListingBackend::new(cfg.backend.clone());
    let registry = backend.registry();
    let llm = create_llm(&cfg);
    let responders = build_responders(llm.clone(), &registry, &cfg.routing.table())?;

    let mut orchestrator = OrchestratorBuilder::from_config(&cfg, registry)
        .with_responders(responders)
        .with_human_input(input)
        .with_observer(ConsoleObserver)
        .build()
        .context("Failed to build orchestrator")?;

    let result = orchestrator.run(&cfg.app.opening_message).await;

    if let Some(dir) = &cfg.app.transcript_dir {
        let store = TranscriptStore::in_dir(dir);
        store
            .save(orchestrator.log())
            .with_context(|| format!("Failed to save transcript to {}", store.path().display()))?;
        tracing::info!(path = %store.path().display(), "transcript saved");
    }

    if let Some(llm) = &llm {
        let (prompt, completion, total) = llm.token_usage();
        tracing::info!(prompt, completion, total, "token usage");
    }

    let outcome = result.context("Conversation aborted")?;
    print_outcome(&outcome)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> CliArgs {
        parse_args(raw.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let cli = args(&["--pick-scenario", "scenario.toml"]);
        assert!(cli.pick_scenario);
        assert_eq!(cli.config_path, Some(PathBuf::from("scenario.toml")));

        let cli = args(&[]);
        assert!(!cli.pick_scenario && !cli.help);
        assert!(cli.config_path.is_none());
        assert!(args(&["-h"]).help);
    }
}
