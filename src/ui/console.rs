//! 控制台人类输入：提示符 + 读取 stdin 一行
//!
//! 空行表示跳过（由编排器写入“无新输入”），EOF 视为退出。
//! 启动前也可在这里交互选择模拟后端的场景。

use async_trait::async_trait;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::backend::{AccountStatus, BackendScenario, BlockReason, BrandApproval, ListingStatus};
use crate::conversation::{RoleId, Turn};
use crate::core::HumanInput;

const ACCOUNT_CHOICES: &[(&str, AccountStatus)] = &[
    ("ACTIVE", AccountStatus::Active),
    ("ONBOARDING", AccountStatus::Onboarding),
    ("ON_HOLD", AccountStatus::OnHold),
];

const LISTING_CHOICES: &[(&str, ListingStatus)] = &[
    ("ACTIVE", ListingStatus::Active),
    ("INACTIVE", ListingStatus::Inactive),
    ("ARCHIVED", ListingStatus::Archived),
    ("READY_FOR_ACTIVATION", ListingStatus::ReadyForActivation),
    ("BLOCKED", ListingStatus::Blocked),
];

const BLOCK_REASON_CHOICES: &[(&str, BlockReason)] = &[
    ("SELLER_STATE_CHANGE", BlockReason::SellerStateChange),
    ("POLICY_VIOLATION", BlockReason::PolicyViolation),
    ("TRADEMARK_VIOLATION", BlockReason::TrademarkViolation),
];

const BRAND_CHOICES: &[(&str, BrandApproval)] = &[
    ("APPROVED", BrandApproval::Approved),
    ("PENDING", BrandApproval::Pending),
    ("REJECTED", BrandApproval::Rejected),
];

/// 解析一次选择：序号（从 1 开始）或名称（不区分大小写）；空行或无法识别时保留当前值
fn choose<T: Copy + PartialEq>(answer: &str, options: &[(&str, T)], current: T) -> T {
    let answer = answer.trim();
    if answer.is_empty() {
        return current;
    }
    let picked = match answer.parse::<usize>() {
        Ok(n) => n.checked_sub(1).and_then(|i| options.get(i)),
        Err(_) => options.iter().find(|(label, _)| label.eq_ignore_ascii_case(answer)),
    };
    match picked {
        Some((_, value)) => *value,
        None => {
            tracing::warn!(answer, "unrecognized choice, keeping current value");
            current
        }
    }
}

pub struct ConsoleInput {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl ConsoleInput {
    async fn ask<T: Copy + PartialEq>(
        &mut self,
        title: &str,
        options: &[(&str, T)],
        current: T,
    ) -> std::io::Result<T> {
        let listed: Vec<String> = options
            .iter()
            .enumerate()
            .map(|(i, (label, value))| {
                let mark = if *value == current { "*" } else { " " };
                format!("  {mark}{}. {label}", i + 1)
            })
            .collect();
        execute!(
            std::io::stdout(),
            SetForegroundColor(Color::Yellow),
            Print(format!("{title}\n{}\n", listed.join("\n"))),
            ResetColor,
            Print("choice (Enter keeps *) > "),
        )?;
        let answer = self.lines.next_line().await?.unwrap_or_default();
        Ok(choose(&answer, options, current))
    }

    /// 逐项询问后端场景；账号、商品状态不触及的字段不再追问
    pub async fn pick_scenario(&mut self, base: BackendScenario) -> std::io::Result<BackendScenario> {
        let mut scenario = base;
        scenario.account_status = self
            .ask("Seller account status", ACCOUNT_CHOICES, scenario.account_status)
            .await?;
        if scenario.account_status != AccountStatus::Active {
            return Ok(scenario);
        }
        scenario.listing_status = self
            .ask("Listing status", LISTING_CHOICES, scenario.listing_status)
            .await?;
        if scenario.listing_status != ListingStatus::Blocked {
            return Ok(scenario);
        }
        scenario.block_reason = self
            .ask("Block reason", BLOCK_REASON_CHOICES, scenario.block_reason)
            .await?;
        if scenario.block_reason == BlockReason::TrademarkViolation {
            scenario.brand_approval = self
                .ask("Brand approval", BRAND_CHOICES, scenario.brand_approval)
                .await?;
        }
        Ok(scenario)
    }
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HumanInput for ConsoleInput {
    async fn read_line(&mut self, _prompt: &Turn) -> std::io::Result<Option<String>> {
        execute!(
            std::io::stdout(),
            SetForegroundColor(Color::Cyan),
            Print(format!("{} (exit/quit to end, Enter to skip) > ", RoleId::HumanProxy)),
            ResetColor,
        )?;
        self.lines.next_line().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_by_index_or_name() {
        assert_eq!(choose("2", LISTING_CHOICES, ListingStatus::Active), ListingStatus::Inactive);
        assert_eq!(choose(" blocked ", LISTING_CHOICES, ListingStatus::Active), ListingStatus::Blocked);
        assert_eq!(
            choose("Trademark_Violation", BLOCK_REASON_CHOICES, BlockReason::SellerStateChange),
            BlockReason::TrademarkViolation
        );
    }

    #[test]
    fn test_choose_keeps_current_on_blank_or_unknown() {
        assert_eq!(choose("", BRAND_CHOICES, BrandApproval::Rejected), BrandApproval::Rejected);
        assert_eq!(choose("0", BRAND_CHOICES, BrandApproval::Pending), BrandApproval::Pending);
        assert_eq!(choose("9", ACCOUNT_CHOICES, AccountStatus::OnHold), AccountStatus::OnHold);
        assert_eq!(choose("maybe", ACCOUNT_CHOICES, AccountStatus::Active), AccountStatus::Active);
    }
}
