//! 角色路由：由最新一轮的内容与发送方决定下一位接收方
//!
//! 路由规则是一张有序决策表，按顺序取第一条命中的规则：
//! 显式寻址标记（@gateway / @ticketing）优先于函数调用形态，二者都优先于基于发送方与话术的兜底规则。
//! 若命中规则的目标恰为发送方本身则跳过该规则，继续向下匹配（保证 sender != receiver）。
//! 路由是纯函数：相同的 (发送方, 内容) 总得到相同的接收方。

use crate::conversation::{RoleId, Turn, TurnContent};

/// 规则命中条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteCondition {
    /// 内容包含任一寻址标记（不区分大小写）
    AddressMarker(Vec<String>),
    /// 内容呈函数调用形态
    FunctionCallDirective,
    /// 发送方属于给定角色之一
    SenderIn(Vec<RoleId>),
    /// 发送方为给定角色，且内容包含任一索取信息的话术（不区分大小写）
    Solicits { sender: RoleId, phrases: Vec<String> },
    /// 无条件
    Always,
}

/// 决策表中的一条规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub name: &'static str,
    pub condition: RouteCondition,
    pub target: RoleId,
}

/// 路由结果：接收方与命中的规则名（用于日志与测试）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDecision {
    pub receiver: RoleId,
    pub rule: &'static str,
}

/// 构造 Router 所需的标记与话术（来自 [routing] 配置段）
#[derive(Debug, Clone)]
pub struct RoutingTable {
    pub gateway_markers: Vec<String>,
    pub ticket_markers: Vec<String>,
    pub solicitation_phrases: Vec<String>,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self {
            gateway_markers: vec!["@gateway".into(), "@api_agent".into()],
            ticket_markers: vec!["@ticketing".into(), "@ticket_agent".into()],
            solicitation_phrases: vec![
                "provide".into(),
                "please provide".into(),
                "what is".into(),
                "enter".into(),
                "what's your".into(),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Router {
    rules: Vec<RouteRule>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RoutingTable::default())
    }
}

fn lowercase_all(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Router {
    /// 标准决策表
    pub fn new(table: RoutingTable) -> Self {
        let rules = vec![
            RouteRule {
                name: "gateway_marker",
                condition: RouteCondition::AddressMarker(lowercase_all(table.gateway_markers)),
                target: RoleId::BackendGateway,
            },
            RouteRule {
                name: "ticket_marker",
                condition: RouteCondition::AddressMarker(lowercase_all(table.ticket_markers)),
                target: RoleId::TicketIssuer,
            },
            RouteRule {
                name: "function_call",
                condition: RouteCondition::FunctionCallDirective,
                target: RoleId::FunctionExecutor,
            },
            RouteRule {
                name: "function_result",
                condition: RouteCondition::SenderIn(vec![
                    RoleId::FunctionExecutor,
                    RoleId::BackendGateway,
                    RoleId::TicketIssuer,
                ]),
                target: RoleId::Specialist,
            },
            RouteRule {
                name: "solicitation",
                condition: RouteCondition::Solicits {
                    sender: RoleId::Specialist,
                    phrases: lowercase_all(table.solicitation_phrases),
                },
                target: RoleId::HumanProxy,
            },
            RouteRule {
                name: "human_reply",
                condition: RouteCondition::SenderIn(vec![RoleId::HumanProxy]),
                target: RoleId::Specialist,
            },
            RouteRule {
                name: "default",
                condition: RouteCondition::Always,
                target: RoleId::HumanProxy,
            },
        ];
        Self { rules }
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// 已追加轮次的下一位接收方
    pub fn next_receiver(&self, turn: &Turn) -> RoleId {
        self.resolve(turn.sender(), turn.content()).receiver
    }

    /// 按决策表为 (发送方, 内容) 选择接收方
    pub fn resolve(&self, sender: RoleId, content: &TurnContent) -> RouteDecision {
        let rendered = content.render();
        let lowered = rendered.to_lowercase();

        let decision = self
            .rules
            .iter()
            .filter(|rule| rule.target != sender)
            .find(|rule| condition_holds(&rule.condition, sender, content, &lowered))
            .map(|rule| RouteDecision {
                receiver: rule.target,
                rule: rule.name,
            })
            // human_reply 与 default 两条规则保证总能找到非自身目标
            .unwrap_or(RouteDecision {
                receiver: if sender == RoleId::HumanProxy {
                    RoleId::Specialist
                } else {
                    RoleId::HumanProxy
                },
                rule: "fallback",
            });

        tracing::debug!(
            sender = %sender,
            receiver = %decision.receiver,
            rule = decision.rule,
            "route resolved"
        );
        decision
    }
}

fn condition_holds(condition: &RouteCondition, sender: RoleId, content: &TurnContent, lowered: &str) -> bool {
    match condition {
        RouteCondition::AddressMarker(markers) => markers.iter().any(|m| lowered.contains(m.as_str())),
        RouteCondition::FunctionCallDirective => content.is_function_call(),
        RouteCondition::SenderIn(roles) => roles.contains(&sender),
        RouteCondition::Solicits { sender: role, phrases } => {
            *role == sender && phrases.iter().any(|p| lowered.contains(p.as_str()))
        }
        RouteCondition::Always => true,
    }
}
