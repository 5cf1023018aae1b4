//! 命令行参数解析工具

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use nxtar_sdk::driver::ListenerFailurePolicy;
use nxtar_sdk::protocol::{Action, ControlAction, ControlFrame, MotorSelector};

/// 动作名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    Forward,
    Backward,
    Stop,
    Recenter,
    User1,
    User2,
    User3,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Forward => Action::MoveForward,
            ActionArg::Backward => Action::MoveBackward,
            ActionArg::Stop => Action::Stop,
            ActionArg::Recenter => Action::Recenter,
            ActionArg::User1 => Action::User1,
            ActionArg::User2 => Action::User2,
            ActionArg::User3 => Action::User3,
        }
    }
}

/// 监听器失败策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Isolate,
    Abort,
}

impl From<PolicyArg> for ListenerFailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Isolate => ListenerFailurePolicy::Isolate,
            PolicyArg::Abort => ListenerFailurePolicy::Abort,
        }
    }
}

/// 解析电机组合，如 `A`、`bc`、`ABC`
pub fn parse_motors(input: &str) -> Result<MotorSelector> {
    let (mut a, mut b, mut c) = (false, false, false);
    for ch in input.trim().chars() {
        match ch.to_ascii_uppercase() {
            'A' => a = true,
            'B' => b = true,
            'C' => c = true,
            other => bail!("unknown motor port '{}'", other),
        }
    }
    MotorSelector::from_ports(a, b, c).context("at least one motor port is required")
}

/// 解析十六进制帧，允许 `0x` 前缀和空白
pub fn parse_frame(input: &str) -> Result<ControlFrame> {
    let cleaned: String = input
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = hex::decode(&cleaned).with_context(|| format!("invalid hex '{}'", input))?;
    Ok(ControlFrame::from_slice(&bytes)?)
}

/// 描述一个动作的公共参数
#[derive(Args, Debug, Clone)]
pub struct ActionArgs {
    /// 动作
    #[arg(short, long, value_enum)]
    pub action: ActionArg,

    /// 电机组合（如 A、BC、ABC）
    #[arg(short, long, default_value = "ABC", value_parser = parse_motors)]
    pub motors: MotorSelector,

    /// 速度（-100..=100，超出范围会被截断；缺省时使用配置文件中的值）
    #[arg(short, long, allow_hyphen_values = true)]
    pub speed: Option<i32>,
}

impl ActionArgs {
    pub fn to_action(&self, default_speed: i32) -> ControlAction {
        ControlAction::new(
            self.action.into(),
            self.motors,
            self.speed.unwrap_or(default_speed),
        )
    }
}
