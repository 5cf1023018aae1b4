//! 发送单帧命令

use crate::args::{ActionArg, ActionArgs, parse_frame, parse_motors};
use crate::commands::config::CliConfig;
use anyhow::{Context, Result};
use clap::Args;
use nxtar_sdk::protocol::{ControlFrame, MotorSelector};
use nxtar_sdk::transport::{TcpTransport, Transport};
use tracing::info;

/// 通过 TCP 发送一帧
#[derive(Args, Debug)]
pub struct SendCommand {
    /// 目标地址（缺省使用配置文件）
    #[arg(long)]
    pub addr: Option<String>,

    /// 直接发送十六进制帧（忽略动作参数）
    #[arg(long, value_parser = parse_frame, conflicts_with = "action")]
    pub raw: Option<ControlFrame>,

    /// 动作
    #[arg(short, long, value_enum, required_unless_present = "raw")]
    pub action: Option<ActionArg>,

    /// 电机组合（如 A、BC、ABC）
    #[arg(short, long, default_value = "ABC", value_parser = parse_motors)]
    pub motors: MotorSelector,

    /// 速度（缺省时使用配置文件中的值）
    #[arg(short, long, allow_hyphen_values = true)]
    pub speed: Option<i32>,
}

impl SendCommand {
    pub fn execute(self) -> Result<()> {
        let config = CliConfig::load()?;
        let frame = match (self.raw, self.action) {
            (Some(frame), _) => frame,
            (None, Some(action)) => ActionArgs {
                action,
                motors: self.motors,
                speed: self.speed,
            }
            .to_action(config.speed)
            .to_frame(),
            (None, None) => anyhow::bail!("either --raw or --action is required"),
        };
        let addr = self.addr.unwrap_or(config.address);

        let mut transport =
            TcpTransport::connect(addr.as_str()).with_context(|| format!("连接 {} 失败", addr))?;
        transport.write_frame(frame)?;
        transport.close()?;

        info!("Sent {:?} to {}", frame, addr);
        println!("✅ {} -> {}", frame, addr);
        Ok(())
    }
}
