//! 离线编解码命令

use crate::args::{ActionArgs, parse_frame};
use crate::commands::config::CliConfig;
use anyhow::Result;
use clap::Args;
use nxtar_sdk::protocol::{ControlAction, ControlFrame};

/// 解码一帧
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// 十六进制帧（如 0F64、"0x11 32"）
    #[arg(value_parser = parse_frame)]
    pub frame: ControlFrame,
}

impl DecodeCommand {
    pub fn execute(self) -> Result<()> {
        println!("{}", describe(self.frame));
        Ok(())
    }
}

pub fn describe(frame: ControlFrame) -> String {
    let action = frame.decode();
    format!(
        "{} -> action={:?} motors={} speed={}",
        frame,
        action.kind(),
        action.motors(),
        action.speed()
    )
}

/// 编码一个动作
#[derive(Args, Debug)]
pub struct EncodeCommand {
    #[command(flatten)]
    pub action: ActionArgs,
}

impl EncodeCommand {
    pub fn execute(self) -> Result<()> {
        let config = CliConfig::load()?;
        println!("{}", encode_hex(&self.action.to_action(config.speed)));
        Ok(())
    }
}

pub fn encode_hex(action: &ControlAction) -> String {
    hex::encode_upper(action.to_frame().as_bytes())
}
