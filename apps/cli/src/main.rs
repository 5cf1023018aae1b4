//! # NxtAR CLI
//!
//! Command-line interface for the NxtAR two-byte motor control protocol.
//!
//! ```bash
//! # 离线编解码
//! nxtar-cli decode 0F64
//! nxtar-cli encode --action forward --motors ABC --speed 70
//!
//! # 在一端运行模拟机器人，另一端发送命令
//! nxtar-cli serve --addr 127.0.0.1:4242
//! nxtar-cli send --addr 127.0.0.1:4242 --action recenter --motors A
//!
//! # 配置默认值
//! nxtar-cli config set --address 192.168.1.20:4242 --speed 60
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod args;
mod commands;

use commands::{ConfigCommand, DecodeCommand, EncodeCommand, SendCommand, ServeCommand};

/// NxtAR CLI - 电机控制协议命令行工具
#[derive(Parser, Debug)]
#[command(name = "nxtar-cli")]
#[command(about = "Command-line interface for the NxtAR motor control protocol", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 解码一帧并打印动作
    Decode {
        #[command(flatten)]
        args: DecodeCommand,
    },

    /// 编码一个动作并打印十六进制
    Encode {
        #[command(flatten)]
        args: EncodeCommand,
    },

    /// 通过 TCP 发送一帧
    Send {
        #[command(flatten)]
        args: SendCommand,
    },

    /// 接受一个连接并驱动模拟电机
    Serve {
        #[command(flatten)]
        args: ServeCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    // 初始化日志
    if let Err(e) = nxtar_sdk::init_logger("nxtar_cli=info,nxtar_driver=info") {
        eprintln!("日志初始化失败: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode { args } => args.execute(),
        Commands::Encode { args } => args.execute(),
        Commands::Send { args } => args.execute(),
        Commands::Serve { args } => args.execute(),
        Commands::Config(cmd) => cmd.execute(),
    }
}
