//! 配置管理命令
//!
//! 用于管理 CLI 配置（默认地址、速度等）

use crate::args::PolicyArg;
use anyhow::{Context, Result};
use clap::Subcommand;
use nxtar_sdk::driver::{ListenerFailurePolicy, ProtocolConfig};
use nxtar_sdk::protocol::Speed;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 覆盖配置文件路径的环境变量
pub const CONFIG_ENV: &str = "NXTAR_CONFIG";

/// 配置文件路径
pub fn config_file() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("nxtar");
    path.push("config.toml");
    Ok(path)
}

/// CLI 配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// 默认地址（send 连接 / serve 监听）
    pub address: String,

    /// 未指定 `--speed` 时使用的速度
    pub speed: i32,

    /// 模拟执行器的回零速度
    pub recenter_speed: i32,

    /// 监听器失败策略
    pub listener_failure_policy: ListenerFailurePolicy,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:4242".to_string(),
            speed: 50,
            recenter_speed: 50,
            listener_failure_policy: ListenerFailurePolicy::Isolate,
        }
    }
}

impl CliConfig {
    /// 加载默认位置的配置（不存在时返回默认配置）
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = config_file()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("创建配置目录失败")?;
        }
        let content = format!("# NxtAR CLI Configuration\n\n{}", toml::to_string(self)?);
        fs::write(path, content).context("写入配置文件失败")?;
        Ok(())
    }

    /// 转为驱动层配置
    pub fn protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig {
            listener_failure_policy: self.listener_failure_policy,
            recenter_speed: Speed::new(self.recenter_speed),
            ..ProtocolConfig::default()
        }
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印当前配置
    Show,

    /// 设置配置项
    Set {
        /// 默认地址（host:port）
        #[arg(long)]
        address: Option<String>,

        /// 默认速度
        #[arg(long, allow_hyphen_values = true)]
        speed: Option<i32>,

        /// 回零速度
        #[arg(long)]
        recenter_speed: Option<i32>,

        /// 监听器失败策略
        #[arg(long, value_enum)]
        listener_policy: Option<PolicyArg>,
    },

    /// 打印配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let config = CliConfig::load()?;
                print!("{}", toml::to_string(&config)?);
            },

            ConfigCommand::Set {
                address,
                speed,
                recenter_speed,
                listener_policy,
            } => {
                let mut config = CliConfig::load()?;
                config.apply(address, speed, recenter_speed, listener_policy);
                let path = config.save()?;
                println!("✅ 已保存: {}", path.display());
            },

            ConfigCommand::Path => println!("{}", config_file()?.display()),
        }
        Ok(())
    }
}

impl CliConfig {
    fn apply(
        &mut self,
        address: Option<String>,
        speed: Option<i32>,
        recenter_speed: Option<i32>,
        listener_policy: Option<PolicyArg>,
    ) {
        if let Some(address) = address {
            self.address = address;
        }
        if let Some(speed) = speed {
            self.speed = Speed::new(speed).into();
        }
        if let Some(recenter_speed) = recenter_speed {
            self.recenter_speed = Speed::new(recenter_speed).into();
        }
        if let Some(policy) = listener_policy {
            self.listener_failure_policy = policy.into();
        }
    }
}
