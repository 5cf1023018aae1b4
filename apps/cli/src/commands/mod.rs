//! 子命令实现

pub mod codec;
pub mod config;
pub mod send;
pub mod serve;

pub use codec::{DecodeCommand, EncodeCommand};
pub use config::ConfigCommand;
pub use send::SendCommand;
pub use serve::ServeCommand;
