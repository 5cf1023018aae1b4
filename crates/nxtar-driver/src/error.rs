//! 驱动层错误类型定义

use crate::listener::ListenerError;
use nxtar_protocol::ProtocolError;
use nxtar_transport::TransportError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 传输层错误（原样向上传递）
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 无效参数（如不足 2 字节的原始消息）
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 监听器回调失败（仅 `ListenerFailurePolicy::Abort` 下返回）
    #[error("Listener #{position} failed: {source}")]
    Listener {
        position: usize,
        #[source]
        source: ListenerError,
    },

    /// 发送通道已关闭（写线程退出）
    #[error("Outgoing channel closed")]
    ChannelClosed,

    /// 发送通道已满
    #[error("Outgoing channel full")]
    ChannelFull,

    /// IO 线程错误
    #[error("IO thread error: {0}")]
    IoThread(String),
}
