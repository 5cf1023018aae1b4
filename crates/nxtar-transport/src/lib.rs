//! # NxtAR Transport Layer
//!
//! 字节流适配层：协议核心只通过“读/写恰好 2 字节”依赖底层流。
//! 流的打开/关闭由适配器自身负责。

use std::io;
use thiserror::Error;

// 重新导出 nxtar-protocol 中的 ControlFrame
pub use nxtar_protocol::ControlFrame;

pub mod stream;
pub use stream::{IoReader, IoWriter, StreamTransport, TcpTransport};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    /// 对端关闭了流（读到 EOF）
    #[error("Stream closed")]
    Closed,
    /// 适配器已被关闭或拆分后不可再用
    #[error("Transport disconnected")]
    Disconnected,
}

impl TransportError {
    /// 是否意味着该流不会再产生数据（也不再接受写入）
    pub fn is_terminal(&self) -> bool {
        match self {
            TransportError::Closed | TransportError::Disconnected => true,
            TransportError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::NotConnected
            ),
        }
    }
}

/// 双工传输适配器
pub trait Transport {
    /// 读取一帧（2 字节作为原子整体读取）
    fn read_frame(&mut self) -> Result<ControlFrame, TransportError>;

    /// 写入一帧并刷新
    fn write_frame(&mut self, frame: ControlFrame) -> Result<(), TransportError>;

    /// 刷新并释放底层流
    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_frame(&mut self) -> Result<ControlFrame, TransportError> {
        (**self).read_frame()
    }

    fn write_frame(&mut self, frame: ControlFrame) -> Result<(), TransportError> {
        (**self).write_frame(frame)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }
}

/// 只读半边（读线程独占）
pub trait FrameReader {
    fn read_frame(&mut self) -> Result<ControlFrame, TransportError>;
}

/// 只写半边（写线程独占）
pub trait FrameWriter {
    fn write_frame(&mut self, frame: ControlFrame) -> Result<(), TransportError>;

    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// 可拆分为读写两半的传输适配器
pub trait SplittableTransport: Transport {
    type Reader: FrameReader + Send + 'static;
    type Writer: FrameWriter + Send + 'static;

    fn split(self) -> Result<(Self::Reader, Self::Writer), TransportError>;
}
