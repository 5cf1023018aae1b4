//! 基于 `std::io` 流的适配器
//!
//! 适用于任何 `Read`/`Write` 实现（串口设备文件、管道、蓝牙 RFCOMM 套接字等），
//! 以及带拆分能力的 TCP 连接。

use crate::{ControlFrame, FrameReader, FrameWriter, SplittableTransport, Transport, TransportError};
use nxtar_protocol::FRAME_LEN;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, trace};

/// 读半边
///
/// 内部保留未读完的半帧：若底层读超时发生在两字节之间，
/// 下一次调用会从断点续读，保证一帧的两个字节不会与其他帧交错。
pub struct IoReader<R> {
    inner: R,
    buf: [u8; FRAME_LEN],
    filled: usize,
}

impl<R: Read> IoReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: [0; FRAME_LEN],
            filled: 0,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> FrameReader for IoReader<R> {
    fn read_frame(&mut self) -> Result<ControlFrame, TransportError> {
        while self.filled < FRAME_LEN {
            match self.inner.read(&mut self.buf[self.filled..]) {
                Ok(0) => {
                    if self.filled > 0 {
                        debug!("Stream closed with a partial frame pending");
                    }
                    return Err(TransportError::Closed);
                },
                Ok(n) => self.filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        self.filled = 0;
        let frame = ControlFrame::from(self.buf);
        trace!("RX frame {}", frame);
        Ok(frame)
    }
}

/// 写半边
pub struct IoWriter<W> {
    inner: W,
}

impl<W: Write> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> FrameWriter for IoWriter<W> {
    fn write_frame(&mut self, frame: ControlFrame) -> Result<(), TransportError> {
        self.inner.write_all(frame.as_bytes())?;
        self.inner.flush()?;
        trace!("TX frame {}", frame);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.inner.flush()?;
        Ok(())
    }
}

/// 由独立读流、写流组成的双工适配器
///
/// # Example
///
/// ```
/// use nxtar_transport::{StreamTransport, Transport};
/// use nxtar_protocol::ControlFrame;
/// use std::io::Cursor;
///
/// let input = Cursor::new(vec![0x09, 0x1E]);
/// let mut transport = StreamTransport::new(input, Vec::new());
///
/// let frame = transport.read_frame().unwrap();
/// assert_eq!(frame.to_bytes(), [0x09, 0x1E]);
///
/// transport.write_frame(ControlFrame::new(0x07, 0)).unwrap();
/// assert_eq!(transport.writer().get_ref(), &vec![0x07, 0x00]);
/// ```
pub struct StreamTransport<R, W> {
    reader: IoReader<R>,
    writer: IoWriter<W>,
}

impl<R: Read, W: Write> StreamTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: IoReader::new(reader),
            writer: IoWriter::new(writer),
        }
    }

    pub fn reader(&self) -> &IoReader<R> {
        &self.reader
    }

    pub fn writer(&self) -> &IoWriter<W> {
        &self.writer
    }

    pub fn into_parts(self) -> (IoReader<R>, IoWriter<W>) {
        (self.reader, self.writer)
    }
}

impl<R: Read, W: Write> Transport for StreamTransport<R, W> {
    fn read_frame(&mut self) -> Result<ControlFrame, TransportError> {
        self.reader.read_frame()
    }

    fn write_frame(&mut self, frame: ControlFrame) -> Result<(), TransportError> {
        self.writer.write_frame(frame)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.writer.close()
    }
}

impl<R, W> SplittableTransport for StreamTransport<R, W>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    type Reader = IoReader<R>;
    type Writer = IoWriter<W>;

    fn split(self) -> Result<(Self::Reader, Self::Writer), TransportError> {
        Ok(self.into_parts())
    }
}

/// TCP 适配器
///
/// 关闭时执行 `shutdown(Both)`，这也会唤醒阻塞在同一套接字上的读线程。
pub struct TcpTransport {
    reader: IoReader<TcpStream>,
    writer: TcpWriter,
}

impl TcpTransport {
    /// 连接到远端
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)?;
        Self::from_stream(stream)
    }

    /// 包装一个已建立的连接
    pub fn from_stream(stream: TcpStream) -> Result<Self, TransportError> {
        // 逐帧写入，关闭 Nagle 以降低控制延迟
        stream.set_nodelay(true)?;
        let read_half = stream.try_clone()?;
        if let Ok(peer) = stream.peer_addr() {
            debug!("TCP transport connected to {}", peer);
        }
        Ok(Self {
            reader: IoReader::new(read_half),
            writer: TcpWriter {
                inner: IoWriter::new(stream),
                shut_down: false,
            },
        })
    }

    /// 设置读超时（`None` 表示无限阻塞）
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), TransportError> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn read_frame(&mut self) -> Result<ControlFrame, TransportError> {
        self.reader.read_frame()
    }

    fn write_frame(&mut self, frame: ControlFrame) -> Result<(), TransportError> {
        self.writer.write_frame(frame)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.writer.close()
    }
}

impl SplittableTransport for TcpTransport {
    type Reader = IoReader<TcpStream>;
    type Writer = TcpWriter;

    fn split(self) -> Result<(Self::Reader, Self::Writer), TransportError> {
        Ok((self.reader, self.writer))
    }
}

/// TCP 写半边
pub struct TcpWriter {
    inner: IoWriter<TcpStream>,
    shut_down: bool,
}

impl FrameWriter for TcpWriter {
    fn write_frame(&mut self, frame: ControlFrame) -> Result<(), TransportError> {
        if self.shut_down {
            return Err(TransportError::Disconnected);
        }
        self.inner.write_frame(frame)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.inner.close()?;
        match self.inner.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // 对端已先行断开
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
