//! Mock 传输适配器
//!
//! 用于测试：预置接收帧、记录发送帧、注入读写错误。
//! 克隆出的句柄共享同一份状态，测试代码可在适配器被移入管线后继续断言。

use crate::{ControlFrame, FrameReader, FrameWriter, SplittableTransport, Transport, TransportError};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// 队列为空时，读操作等待新帧的最长时间
const DEFAULT_READ_WAIT: Duration = Duration::from_millis(100);

#[derive(Default)]
struct MockState {
    incoming: VecDeque<ControlFrame>,
    written: Vec<ControlFrame>,
    read_fault: Option<io::ErrorKind>,
    write_fault: Option<io::ErrorKind>,
    close_fault: Option<io::ErrorKind>,
    hung_up: bool,
    close_count: usize,
}

struct Shared {
    state: Mutex<MockState>,
    readable: Condvar,
}

/// 共享状态的 Mock 适配器
#[derive(Clone)]
pub struct MockTransport {
    shared: Arc<Shared>,
    read_wait: Duration,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(MockState::default()),
                readable: Condvar::new(),
            }),
            read_wait: DEFAULT_READ_WAIT,
        }
    }

    /// 设置队列为空时的等待时间
    pub fn with_read_wait(mut self, wait: Duration) -> Self {
        self.read_wait = wait;
        self
    }

    /// 预置一帧待读取
    pub fn push_frame(&self, frame: ControlFrame) {
        self.shared.state.lock().incoming.push_back(frame);
        self.shared.readable.notify_all();
    }

    pub fn push_bytes(&self, flags: u8, speed: u8) {
        self.push_frame(ControlFrame::new(flags, speed));
    }

    /// 模拟对端关闭：队列读空后返回 `TransportError::Closed`
    pub fn hang_up(&self) {
        self.shared.state.lock().hung_up = true;
        self.shared.readable.notify_all();
    }

    /// 下一次读操作返回指定 IO 错误
    pub fn fail_next_read(&self, kind: io::ErrorKind) {
        self.shared.state.lock().read_fault = Some(kind);
        self.shared.readable.notify_all();
    }

    /// 下一次写操作返回指定 IO 错误
    pub fn fail_next_write(&self, kind: io::ErrorKind) {
        self.shared.state.lock().write_fault = Some(kind);
    }

    /// 下一次 `close()` 返回指定 IO 错误（仍计入 `close_count`，流保持打开）
    pub fn fail_next_close(&self, kind: io::ErrorKind) {
        self.shared.state.lock().close_fault = Some(kind);
    }

    /// 已写出的所有帧（按顺序）
    pub fn written(&self) -> Vec<ControlFrame> {
        self.shared.state.lock().written.clone()
    }

    /// 尚未被读走的预置帧数量
    pub fn pending(&self) -> usize {
        self.shared.state.lock().incoming.len()
    }

    /// `close()` 被调用的次数
    pub fn close_count(&self) -> usize {
        self.shared.state.lock().close_count
    }
}

impl FrameReader for MockTransport {
    fn read_frame(&mut self) -> Result<ControlFrame, TransportError> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(kind) = state.read_fault.take() {
                return Err(io::Error::new(kind, "injected read failure").into());
            }
            if let Some(frame) = state.incoming.pop_front() {
                return Ok(frame);
            }
            if state.hung_up {
                return Err(TransportError::Closed);
            }
            if self
                .shared
                .readable
                .wait_for(&mut state, self.read_wait)
                .timed_out()
                && state.incoming.is_empty()
                && state.read_fault.is_none()
                && !state.hung_up
            {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no frame queued").into());
            }
        }
    }
}

impl FrameWriter for MockTransport {
    fn write_frame(&mut self, frame: ControlFrame) -> Result<(), TransportError> {
        let mut state = self.shared.state.lock();
        if let Some(kind) = state.write_fault.take() {
            return Err(io::Error::new(kind, "injected write failure").into());
        }
        state.written.push(frame);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let mut state = self.shared.state.lock();
        state.close_count += 1;
        if let Some(kind) = state.close_fault.take() {
            return Err(io::Error::new(kind, "injected close failure").into());
        }
        state.hung_up = true;
        drop(state);
        self.shared.readable.notify_all();
        Ok(())
    }
}

impl Transport for MockTransport {
    fn read_frame(&mut self) -> Result<ControlFrame, TransportError> {
        FrameReader::read_frame(self)
    }

    fn write_frame(&mut self, frame: ControlFrame) -> Result<(), TransportError> {
        FrameWriter::write_frame(self, frame)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        FrameWriter::close(self)
    }
}

impl SplittableTransport for MockTransport {
    type Reader = MockTransport;
    type Writer = MockTransport;

    fn split(self) -> Result<(Self::Reader, Self::Writer), TransportError> {
        Ok((self.clone(), self))
    }
}
