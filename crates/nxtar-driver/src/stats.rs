//! 链路统计
//!
//! IO 线程只做 `fetch_add(Relaxed)`，读取方通过 [`LinkStats::snapshot`] 一次性取值。

use std::sync::atomic::{AtomicU64, Ordering};

/// 链路计数器
#[derive(Debug, Default)]
pub struct LinkStats {
    /// 读线程收到的帧数
    pub frames_received: AtomicU64,

    /// 写线程成功写出的帧数
    pub frames_sent: AtomicU64,

    /// 非超时的读错误次数
    pub read_errors: AtomicU64,

    /// 写错误次数
    pub write_errors: AtomicU64,

    /// 分发返回错误，或有端口/监听器失败的次数
    pub dispatch_errors: AtomicU64,

    /// 因发送队列满被拒绝的帧数
    pub outgoing_dropped: AtomicU64,
}

impl LinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> LinkStatsSnapshot {
        LinkStatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            dispatch_errors: self.dispatch_errors.load(Ordering::Relaxed),
            outgoing_dropped: self.outgoing_dropped.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.frames_received.store(0, Ordering::Relaxed);
        self.frames_sent.store(0, Ordering::Relaxed);
        self.read_errors.store(0, Ordering::Relaxed);
        self.write_errors.store(0, Ordering::Relaxed);
        self.dispatch_errors.store(0, Ordering::Relaxed);
        self.outgoing_dropped.store(0, Ordering::Relaxed);
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// 计数器快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkStatsSnapshot {
    pub frames_received: u64,
    pub frames_sent: u64,
    pub read_errors: u64,
    pub write_errors: u64,
    pub dispatch_errors: u64,
    pub outgoing_dropped: u64,
}
