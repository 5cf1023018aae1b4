//! 双线程控制链路
//!
//! 传输适配器被拆成读写两半，各由一个线程独占：
//! - `nxtar-rx`：循环读取帧 → 解码 → 分发，独占执行器
//! - `nxtar-tx`：从有界 `crossbeam-channel` 取出待发帧并写出
//!
//! 其他线程只通过 [`ControlLink::send`] 和共享的监听器注册表与链路交互。

use crate::actuator::Actuator;
use crate::config::ProtocolConfig;
use crate::dispatch::Dispatcher;
use crate::error::DriverError;
use crate::listener::ListenerRegistry;
use crate::stats::{LinkStats, LinkStatsSnapshot};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use nxtar_protocol::{ControlAction, ControlFrame, FRAME_LEN};
use nxtar_transport::{FrameReader, FrameWriter, SplittableTransport, TransportError};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// 写线程在队列为空时检查运行标志的间隔
const TX_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// 带超时的 join
trait JoinTimeout<T> {
    fn join_timeout(self, timeout: Duration) -> Result<T, DriverError>;
}

impl<T: Send + 'static> JoinTimeout<T> for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> Result<T, DriverError> {
        let (tx, rx) = crossbeam_channel::bounded(1);

        // 看门狗线程负责真正的 join；超时后它会继续运行直到目标线程结束
        spawn(move || {
            let _ = tx.send(self.join());
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(DriverError::IoThread("thread panicked".to_string())),
            Err(RecvTimeoutError::Timeout) => Err(DriverError::IoThread(format!(
                "thread did not exit within {:?}",
                timeout
            ))),
            Err(RecvTimeoutError::Disconnected) => {
                Err(DriverError::IoThread("join watchdog vanished".to_string()))
            },
        }
    }
}

/// 读线程的共享上下文
struct RxContext {
    dispatcher: Dispatcher,
    is_running: Arc<AtomicBool>,
    stats: Arc<LinkStats>,
    max_consecutive_errors: u32,
    /// 线程退出时随之 drop，用于 `wait_for_disconnect`
    _done: Sender<()>,
}

fn is_timeout(err: &TransportError) -> bool {
    matches!(
        err,
        TransportError::Io(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
    )
}

fn rx_loop<R: FrameReader, A: Actuator>(mut reader: R, mut actuator: A, ctx: RxContext) -> A {
    let mut consecutive_errors = 0u32;

    while ctx.is_running.load(Ordering::Acquire) {
        let frame = match reader.read_frame() {
            Ok(frame) => {
                consecutive_errors = 0;
                frame
            },
            Err(e) if e.is_terminal() => {
                info!("RX thread: transport closed ({}), exiting", e);
                break;
            },
            Err(e) if is_timeout(&e) => continue,
            Err(e) => {
                LinkStats::bump(&ctx.stats.read_errors);
                consecutive_errors += 1;
                warn!("RX thread: read failed ({}/{}): {}", consecutive_errors, ctx.max_consecutive_errors, e);
                if consecutive_errors >= ctx.max_consecutive_errors {
                    error!("RX thread: too many consecutive read errors, exiting");
                    break;
                }
                continue;
            },
        };

        LinkStats::bump(&ctx.stats.frames_received);
        trace!("RX frame {:?}", frame);

        let action = frame.decode();
        match ctx.dispatcher.dispatch(&action, &mut actuator) {
            Ok(outcome) if outcome.is_clean() => {},
            Ok(outcome) => {
                LinkStats::bump(&ctx.stats.dispatch_errors);
                debug!("RX thread: partial dispatch of {}: {:?}", action, outcome);
            },
            Err(e) => {
                LinkStats::bump(&ctx.stats.dispatch_errors);
                warn!("RX thread: dispatch of {} failed: {}", action, e);
            },
        }
    }

    // 通知写线程和其他观察者链路已断开
    ctx.is_running.store(false, Ordering::Release);
    trace!("RX thread exited");
    actuator
}

/// 写出一帧；返回 `false` 表示传输已不可用
fn write_one<W: FrameWriter>(writer: &mut W, frame: ControlFrame, stats: &LinkStats) -> bool {
    match writer.write_frame(frame) {
        Ok(()) => {
            LinkStats::bump(&stats.frames_sent);
            trace!("TX frame {:?}", frame);
            true
        },
        Err(e) if e.is_terminal() => {
            LinkStats::bump(&stats.write_errors);
            error!("TX thread: transport gone ({}), exiting", e);
            false
        },
        Err(e) => {
            LinkStats::bump(&stats.write_errors);
            warn!("TX thread: failed to write {:?}: {}", frame, e);
            true
        },
    }
}

fn tx_loop<W: FrameWriter>(
    mut writer: W,
    outgoing: Receiver<ControlFrame>,
    is_running: Arc<AtomicBool>,
    stats: Arc<LinkStats>,
) {
    loop {
        match outgoing.recv_timeout(TX_POLL_INTERVAL) {
            Ok(frame) => {
                if !write_one(&mut writer, frame, &stats) {
                    break;
                }
            },
            Err(RecvTimeoutError::Timeout) => {},
            // 所有 Sender 已 drop（队列中剩余的帧已经写完）
            Err(RecvTimeoutError::Disconnected) => break,
        }

        // 链路停止后只写出队列中已有的帧
        if !is_running.load(Ordering::Acquire) {
            trace!("TX thread: is_running flag is false, draining queue");
            while let Ok(frame) = outgoing.try_recv() {
                if !write_one(&mut writer, frame, &stats) {
                    break;
                }
            }
            break;
        }
    }

    // 接收端随之 drop，之后的 send 返回 ChannelClosed
    drop(outgoing);
    is_running.store(false, Ordering::Release);

    // 关闭写半边，同时唤醒阻塞在读上的 RX 线程
    if let Err(e) = writer.close() {
        warn!("TX thread: failed to close writer: {}", e);
    }
    trace!("TX thread exited");
}

/// 双线程控制链路
pub struct ControlLink<A: Actuator + Send + 'static> {
    outgoing: Option<Sender<ControlFrame>>,
    registry: Arc<ListenerRegistry>,
    stats: Arc<LinkStats>,
    is_running: Arc<AtomicBool>,
    done: Receiver<()>,
    rx_thread: Option<JoinHandle<A>>,
    tx_thread: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl<A: Actuator + Send + 'static> ControlLink<A> {
    /// 使用默认配置启动链路
    pub fn new<T: SplittableTransport>(transport: T, actuator: A) -> Result<Self, DriverError> {
        let config = ProtocolConfig::default();
        let registry = Arc::new(ListenerRegistry::with_policy(config.listener_failure_policy));
        Self::start(transport, actuator, registry, &config)
    }

    /// 拆分传输适配器并启动 IO 线程
    pub(crate) fn start<T: SplittableTransport>(
        transport: T,
        actuator: A,
        registry: Arc<ListenerRegistry>,
        config: &ProtocolConfig,
    ) -> Result<Self, DriverError> {
        let (reader, writer) = transport.split()?;
        let (outgoing_tx, outgoing_rx) = crossbeam_channel::bounded(config.outgoing_capacity.max(1));
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(0);

        let is_running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(LinkStats::new());

        let ctx = RxContext {
            dispatcher: Dispatcher::new(registry.clone()),
            is_running: is_running.clone(),
            stats: stats.clone(),
            max_consecutive_errors: config.max_consecutive_read_errors.max(1),
            _done: done_tx,
        };

        let rx_thread = std::thread::Builder::new()
            .name("nxtar-rx".into())
            .spawn(move || rx_loop(reader, actuator, ctx))
            .map_err(|e| DriverError::IoThread(format!("failed to spawn RX thread: {}", e)))?;

        let tx_running = is_running.clone();
        let tx_stats = stats.clone();
        let tx_thread = match std::thread::Builder::new()
            .name("nxtar-tx".into())
            .spawn(move || tx_loop(writer, outgoing_rx, tx_running, tx_stats))
        {
            Ok(handle) => handle,
            Err(e) => {
                // RX 线程已经在跑，先让它退出
                is_running.store(false, Ordering::Release);
                return Err(DriverError::IoThread(format!(
                    "failed to spawn TX thread: {}",
                    e
                )));
            },
        };

        info!("Control link started");
        Ok(Self {
            outgoing: Some(outgoing_tx),
            registry,
            stats,
            is_running,
            done: done_rx,
            rx_thread: Some(rx_thread),
            tx_thread: Some(tx_thread),
            shutdown_timeout: config.shutdown_timeout(),
        })
    }

    /// 编码一个动作并放入发送队列（不阻塞）
    pub fn send(&self, action: &ControlAction) -> Result<(), DriverError> {
        self.enqueue(action.to_frame())
    }

    /// 原样发送前 2 个字节
    pub fn send_raw(&self, bytes: &[u8]) -> Result<(), DriverError> {
        if bytes.len() < FRAME_LEN {
            return Err(DriverError::InvalidArgument(format!(
                "raw message needs {} bytes, got {}",
                FRAME_LEN,
                bytes.len()
            )));
        }
        self.enqueue(ControlFrame::new(bytes[0], bytes[1]))
    }

    fn enqueue(&self, frame: ControlFrame) -> Result<(), DriverError> {
        let outgoing = self.outgoing.as_ref().ok_or(DriverError::ChannelClosed)?;
        match outgoing.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                LinkStats::bump(&self.stats.outgoing_dropped);
                Err(DriverError::ChannelFull)
            },
            Err(TrySendError::Disconnected(_)) => Err(DriverError::ChannelClosed),
        }
    }

    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> LinkStatsSnapshot {
        self.stats.snapshot()
    }

    /// 读线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// 等待读线程退出（对端关闭或读错误过多）
    ///
    /// 在 `timeout` 内退出返回 `true`。
    pub fn wait_for_disconnect(&self, timeout: Duration) -> bool {
        matches!(
            self.done.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// 停止链路并交还执行器
    ///
    /// 队列中尚未写出的帧会先被写完。读线程未能在超时内退出时返回 `None`。
    pub fn shutdown(mut self) -> Option<A> {
        self.stop()
    }

    fn stop(&mut self) -> Option<A> {
        // 先 drop Sender：写线程写完剩余帧后退出并关闭写半边
        self.outgoing.take();
        self.is_running.store(false, Ordering::Release);

        if let Some(handle) = self.tx_thread.take()
            && let Err(e) = handle.join_timeout(self.shutdown_timeout)
        {
            error!("TX thread failed to shut down: {}", e);
        }

        let actuator = match self.rx_thread.take()?.join_timeout(self.shutdown_timeout) {
            Ok(actuator) => Some(actuator),
            Err(e) => {
                error!("RX thread failed to shut down: {}", e);
                None
            },
        };
        info!("Control link stopped");
        actuator
    }
}

impl<A: Actuator + Send + 'static> Drop for ControlLink<A> {
    fn drop(&mut self) {
        if self.rx_thread.is_some() || self.tx_thread.is_some() {
            self.stop();
        }
    }
}
