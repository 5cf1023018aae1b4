//! 服务端命令：接受一个 TCP 连接并在模拟执行器上执行收到的动作

use crate::args::PolicyArg;
use crate::commands::config::CliConfig;
use anyhow::{Context, Result};
use clap::Args;
use nxtar_sdk::driver::{ControlLinkBuilder, ListenerRegistry, SimulatedActuator, TracingListener};
use nxtar_sdk::protocol::MotorPort;
use nxtar_sdk::transport::TcpTransport;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// 读超时，用于及时响应 Ctrl-C
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// 等待连接时检查 Ctrl-C 的间隔
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 接受一个连接；`running` 变为 false 时返回 `None`
fn accept_until(
    listener: &TcpListener,
    running: &AtomicBool,
) -> Result<Option<(TcpStream, SocketAddr)>> {
    listener.set_nonblocking(true)?;
    loop {
        if !running.load(Ordering::SeqCst) {
            return Ok(None);
        }
        match listener.accept() {
            Ok((stream, peer)) => {
                stream.set_nonblocking(false)?;
                return Ok(Some((stream, peer)));
            },
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL_INTERVAL);
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
            Err(e) => return Err(e).context("接受连接失败"),
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeCommand {
    /// 监听地址（缺省使用配置文件）
    #[arg(long)]
    pub addr: Option<String>,

    /// 覆盖配置文件中的监听器失败策略
    #[arg(long, value_enum)]
    pub listener_policy: Option<PolicyArg>,
}

impl ServeCommand {
    pub fn execute(self) -> Result<()> {
        let config = CliConfig::load()?;
        let addr = self.addr.unwrap_or_else(|| config.address.clone());
        let mut protocol_config = config.protocol_config();
        if let Some(policy) = self.listener_policy {
            protocol_config.listener_failure_policy = policy.into();
        }

        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })
        .context("安装 Ctrl-C 处理器失败")?;

        let listener = TcpListener::bind(&addr).with_context(|| format!("监听 {} 失败", addr))?;
        println!("⏳ 等待连接: {}", addr);
        let Some((stream, peer)) = accept_until(&listener, &running)? else {
            println!("👋 已取消");
            return Ok(());
        };
        println!("🔗 已连接: {}", peer);

        let transport = TcpTransport::from_stream(stream)?;
        transport.set_read_timeout(Some(READ_TIMEOUT))?;

        // 读线程启动前注册，第一帧用户动作也能被记录
        let registry = Arc::new(ListenerRegistry::with_policy(
            protocol_config.listener_failure_policy,
        ));
        registry.register(Arc::new(TracingListener));

        let actuator = SimulatedActuator::with_recenter_speed(protocol_config.recenter_speed);
        let link = ControlLinkBuilder::new()
            .config(protocol_config)
            .registry(registry)
            .build(transport, actuator)?;

        while running.load(Ordering::SeqCst) {
            if link.wait_for_disconnect(READ_TIMEOUT) {
                info!("Peer {} disconnected", peer);
                break;
            }
        }

        let stats = link.stats();
        let actuator = link.shutdown();

        println!(
            "📊 收到 {} 帧, 发送 {} 帧, 读错误 {}, 分发错误 {}",
            stats.frames_received, stats.frames_sent, stats.read_errors, stats.dispatch_errors
        );
        if let Some(actuator) = actuator {
            for port in MotorPort::ALL {
                let state = actuator.state(port);
                println!(
                    "  电机 {}: {:?} speed={} tacho={}",
                    port, state.drive, state.speed, state.tacho
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::time::Instant;

    #[test]
    fn test_accept_returns_none_once_stopped() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let r = running.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            r.store(false, Ordering::SeqCst);
        });

        let start = Instant::now();
        assert!(accept_until(&listener, &running).unwrap().is_none());
        assert!(start.elapsed() < Duration::from_secs(2));
        stopper.join().unwrap();
    }

    #[test]
    fn test_accept_returns_blocking_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = std::thread::spawn(move || TcpStream::connect(addr).unwrap());

        let running = AtomicBool::new(true);
        let (stream, peer) = accept_until(&listener, &running).unwrap().unwrap();
        let client = client.join().unwrap();
        assert_eq!(peer, client.local_addr().unwrap());

        // 已恢复阻塞模式：读操作等到超时才返回
        stream.set_read_timeout(Some(Duration::from_millis(50))).unwrap();
        let mut buf = [0u8; 2];
        let start = Instant::now();
        let err = (&stream).read(&mut buf).unwrap_err();
        assert!(matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
