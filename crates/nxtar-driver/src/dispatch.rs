//! 动作分发
//!
//! 将解码后的 [`ControlAction`] 转为两类效果之一：
//! - 前进/后退/停止/回零：按 A、B、C 固定顺序逐端口下发给 [`Actuator`]
//! - 用户动作：通知 [`ListenerRegistry`]，不下发任何电机意图
//!
//! 电机扇出不是事务：单个端口失败只记录日志并计数，其余端口照常下发。

use crate::actuator::{Actuator, Drive};
use crate::error::DriverError;
use crate::listener::{ListenerRegistry, NotifyReport};
use nxtar_protocol::{Action, ControlAction, MotorPort, PortList};
use std::sync::Arc;
use tracing::{debug, warn};

/// 一次分发的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 前进/后退/停止
    Driven {
        drive: Drive,
        /// 按下发顺序排列的端口（含失败的）
        ports: PortList,
        /// 执行器返回错误的端口
        failed: PortList,
    },
    /// 回零（逐端口阻塞等待）
    Recentered { ports: PortList, failed: PortList },
    /// 用户动作
    Notified(NotifyReport),
}

impl DispatchOutcome {
    /// 是否所有效果都成功
    pub fn is_clean(&self) -> bool {
        match self {
            DispatchOutcome::Driven { failed, .. } | DispatchOutcome::Recentered { failed, .. } => {
                failed.is_empty()
            },
            DispatchOutcome::Notified(report) => report.failed == 0,
        }
    }

    /// 下发给执行器的意图数量
    pub fn intents(&self) -> usize {
        match self {
            DispatchOutcome::Driven { ports, .. } | DispatchOutcome::Recentered { ports, .. } => {
                ports.len()
            },
            DispatchOutcome::Notified(_) => 0,
        }
    }
}

/// 无状态分发器（只持有共享的监听器注册表）
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    registry: Arc<ListenerRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ListenerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    /// 分发一个动作
    ///
    /// 只有在 `ListenerFailurePolicy::Abort` 下监听器失败时才返回错误。
    pub fn dispatch<A: Actuator + ?Sized>(
        &self,
        action: &ControlAction,
        actuator: &mut A,
    ) -> Result<DispatchOutcome, DriverError> {
        debug!("Dispatching {}", action);
        let ports = action.motors().ports();

        if let Some(drive) = Drive::from_action(action.kind()) {
            let speed = action.speed();
            let failed = fan_out(&ports, |port| actuator.drive(port, drive, speed));
            return Ok(DispatchOutcome::Driven {
                drive,
                ports,
                failed,
            });
        }

        if action.kind() == Action::Recenter {
            let failed = fan_out(&ports, |port| actuator.recenter_and_wait(port));
            return Ok(DispatchOutcome::Recentered { ports, failed });
        }

        let report = self
            .registry
            .notify(action.kind(), action.motors(), action.speed())?;
        Ok(DispatchOutcome::Notified(report))
    }
}

fn fan_out<F, E>(ports: &[MotorPort], mut apply: F) -> PortList
where
    F: FnMut(MotorPort) -> Result<(), E>,
    E: std::fmt::Display,
{
    let mut failed = PortList::new();
    for &port in ports {
        if let Err(e) = apply(port) {
            warn!("Motor {} intent failed: {}", port, e);
            failed.push(port);
        }
    }
    failed
}
