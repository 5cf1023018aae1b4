//! 执行器接口
//!
//! 分发器只通过 [`Actuator`] 向电机端口下发意图；
//! 实际的调速、正反转、回零由适配器实现。

use nxtar_protocol::{Action, MotorPort, Speed};
use thiserror::Error;
use tracing::{debug, info, warn};

/// 电机运行方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Drive {
    Forward,
    Backward,
    #[default]
    Stop,
}

impl Drive {
    /// 前进/后退/停止动作对应的方向，其他动作返回 `None`
    pub fn from_action(action: Action) -> Option<Self> {
        match action {
            Action::MoveForward => Some(Drive::Forward),
            Action::MoveBackward => Some(Drive::Backward),
            Action::Stop => Some(Drive::Stop),
            _ => None,
        }
    }
}

/// 执行器错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    #[error("Motor port {port} failed: {message}")]
    Port { port: MotorPort, message: String },

    #[error("Motor port {0} did not reach its zero position")]
    NotOnPosition(MotorPort),
}

/// 执行器适配器
///
/// 调用是阻塞的；超时策略由适配器自己决定。
pub trait Actuator {
    /// 以给定方向和速度驱动一个端口
    fn drive(&mut self, port: MotorPort, drive: Drive, speed: Speed) -> Result<(), ActuatorError>;

    /// 将端口转回零位，阻塞直到到位
    ///
    /// 回零使用适配器内部固定的速度。
    fn recenter_and_wait(&mut self, port: MotorPort) -> Result<(), ActuatorError>;
}

impl<A: Actuator + ?Sized> Actuator for &mut A {
    fn drive(&mut self, port: MotorPort, drive: Drive, speed: Speed) -> Result<(), ActuatorError> {
        (**self).drive(port, drive, speed)
    }

    fn recenter_and_wait(&mut self, port: MotorPort) -> Result<(), ActuatorError> {
        (**self).recenter_and_wait(port)
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn drive(&mut self, port: MotorPort, drive: Drive, speed: Speed) -> Result<(), ActuatorError> {
        (**self).drive(port, drive, speed)
    }

    fn recenter_and_wait(&mut self, port: MotorPort) -> Result<(), ActuatorError> {
        (**self).recenter_and_wait(port)
    }
}

/// 已下发给执行器的意图（记录用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorIntent {
    Drive {
        port: MotorPort,
        drive: Drive,
        speed: Speed,
    },
    Recenter {
        port: MotorPort,
        /// 实际转动的角度（度）
        rotation: i32,
    },
}

/// 单个端口的模拟状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorState {
    pub drive: Drive,
    pub speed: Speed,
    /// 转速计读数（度）
    pub tacho: i32,
}

/// 默认回零速度
pub const DEFAULT_RECENTER_SPEED: Speed = Speed::from_raw(50);

/// 内存中的模拟执行器
///
/// 记录每个端口的方向、速度和转速计读数。回零时转动 `-(tacho % 360)` 度，
/// 回到最近一圈的零点。可对指定端口注入故障。
#[derive(Debug, Clone)]
pub struct SimulatedActuator {
    motors: [MotorState; 3],
    recenter_speed: Speed,
    faulty: [bool; 3],
    stalled: [bool; 3],
    history: Vec<MotorIntent>,
}

impl Default for SimulatedActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedActuator {
    pub fn new() -> Self {
        Self::with_recenter_speed(DEFAULT_RECENTER_SPEED)
    }

    pub fn with_recenter_speed(recenter_speed: Speed) -> Self {
        Self {
            motors: [MotorState::default(); 3],
            recenter_speed,
            faulty: [false; 3],
            stalled: [false; 3],
            history: Vec::new(),
        }
    }

    fn index(port: MotorPort) -> usize {
        match port {
            MotorPort::A => 0,
            MotorPort::B => 1,
            MotorPort::C => 2,
        }
    }

    pub fn state(&self, port: MotorPort) -> MotorState {
        self.motors[Self::index(port)]
    }

    pub fn recenter_speed(&self) -> Speed {
        self.recenter_speed
    }

    /// 模拟电机转动（如外力或运行一段时间）
    pub fn advance(&mut self, port: MotorPort, degrees: i32) {
        let motor = &mut self.motors[Self::index(port)];
        motor.tacho = motor.tacho.wrapping_add(degrees);
    }

    /// 使该端口之后的每次操作都失败
    pub fn set_faulty(&mut self, port: MotorPort, faulty: bool) {
        self.faulty[Self::index(port)] = faulty;
    }

    /// 使该端口回零时卡住，无法回到零位
    pub fn set_stalled(&mut self, port: MotorPort, stalled: bool) {
        self.stalled[Self::index(port)] = stalled;
    }

    /// 按下发顺序记录的意图
    pub fn history(&self) -> &[MotorIntent] {
        &self.history
    }

    /// 取走已记录的意图并清空
    pub fn take_history(&mut self) -> Vec<MotorIntent> {
        std::mem::take(&mut self.history)
    }

    fn check_fault(&self, port: MotorPort) -> Result<(), ActuatorError> {
        if self.faulty[Self::index(port)] {
            return Err(ActuatorError::Port {
                port,
                message: "simulated fault".to_string(),
            });
        }
        Ok(())
    }
}

impl Actuator for SimulatedActuator {
    fn drive(&mut self, port: MotorPort, drive: Drive, speed: Speed) -> Result<(), ActuatorError> {
        self.check_fault(port)?;
        let motor = &mut self.motors[Self::index(port)];
        motor.drive = drive;
        motor.speed = speed;
        self.history.push(MotorIntent::Drive { port, drive, speed });
        debug!("Motor {} -> {:?} at {}", port, drive, speed);
        Ok(())
    }

    fn recenter_and_wait(&mut self, port: MotorPort) -> Result<(), ActuatorError> {
        self.check_fault(port)?;
        let recenter_speed = self.recenter_speed;
        let stalled = self.stalled[Self::index(port)];
        let motor = &mut self.motors[Self::index(port)];
        if stalled {
            motor.drive = Drive::Stop;
            warn!("Motor {} stalled at {} deg while recentering", port, motor.tacho);
            return Err(ActuatorError::NotOnPosition(port));
        }
        let rotation = -(motor.tacho % 360);
        motor.tacho += rotation;
        motor.drive = Drive::Stop;
        motor.speed = recenter_speed;
        self.history.push(MotorIntent::Recenter { port, rotation });
        info!(
            "Motor {} recentered: rotated {} deg at speed {}",
            port, rotation, recenter_speed
        );
        Ok(())
    }
}
