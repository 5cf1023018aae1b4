//! 控制指令模型
//!
//! 解码器产出、分发器消费的值类型。所有类型都是 `Copy`，不持有任何引用。

use crate::ProtocolError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use smallvec::SmallVec;
use std::fmt;

/// 所有可识别的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    MoveForward,
    MoveBackward,
    #[default]
    Stop,
    Recenter,
    User1,
    User2,
    User3,
}

impl Action {
    /// 是否为用户自定义动作（不驱动电机，只通知监听器）
    pub fn is_user(self) -> bool {
        matches!(self, Action::User1 | Action::User2 | Action::User3)
    }

    /// 是否为前进/后退动作
    pub fn is_movement(self) -> bool {
        matches!(self, Action::MoveForward | Action::MoveBackward)
    }
}

/// 用户动作（`Action::User1..=User3` 的子集）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UserAction {
    User1,
    User2,
    User3,
}

impl TryFrom<Action> for UserAction {
    type Error = ProtocolError;

    fn try_from(action: Action) -> Result<Self, Self::Error> {
        match action {
            Action::User1 => Ok(UserAction::User1),
            Action::User2 => Ok(UserAction::User2),
            Action::User3 => Ok(UserAction::User3),
            other => Err(ProtocolError::NotUserAction(other)),
        }
    }
}

impl From<UserAction> for Action {
    fn from(action: UserAction) -> Self {
        match action {
            UserAction::User1 => Action::User1,
            UserAction::User2 => Action::User2,
            UserAction::User3 => Action::User3,
        }
    }
}

/// 单个电机端口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MotorPort {
    A,
    B,
    C,
}

impl MotorPort {
    /// 固定的分发顺序
    pub const ALL: [MotorPort; 3] = [MotorPort::A, MotorPort::B, MotorPort::C];

    /// 该端口在第 0 字节中的位
    pub const fn mask(self) -> u8 {
        match self {
            MotorPort::A => 0x01,
            MotorPort::B => 0x02,
            MotorPort::C => 0x04,
        }
    }
}

impl fmt::Display for MotorPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MotorPort::A => "A",
            MotorPort::B => "B",
            MotorPort::C => "C",
        };
        f.write_str(name)
    }
}

/// 端口列表（最多 3 个，栈上分配）
pub type PortList = SmallVec<[MotorPort; 3]>;

/// 电机组合：{A, B, C} 的所有非空子集
///
/// 判别值即第 0 字节中 Bit 0-2 的掩码，空集不可表示。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TryFromPrimitive, IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MotorSelector {
    A = 0x01,
    B = 0x02,
    Ab = 0x03,
    C = 0x04,
    Ac = 0x05,
    Bc = 0x06,
    #[default]
    Abc = 0x07,
}

impl MotorSelector {
    /// 从 3 位掩码构造（掩码为 0 或超过 3 位时失败）
    pub fn from_mask(mask: u8) -> Result<Self, ProtocolError> {
        MotorSelector::try_from(mask).map_err(|_| ProtocolError::InvalidMotorMask(mask))
    }

    /// 从三个端口开关构造，全部关闭时返回 `None`
    pub fn from_ports(a: bool, b: bool, c: bool) -> Option<Self> {
        let mask = (a as u8) | ((b as u8) << 1) | ((c as u8) << 2);
        MotorSelector::try_from(mask).ok()
    }

    /// 电机位掩码
    pub fn mask(self) -> u8 {
        self.into()
    }

    pub fn contains(self, port: MotorPort) -> bool {
        self.mask() & port.mask() != 0
    }

    /// 组成该组合的端口，按 A、B、C 顺序
    pub fn ports(self) -> PortList {
        MotorPort::ALL
            .into_iter()
            .filter(|port| self.contains(*port))
            .collect()
    }
}

impl fmt::Display for MotorSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for port in self.ports() {
            write!(f, "{}", port)?;
        }
        Ok(())
    }
}

/// 有符号速度，始终位于 [-100, 100]
///
/// 构造时静默钳位，从不拒绝输入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "i32", into = "i32"))]
pub struct Speed(i8);

impl Speed {
    pub const MAX_VALUE: i8 = 100;
    pub const MIN_VALUE: i8 = -100;

    pub const MAX: Speed = Speed(Self::MAX_VALUE);
    pub const MIN: Speed = Speed(Self::MIN_VALUE);
    pub const ZERO: Speed = Speed(0);

    /// 钳位到 [-100, 100]
    pub fn new(value: i32) -> Self {
        Speed(value.clamp(Self::MIN_VALUE as i32, Self::MAX_VALUE as i32) as i8)
    }

    /// 从线路上的原始字节构造（-128..=-101 同样被钳位）
    pub const fn from_raw(raw: i8) -> Self {
        if raw > Self::MAX_VALUE {
            Self::MAX
        } else if raw < Self::MIN_VALUE {
            Self::MIN
        } else {
            Speed(raw)
        }
    }

    pub fn value(self) -> i8 {
        self.0
    }
}

impl From<i32> for Speed {
    fn from(value: i32) -> Self {
        Speed::new(value)
    }
}

impl From<Speed> for i32 {
    fn from(speed: Speed) -> Self {
        speed.0 as i32
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 解码后的控制指令（动作、电机组合、速度）
///
/// 不可变；构造一次，分发或编码后丢弃。
///
/// # Example
///
/// ```
/// use nxtar_protocol::{Action, ControlAction, MotorSelector, Speed};
///
/// let stop = ControlAction::default();
/// assert_eq!(stop.kind(), Action::Stop);
/// assert_eq!(stop.motors(), MotorSelector::Abc);
/// assert_eq!(stop.speed(), Speed::ZERO);
///
/// let fast = ControlAction::new(Action::MoveForward, MotorSelector::A, 250);
/// assert_eq!(fast.speed().value(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlAction {
    action: Action,
    motors: MotorSelector,
    speed: Speed,
}

impl ControlAction {
    /// 速度钳位到 [-100, 100]
    pub fn new(action: Action, motors: MotorSelector, speed: impl Into<Speed>) -> Self {
        Self {
            action,
            motors,
            speed: speed.into(),
        }
    }

    /// 作用于全部电机、满速
    pub fn action(action: Action) -> Self {
        Self::new(action, MotorSelector::Abc, Speed::MAX)
    }

    /// 作用于指定电机、满速
    pub fn with_motors(action: Action, motors: MotorSelector) -> Self {
        Self::new(action, motors, Speed::MAX)
    }

    pub fn kind(&self) -> Action {
        self.action
    }

    pub fn motors(&self) -> MotorSelector {
        self.motors
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} motors={} speed={}", self.action, self.motors, self.speed)
    }
}
