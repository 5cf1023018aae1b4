//! 2 字节线路帧

use crate::flags::{ControlFlags, FRAME_LEN};
use crate::{ControlAction, ProtocolError, codec};
use std::fmt;

/// 线路上的一条控制消息
///
/// `ControlFrame` 是传输层与协议层之间的中间表示：
/// 传输层只负责读写整 2 字节，位语义由 `codec` 解释。
///
/// # Example
///
/// ```
/// use nxtar_protocol::{Action, ControlFrame, MotorSelector};
///
/// let frame = ControlFrame::from_slice(&[0x09, 0x1E, 0xFF]).unwrap();
/// assert_eq!(frame.as_bytes(), &[0x09, 0x1E]);
///
/// let action = frame.decode();
/// assert_eq!(action.kind(), Action::MoveForward);
/// assert_eq!(action.motors(), MotorSelector::A);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlFrame([u8; FRAME_LEN]);

impl ControlFrame {
    pub const fn new(flags: u8, speed: u8) -> Self {
        Self([flags, speed])
    }

    /// 从任意缓冲区读取前 2 字节
    ///
    /// # Errors
    /// 缓冲区不足 2 字节时返回 `ProtocolError::InvalidFrame`。
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        match bytes {
            [flags, speed, ..] => Ok(Self([*flags, *speed])),
            _ => Err(ProtocolError::InvalidFrame {
                expected: FRAME_LEN,
                actual: bytes.len(),
            }),
        }
    }

    pub fn flags(&self) -> ControlFlags {
        ControlFlags::from_byte(self.0[0])
    }

    /// Byte 1 的有符号解释（未钳位）
    pub fn speed_byte(&self) -> i8 {
        self.0[1] as i8
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; FRAME_LEN] {
        self.0
    }

    pub fn decode(self) -> ControlAction {
        codec::decode_frame(self)
    }
}

impl From<[u8; FRAME_LEN]> for ControlFrame {
    fn from(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ControlFrame> for [u8; FRAME_LEN] {
    fn from(frame: ControlFrame) -> Self {
        frame.0
    }
}

impl TryFrom<&[u8]> for ControlFrame {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl fmt::Debug for ControlFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControlFrame([0x{:02X}, 0x{:02X}])", self.0[0], self.0[1])
    }
}

impl fmt::Display for ControlFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.0[0], self.0[1])
    }
}
