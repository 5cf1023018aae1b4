//! 第 0 字节位域定义

use bilge::prelude::*;

/// 帧长度（固定 2 字节）
pub const FRAME_LEN: usize = 2;

// 第 0 字节各标志位
pub const MOTOR_A: u8 = 0x01;
pub const MOTOR_B: u8 = 0x02;
pub const MOTOR_C: u8 = 0x04;
pub const DIRECTION: u8 = 0x08;
pub const RECENTER: u8 = 0x10;
pub const USER_1: u8 = 0x20;
pub const USER_2: u8 = 0x40;
pub const USER_3: u8 = 0x80;

/// 电机位掩码（Bit 0-2）
pub const MOTOR_MASK: u8 = MOTOR_A | MOTOR_B | MOTOR_C;
/// 用户动作位掩码（Bit 5-7）
pub const USER_MASK: u8 = USER_1 | USER_2 | USER_3;

/// 控制标志位域（Byte 0: 8 位）
///
/// 协议定义：
/// - Bit 0-2: 电机 A/B/C 选中
/// - Bit 3: 方向，1 前进，0 后退
/// - Bit 4: 回零请求
/// - Bit 5: 用户动作 1
/// - Bit 6: 用户动作 2
/// - Bit 7: 用户动作 3
///
/// bilge 默认使用 LSB first 位序，与协议要求一致。
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlFlags {
    pub motors: u3,     // Bit 0-2: A = bit 0, B = bit 1, C = bit 2
    pub forward: bool,  // Bit 3: 方向
    pub recenter: bool, // Bit 4: 回零
    pub user_1: bool,   // Bit 5: 用户动作 1
    pub user_2: bool,   // Bit 6: 用户动作 2
    pub user_3: bool,   // Bit 7: 用户动作 3
}

impl ControlFlags {
    pub fn from_byte(byte: u8) -> Self {
        ControlFlags::from(u8::new(byte))
    }

    pub fn to_byte(self) -> u8 {
        u8::from(self).value()
    }

    /// Bit 0-2 的原始掩码（0 表示未选中任何电机）
    pub fn motor_mask(&self) -> u8 {
        self.motors().value()
    }

    pub fn any_user(&self) -> bool {
        self.user_1() || self.user_2() || self.user_3()
    }
}
