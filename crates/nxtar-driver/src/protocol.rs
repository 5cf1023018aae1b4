//! 单线程读-解码-分发管线
//!
//! [`ControlProtocol`] 独占一个传输适配器和一个执行器。每次调用处理一条消息：
//! 失败只影响这一条，调用方可以继续处理下一条（本层没有重试循环）。

use crate::actuator::Actuator;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::DriverError;
use crate::listener::{ListenerRegistry, UserActionListener};
use nxtar_protocol::{ControlAction, ControlFrame, FRAME_LEN};
use nxtar_transport::Transport;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// 读-解码-分发管线
pub struct ControlProtocol<T: Transport, A: Actuator> {
    transport: T,
    actuator: A,
    dispatcher: Dispatcher,
}

impl<T: Transport, A: Actuator> ControlProtocol<T, A> {
    /// 使用一个新的空注册表创建管线
    pub fn new(transport: T, actuator: A) -> Self {
        Self::with_registry(transport, actuator, Arc::new(ListenerRegistry::new()))
    }

    /// 与其他管线共享同一个注册表
    pub fn with_registry(transport: T, actuator: A, registry: Arc<ListenerRegistry>) -> Self {
        Self {
            transport,
            actuator,
            dispatcher: Dispatcher::new(registry),
        }
    }

    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        self.dispatcher.registry()
    }

    pub fn register_listener(&self, listener: Arc<dyn UserActionListener>) -> bool {
        self.registry().register(listener)
    }

    pub fn remove_listener(&self, listener: &Arc<dyn UserActionListener>) -> bool {
        self.registry().remove(listener)
    }

    /// 读取一帧并解码，不分发
    pub fn read_raw_message(&mut self) -> Result<ControlAction, DriverError> {
        let frame = self.transport.read_frame()?;
        trace!("RX frame {:?}", frame);
        Ok(frame.decode())
    }

    /// 读取、解码并分发一条消息
    ///
    /// 返回 `Err` 表示这一条消息失败；管线本身仍可继续使用。
    pub fn read_and_execute(&mut self) -> Result<DispatchOutcome, DriverError> {
        let action = self.read_raw_message()?;
        self.execute(&action)
    }

    /// 直接分发一个动作（不经过传输层）
    pub fn execute(&mut self, action: &ControlAction) -> Result<DispatchOutcome, DriverError> {
        self.dispatcher.dispatch(action, &mut self.actuator)
    }

    /// 编码并写出一个动作
    pub fn write_action(&mut self, action: &ControlAction) -> Result<(), DriverError> {
        let frame = action.to_frame();
        trace!("TX frame {:?} ({})", frame, action);
        self.transport.write_frame(frame)?;
        Ok(())
    }

    /// 原样写出前 2 个字节
    ///
    /// 不足 2 字节返回 `InvalidArgument`；多余字节被忽略。
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), DriverError> {
        if bytes.len() < FRAME_LEN {
            return Err(DriverError::InvalidArgument(format!(
                "raw message needs {} bytes, got {}",
                FRAME_LEN,
                bytes.len()
            )));
        }
        if bytes.len() > FRAME_LEN {
            debug!("Ignoring {} trailing bytes of raw message", bytes.len() - FRAME_LEN);
        }
        let frame = ControlFrame::new(bytes[0], bytes[1]);
        trace!("TX raw frame {:?}", frame);
        self.transport.write_frame(frame)?;
        Ok(())
    }

    /// 替换传输适配器
    ///
    /// 先关闭旧适配器，再装入新适配器。旧适配器关闭失败时新适配器仍会被装入，
    /// 错误返回给调用方。
    pub fn replace_transport(&mut self, transport: T) -> Result<(), DriverError> {
        let closed = self.transport.close();
        // 旧适配器在赋值时 drop
        self.transport = transport;
        match closed {
            Ok(()) => {
                info!("Transport replaced");
                Ok(())
            },
            Err(e) => {
                warn!("Old transport failed to close: {}", e);
                Err(e.into())
            },
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    /// 关闭传输适配器并交还执行器
    pub fn close(mut self) -> Result<A, DriverError> {
        self.transport.close()?;
        Ok(self.actuator)
    }

    pub fn into_parts(self) -> (T, A, Arc<ListenerRegistry>) {
        let registry = self.dispatcher.registry().clone();
        (self.transport, self.actuator, registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{Drive, MotorIntent, SimulatedActuator};
    use nxtar_protocol::{Action, MotorPort, MotorSelector, Speed};
    use nxtar_transport::TransportError;
    use nxtar_transport::mock::MockTransport;
    use std::io;
    use std::time::Duration;

    fn protocol() -> (MockTransport, ControlProtocol<MockTransport, SimulatedActuator>) {
        let mock = MockTransport::new().with_read_wait(Duration::from_millis(10));
        let protocol = ControlProtocol::new(mock.clone(), SimulatedActuator::new());
        (mock, protocol)
    }

    #[test]
    fn test_read_and_execute_drives_motors() {
        let (mock, mut protocol) = protocol();
        mock.push_bytes(0x0F, 0x46); // A|B|C|forward, 70

        let outcome = protocol.read_and_execute().unwrap();
        assert_eq!(outcome.intents(), 3);
        assert_eq!(protocol.actuator().state(MotorPort::B).drive, Drive::Forward);
        assert_eq!(protocol.actuator().state(MotorPort::B).speed, Speed::new(70));
    }

    #[test]
    fn test_read_raw_message_does_not_dispatch() {
        let (mock, mut protocol) = protocol();
        mock.push_bytes(0x11, 0x32);

        let action = protocol.read_raw_message().unwrap();
        assert_eq!(action, ControlAction::new(Action::Recenter, MotorSelector::A, 50));
        assert!(protocol.actuator().history().is_empty());
    }

    #[test]
    fn test_transport_error_is_per_message() {
        let (mock, mut protocol) = protocol();
        mock.fail_next_read(io::ErrorKind::BrokenPipe);
        mock.push_bytes(0x01, 0x00); // A, 方向位清零 = 后退

        let err = protocol.read_and_execute().unwrap_err();
        assert!(matches!(err, DriverError::Transport(TransportError::Io(_))));

        // 下一条消息照常处理
        let outcome = protocol.read_and_execute().unwrap();
        assert_eq!(outcome.intents(), 1);
        assert_eq!(
            protocol.actuator().history(),
            &[MotorIntent::Drive {
                port: MotorPort::A,
                drive: Drive::Backward,
                speed: Speed::ZERO
            }]
        );
    }

    #[test]
    fn test_write_action_encodes() {
        let (mock, mut protocol) = protocol();
        let action = ControlAction::new(Action::MoveForward, MotorSelector::Bc, -20);

        protocol.write_action(&action).unwrap();
        assert_eq!(mock.written(), vec![ControlFrame::new(0x0E, (-20i8) as u8)]);
    }

    #[test]
    fn test_write_raw_rejects_short_input() {
        let (mock, mut protocol) = protocol();

        assert!(matches!(
            protocol.write_raw(&[0x01]),
            Err(DriverError::InvalidArgument(_))
        ));
        protocol.write_raw(&[0x81, 0x05, 0xFF]).unwrap();
        assert_eq!(mock.written(), vec![ControlFrame::new(0x81, 0x05)]);
    }

    #[test]
    fn test_replace_transport_closes_old_first() {
        let (old, mut protocol) = protocol();
        let new = MockTransport::new().with_read_wait(Duration::from_millis(10));
        new.push_bytes(0x04, 0x00);

        protocol.replace_transport(new.clone()).unwrap();
        assert_eq!(old.close_count(), 1);
        assert_eq!(new.close_count(), 0);

        let action = protocol.read_raw_message().unwrap();
        assert_eq!(action.motors(), MotorSelector::C);
    }

    #[test]
    fn test_replace_transport_installs_new_even_if_close_fails() {
        let (old, mut protocol) = protocol();
        old.fail_next_close(io::ErrorKind::Other);
        let new = MockTransport::new().with_read_wait(Duration::from_millis(10));
        new.push_bytes(0x21, 0x00); // A|user1

        let err = protocol.replace_transport(new.clone()).unwrap_err();
        assert!(matches!(err, DriverError::Transport(TransportError::Io(_))));
        assert_eq!(old.close_count(), 1);

        let action = protocol.read_raw_message().unwrap();
        assert_eq!(action, ControlAction::new(Action::User1, MotorSelector::A, 0));
        assert_eq!(new.pending(), 0);
    }

    #[test]
    fn test_close_returns_actuator() {
        let (mock, mut protocol) = protocol();
        protocol
            .execute(&ControlAction::new(Action::MoveBackward, MotorSelector::A, 10))
            .unwrap();

        let actuator = protocol.close().unwrap();
        assert_eq!(actuator.history().len(), 1);
        assert_eq!(mock.close_count(), 1);
    }
}
