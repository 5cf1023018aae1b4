//! 双线程链路集成测试

use nxtar_driver::{
    ControlLinkBuilder, Drive, ListenerRegistry, ListenerResult, SimulatedActuator,
    UserActionListener,
};
use nxtar_protocol::{Action, ControlAction, ControlFrame, MotorPort, MotorSelector, Speed};
use nxtar_transport::mock::MockTransport;
use nxtar_transport::{StreamTransport, TcpTransport};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

#[derive(Default)]
struct Counter(AtomicUsize);

impl UserActionListener for Counter {
    fn on_user_action_1(&self, _motors: MotorSelector, _speed: Speed) -> ListenerResult {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_listener_registered_from_another_thread() {
    let transport = MockTransport::new().with_read_wait(Duration::from_millis(5));
    let registry = Arc::new(ListenerRegistry::new());
    let link = ControlLinkBuilder::new()
        .registry(registry.clone())
        .build(transport.clone(), SimulatedActuator::new())
        .unwrap();

    let counter = Arc::new(Counter::default());
    let handle = {
        let registry = registry.clone();
        let counter = counter.clone();
        std::thread::spawn(move || registry.register(counter))
    };
    assert!(handle.join().unwrap());

    transport.push_bytes(0x20, 0x00);
    transport.push_bytes(0x20, 0x00);
    assert!(wait_until(|| counter.0.load(Ordering::SeqCst) == 2));

    let actuator = link.shutdown().unwrap();
    assert!(actuator.history().is_empty());
}

#[test]
fn test_dispatch_errors_are_counted() {
    let transport = MockTransport::new().with_read_wait(Duration::from_millis(5));
    let mut actuator = SimulatedActuator::new();
    actuator.set_faulty(MotorPort::A, true);
    let link = ControlLinkBuilder::new()
        .build(transport.clone(), actuator)
        .unwrap();

    transport.push_bytes(0x03 | 0x08, 0x10); // A|B forward
    assert!(wait_until(|| link.stats().dispatch_errors == 1));

    let actuator = link.shutdown().unwrap();
    assert_eq!(actuator.state(MotorPort::B).drive, Drive::Forward);
    assert_eq!(actuator.state(MotorPort::A).drive, Drive::Stop);
}

#[test]
fn test_too_many_read_errors_stop_the_reader() {
    let transport = MockTransport::new().with_read_wait(Duration::from_millis(5));
    let link = ControlLinkBuilder::new()
        .max_consecutive_read_errors(1)
        .build(transport.clone(), SimulatedActuator::new())
        .unwrap();

    transport.fail_next_read(std::io::ErrorKind::InvalidData);
    assert!(link.wait_for_disconnect(Duration::from_secs(3)));
    assert_eq!(link.stats().read_errors, 1);
}

#[test]
fn test_listener_on_shared_registry_sees_first_frame() {
    let transport = MockTransport::new().with_read_wait(Duration::from_millis(5));
    // 帧在链路启动前就已到达
    transport.push_bytes(0x27, 0x10); // ABC|user1

    let registry = Arc::new(ListenerRegistry::new());
    let counter = Arc::new(Counter::default());
    registry.register(counter.clone());

    let link = ControlLinkBuilder::new()
        .registry(registry)
        .build(transport.clone(), SimulatedActuator::new())
        .unwrap();

    assert!(wait_until(|| counter.0.load(Ordering::SeqCst) == 1));
    assert_eq!(link.stats().frames_received, 1);
}

#[test]
fn test_send_after_disconnect_fails() {
    let transport = MockTransport::new().with_read_wait(Duration::from_millis(5));
    let link = ControlLinkBuilder::new()
        .build(transport.clone(), SimulatedActuator::new())
        .unwrap();
    transport.hang_up();
    assert!(link.wait_for_disconnect(Duration::from_secs(3)));

    // 读线程退出后写线程随之退出，发送通道关闭
    assert!(wait_until(|| link
        .send(&ControlAction::action(Action::Stop))
        .is_err()));
}

#[test]
fn test_tcp_link_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        // 对端发送：A|B|C 前进 70，然后读取链路发回的一帧
        stream.write_all(&[0x0F, 70]).unwrap();
        let mut reply = [0u8; 2];
        stream.read_exact(&mut reply).unwrap();
        reply
    });

    let transport = TcpTransport::connect(addr).unwrap();
    transport
        .set_read_timeout(Some(Duration::from_millis(20)))
        .unwrap();
    let link = ControlLinkBuilder::new()
        .build(transport, SimulatedActuator::new())
        .unwrap();

    assert!(wait_until(|| link.stats().frames_received == 1));
    link.send(&ControlAction::new(Action::Recenter, MotorSelector::B, 0))
        .unwrap();

    let reply = peer.join().unwrap();
    assert_eq!(ControlFrame::from(reply), ControlFrame::new(0x12, 0x00));

    let actuator = link.shutdown().unwrap();
    for port in MotorPort::ALL {
        assert_eq!(actuator.state(port).drive, Drive::Forward);
        assert_eq!(actuator.state(port).speed, Speed::new(70));
    }
}

#[test]
fn test_stream_transport_over_in_memory_buffers() {
    // 读到 EOF 后链路自行断开
    let input: &[u8] = &[0x0C, 0x14, 0x40, 0x00];
    let transport = StreamTransport::new(std::io::Cursor::new(input.to_vec()), Vec::<u8>::new());
    let link = ControlLinkBuilder::new()
        .build(transport, SimulatedActuator::new())
        .unwrap();

    assert!(link.wait_for_disconnect(Duration::from_secs(3)));
    assert_eq!(link.stats().frames_received, 2);

    let actuator = link.shutdown().unwrap();
    assert_eq!(actuator.state(MotorPort::C).drive, Drive::Forward);
    assert_eq!(actuator.state(MotorPort::C).speed, Speed::new(20));
}
