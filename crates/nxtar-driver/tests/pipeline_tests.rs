//! 管线集成测试
//!
//! 从原始帧开始，经解码、分发，检查执行器意图和监听器回调。

use nxtar_driver::{
    ControlProtocol, DispatchOutcome, Drive, DriverError, ListenerFailurePolicy, ListenerRegistry,
    ListenerResult, MotorIntent, NotifyReport, SimulatedActuator, UserActionListener,
};
use nxtar_protocol::{Action, ControlAction, ControlFrame, MotorPort, MotorSelector, Speed};
use nxtar_transport::mock::MockTransport;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Journal = Arc<Mutex<Vec<String>>>;

struct Named {
    name: &'static str,
    journal: Journal,
    fail: bool,
}

impl Named {
    fn new(name: &'static str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name,
            journal: journal.clone(),
            fail: false,
        })
    }

    fn failing(name: &'static str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name,
            journal: journal.clone(),
            fail: true,
        })
    }

    fn push(&self, what: String) -> ListenerResult {
        self.journal.lock().unwrap().push(format!("{} {}", self.name, what));
        if self.fail {
            Err(format!("{} exploded", self.name).into())
        } else {
            Ok(())
        }
    }
}

impl UserActionListener for Named {
    fn on_registered(&self) {
        self.journal.lock().unwrap().push(format!("{} registered", self.name));
    }

    fn on_user_action_1(&self, motors: MotorSelector, speed: Speed) -> ListenerResult {
        self.push(format!("user1 {} {}", motors, speed))
    }

    fn on_user_action_2(&self, motors: MotorSelector, speed: Speed) -> ListenerResult {
        self.push(format!("user2 {} {}", motors, speed))
    }

    fn on_user_action_3(&self, motors: MotorSelector, speed: Speed) -> ListenerResult {
        self.push(format!("user3 {} {}", motors, speed))
    }

    fn on_removed(&self) {
        self.journal.lock().unwrap().push(format!("{} removed", self.name));
    }
}

fn setup(
    policy: ListenerFailurePolicy,
) -> (MockTransport, ControlProtocol<MockTransport, SimulatedActuator>) {
    let mock = MockTransport::new().with_read_wait(Duration::from_millis(10));
    let registry = Arc::new(ListenerRegistry::with_policy(policy));
    let protocol = ControlProtocol::with_registry(mock.clone(), SimulatedActuator::new(), registry);
    (mock, protocol)
}

#[test]
fn test_forward_abc_issues_three_intents_in_order() {
    let (mock, mut protocol) = setup(ListenerFailurePolicy::Isolate);
    mock.push_frame(ControlAction::new(Action::MoveForward, MotorSelector::Abc, 70).to_frame());

    protocol.read_and_execute().unwrap();

    let speed = Speed::new(70);
    let expected: Vec<_> = MotorPort::ALL
        .iter()
        .map(|&port| MotorIntent::Drive {
            port,
            drive: Drive::Forward,
            speed,
        })
        .collect();
    assert_eq!(protocol.actuator().history(), expected.as_slice());
}

#[test]
fn test_empty_selection_becomes_stop_on_all_motors() {
    let (mock, mut protocol) = setup(ListenerFailurePolicy::Isolate);
    // 无标志位（方向 = 后退），速度 100
    mock.push_bytes(0x00, 0x64);

    let outcome = protocol.read_and_execute().unwrap();

    match outcome {
        DispatchOutcome::Driven { drive, ports, failed } => {
            assert_eq!(drive, Drive::Stop);
            assert_eq!(ports.as_slice(), &MotorPort::ALL);
            assert!(failed.is_empty());
        },
        other => panic!("Expected Driven, got {:?}", other),
    }
    for port in MotorPort::ALL {
        assert_eq!(protocol.actuator().state(port).speed, Speed::MAX);
    }
}

#[test]
fn test_recenter_single_motor() {
    let (mock, mut protocol) = setup(ListenerFailurePolicy::Isolate);
    protocol.actuator_mut().advance(MotorPort::A, 200);
    mock.push_bytes(0x11, 0x32);

    let outcome = protocol.read_and_execute().unwrap();

    assert!(matches!(outcome, DispatchOutcome::Recentered { .. }));
    assert_eq!(
        protocol.actuator().history(),
        &[MotorIntent::Recenter {
            port: MotorPort::A,
            rotation: -200
        }]
    );
}

#[test]
fn test_user2_notifies_all_listeners_in_order() {
    let journal = Journal::default();
    let (mock, mut protocol) = setup(ListenerFailurePolicy::Isolate);
    protocol.register_listener(Named::new("first", &journal));
    protocol.register_listener(Named::new("second", &journal));

    mock.push_frame(ControlAction::new(Action::User2, MotorSelector::Bc, 40).to_frame());
    let outcome = protocol.read_and_execute().unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Notified(NotifyReport { notified: 2, failed: 0 })
    );
    assert!(protocol.actuator().history().is_empty());
    assert_eq!(
        *journal.lock().unwrap(),
        vec![
            "first registered",
            "second registered",
            "first user2 BC 40",
            "second user2 BC 40",
        ]
    );
}

#[test]
fn test_user_bits_dominate_recenter() {
    let journal = Journal::default();
    let (mock, mut protocol) = setup(ListenerFailurePolicy::Isolate);
    protocol.register_listener(Named::new("only", &journal));

    // user1 | user2 | recenter，无电机位
    mock.push_bytes(0x20 | 0x40 | 0x10, 0x05);
    protocol.read_and_execute().unwrap();

    assert_eq!(journal.lock().unwrap().last().unwrap(), "only user1 ABC 5");
    assert!(protocol.actuator().history().is_empty());
}

#[test]
fn test_isolated_listener_failure_keeps_notifying() {
    let journal = Journal::default();
    let (_mock, mut protocol) = setup(ListenerFailurePolicy::Isolate);
    protocol.register_listener(Named::failing("bad", &journal));
    protocol.register_listener(Named::new("good", &journal));

    let outcome = protocol
        .execute(&ControlAction::new(Action::User3, MotorSelector::A, 1))
        .unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Notified(NotifyReport { notified: 2, failed: 1 })
    );
    assert_eq!(journal.lock().unwrap().last().unwrap(), "good user3 A 1");
}

#[test]
fn test_aborting_listener_failure_is_returned() {
    let journal = Journal::default();
    let (_mock, mut protocol) = setup(ListenerFailurePolicy::Abort);
    protocol.register_listener(Named::failing("bad", &journal));
    protocol.register_listener(Named::new("never", &journal));
    journal.lock().unwrap().clear();

    let err = protocol
        .execute(&ControlAction::new(Action::User1, MotorSelector::A, 1))
        .unwrap_err();

    assert!(matches!(err, DriverError::Listener { position: 0, .. }));
    assert_eq!(*journal.lock().unwrap(), vec!["bad user1 A 1"]);
}

#[test]
fn test_registration_callbacks_fire_exactly_once() {
    let journal = Journal::default();
    let (_mock, protocol) = setup(ListenerFailurePolicy::Isolate);
    let listener: Arc<dyn UserActionListener> = Named::new("x", &journal);

    assert!(protocol.register_listener(listener.clone()));
    assert!(!protocol.register_listener(listener.clone()));
    assert!(protocol.remove_listener(&listener));
    assert!(!protocol.remove_listener(&listener));

    assert_eq!(*journal.lock().unwrap(), vec!["x registered", "x removed"]);
}

#[test]
fn test_write_then_decode_preserves_motor_bits() {
    let (mock, mut protocol) = setup(ListenerFailurePolicy::Isolate);
    let action = ControlAction::new(Action::MoveBackward, MotorSelector::Ac, -55);

    protocol.write_action(&action).unwrap();
    let written = mock.written();
    assert_eq!(written, vec![ControlFrame::new(0x05, (-55i8) as u8)]);

    // 写出的帧回送后解码得到同一个动作
    mock.push_frame(written[0]);
    assert_eq!(protocol.read_raw_message().unwrap(), action);
}
