//! 用户动作监听器注册表
//!
//! 收到 `User1..=User3` 动作时不驱动电机，而是按注册顺序通知所有监听器。
//!
//! # 线程安全
//!
//! 注册、移除、通知共用一把互斥锁：通知过程中看到的是一致的监听器列表，
//! 并发的注册/移除不会破坏迭代。回调在持锁期间执行，因此回调内部
//! **不得** 再调用同一个注册表（否则死锁）。
//!
//! # 使用示例
//!
//! ```rust
//! use nxtar_driver::listener::{ListenerRegistry, ListenerResult, UserActionListener};
//! use nxtar_protocol::{Action, MotorSelector, Speed};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct Horn {
//!     honks: AtomicUsize,
//! }
//!
//! impl UserActionListener for Horn {
//!     fn on_user_action_1(&self, _motors: MotorSelector, _speed: Speed) -> ListenerResult {
//!         self.honks.fetch_add(1, Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//!
//! let registry = ListenerRegistry::new();
//! let horn = Arc::new(Horn::default());
//! assert!(registry.register(horn.clone()));
//!
//! registry.notify(Action::User1, MotorSelector::Abc, Speed::MAX).unwrap();
//! assert_eq!(horn.honks.load(Ordering::Relaxed), 1);
//! ```

use crate::error::DriverError;
use nxtar_protocol::{Action, MotorSelector, Speed, UserAction};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// 监听器回调错误
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 监听器回调结果
pub type ListenerResult = Result<(), ListenerError>;

/// 用户动作监听器
///
/// 所有方法都有空的默认实现，只需覆盖关心的回调。
pub trait UserActionListener: Send + Sync {
    /// 刚被注册后调用（每次实际加入注册表时恰好一次）
    fn on_registered(&self) {}

    fn on_user_action_1(&self, motors: MotorSelector, speed: Speed) -> ListenerResult {
        let _ = (motors, speed);
        Ok(())
    }

    fn on_user_action_2(&self, motors: MotorSelector, speed: Speed) -> ListenerResult {
        let _ = (motors, speed);
        Ok(())
    }

    fn on_user_action_3(&self, motors: MotorSelector, speed: Speed) -> ListenerResult {
        let _ = (motors, speed);
        Ok(())
    }

    /// 刚被移除后调用
    fn on_removed(&self) {}
}

/// 单个监听器回调失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ListenerFailurePolicy {
    /// 记录日志并继续通知后续监听器
    #[default]
    Isolate,
    /// 第一个失败即中止本次通知，并返回 `DriverError::Listener`
    Abort,
}

/// 一次通知的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifyReport {
    /// 被调用的监听器数量（含失败的）
    pub notified: usize,
    /// 回调返回错误的数量
    pub failed: usize,
}

/// 监听器注册表
///
/// 有序、按 `Arc` 指针身份去重。
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<Arc<dyn UserActionListener>>>,
    policy: ListenerFailurePolicy,
}

fn same_listener(a: &Arc<dyn UserActionListener>, b: &Arc<dyn UserActionListener>) -> bool {
    // 只比较数据指针，忽略 vtable
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::with_policy(ListenerFailurePolicy::default())
    }

    pub fn with_policy(policy: ListenerFailurePolicy) -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            policy,
        }
    }

    pub fn policy(&self) -> ListenerFailurePolicy {
        self.policy
    }

    /// 注册监听器
    ///
    /// 已存在时什么也不做并返回 `false`；否则追加到末尾，
    /// 在返回前同步调用 `on_registered()`。
    pub fn register(&self, listener: Arc<dyn UserActionListener>) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            trace!("Listener already registered, ignoring");
            return false;
        }
        listeners.push(listener.clone());
        listener.on_registered();
        debug!("Listener registered ({} total)", listeners.len());
        true
    }

    /// 移除监听器
    ///
    /// 不存在时什么也不做并返回 `false`；否则移除，并在返回前同步调用 `on_removed()`。
    pub fn remove(&self, listener: &Arc<dyn UserActionListener>) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(index) = listeners.iter().position(|l| same_listener(l, listener)) else {
            trace!("Listener not registered, ignoring removal");
            return false;
        };
        let removed = listeners.remove(index);
        removed.on_removed();
        debug!("Listener removed ({} remaining)", listeners.len());
        true
    }

    pub fn contains(&self, listener: &Arc<dyn UserActionListener>) -> bool {
        self.listeners
            .lock()
            .iter()
            .any(|l| same_listener(l, listener))
    }

    /// 移除全部监听器，按注册顺序依次调用 `on_removed()`
    pub fn clear(&self) {
        let mut listeners = self.listeners.lock();
        for listener in listeners.drain(..) {
            listener.on_removed();
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// 按注册顺序通知所有监听器
    ///
    /// 非用户动作直接忽略。失败处理见 [`ListenerFailurePolicy`]。
    pub fn notify(
        &self,
        action: Action,
        motors: MotorSelector,
        speed: Speed,
    ) -> Result<NotifyReport, DriverError> {
        let Ok(user_action) = UserAction::try_from(action) else {
            trace!("Ignoring notification for non-user action {:?}", action);
            return Ok(NotifyReport::default());
        };

        let listeners = self.listeners.lock();
        let mut report = NotifyReport::default();

        for (position, listener) in listeners.iter().enumerate() {
            let result = match user_action {
                UserAction::User1 => listener.on_user_action_1(motors, speed),
                UserAction::User2 => listener.on_user_action_2(motors, speed),
                UserAction::User3 => listener.on_user_action_3(motors, speed),
            };
            report.notified += 1;

            if let Err(source) = result {
                match self.policy {
                    ListenerFailurePolicy::Isolate => {
                        report.failed += 1;
                        warn!(
                            "Listener #{} failed on {:?}: {}",
                            position, user_action, source
                        );
                    },
                    ListenerFailurePolicy::Abort => {
                        return Err(DriverError::Listener { position, source });
                    },
                }
            }
        }

        Ok(report)
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .field("policy", &self.policy)
            .finish()
    }
}

/// 将用户动作写入日志的监听器
#[derive(Debug, Default)]
pub struct TracingListener;

impl UserActionListener for TracingListener {
    fn on_registered(&self) {
        debug!("TracingListener registered");
    }

    fn on_user_action_1(&self, motors: MotorSelector, speed: Speed) -> ListenerResult {
        tracing::info!("User action 1 (motors={}, speed={})", motors, speed);
        Ok(())
    }

    fn on_user_action_2(&self, motors: MotorSelector, speed: Speed) -> ListenerResult {
        tracing::info!("User action 2 (motors={}, speed={})", motors, speed);
        Ok(())
    }

    fn on_user_action_3(&self, motors: MotorSelector, speed: Speed) -> ListenerResult {
        tracing::info!("User action 3 (motors={}, speed={})", motors, speed);
        Ok(())
    }

    fn on_removed(&self) {
        debug!("TracingListener removed");
    }
}
