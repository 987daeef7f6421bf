//! 동적 텍스트 소스 -- 외부에서 바뀌는 문자열 값
//!
//! 엔진은 변경 알림을 구독하고, 알림마다 전달된 새 값을 동기적으로 적용합니다.
//! 엔진 쪽에서 바뀐 필터 문자열은 [`TextSource::set_value`]로 되돌려 게시됩니다.

use std::sync::Arc;

use parking_lot::RwLock;

/// 변경 알림 콜백
pub type ChangeCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// 현재 값 조회와 변경 알림을 제공하는 외부 텍스트 값
pub trait TextSource: Send + Sync {
    /// 현재 값
    fn current(&self) -> String;

    /// 변경 알림을 구독합니다. 콜백은 값이 게시될 때마다 새 값으로 호출됩니다.
    fn subscribe(&self, callback: ChangeCallback);

    /// 새 값을 게시합니다. 구독자에게도 알립니다.
    fn set_value(&self, value: &str);
}

/// 메모리 텍스트 값
///
/// [`publish`](Self::publish)는 값을 갱신한 뒤, 게시한 스레드에서 구독자를 순서대로 호출합니다.
/// 콜백 호출 중에는 어떤 잠금도 잡고 있지 않으므로 콜백 안에서 다시 게시하거나 구독해도 됩니다.
#[derive(Default)]
pub struct DynamicText {
    value: RwLock<String>,
    subscribers: RwLock<Vec<ChangeCallback>>,
}

impl DynamicText {
    /// 초기 값으로 생성합니다.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            value: RwLock::new(initial.into()),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// 새 값을 게시하고 구독자에게 알립니다.
    pub fn publish(&self, value: impl Into<String>) {
        let value = value.into();
        *self.value.write() = value.clone();

        let subscribers: Vec<ChangeCallback> = self.subscribers.read().clone();
        for callback in subscribers {
            callback(&value);
        }
    }

    /// 구독자 수
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl TextSource for DynamicText {
    fn current(&self) -> String {
        self.value.read().clone()
    }

    fn subscribe(&self, callback: ChangeCallback) {
        self.subscribers.write().push(callback);
    }

    fn set_value(&self, value: &str) {
        self.publish(value);
    }
}

impl std::fmt::Debug for DynamicText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicText")
            .field("value", &*self.value.read())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
