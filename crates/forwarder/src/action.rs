//! 자동화 액션 -- 트리거 인자로 값을 계산해 포워더를 조작
//!
//! 각 액션은 포워더 핸들(`Arc<SyslogForwarder>`)을 명시적으로 보관합니다.
//! 파라미터는 설정 시점에 고정된 값이거나, 실행 시점에 트리거 인자에서 계산되는 값입니다.

use std::fmt;
use std::sync::Arc;

use crate::dispatch::SyslogForwarder;

/// 고정 값 또는 트리거 인자로 계산되는 값
pub enum Templatable<T, A> {
    /// 설정 시점에 고정된 값
    Static(T),
    /// 실행 시점에 인자로 계산되는 값
    Lambda(Box<dyn Fn(&A) -> T + Send + Sync>),
}

impl<T: Clone, A> Templatable<T, A> {
    /// 계산 함수로 값을 만듭니다.
    pub fn lambda<F>(f: F) -> Self
    where
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        Self::Lambda(Box::new(f))
    }

    /// 인자로 현재 값을 얻습니다.
    pub fn value(&self, args: &A) -> T {
        match self {
            Self::Static(value) => value.clone(),
            Self::Lambda(f) => f(args),
        }
    }
}

impl<T, A> From<T> for Templatable<T, A> {
    fn from(value: T) -> Self {
        Self::Static(value)
    }
}

impl<T: fmt::Debug, A> fmt::Debug for Templatable<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Lambda(_) => f.write_str("Lambda(..)"),
        }
    }
}

/// 트리거 인자 `A`로 실행되는 액션
pub trait Action<A>: Send + Sync {
    /// 액션을 실행합니다.
    fn play(&self, args: &A);
}

/// 로그 한 줄을 직접 전송
pub struct LogAction<A> {
    forwarder: Arc<SyslogForwarder>,
    level: Templatable<u8, A>,
    tag: Templatable<String, A>,
    payload: Templatable<String, A>,
}

impl<A> LogAction<A> {
    pub fn new(
        forwarder: Arc<SyslogForwarder>,
        level: impl Into<Templatable<u8, A>>,
        tag: impl Into<Templatable<String, A>>,
        payload: impl Into<Templatable<String, A>>,
    ) -> Self {
        Self {
            forwarder,
            level: level.into(),
            tag: tag.into(),
            payload: payload.into(),
        }
    }
}

impl<A> Action<A> for LogAction<A> {
    fn play(&self, args: &A) {
        let tag = self.tag.value(args);
        let payload = self.payload.value(args);
        self.forwarder.log_direct(self.level.value(args), &tag, &payload);
    }
}

/// 필터 태그 하나 추가
pub struct AddFilterAction<A> {
    forwarder: Arc<SyslogForwarder>,
    tag: Templatable<String, A>,
}

impl<A> AddFilterAction<A> {
    pub fn new(forwarder: Arc<SyslogForwarder>, tag: impl Into<Templatable<String, A>>) -> Self {
        Self {
            forwarder,
            tag: tag.into(),
        }
    }
}

impl<A> Action<A> for AddFilterAction<A> {
    fn play(&self, args: &A) {
        self.forwarder.add_filter(&self.tag.value(args));
    }
}

/// 필터 태그 하나 제거
pub struct RemoveFilterAction<A> {
    forwarder: Arc<SyslogForwarder>,
    tag: Templatable<String, A>,
}

impl<A> RemoveFilterAction<A> {
    pub fn new(forwarder: Arc<SyslogForwarder>, tag: impl Into<Templatable<String, A>>) -> Self {
        Self {
            forwarder,
            tag: tag.into(),
        }
    }
}

impl<A> Action<A> for RemoveFilterAction<A> {
    fn play(&self, args: &A) {
        self.forwarder.remove_filter(&self.tag.value(args));
    }
}

/// 모든 필터 태그 제거
pub struct ClearFiltersAction {
    forwarder: Arc<SyslogForwarder>,
}

impl ClearFiltersAction {
    pub fn new(forwarder: Arc<SyslogForwarder>) -> Self {
        Self { forwarder }
    }
}

impl<A> Action<A> for ClearFiltersAction {
    fn play(&self, _args: &A) {
        self.forwarder.clear_filters();
    }
}

/// 쉼표 구분 문자열로 필터 집합 교체
pub struct SetFilterStringAction<A> {
    forwarder: Arc<SyslogForwarder>,
    filter_string: Templatable<String, A>,
}

impl<A> SetFilterStringAction<A> {
    pub fn new(
        forwarder: Arc<SyslogForwarder>,
        filter_string: impl Into<Templatable<String, A>>,
    ) -> Self {
        Self {
            forwarder,
            filter_string: filter_string.into(),
        }
    }
}

impl<A> Action<A> for SetFilterStringAction<A> {
    fn play(&self, args: &A) {
        self.forwarder.set_filter_string(&self.filter_string.value(args));
    }
}
