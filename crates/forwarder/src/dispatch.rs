//! 디스패치 코어 -- 두 진입점과 런타임 변경 연산
//!
//! 로거 훅([`on_logger_event`](SyslogForwarder::on_logger_event))과
//! 직접 호출([`log_direct`](SyslogForwarder::log_direct))은 하나의 파이프라인으로 모입니다.
//!
//! ```text
//! on_logger_event ─┐
//!                  ├─> 전역 활성화 -> 소스 게이트 -> LevelGate -> FilterEngine
//! log_direct ──────┘                                                  │
//!                                      TransportSink <- PacketFormatter
//! ```
//!
//! 어느 단계에서든 거부된 이벤트는 조용히 버려지고 통계만 남습니다.
//! 핫 패스는 에러를 반환하지 않으며, 대기하거나 큐에 쌓지 않습니다.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use sysfwd_core::pipeline::{FilterStore, Transport};
use sysfwd_core::types::{FilterMode, LogEvent, LogSource, Severity};
use tracing::{info, warn};

use crate::config::{ForwarderConfig, validate_client_id};
use crate::control::RuntimeControl;
use crate::dynamic::TextSource;
use crate::error::ForwarderError;
use crate::filter::{FilterEngine, canonical_filter_string, parse_filter_list};
use crate::format::{FormattedPacket, PacketFormatter};
use crate::level::LevelGate;
use crate::stats::{DropReason, ForwarderStats, StatsSnapshot};
use crate::store::FileFilterStore;
use crate::transport::{TransportSink, UdpTransport};

/// 이벤트 평가 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 포맷 후 전송
    Forward,
    /// 드롭
    Drop(DropReason),
}

/// syslog 포워딩 엔진
///
/// 빌더로 생성하며 항상 `Arc`로 공유됩니다. 모든 메서드는 `&self`를 받으므로
/// 여러 스레드의 로그 호출 지점과 자동화 액션이 같은 인스턴스를 함께 씁니다.
pub struct SyslogForwarder {
    control: RuntimeControl,
    level: LevelGate,
    filter: FilterEngine,
    formatter: RwLock<Arc<PacketFormatter>>,
    sink: TransportSink,
    store: Option<Arc<dyn FilterStore>>,
    /// 마지막으로 저장한 필터 문자열. 저장 순서도 이 잠금으로 직렬화됩니다.
    persisted: Mutex<Option<String>>,
    filter_source: RwLock<Option<Arc<dyn TextSource>>>,
    stats: ForwarderStats,
}

impl SyslogForwarder {
    /// 새 빌더를 생성합니다.
    pub fn builder() -> SyslogForwarderBuilder {
        SyslogForwarderBuilder::new()
    }

    // --- 진입점 ---

    /// 호스트 로깅 서브시스템이 내보낸 로그 한 줄을 처리합니다.
    pub fn on_logger_event(&self, level: u8, tag: &str, message: &str) {
        self.submit(LogSource::Logger, level, tag, message);
    }

    /// 자동화 액션 등에서 직접 보낸 로그 한 줄을 처리합니다.
    pub fn log_direct(&self, level: u8, tag: &str, message: &str) {
        self.submit(LogSource::Direct, level, tag, message);
    }

    /// 공유 파이프라인
    ///
    /// 7을 넘는 레벨은 7로 고정됩니다.
    pub fn submit(&self, source: LogSource, level: u8, tag: &str, message: &str) {
        self.stats.record_received(source);

        let severity = Severity::from_level(level);
        if let Verdict::Drop(reason) = self.evaluate(source, severity, tag) {
            self.stats.record_dropped(source, reason);
            return;
        }

        let packet = self.render(source, &LogEvent::new(severity, tag, message));
        if self.sink.send(&packet.bytes) {
            self.stats.record_sent(packet.truncated);
        } else {
            self.stats.record_send_failure(packet.truncated);
        }
    }

    /// 이벤트가 전송될지 평가합니다. 부수 효과는 없습니다.
    pub fn evaluate(&self, source: LogSource, severity: Severity, tag: &str) -> Verdict {
        if !self.control.globally_enabled() {
            return Verdict::Drop(DropReason::Disabled);
        }
        if !self.control.source_enabled(source) {
            return Verdict::Drop(DropReason::SourceDisabled);
        }
        if !self.level.passes(severity) {
            return Verdict::Drop(DropReason::Level);
        }
        if !self.filter.passes(tag) {
            return Verdict::Drop(DropReason::Filter);
        }
        Verdict::Forward
    }

    /// 소스에 맞는 접두어와 현재 색상 설정으로 패킷을 만듭니다.
    pub fn render(&self, source: LogSource, event: &LogEvent<'_>) -> FormattedPacket {
        let formatter = self.formatter();
        let prefix = self.control.prefix(source);
        formatter.format(event, &prefix, self.control.strip_colors())
    }

    // --- 런타임 제어 ---

    pub fn set_globally_enabled(&self, enabled: bool) -> bool {
        self.control.set_globally_enabled(enabled)
    }

    pub fn set_enable_logger(&self, enabled: bool) -> bool {
        self.control.set_logger_enabled(enabled)
    }

    pub fn set_enable_direct_logs(&self, enabled: bool) -> bool {
        self.control.set_direct_logs_enabled(enabled)
    }

    pub fn set_strip_colors(&self, strip: bool) -> bool {
        self.control.set_strip_colors(strip)
    }

    pub fn set_logger_prefix(&self, prefix: &str) {
        self.control.set_prefix(LogSource::Logger, prefix);
    }

    pub fn set_direct_prefix(&self, prefix: &str) {
        self.control.set_prefix(LogSource::Direct, prefix);
    }

    /// 최소 레벨을 바꿉니다.
    pub fn set_min_level(&self, level: Severity) {
        let old = self.level.set_threshold(level);
        if old != level {
            info!("minimum level: {} -> {}", old, level);
        }
    }

    // --- 필터 변경 ---

    /// 필터 모드를 바꿉니다. 규칙 집합은 유지됩니다.
    pub fn set_filter_mode(&self, mode: FilterMode) {
        let old = self.filter.set_mode(mode);
        if old != mode {
            info!("filter mode: {} -> {}", old, mode);
        }
    }

    /// 태그 하나를 추가합니다. 빈 태그와 중복은 무시됩니다.
    pub fn add_filter(&self, tag: &str) -> bool {
        let added = self.filter.add(tag);
        if added {
            info!(tag = tag.trim(), rules = self.filter.len(), "added filter");
        }
        added
    }

    /// 태그 하나를 제거합니다. 없는 태그는 무시됩니다.
    pub fn remove_filter(&self, tag: &str) -> bool {
        let removed = self.filter.remove(tag);
        if removed {
            info!(tag = tag.trim(), rules = self.filter.len(), "removed filter");
        }
        removed
    }

    /// 모든 태그를 제거하고 빈 필터 문자열을 저장합니다.
    pub fn clear_filters(&self) {
        {
            let mut persisted = self.persisted.lock();
            self.filter.clear();
            self.persist(&mut persisted, String::new());
        }
        info!("all filters cleared");
        self.publish_filter_string();
    }

    /// 쉼표 구분 문자열로 규칙 집합 전체를 원자적으로 교체합니다.
    ///
    /// 저장 여부는 규칙 집합이 아니라 마지막으로 저장한 문자열과 비교해 정합니다.
    /// `add_filter`로 이미 같은 집합이 되어 있어도 정규화된 문자열은 저장됩니다.
    /// 규칙 집합이 바뀌었으면 `true`를 반환합니다.
    pub fn set_filter_string(&self, filter_string: &str) -> bool {
        let parsed = parse_filter_list(filter_string);
        let canonical = canonical_filter_string(&parsed);
        let rules = parsed.len();

        let changed = {
            let mut persisted = self.persisted.lock();
            let changed = self.filter.replace(parsed);
            self.persist(&mut persisted, canonical.clone());
            changed
        };

        if changed {
            self.stats.record_filter_reload();
            info!(filter_string = %canonical, rules, "filter string updated");
        }
        self.publish_filter_string();
        changed
    }

    /// 외부 텍스트 소스의 변경을 구독합니다.
    ///
    /// 엔진은 약한 참조만 등록하므로, 엔진이 먼저 해제되면 이후 알림은 무시됩니다.
    /// 구독 시점의 현재 값은 적용하지 않습니다. 이후 `set_filter_string`과
    /// `clear_filters`의 결과는 마지막으로 바인딩한 소스에 정규화된 문자열로 게시됩니다.
    pub fn bind_filter_source(self: &Arc<Self>, source: Arc<dyn TextSource>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        source.subscribe(Arc::new(move |text: &str| {
            if let Some(forwarder) = weak.upgrade() {
                forwarder.set_filter_string(text);
            }
        }));
        *self.filter_source.write() = Some(source);
        info!("bound dynamic filter source");
    }

    fn persist(&self, persisted: &mut Option<String>, filter_string: String) {
        let Some(store) = &self.store else {
            return;
        };
        if persisted.as_deref() == Some(filter_string.as_str()) {
            return;
        }
        match store.save(&filter_string) {
            Ok(()) => *persisted = Some(filter_string),
            Err(e) => warn!(store = store.name(), error = %e, "failed to persist filter string"),
        }
    }

    /// 현재 규칙 집합을 바인딩된 소스에 게시합니다.
    ///
    /// 소스의 값이 이미 같으면 게시하지 않으므로, 게시가 구독 콜백을 거쳐
    /// 다시 이 메서드로 돌아와도 한 번에 멈춥니다.
    fn publish_filter_string(&self) {
        let source = self.filter_source.read().clone();
        let Some(source) = source else {
            return;
        };
        let current = self.filter.filter_string();
        if source.current() != current {
            source.set_value(&current);
        }
    }

    // --- 목적지 / 식별자 ---

    /// 서버 주소를 바꾸고 새 소켓을 게시합니다.
    ///
    /// 소켓 생성에 실패하면 기존 소켓이 그대로 유지됩니다.
    pub fn set_server(&self, address: IpAddr, port: u16) -> Result<(), ForwarderError> {
        if port == 0 {
            return Err(ForwarderError::config("syslog.port", "must be 1-65535"));
        }
        let endpoint = SocketAddr::new(address, port);
        if self.sink.endpoint() == endpoint {
            return Ok(());
        }
        let transport = UdpTransport::connect(endpoint)?;
        let old = self.sink.replace(Arc::new(transport));
        info!("syslog server updated: {} -> {}", old.endpoint(), endpoint);
        Ok(())
    }

    /// 전송을 직접 교체합니다.
    pub fn set_transport(&self, transport: Arc<dyn Transport>) -> Arc<dyn Transport> {
        self.sink.replace(transport)
    }

    /// 클라이언트 ID를 바꿉니다.
    pub fn set_client_id(&self, client_id: &str) -> Result<(), ForwarderError> {
        validate_client_id(client_id)?;
        let mut slot = self.formatter.write();
        if slot.client_id() == client_id {
            return Ok(());
        }
        let old = slot.client_id().to_owned();
        *slot = Arc::new(slot.with_client_id(client_id));
        drop(slot);
        info!("client id updated: {} -> {}", old, client_id);
        Ok(())
    }

    // --- 조회 ---

    /// 현재 태그 목록 (정렬됨)
    pub fn filters(&self) -> Vec<String> {
        self.filter.tags()
    }

    pub fn has_filter(&self, tag: &str) -> bool {
        self.filter.has_filter(tag)
    }

    /// 정렬된 쉼표 구분 필터 문자열
    pub fn filter_string(&self) -> String {
        self.filter.filter_string()
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter.mode()
    }

    pub fn min_level(&self) -> Severity {
        self.level.threshold()
    }

    pub fn endpoint(&self) -> SocketAddr {
        self.sink.endpoint()
    }

    pub fn client_id(&self) -> String {
        self.formatter().client_id().to_owned()
    }

    /// 런타임 제어 상태
    pub fn control(&self) -> &RuntimeControl {
        &self.control
    }

    /// 통계 스냅샷
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn formatter(&self) -> Arc<PacketFormatter> {
        Arc::clone(&self.formatter.read())
    }
}

impl std::fmt::Debug for SyslogForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyslogForwarder")
            .field("endpoint", &self.endpoint())
            .field("client_id", &self.client_id())
            .field("min_level", &self.min_level())
            .field("filter", &self.filter)
            .field("control", &self.control)
            .finish()
    }
}

/// 포워더 빌더
#[derive(Default)]
pub struct SyslogForwarderBuilder {
    config: ForwarderConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn FilterStore>>,
}

impl SyslogForwarderBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 포워더 설정을 지정합니다.
    pub fn config(mut self, config: ForwarderConfig) -> Self {
        self.config = config;
        self
    }

    /// 전송을 지정합니다. 지정하지 않으면 설정의 서버 주소로 UDP 소켓을 엽니다.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 필터 저장소를 지정합니다. 지정하지 않으면 `filter_state_path`가 있을 때 파일 저장소를 씁니다.
    pub fn filter_store(mut self, store: Arc<dyn FilterStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 포워더를 생성합니다.
    ///
    /// # Errors
    ///
    /// - 설정 검증 실패
    /// - UDP 소켓 생성 실패
    pub fn build(self) -> Result<Arc<SyslogForwarder>, ForwarderError> {
        let config = self.config;
        config.validate()?;

        let formatter = PacketFormatter::from_config(&config)?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(UdpTransport::connect(config.server)?),
        };
        let store: Option<Arc<dyn FilterStore>> = self.store.or_else(|| {
            config
                .filter_state_path
                .as_ref()
                .map(|path| Arc::new(FileFilterStore::new(path)) as Arc<dyn FilterStore>)
        });

        let initial = initial_filters(&config, store.as_deref());
        let filter = FilterEngine::new(config.filter_mode, initial.iter());

        info!(
            endpoint = %transport.endpoint(),
            client_id = %formatter.client_id(),
            min_level = %config.min_level,
            filter_mode = %config.filter_mode,
            rules = filter.len(),
            enabled = config.globally_enabled,
            "syslog forwarder started"
        );

        Ok(Arc::new(SyslogForwarder {
            control: RuntimeControl::from_config(&config),
            level: LevelGate::new(config.min_level),
            filter,
            formatter: RwLock::new(Arc::new(formatter)),
            sink: TransportSink::new(transport),
            store,
            persisted: Mutex::new(None),
            filter_source: RwLock::new(None),
            stats: ForwarderStats::new(),
        }))
    }
}

/// 초기 규칙 집합을 결정합니다.
///
/// 설정된 필터 문자열 -> 정적 필터 -> 저장된 필터 문자열 -> 빈 집합 순서입니다.
/// 저장소 읽기 실패는 경고만 남기고 빈 집합으로 시작합니다.
fn initial_filters(config: &ForwarderConfig, store: Option<&dyn FilterStore>) -> Vec<String> {
    if let Some(tags) = config.configured_filters() {
        return tags;
    }
    let Some(store) = store else {
        return Vec::new();
    };
    match store.load() {
        Ok(Some(saved)) => {
            let tags: Vec<String> = parse_filter_list(&saved).into_iter().collect();
            if !tags.is_empty() {
                info!(store = store.name(), rules = tags.len(), "restored saved filters");
            }
            tags
        }
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(store = store.name(), error = %e, "failed to load saved filters");
            Vec::new()
        }
    }
}
