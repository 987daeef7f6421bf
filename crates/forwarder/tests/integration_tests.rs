//! 통합 테스트 -- 포워더 전체 흐름 검증
//!
//! 설정 해석부터 게이트, 필터, 포맷, 전송까지의 흐름과
//! 동적 필터 교체의 원자성을 검증합니다.

use std::collections::HashSet;
use std::net::UdpSocket;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sysfwd_core::config::{FilterModeSetting, SysfwdConfig, SyslogConfig};
use sysfwd_core::pipeline::FilterStore;
use sysfwd_core::types::{FilterMode, LogSource, Severity};
use sysfwd_forwarder::{
    DropReason, DynamicText, FileFilterStore, FilterEngine, ForwarderConfig, MemoryTransport,
    SyslogForwarder, Verdict,
};

fn memory_transport() -> Arc<MemoryTransport> {
    Arc::new(MemoryTransport::new("127.0.0.1:514".parse().unwrap()))
}

fn forwarder_from(syslog: SyslogConfig) -> (Arc<SyslogForwarder>, Arc<MemoryTransport>) {
    let config = ForwarderConfig::from_core(&syslog).expect("config should resolve");
    let transport = memory_transport();
    let forwarder = SyslogForwarder::builder()
        .config(config)
        .transport(transport.clone())
        .build()
        .expect("forwarder should build");
    (forwarder, transport)
}

/// 시나리오 1: ERROR 임계값에서 INFO 이벤트는 필터와 무관하게 레벨 게이트에서 드롭
#[test]
fn scenario_level_gate_drops_info_under_error_threshold() {
    let (forwarder, transport) = forwarder_from(SyslogConfig {
        min_level: "ERROR".to_owned(),
        filter_mode: FilterModeSetting::Name("exclude".to_owned()),
        filters: vec![],
        ..Default::default()
    });

    forwarder.log_direct(6, "wifi", "connected");

    assert!(transport.is_empty());
    assert_eq!(forwarder.stats().dropped_level, 1);
    assert_eq!(forwarder.stats().dropped_filter, 0);
}

/// 시나리오 2: include 모드에서 목록에 있는 태그만 포맷터로 전달
#[test]
fn scenario_include_mode_passes_only_listed_tag() {
    let (forwarder, transport) = forwarder_from(SyslogConfig {
        client_id: Some("node-7".to_owned()),
        min_level: "DEBUG".to_owned(),
        filter_mode: FilterModeSetting::Name("include".to_owned()),
        filters: vec!["sensor".to_owned()],
        include_timestamp: false,
        ..Default::default()
    });

    forwarder.log_direct(3, "sensor", "reading=42");
    forwarder.log_direct(3, "wifi", "x");

    let packets = transport.packets();
    assert_eq!(packets.len(), 1);
    assert_eq!(
        &packets[0][..],
        "<11>1 - node-7 sensor - - - \u{FEFF}reading=42".as_bytes()
    );
    assert_eq!(forwarder.stats().dropped_filter, 1);
}

/// 시나리오 3: 전역 비활성화 시 레벨/태그와 무관하게 전송 0회
#[test]
fn scenario_globally_disabled_sends_nothing() {
    let (forwarder, transport) = forwarder_from(SyslogConfig {
        globally_enabled: false,
        ..Default::default()
    });

    for level in 0..=7 {
        forwarder.log_direct(level, "any", "message");
        forwarder.on_logger_event(level, "hook", "message");
    }

    assert!(transport.is_empty());
    let stats = forwarder.stats();
    assert_eq!(stats.dropped_disabled, 16);
    assert_eq!(stats.sent + stats.send_failures, 0);
}

/// 모드 전환은 같은 규칙 집합에 대해 결과를 뒤집음
#[test]
fn mode_switch_inverts_outcome() {
    let (forwarder, _) = forwarder_from(SyslogConfig {
        filters: vec!["sensor".to_owned()],
        ..Default::default()
    });

    assert_eq!(
        forwarder.evaluate(LogSource::Direct, Severity::Error, "sensor"),
        Verdict::Drop(DropReason::Filter)
    );
    assert_eq!(
        forwarder.evaluate(LogSource::Direct, Severity::Error, "wifi"),
        Verdict::Forward
    );

    forwarder.set_filter_mode(FilterMode::Include);
    assert_eq!(
        forwarder.evaluate(LogSource::Direct, Severity::Error, "sensor"),
        Verdict::Forward
    );
    assert_eq!(
        forwarder.evaluate(LogSource::Direct, Severity::Error, "wifi"),
        Verdict::Drop(DropReason::Filter)
    );
}

/// 빈 include 집합은 모두 거부, 빈 exclude 집합은 모두 허용
#[test]
fn empty_rule_set_asymmetry() {
    let (forwarder, _) = forwarder_from(SyslogConfig {
        filter_mode: FilterModeSetting::Flag(true),
        ..Default::default()
    });
    assert!(forwarder.filters().is_empty());
    assert_eq!(
        forwarder.evaluate(LogSource::Logger, Severity::Emergency, "anything"),
        Verdict::Drop(DropReason::Filter)
    );

    forwarder.set_filter_mode(FilterMode::Exclude);
    assert_eq!(
        forwarder.evaluate(LogSource::Logger, Severity::Emergency, "anything"),
        Verdict::Forward
    );
}

/// 실제 UDP 루프백으로 패킷이 도착하는지 확인
#[test]
fn udp_loopback_end_to_end() {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let addr = receiver.local_addr().unwrap();

    let config = ForwarderConfig::from_core(&SyslogConfig {
        server_address: addr.ip().to_string(),
        port: addr.port(),
        client_id: Some("loopback".to_owned()),
        direct_prefix: "[auto] ".to_owned(),
        ..Default::default()
    })
    .unwrap();
    let forwarder = SyslogForwarder::builder().config(config).build().unwrap();

    forwarder.log_direct(4, "ota", "\x1b[33mupdate pending\x1b[0m");

    let mut buf = [0u8; 1024];
    let (len, _) = receiver.recv_from(&mut buf).expect("datagram should arrive");
    let text = std::str::from_utf8(&buf[..len]).unwrap();

    assert!(text.starts_with("<12>1 "));
    assert!(text.contains(" loopback ota - - - "));
    assert!(text.ends_with("\u{FEFF}[auto] update pending"));
    assert_eq!(forwarder.stats().sent, 1);
}

/// 도달할 수 없는 주소로의 전송 실패는 패닉도, 상태 변화도 일으키지 않음
#[test]
fn unreachable_send_does_not_alter_state() {
    let config = ForwarderConfig::from_core(&SyslogConfig {
        server_address: "198.51.100.1".to_owned(),
        port: 9,
        filters: vec!["noise".to_owned()],
        min_level: "WARNING".to_owned(),
        ..Default::default()
    })
    .unwrap();
    let forwarder = SyslogForwarder::builder().config(config).build().unwrap();

    let filters_before = forwarder.filters();
    forwarder.log_direct(0, "alarm", "fire");
    forwarder.log_direct(0, "alarm", "fire");

    assert_eq!(forwarder.filters(), filters_before);
    assert_eq!(forwarder.filter_mode(), FilterMode::Exclude);
    assert_eq!(forwarder.min_level(), Severity::Warning);
    assert!(forwarder.control().globally_enabled());
    let stats = forwarder.stats();
    assert_eq!(stats.sent + stats.send_failures, 2);
}

/// 동적 소스 갱신 중에도 평가는 완전한 이전 집합이나 완전한 새 집합만 관찰
#[test]
fn dynamic_reload_is_atomic_under_concurrent_evaluation() {
    let (forwarder, transport) = forwarder_from(SyslogConfig {
        filter_string: "x,y".to_owned(),
        ..Default::default()
    });
    // 전송 경로는 타되 패킷은 쌓이지 않도록
    transport.fail_sends(true);
    let text = Arc::new(DynamicText::new(""));
    forwarder.bind_filter_source(text.clone());

    let old_set: HashSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
    let new_set: HashSet<String> = ["tagA", "tagB"].iter().map(|s| s.to_string()).collect();
    let stop = AtomicBool::new(false);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                while !stop.load(Ordering::Relaxed) {
                    // 관련 없는 태그는 어느 집합에서도 통과해야 함
                    assert_eq!(
                        forwarder.evaluate(LogSource::Direct, Severity::Debug, "unrelated"),
                        Verdict::Forward
                    );
                    forwarder.log_direct(7, "unrelated", "in flight");

                    let tags: HashSet<String> = forwarder.filters().into_iter().collect();
                    assert!(tags == old_set || tags == new_set, "partial set: {:?}", tags);
                }
            });
        }

        for round in 0..200 {
            if round % 2 == 0 {
                text.publish("tagA, tagB");
            } else {
                text.publish("x ,y");
            }
        }
        stop.store(true, Ordering::Relaxed);
    });

    text.publish("tagA,tagB");
    assert_eq!(forwarder.filters(), vec!["tagA", "tagB"]);
}

/// 필터 엔진 스냅샷 교체의 원자성 (포워더 없이)
#[test]
fn filter_engine_swap_is_atomic() {
    let engine = FilterEngine::new(FilterMode::Include, ["a", "b", "c"]);
    let stop = AtomicBool::new(false);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            while !stop.load(Ordering::Relaxed) {
                let snapshot = engine.snapshot();
                let size = snapshot.len();
                assert!(size == 3 || size == 5, "observed {} tags", size);
            }
        });

        for i in 0..500 {
            if i % 2 == 0 {
                engine.replace_from_string("p,q,r,s,t");
            } else {
                engine.replace_from_string("a,b,c");
            }
        }
        stop.store(true, Ordering::Relaxed);
    });
}

/// TOML 설정에서 파일 저장소까지: 재시작 후 필터 문자열 복원
#[test]
fn filter_string_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("filters");
    let toml = format!(
        r#"
[syslog]
server_address = "127.0.0.1"
filter_mode = "include"
filter_state_path = "{}"
"#,
        state.display()
    );
    let core = SysfwdConfig::parse(&toml).unwrap();
    core.validate().unwrap();

    let first = {
        let config = ForwarderConfig::from_core(&core.syslog).unwrap();
        SyslogForwarder::builder()
            .config(config)
            .transport(memory_transport())
            .build()
            .unwrap()
    };
    assert!(first.filters().is_empty());
    first.set_filter_string("api, ota");
    drop(first);

    assert_eq!(
        FileFilterStore::new(&state).load().unwrap().as_deref(),
        Some("api,ota")
    );

    let config = ForwarderConfig::from_core(&core.syslog).unwrap();
    let second = SyslogForwarder::builder()
        .config(config)
        .transport(memory_transport())
        .build()
        .unwrap();
    assert_eq!(second.filters(), vec!["api", "ota"]);
    assert_eq!(
        second.evaluate(LogSource::Direct, Severity::Debug, "ota"),
        Verdict::Forward
    );
}

/// 설정 에러는 엔진 생성을 막음
#[test]
fn invalid_config_prevents_construction() {
    let bad_level = SyslogConfig {
        min_level: "CHATTY".to_owned(),
        ..Default::default()
    };
    assert!(ForwarderConfig::from_core(&bad_level).is_err());

    let bad_mode = SyslogConfig {
        filter_mode: FilterModeSetting::Name("both".to_owned()),
        ..Default::default()
    };
    assert!(ForwarderConfig::from_core(&bad_mode).is_err());

    let bad_address = SyslogConfig {
        server_address: "300.1.1.1".to_owned(),
        ..Default::default()
    };
    assert!(ForwarderConfig::from_core(&bad_address).is_err());
}

/// 빈 태그 추가/제거는 에러 없이 무시
#[test]
fn empty_tag_edits_are_noops() {
    let (forwarder, _) = forwarder_from(SyslogConfig::default());
    assert!(!forwarder.add_filter(""));
    assert!(!forwarder.add_filter("   "));
    assert!(!forwarder.remove_filter(""));
    assert!(!forwarder.remove_filter("missing"));
    assert!(forwarder.filters().is_empty());
}
