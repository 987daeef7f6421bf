#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`level`]: 심각도 임계값 검사
//! - [`filter`]: 태그 기반 include/exclude 규칙 엔진
//! - [`format`]: RFC 5424 패킷 포맷터 (ANSI 색상 제거, 크기 제한)
//! - [`transport`]: best-effort UDP 전송과 교체 가능한 싱크
//! - [`control`]: 활성화 플래그와 소스별 접두어
//! - [`dispatch`]: 두 진입점을 하나의 파이프라인으로 묶는 포워더
//! - [`dynamic`]: 외부 텍스트 값과 변경 알림
//! - [`hook`]: `tracing` 이벤트를 포워더로 넘기는 레이어
//! - [`action`]: 자동화 액션
//! - [`store`]: 필터 문자열 영속화
//! - [`stats`]: 통계 카운터
//! - [`config`]: 포워더 설정 (core 설정 해석)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! tracing 이벤트 -> ForwarderLayer -> on_logger_event ─┐
//!                                                      ├─> LevelGate -> FilterEngine -> PacketFormatter -> TransportSink
//! Action / 직접 호출 ------------------> log_direct ──┘                     ^
//!                                                                           |
//!                                        DynamicText --(변경 알림)--> set_filter_string
//! ```

pub mod action;
pub mod config;
pub mod control;
pub mod dispatch;
pub mod dynamic;
pub mod error;
pub mod filter;
pub mod format;
pub mod hook;
pub mod level;
pub mod stats;
pub mod store;
pub mod transport;

// --- 주요 타입 re-export ---

// 포워더
pub use dispatch::{SyslogForwarder, SyslogForwarderBuilder, Verdict};

// 설정
pub use config::{ForwarderConfig, ForwarderConfigBuilder};

// 에러
pub use error::ForwarderError;

// 파이프라인 구성 요소
pub use filter::{FilterEngine, canonical_filter_string, parse_filter_list};
pub use format::{FormattedPacket, PacketFormatter};
pub use level::LevelGate;
pub use transport::{MemoryTransport, TransportSink, UdpTransport};

// 확장
pub use action::{
    Action, AddFilterAction, ClearFiltersAction, LogAction, RemoveFilterAction,
    SetFilterStringAction, Templatable,
};
pub use dynamic::{DynamicText, TextSource};
pub use hook::ForwarderLayer;
pub use stats::{DropReason, StatsSnapshot};
pub use store::{FileFilterStore, MemoryFilterStore};
