//! 파이프라인 trait -- 모듈 확장 포인트 정의

use std::net::SocketAddr;

use crate::error::{StoreError, TransportError};

/// 데이터그램 전송 trait
///
/// 포워더는 이 trait 뒤의 구현으로 패킷을 내보냅니다.
/// 구현은 호출 스레드를 블로킹해서는 안 되며, 실패는 에러로만 돌려줍니다.
pub trait Transport: Send + Sync {
    /// 목적지 주소
    fn endpoint(&self) -> SocketAddr;

    /// 패킷 하나를 한 번 전송 시도합니다.
    fn send(&self, packet: &[u8]) -> Result<usize, TransportError>;
}

/// 필터 문자열 영속화 trait
///
/// 재시작 후에도 런타임에 바뀐 필터 문자열을 복원하기 위해 사용합니다.
pub trait FilterStore: Send + Sync {
    /// 저장소 이름 (로그용)
    fn name(&self) -> &str;

    /// 저장된 필터 문자열을 읽습니다. 저장된 값이 없으면 `None`.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// 필터 문자열을 저장합니다.
    fn save(&self, filter_string: &str) -> Result<(), StoreError>;
}
