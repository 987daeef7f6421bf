//! 전송 계층 -- best-effort UDP 데이터그램 전송
//!
//! - [`UdpTransport`]: 논블로킹 UDP 소켓 하나로 고정 목적지에 전송
//! - [`MemoryTransport`]: 패킷을 메모리에 모으는 전송 (드라이런, 테스트)
//! - [`TransportSink`]: 교체 가능한 전송을 감싸고 실패를 삼키는 싱크
//!
//! 재시도, 큐잉, 백프레셔는 없습니다. 전송 실패는 카운터와 `debug` 로그로만 남습니다.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use sysfwd_core::error::TransportError;
use sysfwd_core::pipeline::Transport;
use tracing::debug;

/// UDP 전송
///
/// 목적지와 같은 주소 패밀리의 임의 포트에 바인딩하고, 브로드캐스트를 허용합니다.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    endpoint: SocketAddr,
}

impl UdpTransport {
    /// 목적지로 보낼 소켓을 생성합니다.
    pub fn connect(endpoint: SocketAddr) -> Result<Self, TransportError> {
        let local = match endpoint.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };

        let socket = UdpSocket::bind(local)
            .map_err(|e| TransportError::SocketSetup(format!("bind {}: {}", local, e)))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| TransportError::SocketSetup(format!("set_nonblocking: {}", e)))?;
        if endpoint.is_ipv4() {
            socket
                .set_broadcast(true)
                .map_err(|e| TransportError::SocketSetup(format!("set_broadcast: {}", e)))?;
        }

        Ok(Self { socket, endpoint })
    }

    /// 바인딩된 로컬 주소
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket
            .local_addr()
            .map_err(|e| TransportError::SocketSetup(e.to_string()))
    }
}

impl Transport for UdpTransport {
    fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    fn send(&self, packet: &[u8]) -> Result<usize, TransportError> {
        self.socket
            .send_to(packet, self.endpoint)
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

/// 패킷을 메모리에 모으는 전송
///
/// `fail_sends(true)`로 전송 실패를 흉내 낼 수 있습니다.
#[derive(Debug)]
pub struct MemoryTransport {
    endpoint: SocketAddr,
    packets: Mutex<Vec<Bytes>>,
    failing: AtomicBool,
}

impl MemoryTransport {
    /// 새 메모리 전송을 생성합니다.
    pub fn new(endpoint: SocketAddr) -> Self {
        Self {
            endpoint,
            packets: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// 이후 전송을 실패시킬지 설정합니다.
    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// 지금까지 받은 패킷
    pub fn packets(&self) -> Vec<Bytes> {
        self.packets.lock().clone()
    }

    /// 받은 패킷을 꺼내고 비웁니다.
    pub fn take(&self) -> Vec<Bytes> {
        std::mem::take(&mut *self.packets.lock())
    }

    /// 받은 패킷 수
    pub fn len(&self) -> usize {
        self.packets.lock().len()
    }

    /// 받은 패킷이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.packets.lock().is_empty()
    }
}

impl Transport for MemoryTransport {
    fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    fn send(&self, packet: &[u8]) -> Result<usize, TransportError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(TransportError::Send("simulated failure".to_owned()));
        }
        self.packets.lock().push(Bytes::copy_from_slice(packet));
        Ok(packet.len())
    }
}

/// 교체 가능한 전송 싱크
///
/// 현재 전송은 `Arc`로 게시되며, [`replace`](Self::replace)는 포인터만 바꿉니다.
/// 진행 중인 전송은 교체 전 소켓으로 끝까지 진행됩니다.
pub struct TransportSink {
    transport: RwLock<Arc<dyn Transport>>,
}

impl TransportSink {
    /// 전송을 감싸는 싱크를 생성합니다.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport: RwLock::new(transport),
        }
    }

    /// 패킷을 한 번 전송 시도합니다. 성공하면 `true`.
    ///
    /// 에러는 호출자에게 전파되지 않습니다.
    pub fn send(&self, packet: &[u8]) -> bool {
        let transport = self.current();
        match transport.send(packet) {
            Ok(_) => true,
            Err(e) => {
                debug!(
                    endpoint = %transport.endpoint(),
                    bytes = packet.len(),
                    error = %e,
                    "syslog datagram dropped"
                );
                false
            }
        }
    }

    /// 현재 전송
    pub fn current(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport.read())
    }

    /// 현재 목적지
    pub fn endpoint(&self) -> SocketAddr {
        self.current().endpoint()
    }

    /// 전송을 교체하고 이전 전송을 반환합니다.
    pub fn replace(&self, transport: Arc<dyn Transport>) -> Arc<dyn Transport> {
        std::mem::replace(&mut *self.transport.write(), transport)
    }
}

impl std::fmt::Debug for TransportSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSink")
            .field("endpoint", &self.endpoint())
            .finish()
    }
}
