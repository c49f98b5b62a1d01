use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use lynx_abi::bytes::{hton16, ntoh16, raw};
use lynx_abi::{
    Buffer, BufferMut, Context, Endpoint, SockProto, SockType, Socket, SocketFlags, SocketState,
};

use crate::provider::Provider;
use crate::status::{ErrorCode, SL_ERR, SL_OK};

/// First port handed out when a socket opens on port 0.
const EPHEMERAL_FIRST: u16 = 49152;

/// Loopback provider settings.
#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    /// Tag stamped into `Context::af_inet` on setup.
    pub af_inet: u16,
    /// Tag stamped into `Context::af_inet6` on setup.
    pub af_inet6: u16,
    /// How long a blocking receive waits; `None` waits forever.
    pub recv_timeout: Option<Duration>,
    /// Datagrams queued per socket before new arrivals are dropped.
    pub queue_depth: usize,
    /// Largest payload a single send accepts.
    pub max_datagram: usize,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            af_inet: 2,
            af_inet6: 23,
            recv_timeout: Some(Duration::from_secs(1)),
            queue_depth: 64,
            max_datagram: 65507,
        }
    }
}

struct Datagram {
    payload: Vec<u8>,
    from: Endpoint,
}

struct Mailbox {
    local: Endpoint,
    rx_queue: VecDeque<Datagram>,
}

struct SocketTable {
    started: bool,
    af_inet: u16,
    af_inet6: u16,
    sockets: BTreeMap<i64, Mailbox>,
    next_fd: i64,
}

impl SocketTable {
    const fn new() -> Self {
        Self {
            started: false,
            af_inet: 0,
            af_inet6: 0,
            sockets: BTreeMap::new(),
            next_fd: 3,
        }
    }

    fn check_family(&self, endpoint: &Endpoint, flags: SocketFlags) -> Result<(), ErrorCode> {
        let af = endpoint.af();
        if af == self.af_inet && !flags.contains(SocketFlags::IPV4_DISABLED) {
            return Ok(());
        }
        if lynx_abi::IPV6_ENABLED && af == self.af_inet6 && !flags.contains(SocketFlags::IPV6_DISABLED) {
            return Ok(());
        }
        Err(ErrorCode::EAFNOSUPPORT)
    }

    fn find_bound(&self, endpoint: &Endpoint) -> Option<i64> {
        self.sockets
            .iter()
            .find(|(_, mailbox)| mailbox.local == *endpoint)
            .map(|(fd, _)| *fd)
    }

    /// Network-order port not yet bound for `endpoint`'s address.
    fn ephemeral_port(&self, endpoint: &Endpoint) -> Option<u16> {
        let mut candidate = *endpoint;
        (EPHEMERAL_FIRST..=u16::MAX).map(hton16).find(|&port| {
            candidate.set_port(port);
            self.find_bound(&candidate).is_none()
        })
    }

    fn bind(&mut self, local: Endpoint) -> i64 {
        let fd = self.next_fd;
        self.next_fd += 1;
        self.sockets.insert(
            fd,
            Mailbox {
                local,
                rx_queue: VecDeque::new(),
            },
        );
        fd
    }
}

struct Shared {
    config: LoopbackConfig,
    table: Mutex<SocketTable>,
    arrived: Condvar,
}

/// In-process provider that routes datagrams between its own sockets.
///
/// Sockets are keyed by their bound endpoint; a send to an endpoint nobody
/// has bound is counted as sent and dropped, the way UDP behaves. Clones
/// share the same socket table, so one thread can block in a receive while
/// another sends.
#[derive(Clone)]
pub struct LoopbackProvider {
    shared: Arc<Shared>,
}

impl Default for LoopbackProvider {
    fn default() -> Self {
        Self::new(LoopbackConfig::default())
    }
}

impl LoopbackProvider {
    pub fn new(config: LoopbackConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                table: Mutex::new(SocketTable::new()),
                arrived: Condvar::new(),
            }),
        }
    }

    pub fn config(&self) -> &LoopbackConfig {
        &self.shared.config
    }

    /// Number of sockets currently holding a descriptor.
    pub fn open_sockets(&self) -> usize {
        self.lock().sockets.len()
    }

    fn lock(&self) -> MutexGuard<'_, SocketTable> {
        self.shared.table.lock()
    }
}

fn reject(sock: &mut Socket, op: &str, code: ErrorCode) -> i32 {
    log::warn!("loopback: {} on fd {} failed: {}", op, sock.fd, code);
    sock.fail(code.code());
    SL_ERR
}

fn byte_count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

fn mark_traffic(sock: &mut Socket, would_block: SocketFlags) {
    sock.set_flag(would_block, false);
    if sock.state == SocketState::Bound as u32 {
        sock.set_state(SocketState::Open);
        log::debug!("loopback: fd {} open", sock.fd);
    }
}

fn gather(bufs: &[Buffer<'_>], total: usize) -> Vec<u8> {
    let mut payload = vec![0u8; total];
    let mut offset = 0;
    for buf in bufs {
        // SAFETY: each segment borrows `buf.len()` live bytes and `payload`
        // was sized to the sum of all segment lengths.
        unsafe { raw::copy_region(payload.as_mut_ptr(), offset, buf.as_ptr(), 0, buf.len()) };
        offset += buf.len();
    }
    payload
}

/// Copies `payload` across `bufs` in order; whatever does not fit is discarded.
fn scatter(payload: &[u8], bufs: &mut [BufferMut<'_>]) -> usize {
    let mut copied = 0;
    for buf in bufs.iter_mut() {
        if copied == payload.len() {
            break;
        }
        let len = buf.len().min(payload.len() - copied);
        // SAFETY: receive segments are writable for `buf.len()` bytes and
        // `copied + len` stays inside `payload`.
        unsafe { raw::copy_region(buf.as_mut_ptr(), 0, payload.as_ptr(), copied, len) };
        copied += len;
    }
    copied
}

impl Provider for LoopbackProvider {
    fn setup(&self, ctx: &mut Context) -> i32 {
        let mut table = self.lock();
        if !table.started {
            table.started = true;
            table.af_inet = self.shared.config.af_inet;
            table.af_inet6 = self.shared.config.af_inet6;
            log::debug!(
                "loopback: started (af_inet={}, af_inet6={})",
                table.af_inet,
                table.af_inet6
            );
        }
        ctx.mark_started(table.af_inet, table.af_inet6);
        SL_OK
    }

    fn cleanup(&self, ctx: &mut Context) -> i32 {
        let mut table = self.lock();
        if table.started {
            table.started = false;
            let dropped = table.sockets.len();
            table.sockets.clear();
            self.shared.arrived.notify_all();
            log::debug!("loopback: stopped, released {} sockets", dropped);
        }
        ctx.mark_stopped();
        SL_OK
    }

    fn socket_open(&self, sock: &mut Socket) -> i32 {
        let mut table = self.lock();
        if !table.started {
            return reject(sock, "open", ErrorCode::ENOTCONN);
        }
        if sock.has_descriptor() {
            return reject(sock, "open", ErrorCode::EINVAL);
        }
        if let Err(code) = table.check_family(&sock.endpoint, sock.flags()) {
            return reject(sock, "open", code);
        }

        if sock.endpoint.port() == 0 {
            match table.ephemeral_port(&sock.endpoint) {
                Some(port) => sock.endpoint.set_port(port),
                None => return reject(sock, "open", ErrorCode::EADDRINUSE),
            }
        }
        if table.find_bound(&sock.endpoint).is_some() {
            return reject(sock, "open", ErrorCode::EADDRINUSE);
        }

        sock.fd = table.bind(sock.endpoint);
        sock.sock_type = SockType::Dgram as u32;
        sock.proto = SockProto::Udp as u32;
        sock.error = 0;
        sock.set_flag(SocketFlags::WOULD_BLOCK_ON_READ | SocketFlags::WOULD_BLOCK_ON_WRITE, false);
        sock.set_state(SocketState::Bound);
        log::debug!(
            "loopback: fd {} bound to port {}",
            sock.fd,
            ntoh16(sock.endpoint.port())
        );
        SL_OK
    }

    fn socket_close(&self, sock: &mut Socket) -> i32 {
        if sock.has_descriptor() {
            let mut table = self.lock();
            if table.sockets.remove(&sock.fd).is_some() {
                self.shared.arrived.notify_all();
                log::debug!("loopback: fd {} closed", sock.fd);
            }
        }
        sock.mark_closed();
        SL_OK
    }

    fn socket_nonblocking(&self, sock: &mut Socket, enabled: bool) -> i32 {
        let known = sock.has_descriptor() && self.lock().sockets.contains_key(&sock.fd);
        if !known {
            return reject(sock, "nonblocking", ErrorCode::EBADF);
        }
        sock.set_flag(SocketFlags::NON_BLOCKING, enabled);
        log::debug!("loopback: fd {} non-blocking={}", sock.fd, enabled);
        SL_OK
    }

    fn socket_send(&self, sock: &mut Socket, bufs: &[Buffer<'_>], to: &Endpoint) -> i32 {
        let config = &self.shared.config;
        let mut table = self.lock();
        if !table.started {
            return reject(sock, "send", ErrorCode::ENOTCONN);
        }
        let Some(local) = table.sockets.get(&sock.fd).map(|mailbox| mailbox.local) else {
            return reject(sock, "send", ErrorCode::EBADF);
        };
        if let Err(code) = table.check_family(to, sock.flags()) {
            return reject(sock, "send", code);
        }

        let total: usize = bufs.iter().map(Buffer::len).sum();
        if total > config.max_datagram {
            return reject(sock, "send", ErrorCode::EMSGSIZE);
        }
        let payload = gather(bufs, total);

        match table.find_bound(to) {
            Some(fd) => {
                if let Some(mailbox) = table.sockets.get_mut(&fd) {
                    if mailbox.rx_queue.len() >= config.queue_depth {
                        log::trace!("loopback: fd {} queue full, dropped {} bytes", fd, total);
                    } else {
                        mailbox.rx_queue.push_back(Datagram { payload, from: local });
                        self.shared.arrived.notify_all();
                        log::trace!("loopback: fd {} -> fd {}: {} bytes", sock.fd, fd, total);
                    }
                }
            }
            None => log::trace!("loopback: no socket bound at {:?}, dropped {} bytes", to, total),
        }
        drop(table);

        mark_traffic(sock, SocketFlags::WOULD_BLOCK_ON_WRITE);
        byte_count(total)
    }

    fn socket_recv(&self, sock: &mut Socket, bufs: &mut [BufferMut<'_>], from: &mut Endpoint) -> i32 {
        let deadline = self.shared.config.recv_timeout.map(|timeout| Instant::now() + timeout);
        let mut table = self.lock();

        loop {
            if !table.started {
                return reject(sock, "recv", ErrorCode::ENOTCONN);
            }
            let Some(mailbox) = table.sockets.get_mut(&sock.fd) else {
                return reject(sock, "recv", ErrorCode::EBADF);
            };

            if let Some(datagram) = mailbox.rx_queue.pop_front() {
                drop(table);
                let copied = scatter(&datagram.payload, bufs);
                if copied < datagram.payload.len() {
                    log::trace!(
                        "loopback: fd {} truncated {} bytes to {}",
                        sock.fd,
                        datagram.payload.len(),
                        copied
                    );
                }
                *from = datagram.from;
                mark_traffic(sock, SocketFlags::WOULD_BLOCK_ON_READ);
                log::trace!("loopback: fd {} received {} bytes", sock.fd, copied);
                return byte_count(copied);
            }

            if sock.has_flag(SocketFlags::NON_BLOCKING) {
                sock.set_flag(SocketFlags::WOULD_BLOCK_ON_READ, true);
                log::trace!("loopback: fd {} would block on read", sock.fd);
                return 0;
            }

            match deadline {
                None => self.shared.arrived.wait(&mut table),
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return reject(sock, "recv", ErrorCode::ETIMEDOUT);
                    }
                    self.shared.arrived.wait_until(&mut table, deadline);
                }
            }
        }
    }
}
