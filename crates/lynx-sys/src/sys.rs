use core::fmt;

use lynx_abi::{Buffer, BufferMut, Context, Endpoint, Socket, SocketFlags};
use thiserror::Error;

use crate::provider::Provider;
use crate::status::{ErrorCode, SL_OK};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Setup,
    Cleanup,
    Open,
    Close,
    NonBlocking,
    Send,
    Recv,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Setup => "setup",
            Operation::Cleanup => "cleanup",
            Operation::Open => "socket_open",
            Operation::Close => "socket_close",
            Operation::NonBlocking => "socket_nonblocking",
            Operation::Send => "socket_send",
            Operation::Recv => "socket_recv",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SysError {
    /// The provider returned a failure status. `code` is the socket's
    /// persisted error, or 0 for context calls.
    #[error("{op} failed with status {status} (error {code})")]
    Provider { op: Operation, status: i32, code: u32 },

    /// A non-blocking socket could not make progress.
    #[error("{0} would block")]
    WouldBlock(Operation),
}

impl SysError {
    pub fn operation(&self) -> Operation {
        match self {
            SysError::Provider { op, .. } => *op,
            SysError::WouldBlock(op) => *op,
        }
    }

    /// The persisted error code, when the provider used a known one.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            SysError::Provider { code, .. } => ErrorCode::from_code(*code),
            SysError::WouldBlock(_) => Some(ErrorCode::EAGAIN),
        }
    }
}

pub type SysResult<T> = Result<T, SysError>;

/// Typed front end over a [`Provider`].
///
/// Each call forwards to the provider once and never retries. Status codes
/// become `Result`s; the socket block keeps whatever the provider wrote.
#[derive(Debug, Clone, Default)]
pub struct Sys<P> {
    provider: P,
}

impl<P: Provider> Sys<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Starts the provider and stamps the family tags into `ctx`.
    pub fn setup(&self, ctx: &mut Context) -> SysResult<()> {
        let status = self.provider.setup(ctx);
        if status != SL_OK {
            log::warn!("setup failed with status {}", status);
            return Err(SysError::Provider {
                op: Operation::Setup,
                status,
                code: 0,
            });
        }
        log::debug!("context started (af_inet={}, af_inet6={})", ctx.af_inet, ctx.af_inet6);
        Ok(())
    }

    pub fn cleanup(&self, ctx: &mut Context) -> SysResult<()> {
        let status = self.provider.cleanup(ctx);
        if status != SL_OK {
            log::warn!("cleanup failed with status {}", status);
            return Err(SysError::Provider {
                op: Operation::Cleanup,
                status,
                code: 0,
            });
        }
        log::debug!("context stopped");
        Ok(())
    }

    pub fn open(&self, sock: &mut Socket) -> SysResult<()> {
        let status = self.provider.socket_open(sock);
        check(Operation::Open, status, sock)?;
        log::debug!("socket opened (fd={})", sock.fd);
        Ok(())
    }

    pub fn close(&self, sock: &mut Socket) -> SysResult<()> {
        let fd = sock.fd;
        let status = self.provider.socket_close(sock);
        check(Operation::Close, status, sock)?;
        log::debug!("socket closed (fd={})", fd);
        Ok(())
    }

    pub fn set_nonblocking(&self, sock: &mut Socket, enabled: bool) -> SysResult<()> {
        let status = self.provider.socket_nonblocking(sock, enabled);
        check(Operation::NonBlocking, status, sock)
    }

    /// Sends `bufs` as one datagram to `to` and returns the bytes sent.
    pub fn send(&self, sock: &mut Socket, bufs: &[Buffer<'_>], to: &Endpoint) -> SysResult<usize> {
        let status = self.provider.socket_send(sock, bufs, to);
        transferred(Operation::Send, status, sock, SocketFlags::WOULD_BLOCK_ON_WRITE)
    }

    /// Receives one datagram into `bufs`, writing its source to `from`.
    ///
    /// Only writable segments are accepted; a send segment over read-only
    /// memory does not compile here:
    ///
    /// ```compile_fail
    /// use lynx_abi::{Buffer, Endpoint, Socket};
    /// use lynx_sys::{LoopbackProvider, Sys};
    ///
    /// static GREETING: [u8; 5] = *b"hello";
    ///
    /// let sys = Sys::new(LoopbackProvider::default());
    /// let mut sock = Socket::default();
    /// let mut from = Endpoint::zeroed();
    /// let _ = sys.recv(&mut sock, &mut [Buffer::for_send(&GREETING)], &mut from);
    /// ```
    pub fn recv(&self, sock: &mut Socket, bufs: &mut [BufferMut<'_>], from: &mut Endpoint) -> SysResult<usize> {
        let status = self.provider.socket_recv(sock, bufs, from);
        transferred(Operation::Recv, status, sock, SocketFlags::WOULD_BLOCK_ON_READ)
    }
}

fn check(op: Operation, status: i32, sock: &Socket) -> SysResult<()> {
    if status == SL_OK {
        return Ok(());
    }
    log::warn!("{} failed with status {} (error {})", op, status, sock.error);
    Err(SysError::Provider {
        op,
        status,
        code: sock.error,
    })
}

fn transferred(op: Operation, status: i32, sock: &Socket, would_block: SocketFlags) -> SysResult<usize> {
    match usize::try_from(status) {
        Ok(0) if sock.has_flag(would_block) => Err(SysError::WouldBlock(op)),
        Ok(len) => {
            log::trace!("{} moved {} bytes (fd={})", op, len, sock.fd);
            Ok(len)
        }
        Err(_) => {
            log::warn!("{} failed with status {} (error {})", op, status, sock.error);
            Err(SysError::Provider {
                op,
                status,
                code: sock.error,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::SL_ERR;
    use lynx_abi::SocketState;

    /// Provider that answers every call with a fixed status.
    struct Scripted {
        status: i32,
        error: u32,
        flags: SocketFlags,
    }

    impl Scripted {
        fn apply(&self, sock: &mut Socket) -> i32 {
            if self.status < 0 {
                sock.fail(self.error);
            }
            sock.flags = self.flags.bits();
            self.status
        }
    }

    impl Provider for Scripted {
        fn setup(&self, ctx: &mut Context) -> i32 {
            ctx.mark_started(2, 23);
            self.status
        }

        fn cleanup(&self, ctx: &mut Context) -> i32 {
            ctx.mark_stopped();
            self.status
        }

        fn socket_open(&self, sock: &mut Socket) -> i32 {
            self.apply(sock)
        }

        fn socket_close(&self, sock: &mut Socket) -> i32 {
            self.apply(sock)
        }

        fn socket_nonblocking(&self, sock: &mut Socket, _enabled: bool) -> i32 {
            self.apply(sock)
        }

        fn socket_send(&self, sock: &mut Socket, _bufs: &[Buffer<'_>], _to: &Endpoint) -> i32 {
            self.apply(sock)
        }

        fn socket_recv(&self, sock: &mut Socket, _bufs: &mut [BufferMut<'_>], _from: &mut Endpoint) -> i32 {
            self.apply(sock)
        }
    }

    fn sys(status: i32, error: u32, flags: SocketFlags) -> Sys<Scripted> {
        Sys::new(Scripted { status, error, flags })
    }

    #[test]
    fn ok_status_is_ok() {
        let sys = sys(SL_OK, 0, SocketFlags::empty());
        let mut ctx = Context::new();
        let mut sock = Socket::default();
        assert!(sys.setup(&mut ctx).is_ok());
        assert!(sys.open(&mut sock).is_ok());
        assert!(sys.set_nonblocking(&mut sock, true).is_ok());
        assert!(sys.close(&mut sock).is_ok());
        assert!(sys.cleanup(&mut ctx).is_ok());
    }

    #[test]
    fn failure_carries_persisted_code() {
        let sys = sys(SL_ERR, ErrorCode::EADDRINUSE.code(), SocketFlags::empty());
        let mut sock = Socket::default();
        let err = sys.open(&mut sock).unwrap_err();

        assert_eq!(
            err,
            SysError::Provider {
                op: Operation::Open,
                status: SL_ERR,
                code: ErrorCode::EADDRINUSE.code(),
            }
        );
        assert_eq!(err.error_code(), Some(ErrorCode::EADDRINUSE));
        assert_eq!(sock.state(), Ok(SocketState::Error));
        assert_eq!(err.to_string(), "socket_open failed with status -1 (error 98)");
    }

    #[test]
    fn context_failure_has_no_code() {
        let sys = sys(SL_ERR, 0, SocketFlags::empty());
        let mut ctx = Context::new();
        let err = sys.setup(&mut ctx).unwrap_err();
        assert_eq!(err.operation(), Operation::Setup);
        assert_eq!(err.error_code(), None);
    }

    #[test]
    fn byte_count_passes_through() {
        let sys = sys(1235, 0, SocketFlags::empty());
        let mut sock = Socket::default();
        let payload = [0u8; 4];
        assert_eq!(sys.send(&mut sock, &[Buffer::for_send(&payload)], &Endpoint::zeroed()), Ok(1235));
    }

    #[test]
    fn zero_with_flag_is_would_block() {
        let sys = sys(0, 0, SocketFlags::NON_BLOCKING | SocketFlags::WOULD_BLOCK_ON_READ);
        let mut sock = Socket::default();
        let mut from = Endpoint::zeroed();
        assert_eq!(
            sys.recv(&mut sock, &mut [], &mut from),
            Err(SysError::WouldBlock(Operation::Recv))
        );
        assert_eq!(
            SysError::WouldBlock(Operation::Recv).error_code(),
            Some(ErrorCode::EAGAIN)
        );
    }

    #[test]
    fn zero_without_flag_is_empty_datagram() {
        let sys = sys(0, 0, SocketFlags::WOULD_BLOCK_ON_READ);
        let mut sock = Socket::default();
        assert_eq!(sys.send(&mut sock, &[], &Endpoint::zeroed()), Ok(0));
    }
}
