use lynx_abi::{Buffer, BufferMut, Context, Endpoint, Socket};

/// The operations a network provider exposes.
///
/// Every call mutates the passed structures in place and reports a raw
/// status: [`SL_OK`](crate::SL_OK) or [`SL_ERR`](crate::SL_ERR) for the
/// control calls, a byte count or `SL_ERR` for send and receive. On failure
/// the provider leaves the socket in `SocketState::Error` with a nonzero
/// `error` code.
pub trait Provider {
    /// Resolves the address family tags and starts the context. Repeat calls succeed.
    fn setup(&self, ctx: &mut Context) -> i32;

    /// Stops the context. Repeat calls succeed.
    fn cleanup(&self, ctx: &mut Context) -> i32;

    /// Creates and binds a descriptor for `sock.endpoint`.
    fn socket_open(&self, sock: &mut Socket) -> i32;

    /// Releases the descriptor. Always legal.
    fn socket_close(&self, sock: &mut Socket) -> i32;

    /// Sets or clears `SocketFlags::NON_BLOCKING`.
    fn socket_nonblocking(&self, sock: &mut Socket, enabled: bool) -> i32;

    /// Gathers `bufs` into one datagram for `to`.
    ///
    /// Returns 0 with `WOULD_BLOCK_ON_WRITE` set when a non-blocking socket
    /// cannot send yet.
    fn socket_send(&self, sock: &mut Socket, bufs: &[Buffer<'_>], to: &Endpoint) -> i32;

    /// Scatters one datagram into `bufs` and writes its source to `from`.
    ///
    /// Every segment is writable (see `BufferMut::for_recv`). Returns 0 with
    /// `WOULD_BLOCK_ON_READ` set when a non-blocking socket has nothing queued.
    fn socket_recv(&self, sock: &mut Socket, bufs: &mut [BufferMut<'_>], from: &mut Endpoint) -> i32;
}

impl<P: Provider + ?Sized> Provider for &P {
    fn setup(&self, ctx: &mut Context) -> i32 {
        (**self).setup(ctx)
    }

    fn cleanup(&self, ctx: &mut Context) -> i32 {
        (**self).cleanup(ctx)
    }

    fn socket_open(&self, sock: &mut Socket) -> i32 {
        (**self).socket_open(sock)
    }

    fn socket_close(&self, sock: &mut Socket) -> i32 {
        (**self).socket_close(sock)
    }

    fn socket_nonblocking(&self, sock: &mut Socket, enabled: bool) -> i32 {
        (**self).socket_nonblocking(sock, enabled)
    }

    fn socket_send(&self, sock: &mut Socket, bufs: &[Buffer<'_>], to: &Endpoint) -> i32 {
        (**self).socket_send(sock, bufs, to)
    }

    fn socket_recv(&self, sock: &mut Socket, bufs: &mut [BufferMut<'_>], from: &mut Endpoint) -> i32 {
        (**self).socket_recv(sock, bufs, from)
    }
}
