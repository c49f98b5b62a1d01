//! Binding to the external provider library (`libsocklynx`).

use lynx_abi::{Buffer, BufferMut, Context, Endpoint, Socket};

use crate::provider::Provider;
use crate::status::{ErrorCode, SL_ERR};

#[link(name = "socklynx")]
extern "C" {
    fn socklynx_setup(ctx: *mut Context) -> i32;
    fn socklynx_cleanup(ctx: *mut Context) -> i32;
    fn socklynx_socket_nonblocking(sock: *mut Socket, enabled: i32) -> i32;
    fn socklynx_socket_open(sock: *mut Socket) -> i32;
    fn socklynx_socket_close(sock: *mut Socket) -> i32;
    fn socklynx_socket_send(
        sock: *mut Socket,
        bufs: *mut Buffer<'static>,
        count: i32,
        endpoint: *mut Endpoint,
    ) -> i32;
    fn socklynx_socket_recv(
        sock: *mut Socket,
        bufs: *mut Buffer<'static>,
        count: i32,
        endpoint: *mut Endpoint,
    ) -> i32;
}

/// Provider backed by the platform socket library.
///
/// The library keeps process-wide state of its own; every `NativeProvider`
/// value talks to the same instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeProvider;

fn segment_count(sock: &mut Socket, len: usize) -> Option<i32> {
    let count = i32::try_from(len).ok();
    if count.is_none() {
        log::warn!("native: {} segments exceed the provider limit", len);
        sock.fail(ErrorCode::EINVAL.code());
    }
    count
}

impl Provider for NativeProvider {
    fn setup(&self, ctx: &mut Context) -> i32 {
        // SAFETY: `Context` has the provider's layout and outlives the call.
        unsafe { socklynx_setup(ctx) }
    }

    fn cleanup(&self, ctx: &mut Context) -> i32 {
        // SAFETY: as for `setup`.
        unsafe { socklynx_cleanup(ctx) }
    }

    fn socket_open(&self, sock: &mut Socket) -> i32 {
        // SAFETY: `Socket` has the provider's layout and outlives the call.
        unsafe { socklynx_socket_open(sock) }
    }

    fn socket_close(&self, sock: &mut Socket) -> i32 {
        // SAFETY: as for `socket_open`.
        unsafe { socklynx_socket_close(sock) }
    }

    fn socket_nonblocking(&self, sock: &mut Socket, enabled: bool) -> i32 {
        // SAFETY: as for `socket_open`.
        unsafe { socklynx_socket_nonblocking(sock, i32::from(enabled)) }
    }

    fn socket_send(&self, sock: &mut Socket, bufs: &[Buffer<'_>], to: &Endpoint) -> i32 {
        let Some(count) = segment_count(sock, bufs.len()) else {
            return SL_ERR;
        };
        // SAFETY: the provider only reads the segments and the endpoint on
        // send; every segment borrows live memory for the duration of the call.
        unsafe {
            socklynx_socket_send(
                sock,
                bufs.as_ptr().cast_mut().cast(),
                count,
                (to as *const Endpoint).cast_mut(),
            )
        }
    }

    fn socket_recv(&self, sock: &mut Socket, bufs: &mut [BufferMut<'_>], from: &mut Endpoint) -> i32 {
        let Some(count) = segment_count(sock, bufs.len()) else {
            return SL_ERR;
        };
        // SAFETY: `BufferMut` is transparent over `Buffer`, every segment is
        // writable for its full length, and `from` is a valid endpoint block
        // for the provider to fill in.
        unsafe { socklynx_socket_recv(sock, bufs.as_mut_ptr().cast(), count, from) }
    }
}
