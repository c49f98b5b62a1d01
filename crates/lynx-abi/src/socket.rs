use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::endpoint::{Endpoint, ENDPOINT_SIZE};
use crate::error::AbiError;
use crate::layout::align_up;

/// Bytes covering `fd` through `flags`.
pub const SOCKET_BASE_SIZE: usize = 32;
pub const SOCKET_SIZE: usize = align_up(SOCKET_BASE_SIZE + ENDPOINT_SIZE, 8);
const SOCKET_TAIL: usize = SOCKET_SIZE - SOCKET_BASE_SIZE - ENDPOINT_SIZE;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    New = 0,
    Created = 1,
    Bound = 2,
    Open = 3,
    Closed = 4,
    Error = 5,
}

impl TryFrom<u32> for SocketState {
    type Error = AbiError;

    fn try_from(raw: u32) -> Result<Self, AbiError> {
        match raw {
            0 => Ok(SocketState::New),
            1 => Ok(SocketState::Created),
            2 => Ok(SocketState::Bound),
            3 => Ok(SocketState::Open),
            4 => Ok(SocketState::Closed),
            5 => Ok(SocketState::Error),
            other => Err(AbiError::InvalidSocketState(other)),
        }
    }
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SockType {
    Stream = 1,
    Dgram = 2,
}

impl TryFrom<u32> for SockType {
    type Error = AbiError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Self::Stream),
            2 => Ok(Self::Dgram),
            other => Err(AbiError::InvalidSockType(other)),
        }
    }
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SockProto {
    Tcp = 6,
    Udp = 17,
}

impl TryFrom<u32> for SockProto {
    type Error = AbiError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            6 => Ok(Self::Tcp),
            17 => Ok(Self::Udp),
            other => Err(AbiError::InvalidSockProto(other)),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SocketFlags: u32 {
        const NON_BLOCKING = 1 << 0;
        const WOULD_BLOCK_ON_READ = 1 << 1;
        const WOULD_BLOCK_ON_WRITE = 1 << 2;
        const IPV4_DISABLED = 1 << 3;
        const IPV6_DISABLED = 1 << 4;
    }
}

/// Socket state block handed to the provider by pointer.
///
/// The provider owns the transitions: it writes `fd`, `state`, `error` and
/// `flags` in place. Fields are kept as raw integers because the other side
/// may write values this build does not know about; the typed getters decode
/// them.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Socket {
    /// Platform descriptor, 0 when none is held.
    pub fd: i64,
    pub dir: u32,
    pub state: u32,
    pub sock_type: u32,
    pub proto: u32,
    /// Last error code, 0 when none.
    pub error: u32,
    pub flags: u32,
    pub endpoint: Endpoint,
    _tail: [u8; SOCKET_TAIL],
}

impl Socket {
    /// A fresh socket for `endpoint`: no descriptor, state `New`, no flags.
    ///
    /// `sock_type` and `proto` stay zero; the provider fills them in on open.
    pub fn new_udp(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Zeroable::zeroed()
        }
    }

    pub fn state(&self) -> Result<SocketState, AbiError> {
        SocketState::try_from(self.state)
    }

    pub fn set_state(&mut self, state: SocketState) {
        self.state = state as u32;
    }

    pub fn sock_type(&self) -> Result<SockType, AbiError> {
        SockType::try_from(self.sock_type)
    }

    pub fn proto(&self) -> Result<SockProto, AbiError> {
        SockProto::try_from(self.proto)
    }

    /// Flag bits as written, including any this build does not name.
    pub fn flags(&self) -> SocketFlags {
        SocketFlags::from_bits_retain(self.flags)
    }

    pub fn has_flag(&self, flag: SocketFlags) -> bool {
        self.flags().contains(flag)
    }

    pub fn set_flag(&mut self, flag: SocketFlags, enabled: bool) {
        let mut flags = self.flags();
        flags.set(flag, enabled);
        self.flags = flags.bits();
    }

    pub fn has_descriptor(&self) -> bool {
        self.fd != 0
    }

    /// Records a provider failure: state `Error` and a nonzero code.
    pub fn fail(&mut self, code: u32) {
        self.state = SocketState::Error as u32;
        self.error = code.max(1);
    }

    /// Descriptor released, state `Closed`.
    pub fn mark_closed(&mut self) {
        self.fd = 0;
        self.state = SocketState::Closed as u32;
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for Socket {
    fn default() -> Self {
        Zeroable::zeroed()
    }
}
