use bytemuck::{Pod, Zeroable};
use core::fmt;
use static_assertions::const_assert_eq;

use crate::addr::{Ipv4Address, IPV4_SIZE};
use crate::bytes::{compare_region, copy_region};
use crate::context::Context;

#[cfg(feature = "ipv6")]
use crate::addr::{Ipv6Address, IPV6_SIZE};

pub const ENDPOINT4_SIZE: usize = 16;
pub const ENDPOINT6_SIZE: usize = 28;

#[cfg(feature = "ipv6")]
pub const ENDPOINT_SIZE: usize = ENDPOINT6_SIZE;
#[cfg(not(feature = "ipv6"))]
pub const ENDPOINT_SIZE: usize = ENDPOINT4_SIZE;

// Field offsets. The IPv4 and IPv6 sets overlap from byte 4 onwards.
pub const AF_OFFSET: usize = 0;
pub const PORT_OFFSET: usize = 2;
pub const ADDR4_OFFSET: usize = 4;
pub const FLOWINFO_OFFSET: usize = 4;
pub const ADDR6_OFFSET: usize = 8;
pub const SCOPE_ID_OFFSET: usize = 24;

/// Dual-stack socket address with a fixed layout.
///
/// The family tag at offset 0 decides which overlapping field set is valid:
///
/// | bytes   | tagged `af_inet` | tagged `af_inet6` |
/// |---------|------------------|-------------------|
/// | [0,2)   | af               | af                |
/// | [2,4)   | port             | port              |
/// | [4,8)   | IPv4 address     | flow info         |
/// | [8,24)  | zero             | IPv6 address      |
/// | [24,28) | n/a              | scope id          |
///
/// Accessors reinterpret their byte range regardless of the tag; reading the
/// set that does not match the tag yields meaningless values. Use
/// [`Endpoint::view`] for a tag-checked read.
///
/// The port is stored exactly as given. Callers convert it to network order
/// (see [`crate::bytes::hton16`]) before stamping.
#[repr(C, align(4))]
#[derive(Clone, Copy)]
pub struct Endpoint {
    bytes: [u8; ENDPOINT_SIZE],
}

const_assert_eq!(core::mem::size_of::<Endpoint>(), ENDPOINT_SIZE);
const_assert_eq!(core::mem::align_of::<Endpoint>(), 4);

// SAFETY: a byte array whose length is a multiple of the alignment, so there
// is no padding and every bit pattern is valid.
unsafe impl Zeroable for Endpoint {}
unsafe impl Pod for Endpoint {}

/// Tag-checked, typed reading of an [`Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointView {
    V4 {
        port: u16,
        addr: Ipv4Address,
    },
    #[cfg(feature = "ipv6")]
    V6 {
        port: u16,
        flowinfo: u32,
        addr: Ipv6Address,
        scope_id: u32,
    },
}

impl Endpoint {
    pub const fn zeroed() -> Self {
        Self {
            bytes: [0; ENDPOINT_SIZE],
        }
    }

    /// Stamps an IPv4 endpoint. All bytes beyond the address are zero.
    pub fn for_ipv4(af: u16, port: u16, addr: Ipv4Address) -> Self {
        let mut endpoint = Self::zeroed();
        endpoint.set_af(af);
        endpoint.set_port(port);
        endpoint.set_addr4(addr);
        endpoint
    }

    #[cfg(feature = "ipv6")]
    pub fn for_ipv6(af: u16, port: u16, addr: Ipv6Address, flowinfo: u32, scope_id: u32) -> Self {
        let mut endpoint = Self::zeroed();
        endpoint.set_af(af);
        endpoint.set_port(port);
        endpoint.set_flowinfo(flowinfo);
        endpoint.set_addr6(addr);
        endpoint.set_scope_id(scope_id);
        endpoint
    }

    fn read<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut out = [0u8; N];
        copy_region(&mut out, 0, &self.bytes, offset, N);
        out
    }

    fn write(&mut self, offset: usize, src: &[u8]) {
        copy_region(&mut self.bytes, offset, src, 0, src.len());
    }

    pub fn af(&self) -> u16 {
        u16::from_ne_bytes(self.read(AF_OFFSET))
    }

    pub fn set_af(&mut self, af: u16) {
        self.write(AF_OFFSET, &af.to_ne_bytes());
    }

    pub fn port(&self) -> u16 {
        u16::from_ne_bytes(self.read(PORT_OFFSET))
    }

    pub fn set_port(&mut self, port: u16) {
        self.write(PORT_OFFSET, &port.to_ne_bytes());
    }

    pub fn addr4(&self) -> Ipv4Address {
        Ipv4Address::from_octets(self.read::<IPV4_SIZE>(ADDR4_OFFSET))
    }

    pub fn set_addr4(&mut self, addr: Ipv4Address) {
        self.write(ADDR4_OFFSET, &addr.octets());
    }

    #[cfg(feature = "ipv6")]
    pub fn flowinfo(&self) -> u32 {
        u32::from_ne_bytes(self.read(FLOWINFO_OFFSET))
    }

    #[cfg(feature = "ipv6")]
    pub fn set_flowinfo(&mut self, flowinfo: u32) {
        self.write(FLOWINFO_OFFSET, &flowinfo.to_ne_bytes());
    }

    #[cfg(feature = "ipv6")]
    pub fn addr6(&self) -> Ipv6Address {
        Ipv6Address::from_octets(self.read::<IPV6_SIZE>(ADDR6_OFFSET))
    }

    #[cfg(feature = "ipv6")]
    pub fn set_addr6(&mut self, addr: Ipv6Address) {
        self.write(ADDR6_OFFSET, &addr.octets());
    }

    #[cfg(feature = "ipv6")]
    pub fn scope_id(&self) -> u32 {
        u32::from_ne_bytes(self.read(SCOPE_ID_OFFSET))
    }

    #[cfg(feature = "ipv6")]
    pub fn set_scope_id(&mut self, scope_id: u32) {
        self.write(SCOPE_ID_OFFSET, &scope_id.to_ne_bytes());
    }

    pub fn is_ipv4(&self, ctx: &Context) -> bool {
        ctx.is_started() && self.af() == ctx.af_inet()
    }

    pub fn is_ipv6(&self, ctx: &Context) -> bool {
        cfg!(feature = "ipv6") && ctx.is_started() && self.af() == ctx.af_inet6()
    }

    /// Reads the field set selected by the family tag, or `None` when the tag
    /// is not one of the context's resolved families.
    pub fn view(&self, ctx: &Context) -> Option<EndpointView> {
        if self.is_ipv4(ctx) {
            return Some(EndpointView::V4 {
                port: self.port(),
                addr: self.addr4(),
            });
        }
        self.view6(ctx)
    }

    #[cfg(feature = "ipv6")]
    fn view6(&self, ctx: &Context) -> Option<EndpointView> {
        self.is_ipv6(ctx).then(|| EndpointView::V6 {
            port: self.port(),
            flowinfo: self.flowinfo(),
            addr: self.addr6(),
            scope_id: self.scope_id(),
        })
    }

    #[cfg(not(feature = "ipv6"))]
    fn view6(&self, _ctx: &Context) -> Option<EndpointView> {
        None
    }

    /// Length of the native socket address this endpoint stands for.
    pub fn wire_len(&self, ctx: &Context) -> Option<usize> {
        if self.is_ipv4(ctx) {
            Some(ENDPOINT4_SIZE)
        } else if self.is_ipv6(ctx) {
            Some(ENDPOINT6_SIZE)
        } else {
            None
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Byte-wise equality over `[offset, ENDPOINT_SIZE)`.
    ///
    /// `offset == 2` skips the family tag, which is how a received source
    /// address is matched against a locally built one.
    pub fn bytes_eq_from(&self, other: &Endpoint, offset: usize) -> bool {
        let offset = offset.min(ENDPOINT_SIZE);
        compare_region(&self.bytes, offset, &other.bytes, offset, ENDPOINT_SIZE - offset)
    }

    #[cfg(feature = "std")]
    pub fn to_socket_addr(&self, ctx: &Context) -> Option<std::net::SocketAddr> {
        use crate::bytes::ntoh16;
        use std::net::{SocketAddr, SocketAddrV4};

        match self.view(ctx)? {
            EndpointView::V4 { port, addr } => {
                Some(SocketAddr::V4(SocketAddrV4::new(addr.into(), ntoh16(port))))
            }
            #[cfg(feature = "ipv6")]
            EndpointView::V6 {
                port,
                flowinfo,
                addr,
                scope_id,
            } => Some(SocketAddr::V6(std::net::SocketAddrV6::new(
                addr.into(),
                ntoh16(port),
                flowinfo,
                scope_id,
            ))),
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.bytes_eq_from(other, 0)
    }
}

impl Eq for Endpoint {}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("af", &self.af())
            .field("port", &self.port())
            .field("bytes", &&self.bytes[ADDR4_OFFSET..])
            .finish()
    }
}
