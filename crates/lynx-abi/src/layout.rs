//! The size and offset table both sides of the boundary agree on.
//!
//! The assertions at the bottom of this module fail the build if any
//! structure drifts from the contract.

use core::mem::{align_of, offset_of, size_of};
use static_assertions::const_assert_eq;

use crate::addr::{Ipv4Address, IPV4_SIZE};
use crate::buffer::{Buffer, BufferMut};
use crate::context::{Context, CONTEXT_SIZE};
use crate::endpoint::*;
use crate::socket::{Socket, SOCKET_BASE_SIZE, SOCKET_SIZE};

#[cfg(feature = "ipv6")]
use crate::addr::{Ipv6Address, IPV6_SIZE};

/// Rounds `value` up to the next multiple of `align` (a power of two).
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructLayout {
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
    pub fields: &'static [FieldLayout],
}

const fn field(name: &'static str, offset: usize, size: usize) -> FieldLayout {
    FieldLayout { name, offset, size }
}

#[cfg(feature = "ipv6")]
const ENDPOINT_FIELDS: &[FieldLayout] = &[
    field("af", AF_OFFSET, 2),
    field("port", PORT_OFFSET, 2),
    field("addr4", ADDR4_OFFSET, IPV4_SIZE),
    field("flowinfo", FLOWINFO_OFFSET, 4),
    field("addr6", ADDR6_OFFSET, IPV6_SIZE),
    field("scope_id", SCOPE_ID_OFFSET, 4),
];

#[cfg(not(feature = "ipv6"))]
const ENDPOINT_FIELDS: &[FieldLayout] = &[
    field("af", AF_OFFSET, 2),
    field("port", PORT_OFFSET, 2),
    field("addr4", ADDR4_OFFSET, IPV4_SIZE),
];

const BUFFER_FIELDS: &[FieldLayout] = if cfg!(windows) {
    &[
        field("len", 0, 4),
        field("base", size_of::<usize>(), size_of::<usize>()),
    ]
} else {
    &[
        field("base", 0, size_of::<usize>()),
        field("len", size_of::<usize>(), size_of::<usize>()),
    ]
};

pub const LAYOUT: &[StructLayout] = &[
    StructLayout {
        name: "Context",
        size: size_of::<Context>(),
        align: align_of::<Context>(),
        fields: &[
            field("state", offset_of!(Context, state), 4),
            field("af_inet", offset_of!(Context, af_inet), 2),
            field("af_inet6", offset_of!(Context, af_inet6), 2),
        ],
    },
    StructLayout {
        name: "IPv4",
        size: size_of::<Ipv4Address>(),
        align: align_of::<Ipv4Address>(),
        fields: &[],
    },
    #[cfg(feature = "ipv6")]
    StructLayout {
        name: "IPv6",
        size: size_of::<Ipv6Address>(),
        align: align_of::<Ipv6Address>(),
        fields: &[],
    },
    StructLayout {
        name: "Endpoint",
        size: size_of::<Endpoint>(),
        align: align_of::<Endpoint>(),
        fields: ENDPOINT_FIELDS,
    },
    StructLayout {
        name: "Socket",
        size: size_of::<Socket>(),
        align: align_of::<Socket>(),
        fields: &[
            field("fd", offset_of!(Socket, fd), 8),
            field("dir", offset_of!(Socket, dir), 4),
            field("state", offset_of!(Socket, state), 4),
            field("type", offset_of!(Socket, sock_type), 4),
            field("proto", offset_of!(Socket, proto), 4),
            field("error", offset_of!(Socket, error), 4),
            field("flags", offset_of!(Socket, flags), 4),
            field("endpoint", offset_of!(Socket, endpoint), ENDPOINT_SIZE),
        ],
    },
    StructLayout {
        name: "Buffer",
        size: size_of::<Buffer<'static>>(),
        align: align_of::<Buffer<'static>>(),
        fields: BUFFER_FIELDS,
    },
];

/// Looks a structure up by its contract name.
pub fn find(name: &str) -> Option<&'static StructLayout> {
    LAYOUT.iter().find(|layout| layout.name == name)
}

const_assert_eq!(size_of::<Context>(), CONTEXT_SIZE);
const_assert_eq!(size_of::<Ipv4Address>(), IPV4_SIZE);
#[cfg(feature = "ipv6")]
const_assert_eq!(size_of::<Ipv6Address>(), IPV6_SIZE);
const_assert_eq!(size_of::<Endpoint>(), ENDPOINT_SIZE);
const_assert_eq!(size_of::<Socket>(), SOCKET_SIZE);
const_assert_eq!(SOCKET_SIZE, align_up(SOCKET_BASE_SIZE + ENDPOINT_SIZE, 8));
const_assert_eq!(offset_of!(Socket, endpoint), SOCKET_BASE_SIZE);
const_assert_eq!(size_of::<Buffer<'static>>(), 2 * size_of::<usize>());
const_assert_eq!(size_of::<BufferMut<'static>>(), size_of::<Buffer<'static>>());
const_assert_eq!(align_of::<BufferMut<'static>>(), align_of::<Buffer<'static>>());
