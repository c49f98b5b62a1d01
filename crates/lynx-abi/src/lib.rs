//! Binary contract shared between managed callers and a native network provider.
//!
//! Every structure in this crate has a fixed, byte-exact layout. The provider
//! receives them as plain memory blocks, so sizes and field offsets are part of
//! the wire contract and are asserted at build time (see [`layout`]).
//!
//! The `ipv6` feature selects the 28-byte [`Endpoint`]; without it the endpoint
//! is 16 bytes and only carries IPv4 addresses.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod addr;
pub mod buffer;
pub mod bytes;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod layout;
pub mod socket;

pub use addr::*;
pub use buffer::*;
pub use context::*;
pub use endpoint::*;
pub use error::*;
pub use socket::*;

/// Whether this build carries the IPv6 endpoint layout.
pub const IPV6_ENABLED: bool = cfg!(feature = "ipv6");
