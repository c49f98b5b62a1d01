use bytemuck::{Pod, Zeroable};
use core::fmt;

#[cfg(feature = "ipv6")]
use crate::bytes::{hton16, ntoh16};

pub const IPV4_SIZE: usize = 4;
#[cfg(feature = "ipv6")]
pub const IPV6_SIZE: usize = 16;

/// IPv4 address stored as four octets in network order.
///
/// The same four bytes read as a native `u32` give the integer view the
/// provider uses (`in_addr.s_addr`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Ipv4Address {
    octets: [u8; IPV4_SIZE],
}

impl Ipv4Address {
    pub const UNSPECIFIED: Self = Self::new(0, 0, 0, 0);
    pub const LOCALHOST: Self = Self::new(127, 0, 0, 1);

    /// Octet 0 lands at byte offset 0. Every combination is valid.
    pub const fn new(b0: u8, b1: u8, b2: u8, b3: u8) -> Self {
        Self {
            octets: [b0, b1, b2, b3],
        }
    }

    pub const fn from_octets(octets: [u8; IPV4_SIZE]) -> Self {
        Self { octets }
    }

    pub const fn octets(&self) -> [u8; IPV4_SIZE] {
        self.octets
    }

    /// Integer view of the stored bytes (network byte order in memory).
    pub const fn to_bits(&self) -> u32 {
        u32::from_ne_bytes(self.octets)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self {
            octets: bits.to_ne_bytes(),
        }
    }

    /// Numeric value in host order, `127.0.0.1` is `0x7f00_0001`.
    pub const fn to_host(&self) -> u32 {
        u32::from_be_bytes(self.octets)
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.octets;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

#[cfg(feature = "std")]
impl From<std::net::Ipv4Addr> for Ipv4Address {
    fn from(addr: std::net::Ipv4Addr) -> Self {
        Self::from_octets(addr.octets())
    }
}

#[cfg(feature = "std")]
impl From<Ipv4Address> for std::net::Ipv4Addr {
    fn from(addr: Ipv4Address) -> Self {
        std::net::Ipv4Addr::from(addr.octets)
    }
}

/// IPv6 address stored as eight 16-bit words in network order.
#[cfg(feature = "ipv6")]
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Ipv6Address {
    words: [u16; 8],
}

#[cfg(feature = "ipv6")]
impl Ipv6Address {
    pub const UNSPECIFIED: Self = Self::new(0, 0, 0, 0, 0, 0, 0, 0);
    pub const LOCALHOST: Self = Self::new(0, 0, 0, 0, 0, 0, 0, 1);

    /// Builds an address from host-order segments, converting each to network order.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(s0: u16, s1: u16, s2: u16, s3: u16, s4: u16, s5: u16, s6: u16, s7: u16) -> Self {
        Self {
            words: [
                hton16(s0),
                hton16(s1),
                hton16(s2),
                hton16(s3),
                hton16(s4),
                hton16(s5),
                hton16(s6),
                hton16(s7),
            ],
        }
    }

    pub const fn from_octets(octets: [u8; IPV6_SIZE]) -> Self {
        let mut words = [0u16; 8];
        let mut i = 0;
        while i < 8 {
            words[i] = u16::from_ne_bytes([octets[2 * i], octets[2 * i + 1]]);
            i += 1;
        }
        Self { words }
    }

    pub const fn octets(&self) -> [u8; IPV6_SIZE] {
        let mut octets = [0u8; IPV6_SIZE];
        let mut i = 0;
        while i < 8 {
            let [first, second] = self.words[i].to_ne_bytes();
            octets[2 * i] = first;
            octets[2 * i + 1] = second;
            i += 1;
        }
        octets
    }

    /// Stored words exactly as they sit in memory.
    pub const fn words(&self) -> [u16; 8] {
        self.words
    }

    /// Segments converted back to host order.
    pub const fn segments(&self) -> [u16; 8] {
        let mut segments = [0u16; 8];
        let mut i = 0;
        while i < 8 {
            segments[i] = ntoh16(self.words[i]);
            i += 1;
        }
        segments
    }
}

#[cfg(all(feature = "ipv6", feature = "std"))]
impl From<std::net::Ipv6Addr> for Ipv6Address {
    fn from(addr: std::net::Ipv6Addr) -> Self {
        Self::from_octets(addr.octets())
    }
}

#[cfg(all(feature = "ipv6", feature = "std"))]
impl From<Ipv6Address> for std::net::Ipv6Addr {
    fn from(addr: Ipv6Address) -> Self {
        std::net::Ipv6Addr::from(addr.octets())
    }
}

#[cfg(all(feature = "ipv6", feature = "std"))]
impl fmt::Display for Ipv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&std::net::Ipv6Addr::from(*self), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::hton32;

    #[test]
    fn ipv4_size() {
        assert_eq!(core::mem::size_of::<Ipv4Address>(), IPV4_SIZE);
    }

    #[test]
    fn ipv4_new_places_octets_in_order() {
        let ip = Ipv4Address::new(127, 0, 0, 1);
        assert_eq!(bytemuck::bytes_of(&ip), &[127, 0, 0, 1]);

        let reversed = Ipv4Address::new(1, 0, 0, 127);
        assert_eq!(ip.to_bits(), crate::bytes::swap32(reversed.to_bits()));

        assert_eq!(ip.to_bits(), hton32((127 << 24) | 1));
        assert_eq!(ip.to_host(), 0x7f00_0001);
        assert_eq!(Ipv4Address::from_bits(ip.to_bits()), ip);
    }

    #[cfg(feature = "std")]
    #[test]
    fn ipv4_matches_parsed_literal() {
        let parsed: std::net::Ipv4Addr = "127.0.0.1".parse().unwrap();
        let ip = Ipv4Address::new(127, 0, 0, 1);
        assert_eq!(ip.octets(), parsed.octets());
        assert_eq!(ip.to_bits(), u32::from_ne_bytes(parsed.octets()));
        assert_eq!(Ipv4Address::from(parsed), ip);
        assert_eq!(ip.to_string(), "127.0.0.1");
    }

    #[cfg(feature = "ipv6")]
    #[test]
    fn ipv6_size() {
        assert_eq!(core::mem::size_of::<Ipv6Address>(), IPV6_SIZE);
    }

    #[cfg(feature = "ipv6")]
    #[test]
    fn ipv6_new_stores_network_order() {
        let ip = Ipv6Address::new(0xfe80, 0, 0, 0, 0x300e, 0x5130, 0x704b, 0xa647);
        assert_eq!(
            ip.octets(),
            [0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0x30, 0x0e, 0x51, 0x30, 0x70, 0x4b, 0xa6, 0x47]
        );
        assert_eq!(bytemuck::bytes_of(&ip), &ip.octets()[..]);
        assert_eq!(ip.segments(), [0xfe80, 0, 0, 0, 0x300e, 0x5130, 0x704b, 0xa647]);
        assert_eq!(Ipv6Address::from_octets(ip.octets()), ip);
    }

    #[cfg(all(feature = "ipv6", feature = "std"))]
    #[test]
    fn ipv6_matches_parsed_literal() {
        let parsed: std::net::Ipv6Addr = "fe80::300e:5130:704b:a647".parse().unwrap();
        let ip = Ipv6Address::new(0xfe80, 0, 0, 0, 0x300e, 0x5130, 0x704b, 0xa647);
        assert_eq!(ip.octets(), parsed.octets());
        assert_eq!(Ipv6Address::from(parsed), ip);
        assert_eq!(ip.to_string(), "fe80::300e:5130:704b:a647");
    }
}
