use bytemuck::{Pod, Zeroable};

use crate::addr::Ipv4Address;
use crate::endpoint::Endpoint;
use crate::error::AbiError;

#[cfg(feature = "ipv6")]
use crate::addr::Ipv6Address;

pub const CONTEXT_SIZE: usize = 8;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Stopped = 0,
    Started = 1,
}

impl TryFrom<u32> for ContextState {
    type Error = AbiError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Stopped),
            1 => Ok(Self::Started),
            other => Err(AbiError::InvalidContextState(other)),
        }
    }
}

/// Process-wide provider state, passed explicitly to every call that needs it.
///
/// Created zeroed (stopped). The provider's `setup` resolves the two family
/// tags and flips the state to started; `cleanup` flips it back. The tags are
/// opaque values chosen by the provider, not platform `AF_*` constants.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Context {
    pub state: u32,
    pub af_inet: u16,
    pub af_inet6: u16,
}

impl Context {
    pub const fn new() -> Self {
        Self {
            state: ContextState::Stopped as u32,
            af_inet: 0,
            af_inet6: 0,
        }
    }

    pub fn state(&self) -> Result<ContextState, AbiError> {
        ContextState::try_from(self.state)
    }

    pub fn is_started(&self) -> bool {
        self.state == ContextState::Started as u32
    }

    pub fn af_inet(&self) -> u16 {
        self.af_inet
    }

    pub fn af_inet6(&self) -> u16 {
        self.af_inet6
    }

    /// Provider side of `setup`.
    pub fn mark_started(&mut self, af_inet: u16, af_inet6: u16) {
        self.af_inet = af_inet;
        self.af_inet6 = af_inet6;
        self.state = ContextState::Started as u32;
    }

    /// Provider side of `cleanup`. The tags go back to zero with the state.
    pub fn mark_stopped(&mut self) {
        *self = Self::new();
    }

    /// Endpoint stamped with this context's IPv4 tag.
    pub fn endpoint_v4(&self, port: u16, addr: Ipv4Address) -> Endpoint {
        Endpoint::for_ipv4(self.af_inet, port, addr)
    }

    /// Endpoint stamped with this context's IPv6 tag.
    #[cfg(feature = "ipv6")]
    pub fn endpoint_v6(&self, port: u16, addr: Ipv6Address, flowinfo: u32, scope_id: u32) -> Endpoint {
        Endpoint::for_ipv6(self.af_inet6, port, addr, flowinfo, scope_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size() {
        assert_eq!(core::mem::size_of::<Context>(), CONTEXT_SIZE);
    }

    #[test]
    fn starts_zeroed_and_stopped() {
        let ctx = Context::new();
        assert_eq!(ctx, Context::default());
        assert_eq!(ctx.state(), Ok(ContextState::Stopped));
        assert!(!ctx.is_started());
        assert_eq!(ctx.af_inet(), 0);
        assert_eq!(ctx.af_inet6(), 0);
    }

    #[test]
    fn start_and_stop() {
        let mut ctx = Context::new();
        ctx.mark_started(2, 23);
        assert!(ctx.is_started());
        assert_eq!((ctx.af_inet(), ctx.af_inet6()), (2, 23));

        ctx.mark_stopped();
        assert_eq!(ctx.state(), Ok(ContextState::Stopped));
        assert_eq!(ctx.af_inet(), 0);
    }

    #[test]
    fn unknown_state_is_reported() {
        let ctx = Context {
            state: 7,
            ..Context::new()
        };
        assert_eq!(ctx.state(), Err(AbiError::InvalidContextState(7)));
        assert!(!ctx.is_started());
    }

    #[test]
    fn stamping_uses_resolved_tag() {
        let mut ctx = Context::new();
        ctx.mark_started(2, 23);
        let endpoint = ctx.endpoint_v4(0x1234, Ipv4Address::LOCALHOST);
        assert_eq!(endpoint.af(), 2);
        assert_eq!(endpoint.port(), 0x1234);
    }
}
