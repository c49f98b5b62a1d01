/// Raised when a field written by the provider holds a value this side does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("invalid context state: {0}")]
    InvalidContextState(u32),

    #[error("invalid socket state: {0}")]
    InvalidSocketState(u32),

    #[error("invalid socket type: {0}")]
    InvalidSockType(u32),

    #[error("invalid socket protocol: {0}")]
    InvalidSockProto(u32),
}
