use thiserror::Error;

/// Provider call succeeded.
pub const SL_OK: i32 = 0;
/// Provider call failed; the socket's `error` field holds the reason.
pub const SL_ERR: i32 = -1;

/// Error codes a provider persists in `Socket::error`.
///
/// Values follow Linux errno numbering.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorCode {
    #[error("bad descriptor")]
    EBADF = 9,
    #[error("resource temporarily unavailable")]
    EAGAIN = 11,
    #[error("invalid argument")]
    EINVAL = 22,
    #[error("message too long")]
    EMSGSIZE = 90,
    #[error("address family not supported")]
    EAFNOSUPPORT = 97,
    #[error("address already in use")]
    EADDRINUSE = 98,
    #[error("provider not started")]
    ENOTCONN = 107,
    #[error("timed out")]
    ETIMEDOUT = 110,
}

impl ErrorCode {
    pub fn to_errno(self) -> i32 {
        -(self as i32)
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            9 => Some(Self::EBADF),
            11 => Some(Self::EAGAIN),
            22 => Some(Self::EINVAL),
            90 => Some(Self::EMSGSIZE),
            97 => Some(Self::EAFNOSUPPORT),
            98 => Some(Self::EADDRINUSE),
            107 => Some(Self::ENOTCONN),
            110 => Some(Self::ETIMEDOUT),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_is_negated_code() {
        assert_eq!(ErrorCode::EBADF.to_errno(), -9);
        assert_eq!(ErrorCode::ETIMEDOUT.to_errno(), -110);
    }

    #[test]
    fn code_round_trips() {
        for code in [
            ErrorCode::EBADF,
            ErrorCode::EAGAIN,
            ErrorCode::EINVAL,
            ErrorCode::EMSGSIZE,
            ErrorCode::EAFNOSUPPORT,
            ErrorCode::EADDRINUSE,
            ErrorCode::ENOTCONN,
            ErrorCode::ETIMEDOUT,
        ] {
            assert_eq!(ErrorCode::from_code(code.code()), Some(code));
        }
        assert_eq!(ErrorCode::from_code(0), None);
    }
}
