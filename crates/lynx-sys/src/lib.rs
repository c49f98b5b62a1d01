//! Socket operations over the `lynx-abi` structures.
//!
//! A [`Provider`] performs the actual I/O and mutates the socket block in
//! place, reporting raw status codes. [`Sys`] is the typed front end that
//! turns those codes into `Result`s. [`LoopbackProvider`] routes datagrams
//! between sockets inside the process; with the `native` feature,
//! `NativeProvider` calls into the external provider library.

pub mod loopback;
#[cfg(feature = "native")]
pub mod native;
pub mod provider;
pub mod status;
pub mod sys;

pub use loopback::*;
#[cfg(feature = "native")]
pub use native::*;
pub use provider::*;
pub use status::*;
pub use sys::*;

pub use lynx_abi as abi;
