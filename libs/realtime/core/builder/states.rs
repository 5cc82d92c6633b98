//! Compile-time builder states
//!
//! [`RealtimeClientBuilder::build`](super::RealtimeClientBuilder::build)
//! exists only on `RealtimeClientBuilder<HasUrl>`, so a client without an
//! endpoint does not compile.

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::NoUrl {}
    impl Sealed for super::HasUrl {}
}

/// Whether the endpoint has been supplied; not implementable outside this crate
pub trait UrlState: sealed::Sealed {}

/// Endpoint not supplied yet
pub struct NoUrl;
impl UrlState for NoUrl {}

/// Endpoint supplied via `url()` or `config()`
pub struct HasUrl;
impl UrlState for HasUrl {}
