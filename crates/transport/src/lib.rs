//! The boundary between the chat controller and the assistant backend.
//!
//! This crate establishes the protocol the controller uses to talk to
//! the backend: one asynchronous operation per interaction mode, each
//! resolving to a reply payload or failing with a transport error.
//!
//! Backends are not consistent about where they put the reply text, so
//! the raw payload ([`RawReply`]) accepts every known spelling and is
//! normalized into a single canonical [`Reply`] right at the boundary.
//! Code on the controller side never branches on naming conventions.

#![deny(missing_docs)]

pub mod catalog;
mod error;
mod mode;
mod reply;
mod request;
mod transport;

pub use error::*;
pub use mode::*;
pub use reply::*;
pub use request::*;
pub use transport::*;
