//! An assistant chat session that talks to the document analysis backend.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring the chat into your own host apps.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

mod session;

pub use session::{Session, SessionBuilder, UnknownModelError};

/// Re-exports of [`parley_core`] crate.
pub mod core {
    pub use parley_core::*;
}

/// Re-exports of [`parley_transport`] crate.
pub mod transport {
    pub use parley_transport::*;
}
