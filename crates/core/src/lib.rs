//! Core logic of the chat session: message history, dispatching queries
//! to the backend in one of the interaction modes, and revealing replies
//! incrementally.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod controller;
mod message;
mod mode;
mod reveal;
mod timer;
mod transport_client;

pub use controller::{ChatController, ChatView, ControllerBuilder, SubmitOptions};
pub use message::{Message, Role};
pub use reveal::RevealConfig;
