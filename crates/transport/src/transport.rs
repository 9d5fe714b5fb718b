use std::error::Error;

use crate::error::ErrorKind;
use crate::reply::RawReply;
use crate::request::DispatchRequest;

/// The error type for a transport.
///
/// The `Display` output is the human-readable message; it may be shown
/// to the user as part of an error turn.
pub trait TransportError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;

    /// Returns structured detail about the failure, such as the error
    /// body returned by the backend.
    fn detail(&self) -> Option<&str> {
        None
    }
}

/// A type that carries requests to the assistant backend.
///
/// Once created, a transport should behave like a stateless object. It
/// may keep internal state, but callers should not rely on it, and the
/// transport should be prepared for being dropped anytime. The returned
/// futures must not borrow from `self`.
pub trait Transport: Send + Sync {
    /// The error type that may be returned by the transport.
    type Error: TransportError;

    /// Sends a plain chat message.
    fn send_message(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static;

    /// Requests a multi-stage analysis.
    fn advanced_analysis(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static;

    /// Requests a hybrid analysis.
    fn hybrid_analysis(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static;

    /// Sends a vision query.
    fn vision_query(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static;
}
