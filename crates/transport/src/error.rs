use std::fmt::{self, Display};

/// The kind of error that occurred while dispatching a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The backend could not be reached.
    Network,
    /// The backend is rate limited.
    RateLimitExceeded,
    /// The backend refused the request.
    Rejected,
    /// The backend failed while handling the request.
    Server,
    /// The backend answered with something that is not a reply.
    MalformedReply,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "Network error"),
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::Rejected => write!(f, "Request rejected"),
            ErrorKind::Server => write!(f, "Server error"),
            ErrorKind::MalformedReply => write!(f, "Malformed reply"),
            ErrorKind::Other => write!(f, "Unknown error"),
        }
    }
}
