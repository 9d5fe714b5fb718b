use serde::{Deserialize, Serialize};

/// A request to be dispatched to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// The conversation the request belongs to.
    pub conversation_id: String,
    /// The query as typed by the user, without any mode label.
    pub query: String,
    /// Documents the query should be answered against.
    pub document_ids: Vec<String>,
    /// The model to use, for modes that support choosing one.
    pub model_id: Option<String>,
}
