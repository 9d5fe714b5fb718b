use std::error::Error as StdError;
use std::fmt::{self, Display};

use parley_core::{ChatController, ChatView, ControllerBuilder, RevealConfig};
use parley_http_transport::{
    Error as HttpError, HttpTransport, HttpTransportConfig,
};
use parley_transport::Transport;
use parley_transport::catalog::{
    Capability, DEFAULT_VISION_MODEL, ModelInfo, find_model,
};
use tokio::sync::watch;
use uuid::Uuid;

/// The error returned when selecting a model that isn't in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModelError(String);

impl UnknownModelError {
    /// Returns the id that was asked for.
    #[inline]
    pub fn model_id(&self) -> &str {
        &self.0
    }
}

impl Display for UnknownModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model: {}", self.0)
    }
}

impl StdError for UnknownModelError {}

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    controller_builder: ControllerBuilder,
}

impl SessionBuilder {
    /// Creates a session builder with a specified transport.
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        let controller_builder = ControllerBuilder::with_transport(transport);
        Self { controller_builder }
    }

    /// Creates a session builder that talks to the backend over HTTP.
    pub fn connect(config: HttpTransportConfig) -> Result<Self, HttpError> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }

    /// Binds a conversation from the start.
    #[inline]
    pub fn with_conversation<S: Into<String>>(
        mut self,
        conversation_id: S,
    ) -> Self {
        self.controller_builder =
            self.controller_builder.with_conversation(conversation_id);
        self
    }

    /// Sets the pacing of reply reveals.
    #[inline]
    pub fn with_reveal_config(mut self, config: RevealConfig) -> Self {
        self.controller_builder =
            self.controller_builder.with_reveal_config(config);
        self
    }

    /// Attaches a callback to be invoked when the loading flag flips.
    #[inline]
    pub fn on_loading_changed(
        mut self,
        on_loading_changed: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.controller_builder =
            self.controller_builder.on_loading_changed(on_loading_changed);
        self
    }

    /// Attaches a callback to be invoked with the diagram source when a
    /// mind map is requested.
    #[inline]
    pub fn on_view_mindmap(
        mut self,
        on_view_mindmap: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.controller_builder =
            self.controller_builder.on_view_mindmap(on_view_mindmap);
        self
    }

    /// Builds a new session.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Session {
        Session {
            controller: self.controller_builder.build(),
            document_ids: vec![],
            model: None,
        }
    }
}

/// A chat session, like a chat window with a document picker and a model
/// selector next to its input box.
///
/// The session holds the attached documents and the selected model, and
/// passes them along with every query. It is basically a wrapper around
/// [`ChatController`].
pub struct Session {
    controller: ChatController,
    document_ids: Vec<String>,
    model: Option<&'static ModelInfo>,
}

impl Session {
    /// Attaches a document to the following queries.
    pub fn attach_document<S: Into<String>>(&mut self, document_id: S) {
        let document_id = document_id.into();
        if !self.document_ids.contains(&document_id) {
            self.document_ids.push(document_id);
        }
    }

    /// Detaches every document.
    #[inline]
    pub fn clear_documents(&mut self) {
        self.document_ids.clear();
    }

    /// Returns the attached documents.
    #[inline]
    pub fn documents(&self) -> &[String] {
        &self.document_ids
    }

    /// Selects the model for the modes that take one, or goes back to
    /// the backend's default with `None`.
    pub fn select_model(
        &mut self,
        model_id: Option<&str>,
    ) -> Result<(), UnknownModelError> {
        self.model = match model_id {
            Some(id) => Some(
                find_model(id)
                    .ok_or_else(|| UnknownModelError(id.to_owned()))?,
            ),
            None => None,
        };
        Ok(())
    }

    /// Returns the selected model.
    #[inline]
    pub fn model(&self) -> Option<&'static ModelInfo> {
        self.model
    }

    /// Starts a new conversation and returns its id.
    pub fn new_conversation(&self) -> String {
        let conversation_id = Uuid::new_v4().to_string();
        debug!("starting conversation {conversation_id}");
        self.controller.bind_conversation(conversation_id.clone());
        conversation_id
    }

    /// Switches to an existing conversation.
    #[inline]
    pub fn bind_conversation<S: Into<String>>(&self, conversation_id: S) {
        self.controller.bind_conversation(conversation_id);
    }

    /// Sends a plain chat message.
    #[inline]
    pub fn send_message(&self, query: &str) {
        self.controller
            .send_message(query, self.document_ids.clone());
    }

    /// Runs an advanced analysis with the selected model.
    #[inline]
    pub fn advanced_analysis(&self, query: &str) {
        self.controller.advanced_analysis(
            query,
            self.document_ids.clone(),
            self.model.map(|m| m.id.to_owned()),
        );
    }

    /// Runs a hybrid analysis.
    #[inline]
    pub fn hybrid_analysis(&self, query: &str) {
        self.controller
            .hybrid_analysis(query, self.document_ids.clone());
    }

    /// Runs a vision query with the selected model if it understands
    /// images, or with the default vision model otherwise.
    pub fn vision_query(&self, query: &str) {
        let model_id = self
            .model
            .filter(|m| m.supports(Capability::Vision))
            .map_or(DEFAULT_VISION_MODEL, |m| m.id);
        self.controller.vision_query(
            query,
            self.document_ids.clone(),
            Some(model_id.to_owned()),
        );
    }

    /// Asks the renderer to show the mind map attached to a message.
    #[inline]
    pub fn view_mindmap(&self, message_id: &str) {
        self.controller.view_mindmap(message_id);
    }

    /// Returns a receiver that is notified on every change of the view.
    #[inline]
    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.controller.subscribe()
    }

    /// Returns the latest view.
    #[inline]
    pub fn view(&self) -> ChatView {
        self.controller.view()
    }

    /// Ends the session.
    #[inline]
    pub fn close(&self) {
        self.controller.close();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parley_test_transport::TestTransport;
    use parley_transport::{Mode, RawReply};
    use tokio::time::sleep;

    use super::*;

    fn session(transport: &TestTransport) -> Session {
        SessionBuilder::with_transport(transport.clone())
            .with_conversation("c1")
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_documents_and_model_are_forwarded() {
        let mut transport = TestTransport::default();
        transport.add_reply(RawReply::with_response("ok"));
        transport.add_reply(RawReply::with_response("ok"));
        let mut session = session(&transport);

        session.attach_document("doc1");
        session.attach_document("doc2");
        session.attach_document("doc1");
        session.select_model(Some("deepseek/deepseek-r1")).unwrap();
        session.advanced_analysis("compare the revisions");
        session.hybrid_analysis("compare the revisions");
        sleep(Duration::from_secs(1)).await;

        let calls = transport.calls();
        assert_eq!(calls[0].mode, Mode::Advanced);
        assert_eq!(calls[0].request.document_ids, ["doc1", "doc2"]);
        assert_eq!(
            calls[0].request.model_id.as_deref(),
            Some("deepseek/deepseek-r1")
        );
        assert_eq!(calls[1].mode, Mode::Hybrid);
        assert_eq!(calls[1].request.model_id, None);
        assert_eq!(session.view().messages.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vision_model_fallback() {
        let mut transport = TestTransport::default();
        transport.add_reply(RawReply::with_response("a bracket"));
        transport.add_reply(RawReply::with_response("a bracket"));
        let mut session = session(&transport);

        session.select_model(Some("qwen/qwen3-235b-a22b")).unwrap();
        session.vision_query("what is this?");
        sleep(Duration::from_secs(1)).await;
        session.select_model(Some("gemini-2.5-pro")).unwrap();
        session.vision_query("what is this?");
        sleep(Duration::from_secs(1)).await;

        let models: Vec<_> = transport
            .calls()
            .into_iter()
            .map(|call| call.request.model_id)
            .collect();
        assert_eq!(
            models,
            [
                Some(DEFAULT_VISION_MODEL.to_owned()),
                Some("gemini-2.5-pro".to_owned())
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_model() {
        let mut session = session(&TestTransport::default());
        session.select_model(Some("gemini-2.5-flash")).unwrap();

        let err = session.select_model(Some("gpt-nonexistent")).unwrap_err();
        assert_eq!(err.model_id(), "gpt-nonexistent");
        assert_eq!(err.to_string(), "unknown model: gpt-nonexistent");
        assert_eq!(session.model().map(|m| m.id), Some("gemini-2.5-flash"));

        session.select_model(None).unwrap();
        assert!(session.model().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_conversation() {
        let mut transport = TestTransport::default();
        transport.add_reply(RawReply::with_response("ok"));
        let session = session(&transport);

        session.send_message("hello");
        sleep(Duration::from_secs(1)).await;
        assert_eq!(session.view().messages.len(), 2);

        let conversation_id = session.new_conversation();
        sleep(Duration::from_millis(1)).await;
        let view = session.view();
        assert_eq!(view.conversation_id, Some(conversation_id));
        assert!(view.messages.is_empty());
    }
}
