use parley_transport::Transport;

use super::{ChatController, LoadingCallback, MindmapCallback};
use crate::reveal::RevealConfig;
use crate::transport_client::TransportClient;

/// [`ChatController`] builder.
pub struct ControllerBuilder {
    pub(crate) client: TransportClient,
    pub(crate) conversation_id: Option<String>,
    pub(crate) reveal_config: RevealConfig,
    pub(crate) on_loading_changed: Option<LoadingCallback>,
    pub(crate) on_view_mindmap: Option<MindmapCallback>,
}

impl ControllerBuilder {
    /// Creates a new builder with the specified transport.
    #[inline]
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self {
            client: TransportClient::new(transport),
            conversation_id: None,
            reveal_config: RevealConfig::default(),
            on_loading_changed: None,
            on_view_mindmap: None,
        }
    }

    /// Binds a conversation from the start.
    #[inline]
    pub fn with_conversation<S: Into<String>>(
        mut self,
        conversation_id: S,
    ) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Sets the pacing of reply reveals.
    #[inline]
    pub fn with_reveal_config(mut self, config: RevealConfig) -> Self {
        self.reveal_config = config;
        self
    }

    /// Attaches a callback to be invoked when the loading flag flips.
    #[inline]
    pub fn on_loading_changed(
        mut self,
        f: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.on_loading_changed = Some(Box::new(f));
        self
    }

    /// Attaches a callback that receives the diagram source when a mind
    /// map is requested with [`ChatController::view_mindmap`].
    #[inline]
    pub fn on_view_mindmap(
        mut self,
        f: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_view_mindmap = Some(Box::new(f));
        self
    }

    /// Builds the controller.
    ///
    /// Must be called from within a Tokio runtime.
    #[inline]
    pub fn build(self) -> ChatController {
        ChatController::spawn_from_builder(self)
    }
}
