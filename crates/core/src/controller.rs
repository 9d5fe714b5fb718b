mod builder;
mod state;

use parley_actor::{Actor, ActorState, Message as ActorMessage};
use parley_transport::Mode;
use tokio::sync::watch;

use crate::message::Message;
use crate::reveal::{Reveal, RevealConfig};
use crate::timer::TimerSet;
use crate::transport_client::TransportClient;
pub use builder::ControllerBuilder;
use state::{BindConversation, Submit, ViewMindmap};

type LoadingCallback = Box<dyn Fn(bool) + Send + Sync>;
type MindmapCallback = Box<dyn Fn(&str) + Send + Sync>;

/// A snapshot of the session, as seen by renderers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatView {
    /// The bound conversation, if any.
    pub conversation_id: Option<String>,
    /// Every turn of the conversation, oldest first.
    pub messages: Vec<Message>,
    /// Whether a dispatch is in flight.
    pub is_loading: bool,
}

impl ChatView {
    /// Returns the message that is currently being revealed.
    #[inline]
    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_streaming)
    }
}

/// Per-submission arguments besides the query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Documents the query refers to.
    pub document_ids: Vec<String>,
    /// The model to analyze with. Ignored by modes that don't take one.
    pub model_id: Option<String>,
}

/// The chat session controller.
///
/// Owns the message history of one conversation, dispatches queries to
/// the transport and reveals replies incrementally. All state lives on
/// the controller's own task; the methods here only enqueue requests and
/// return immediately. Renderers observe the effects through
/// [`ChatController::subscribe`].
///
/// The controller stops once [`ChatController::close`] is called or every
/// handle is dropped. Any running reveal stops with it.
#[derive(Clone)]
pub struct ChatController {
    actor: Actor<ControllerState>,
    view_rx: watch::Receiver<ChatView>,
}

impl ChatController {
    /// Submits a query in the given mode.
    ///
    /// Does nothing if no conversation is bound.
    pub fn submit<S: Into<String>>(
        &self,
        mode: Mode,
        query: S,
        options: SubmitOptions,
    ) {
        self.send(Submit {
            mode,
            query: query.into(),
            options,
        });
    }

    /// Sends a plain chat message.
    #[inline]
    pub fn send_message<S: Into<String>>(
        &self,
        query: S,
        document_ids: Vec<String>,
    ) {
        self.submit(
            Mode::Chat,
            query,
            SubmitOptions {
                document_ids,
                model_id: None,
            },
        );
    }

    /// Runs an advanced analysis, optionally with a specific model.
    #[inline]
    pub fn advanced_analysis<S: Into<String>>(
        &self,
        query: S,
        document_ids: Vec<String>,
        model_id: Option<String>,
    ) {
        self.submit(
            Mode::Advanced,
            query,
            SubmitOptions {
                document_ids,
                model_id,
            },
        );
    }

    /// Runs a hybrid analysis.
    #[inline]
    pub fn hybrid_analysis<S: Into<String>>(
        &self,
        query: S,
        document_ids: Vec<String>,
    ) {
        self.submit(
            Mode::Hybrid,
            query,
            SubmitOptions {
                document_ids,
                model_id: None,
            },
        );
    }

    /// Runs a vision query, optionally with a specific model.
    #[inline]
    pub fn vision_query<S: Into<String>>(
        &self,
        query: S,
        document_ids: Vec<String>,
        model_id: Option<String>,
    ) {
        self.submit(
            Mode::Vision,
            query,
            SubmitOptions {
                document_ids,
                model_id,
            },
        );
    }

    /// Switches to another conversation.
    ///
    /// The history is cleared and replies still in flight for the
    /// previous conversation are discarded. Binding the current
    /// conversation again does nothing.
    pub fn bind_conversation<S: Into<String>>(&self, conversation_id: S) {
        self.send(BindConversation(conversation_id.into()));
    }

    /// Asks the renderer to show the mind map attached to a message.
    pub fn view_mindmap<S: Into<String>>(&self, message_id: S) {
        self.send(ViewMindmap(message_id.into()));
    }

    /// Returns a receiver that is notified on every change of the view.
    ///
    /// The receiver errors out once the controller has stopped.
    #[inline]
    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.view_rx.clone()
    }

    /// Returns the latest view.
    #[inline]
    pub fn view(&self) -> ChatView {
        self.view_rx.borrow().clone()
    }

    /// Stops the controller. Later calls are ignored.
    #[inline]
    pub fn close(&self) {
        self.actor.try_kill();
    }

    /// Returns `true` once the controller has stopped or is stopping.
    #[inline]
    pub fn is_closed(&self) -> bool {
        !self.actor.is_alive()
    }

    fn send<M: ActorMessage<ControllerState> + 'static>(&self, msg: M) {
        if self.actor.send(msg).is_err() {
            warn!("controller is closed, request dropped");
        }
    }
}

pub(crate) struct ControllerState {
    client: TransportClient,
    reveal_config: RevealConfig,
    conversation_id: Option<String>,
    // Bumped on every conversation switch; dispatches carry the value
    // they were started with.
    epoch: u64,
    messages: Vec<Message>,
    in_flight: usize,
    reveal: Option<Reveal>,
    next_reveal_id: u64,
    timers: TimerSet,
    view_tx: watch::Sender<ChatView>,

    on_loading_changed: Option<LoadingCallback>,
    on_view_mindmap: Option<MindmapCallback>,
}

impl ActorState for ControllerState {
    fn stopped(&mut self) {
        let cancelled = self.timers.cancel_all();
        self.reveal = None;
        debug!("controller stopped, {cancelled} timer(s) cancelled");
    }
}

impl ChatController {
    fn spawn_from_builder(builder: ControllerBuilder) -> Self {
        let ControllerBuilder {
            client,
            conversation_id,
            reveal_config,
            on_loading_changed,
            on_view_mindmap,
        } = builder;

        let (view_tx, view_rx) = watch::channel(ChatView {
            conversation_id: conversation_id.clone(),
            ..Default::default()
        });
        let state = ControllerState {
            client,
            reveal_config,
            conversation_id,
            epoch: 0,
            messages: vec![],
            in_flight: 0,
            reveal: None,
            next_reveal_id: 1,
            timers: TimerSet::default(),
            view_tx,
            on_loading_changed,
            on_view_mindmap,
        };
        Self {
            actor: Actor::spawn(state, Some("controller")),
            view_rx,
        }
    }
}
