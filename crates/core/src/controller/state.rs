use std::ops::ControlFlow;

use parley_actor::{Actor, Message as ActorMessage};
use parley_transport::{DispatchRequest, Mode, Reply};

use super::{ChatView, ControllerState, SubmitOptions};
use crate::message::Message;
use crate::mode::ModeSpec;
use crate::reveal::Reveal;
use crate::transport_client::DispatchResult;

impl ControllerState {
    fn submit(
        &mut self,
        mode: Mode,
        query: String,
        options: SubmitOptions,
        handle: &Actor<Self>,
    ) {
        let Some(conversation_id) = self.conversation_id.clone() else {
            debug!("no conversation is bound, ignoring the {mode} request");
            return;
        };
        let spec = ModeSpec::of(mode);

        self.messages.push(Message::user(spec.echo(&query)));
        self.begin_dispatch();

        let SubmitOptions {
            document_ids,
            model_id,
        } = options;
        if model_id.is_some() && !spec.accepts_model {
            debug!("{mode} doesn't take a model, the selection is dropped");
        }
        let req = DispatchRequest {
            conversation_id,
            query,
            document_ids,
            model_id: model_id.filter(|_| spec.accepts_model),
        };
        let fut = self.client.dispatch(mode, req);
        let epoch = self.epoch;
        let handle = handle.downgrade();
        tokio::spawn(async move {
            let result = fut.await;
            if handle
                .send(DispatchSettled {
                    mode,
                    epoch,
                    result,
                })
                .is_err()
            {
                debug!("controller is gone, dropping the {mode} reply");
            }
        });

        self.publish();
    }

    fn dispatch_settled(
        &mut self,
        mode: Mode,
        epoch: u64,
        result: DispatchResult,
        handle: &Actor<Self>,
    ) {
        if epoch != self.epoch {
            debug!("discarding a {mode} reply for a previous conversation");
            return;
        }
        let spec = ModeSpec::of(mode);

        match result {
            Ok(raw) => self.start_reveal(raw.normalize(spec.reply_field), handle),
            Err(err) => {
                let text = spec.failure_text(&err.to_string());
                let detail = err.detail().map(ToOwned::to_owned);
                self.messages.push(Message::assistant_error(text, detail));
            }
        }
        self.end_dispatch();
        self.publish();
    }

    fn start_reveal(&mut self, mut reply: Reply, handle: &Actor<Self>) {
        self.interrupt_reveal();

        let message = Message::reveal_placeholder(&mut reply);
        let reveal_id = self.next_reveal_id;
        self.next_reveal_id += 1;
        let mut reveal = Reveal::new(
            reveal_id,
            self.messages.len(),
            message.id.clone(),
            reply.text,
        );
        self.messages.push(message);

        if reveal.is_complete() {
            debug!("reveal {reveal_id} has nothing to show");
            self.settle(reveal);
            return;
        }

        let config = self.reveal_config;
        debug!(
            "reveal {reveal_id} started, {} step(s) to go",
            reveal.remaining_steps(config.chunk_chars())
        );
        let handle = handle.downgrade();
        let timer = self.timers.schedule_every(config.interval(), move || {
            match handle.send(RevealTick(reveal_id)) {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => ControlFlow::Break(()),
            }
        });
        reveal.set_timer(timer);
        self.reveal = Some(reveal);
    }

    fn reveal_tick(&mut self, reveal_id: u64) {
        let Some(reveal) = self.reveal.as_mut().filter(|r| r.id() == reveal_id)
        else {
            trace!("reveal {reveal_id} is no longer active, tick ignored");
            return;
        };

        let range = reveal.advance(self.reveal_config.chunk_chars());
        if let Some(message) = self.messages.get_mut(reveal.message_index()) {
            message.content.push_str(&reveal.full_text()[range]);
        }
        trace!("reveal {reveal_id} advanced");

        if reveal.is_complete() {
            if let Some(reveal) = self.reveal.take() {
                self.settle(reveal);
            }
        }
        self.publish();
    }

    /// Marks the message of a completed reveal as final.
    fn settle(&mut self, reveal: Reveal) {
        if let Some(timer) = reveal.timer() {
            self.timers.cancel(timer);
        }
        let reveal_id = reveal.id();
        let Some(message) = message_of(&mut self.messages, &reveal) else {
            return;
        };
        message.content = reveal.into_full_text();
        message.is_streaming = false;
        debug!("reveal {reveal_id} settled");
    }

    /// Stops the active reveal, if any, keeping what has been shown so far.
    fn interrupt_reveal(&mut self) {
        self.timers.cancel_all();
        let Some(reveal) = self.reveal.take() else {
            return;
        };
        if let Some(message) = message_of(&mut self.messages, &reveal) {
            message.is_streaming = false;
        }
        debug!("reveal {} interrupted", reveal.id());
    }

    fn bind_conversation(&mut self, conversation_id: String) {
        if self.conversation_id.as_deref() == Some(conversation_id.as_str()) {
            trace!("conversation {conversation_id} is already bound");
            return;
        }

        let cancelled = self.timers.cancel_all();
        self.reveal = None;
        self.messages.clear();
        self.epoch += 1;
        if self.in_flight > 0 {
            debug!("{} dispatch(es) will be discarded", self.in_flight);
            self.in_flight = 0;
            self.notify_loading(false);
        }
        debug!(
            "switched to conversation {conversation_id}, {cancelled} timer(s) cancelled"
        );
        self.conversation_id = Some(conversation_id);
        self.publish();
    }

    fn view_mindmap(&self, message_id: &str) {
        let mermaid_code = self
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .filter(|m| m.has_mindmap)
            .and_then(|m| m.mermaid_code.as_deref());
        let Some(mermaid_code) = mermaid_code else {
            debug!("message {message_id} has no mind map to show");
            return;
        };
        if let Some(on_view_mindmap) = &self.on_view_mindmap {
            on_view_mindmap(mermaid_code);
        }
    }

    fn begin_dispatch(&mut self) {
        self.in_flight += 1;
        if self.in_flight == 1 {
            self.notify_loading(true);
        }
    }

    fn end_dispatch(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.notify_loading(false);
        }
    }

    #[inline]
    fn notify_loading(&self, is_loading: bool) {
        if let Some(on_loading_changed) = &self.on_loading_changed {
            on_loading_changed(is_loading);
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(ChatView {
            conversation_id: self.conversation_id.clone(),
            messages: self.messages.clone(),
            is_loading: self.in_flight > 0,
        });
    }
}

/// Looks up the message a reveal writes into.
#[inline]
fn message_of<'a>(
    messages: &'a mut [Message],
    reveal: &Reveal,
) -> Option<&'a mut Message> {
    messages
        .get_mut(reveal.message_index())
        .filter(|m| m.id == reveal.message_id())
}

#[derive(Debug)]
pub struct Submit {
    pub mode: Mode,
    pub query: String,
    pub options: SubmitOptions,
}

impl ActorMessage<ControllerState> for Submit {
    #[inline]
    fn handle(self, state: &mut ControllerState, handle: &Actor<ControllerState>) {
        state.submit(self.mode, self.query, self.options, handle);
    }
}

#[derive(Debug)]
pub struct BindConversation(pub String);

impl ActorMessage<ControllerState> for BindConversation {
    #[inline]
    fn handle(self, state: &mut ControllerState, _handle: &Actor<ControllerState>) {
        state.bind_conversation(self.0);
    }
}

#[derive(Debug)]
pub struct ViewMindmap(pub String);

impl ActorMessage<ControllerState> for ViewMindmap {
    #[inline]
    fn handle(self, state: &mut ControllerState, _handle: &Actor<ControllerState>) {
        state.view_mindmap(&self.0);
    }
}

#[derive(Debug)]
struct DispatchSettled {
    mode: Mode,
    epoch: u64,
    result: DispatchResult,
}

impl ActorMessage<ControllerState> for DispatchSettled {
    fn handle(self, state: &mut ControllerState, handle: &Actor<ControllerState>) {
        state.dispatch_settled(self.mode, self.epoch, self.result, handle);
    }
}

#[derive(Debug)]
struct RevealTick(u64);

impl ActorMessage<ControllerState> for RevealTick {
    #[inline]
    fn handle(self, state: &mut ControllerState, _handle: &Actor<ControllerState>) {
        state.reveal_tick(self.0);
    }
}
