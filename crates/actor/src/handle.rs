use std::sync::{Arc, Weak};

use tracing::Instrument;

use crate::mailbox::{ActorState, Mailbox, MailboxParts};
use crate::scheduler::run_actor;
use crate::{ActorDeadError, Message};

/// Strong handle to an actor.
///
/// The actor keeps running for as long as at least one strong handle
/// exists (or until it is killed). Background work that must not extend
/// the actor's lifetime should hold a [`WeakActor`] instead.
pub struct Actor<S> {
    mailbox: Arc<Mailbox<S>>,
}

impl<S: ActorState> Actor<S> {
    /// Spawns a new actor with the specified state and an optional label.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(state: S, label: Option<&str>) -> Self {
        let MailboxParts {
            mailbox,
            msg_rx,
            kill_rx,
        } = Mailbox::new();
        let mailbox = Arc::new(mailbox);
        tokio::spawn(
            run_actor(Arc::downgrade(&mailbox), state, msg_rx, kill_rx)
                .instrument(trace_span!("actor", label = label)),
        );
        Self { mailbox }
    }

    #[inline]
    pub(crate) fn from_mailbox(mailbox: Arc<Mailbox<S>>) -> Self {
        Self { mailbox }
    }

    /// Sends a message to the actor.
    #[inline]
    pub fn send<M: Message<S> + 'static>(
        &self,
        msg: M,
    ) -> Result<(), ActorDeadError> {
        self.mailbox.send(Box::new(msg))
    }

    /// Creates a weak handle that doesn't keep the actor alive.
    #[inline]
    pub fn downgrade(&self) -> WeakActor<S> {
        WeakActor {
            mailbox: Arc::downgrade(&self.mailbox),
        }
    }

    /// Returns `false` once the actor has been killed or has stopped.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.mailbox.is_alive()
    }

    /// Attempts to kill the actor.
    ///
    /// The actor is not guaranteed to be killed immediately, but it
    /// will stop handling further messages and quit soon. Messages sent
    /// after this call are rejected.
    #[inline]
    pub fn try_kill(&self) {
        self.mailbox.try_kill();
    }
}

impl<S> Clone for Actor<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            mailbox: Arc::clone(&self.mailbox),
        }
    }
}

/// Weak handle to an actor.
///
/// Sending through a weak handle fails with [`ActorDeadError`] once every
/// strong handle has been dropped.
pub struct WeakActor<S> {
    mailbox: Weak<Mailbox<S>>,
}

impl<S: ActorState> WeakActor<S> {
    /// Sends a message to the actor if it is still reachable.
    #[inline]
    pub fn send<M: Message<S> + 'static>(
        &self,
        msg: M,
    ) -> Result<(), ActorDeadError> {
        let Some(mailbox) = self.mailbox.upgrade() else {
            return Err(ActorDeadError);
        };
        mailbox.send(Box::new(msg))
    }
}

impl<S> Clone for WeakActor<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            mailbox: Weak::clone(&self.mailbox),
        }
    }
}
