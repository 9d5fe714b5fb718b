//! A local fake transport for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use parley_transport::{
    DispatchRequest, ErrorKind, Mode, RawReply, Transport, TransportError,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    detail: Option<String>,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl TransportError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

/// A call the transport has received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub mode: Mode,
    pub request: DispatchRequest,
}

#[derive(Default)]
struct Script {
    steps: VecDeque<PresetStep>,
    calls: Vec<RecordedCall>,
}

/// A local fake transport for testing purpose.
///
/// Calls consume the scripted steps in order, whatever their mode. Once
/// the script runs out, every further call fails. Clones share the same
/// script, so a test can keep one to inspect the recorded calls after
/// handing another to the code under test.
#[derive(Clone, Default)]
pub struct TestTransport {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestTransport {
    #[inline]
    pub fn add_step(&mut self, step: PresetStep) {
        self.script().steps.push_back(step);
    }

    #[inline]
    pub fn add_reply(&mut self, reply: RawReply) {
        self.add_step(PresetStep::reply(reply));
    }

    #[inline]
    pub fn add_failure<S: Into<String>>(&mut self, message: S) {
        self.add_step(PresetStep::failure(message));
    }

    /// Sets the default time every call takes.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the calls received so far, in order.
    #[inline]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script().calls.clone()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(
        &self,
        mode: Mode,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Error>> + Send + 'static {
        let step = {
            let mut script = self.script();
            script.calls.push(RecordedCall {
                mode,
                request: req.clone(),
            });
            script.steps.pop_front()
        };
        let delay = step
            .as_ref()
            .and_then(|step| step.delay_ms)
            .map(Duration::from_millis)
            .or(self.delay)
            .unwrap_or(Duration::from_millis(1));

        async move {
            sleep(delay).await;
            let Some(step) = step else {
                return Err(Error {
                    message: format!("no scripted reply left for {mode}"),
                    detail: None,
                    kind: ErrorKind::Other,
                });
            };
            match step.outcome {
                PresetOutcome::Reply(reply) => Ok(reply),
                PresetOutcome::Failure { message, detail } => Err(Error {
                    message,
                    detail,
                    kind: ErrorKind::Server,
                }),
            }
        }
    }
}

impl Transport for TestTransport {
    type Error = crate::Error;

    fn send_message(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static
    {
        self.respond(Mode::Chat, req)
    }

    fn advanced_analysis(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static
    {
        self.respond(Mode::Advanced, req)
    }

    fn hybrid_analysis(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static
    {
        self.respond(Mode::Hybrid, req)
    }

    fn vision_query(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static
    {
        self.respond(Mode::Vision, req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: &str) -> DispatchRequest {
        DispatchRequest {
            conversation_id: "c1".to_owned(),
            query: query.to_owned(),
            document_ids: vec![],
            model_id: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_is_consumed_in_order() {
        let mut transport = TestTransport::default();
        transport.add_reply(RawReply::with_response("first"));
        transport.add_step(
            PresetStep::failure("rate limit").with_detail("slow down"),
        );

        let reply = transport.send_message(&request("a")).await.unwrap();
        assert_eq!(reply.response.as_deref(), Some("first"));

        let err = transport.hybrid_analysis(&request("b")).await.unwrap_err();
        assert_eq!(err.to_string(), "rate limit");
        assert_eq!(err.detail(), Some("slow down"));
        assert_eq!(err.kind(), ErrorKind::Server);

        let err = transport.vision_query(&request("c")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);

        let calls = transport.calls();
        let modes: Vec<_> = calls.iter().map(|call| call.mode).collect();
        assert_eq!(modes, [Mode::Chat, Mode::Hybrid, Mode::Vision]);
        assert_eq!(calls[1].request.query, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay() {
        let mut transport = TestTransport::default();
        transport.set_delay(Duration::from_millis(200));
        transport.add_reply(RawReply::with_response("slow"));
        transport.add_step(
            PresetStep::reply(RawReply::with_response("fast"))
                .with_delay(Duration::from_millis(10)),
        );

        let start = tokio::time::Instant::now();
        transport.send_message(&request("a")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));

        let start = tokio::time::Instant::now();
        transport.send_message(&request("b")).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(200));
    }
}
