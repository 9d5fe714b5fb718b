use std::pin::Pin;
use std::sync::Arc;

use parley_transport::{
    DispatchRequest, Mode, RawReply, Transport, TransportError,
};
use tracing::Instrument;

pub(crate) type DispatchResult = Result<RawReply, Box<dyn TransportError>>;
type BoxedDispatchFuture = Pin<Box<dyn Future<Output = DispatchResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(Mode, DispatchRequest) -> BoxedDispatchFuture + Send + Sync
>;
type RouteFuture<E> = Pin<Box<dyn Future<Output = Result<RawReply, E>> + Send>>;

/// A wrapper around a transport that routes each mode to its operation
/// and provides a type-erased interface for the other modules.
#[derive(Clone)]
pub(crate) struct TransportClient {
    handler_fn: HandlerFn,
}

impl TransportClient {
    #[inline]
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        // We have to erase the type `T`, since the controller state doesn't
        // have a generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |mode, req| {
            let span = trace_span!(
                "dispatch",
                %mode,
                conversation = %req.conversation_id
            );
            let fut = route(&transport, mode, &req);
            Box::pin(
                async move {
                    trace!("sending a request: {req:?}");
                    match fut.await {
                        Ok(reply) => {
                            trace!("got a reply");
                            Ok(reply)
                        }
                        Err(err) => {
                            warn!(kind = ?err.kind(), "dispatch failed: {err}");
                            Err(Box::new(err) as Box<dyn TransportError>)
                        }
                    }
                }
                .instrument(span),
            )
        });
        Self { handler_fn }
    }

    /// Dispatches a request with the operation of `mode`.
    ///
    /// The returned future doesn't borrow the client, and it is fine to
    /// drop it at any point.
    #[inline]
    pub fn dispatch(
        &self,
        mode: Mode,
        req: DispatchRequest,
    ) -> impl Future<Output = DispatchResult> + Send + 'static {
        (self.handler_fn)(mode, req)
    }
}

#[inline]
fn route<T: Transport>(
    transport: &T,
    mode: Mode,
    req: &DispatchRequest,
) -> RouteFuture<T::Error> {
    match mode {
        Mode::Chat => Box::pin(transport.send_message(req)),
        Mode::Advanced => Box::pin(transport.advanced_analysis(req)),
        Mode::Hybrid => Box::pin(transport.hybrid_analysis(req)),
        Mode::Vision => Box::pin(transport.vision_query(req)),
    }
}

#[cfg(test)]
mod tests {
    use parley_test_transport::TestTransport;
    use parley_transport::ErrorKind;

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
    async fn test_routes_each_mode() {
        let mut transport = TestTransport::default();
        for mode in Mode::ALL {
            transport.add_reply(RawReply::with_response(mode.as_str()));
        }
        let client = TransportClient::new(transport.clone());

        for mode in Mode::ALL {
            let reply = client.dispatch(mode, request("q")).await.unwrap();
            assert_eq!(reply.response.as_deref(), Some(mode.as_str()));
        }
        let modes: Vec<_> =
            transport.calls().into_iter().map(|call| call.mode).collect();
        assert_eq!(modes, Mode::ALL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_handling() {
        let client = TransportClient::new(TestTransport::default());
        let err = client
            .dispatch(Mode::Hybrid, request("q"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
