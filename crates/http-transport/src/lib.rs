//! A transport that talks to the assistant backend over HTTP.
//!
//! Every mode is a JSON `POST` to its own endpoint, answered with a JSON
//! reply payload. Replies are not streamed.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use parley_transport::{
    DispatchRequest, ErrorKind, Mode, RawReply, Transport, TransportError,
};
use reqwest::{Client, header};

pub use config::{HttpTransportConfig, HttpTransportConfigBuilder, default_endpoint};

/// Error type for [`HttpTransport`].
#[derive(Debug)]
pub struct Error {
    message: String,
    detail: Option<String>,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            detail: None,
            kind,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
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

/// HTTP transport for the assistant backend.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    config: Arc<HttpTransportConfig>,
}

impl HttpTransport {
    /// Creates a new `HttpTransport` with the given configuration.
    pub fn new(config: HttpTransportConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    fn post(
        &self,
        mode: Mode,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Error>> + Send + 'static {
        let url = self.config.url(mode);
        trace!("posting {mode} request to {url}");
        let mut builder = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(&proto::create_body(mode, req));
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }
        let resp_fut = builder.send();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    let kind = if err.is_timeout() || err.is_connect() {
                        ErrorKind::Network
                    } else {
                        ErrorKind::Other
                    };
                    return Err(Error::new(format!("{err}"), kind));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                debug!("{mode} request failed with {status}: {body}");
                return Err(proto::error_from_status(status, body));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            if !proto::is_json(content_type.as_deref()) {
                return Err(Error::new(
                    format!("unexpected content type: {content_type:?}"),
                    ErrorKind::MalformedReply,
                ));
            }

            let body = resp
                .text()
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Network))?;
            proto::decode_reply(body)
        }
    }
}

impl Transport for HttpTransport {
    type Error = Error;

    fn send_message(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static
    {
        self.post(Mode::Chat, req)
    }

    fn advanced_analysis(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static
    {
        self.post(Mode::Advanced, req)
    }

    fn hybrid_analysis(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static
    {
        self.post(Mode::Hybrid, req)
    }

    fn vision_query(
        &self,
        req: &DispatchRequest,
    ) -> impl Future<Output = Result<RawReply, Self::Error>> + Send + 'static
    {
        self.post(Mode::Vision, req)
    }
}
