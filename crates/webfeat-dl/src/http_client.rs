use std::{
    io,
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::Duration,
};

use tracing::trace;
use ureq::{
    http::{HeaderMap, Response},
    typestate::WithoutBody,
    Agent, Body, Proxy, RequestBuilder,
};

use crate::{
    context::{Context, ContextReader},
    http::{HttpClient, HttpResponse, TransportError},
};

pub const DEFAULT_USER_AGENT: &str = concat!("webfeat/", env!("CARGO_PKG_VERSION"));

/// How often a request waiting on the network checks its context.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: Option<String>,
    pub headers: Option<HeaderMap>,
    pub proxy: Option<Proxy>,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    /// Creates a config with the `webfeat/<version>` user agent and no proxy,
    /// extra headers or timeout.
    ///
    /// # Examples
    ///
    /// ```
    /// use webfeat_dl::http_client::{ClientConfig, DEFAULT_USER_AGENT};
    ///
    /// let cfg = ClientConfig::default();
    /// assert_eq!(cfg.user_agent.as_deref(), Some(DEFAULT_USER_AGENT));
    /// assert!(cfg.proxy.is_none());
    /// assert!(cfg.timeout.is_none());
    /// ```
    fn default() -> Self {
        Self {
            user_agent: Some(DEFAULT_USER_AGENT.into()),
            headers: None,
            proxy: None,
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Builds an HTTP `Agent` configured from this `ClientConfig`.
    ///
    /// Status codes are never turned into errors by the agent; the pipeline
    /// inspects them itself.
    pub fn build(&self) -> Agent {
        let mut config = Agent::config_builder()
            .proxy(self.proxy.clone())
            .timeout_global(self.timeout)
            .http_status_as_error(false);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        config.build().into()
    }

    pub fn into_client(self) -> UreqClient {
        UreqClient::new(&self)
    }
}

/// [`HttpClient`] backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqClient {
    agent: Agent,
    headers: Option<HeaderMap>,
}

impl UreqClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            agent: config.build(),
            headers: config.headers.clone(),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl HttpClient for UreqClient {
    fn get(
        &self,
        ctx: &Context,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        ctx.check()?;

        let mut req = apply_headers(self.agent.get(url), &self.headers);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        if let Some(remaining) = ctx.remaining() {
            req = req.config().timeout_global(Some(remaining)).build();
        }

        trace!("GET {}", url);
        let result = call(ctx, req)?;

        // The call may have been cut short by the deadline or raced a cancel.
        ctx.check()?;

        let response = result.map_err(|err| {
            match err {
                ureq::Error::Timeout(_) if ctx.deadline().is_some() => {
                    TransportError::DeadlineExceeded
                }
                err => TransportError::from(err),
            }
        })?;

        let status = response.status().as_u16();
        let body = response.into_body();
        let content_length = body.content_length();
        let reader = ContextReader::new(body.into_reader(), ctx.clone());

        Ok(HttpResponse {
            status,
            content_length,
            body: Some(Box::new(reader)),
        })
    }
}

/// Sends `req` from a worker thread and waits for it while `ctx` is live.
///
/// Once `ctx` is done the request is abandoned: the worker finishes on its own,
/// bounded by the agent's timeout, and its response is dropped.
fn call(
    ctx: &Context,
    req: RequestBuilder<WithoutBody>,
) -> Result<Result<Response<Body>, ureq::Error>, TransportError> {
    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name("webfeat-http".into())
        .spawn(move || {
            let _ = tx.send(req.call());
        })?;

    loop {
        match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
            Ok(result) => return Ok(result),
            Err(RecvTimeoutError::Timeout) => ctx.check()?,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(TransportError::Io(io::Error::other(
                    "request worker exited without a response",
                )));
            }
        }
    }
}

fn apply_headers<B>(mut req: RequestBuilder<B>, headers: &Option<HeaderMap>) -> RequestBuilder<B> {
    if let Some(headers) = headers {
        for (key, value) in headers.iter() {
            req = req.header(key, value);
        }
    }
    req
}
