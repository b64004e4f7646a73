use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use serde::Deserialize;

use crate::chat::endpoint::Endpoint;
use crate::chat::transport::ChatTransport;
use crate::chat::{ExplainError, ExplanationRequest, NO_RESPONSE, Outcome};

/// Shared abort flag for one request. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    token: CancelToken,
}

/// The single "current request" slot. Starting a request cancels whatever
/// was there; a completion is only applied if it still owns the slot.
#[derive(Debug, Default)]
pub struct RequestLifecycle {
    next_id: u64,
    current: Option<InFlight>,
}

/// Returned by [`RequestLifecycle::begin`].
#[derive(Debug)]
pub struct Ticket {
    pub id: u64,
    pub token: CancelToken,
    /// Id of the request this one replaced, if it was still outstanding.
    pub superseded: Option<u64>,
}

impl RequestLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Ticket {
        let superseded = self.cancel();
        self.next_id += 1;
        let token = CancelToken::new();
        self.current = Some(InFlight {
            id: self.next_id,
            token: token.clone(),
        });
        Ticket {
            id: self.next_id,
            token,
            superseded,
        }
    }

    /// Cancels the outstanding request, returning its id.
    pub fn cancel(&mut self) -> Option<u64> {
        self.current.take().map(|in_flight| {
            in_flight.token.cancel();
            in_flight.id
        })
    }

    /// Claims the slot for a finished request. False means the result is stale
    /// (superseded or cancelled) and must not be shown.
    pub fn complete(&mut self, id: u64) -> bool {
        match &self.current {
            Some(in_flight) if in_flight.id == id && !in_flight.token.is_cancelled() => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.current.as_ref().map(|f| f.id)
    }
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    text: Option<String>,
}

/// Performs one request on the calling thread.
///
/// Cancellation is checked before sending and again before interpreting the
/// response; either hit yields [`Outcome::Aborted`].
pub fn fetch_explanation(
    transport: &dyn ChatTransport,
    endpoint: &Endpoint,
    request: &ExplanationRequest,
    token: &CancelToken,
) -> Outcome {
    if token.is_cancelled() {
        return Outcome::Aborted;
    }

    let url = endpoint.url();
    let body = endpoint.body(request);
    tracing::info!(id = request.id, %url, topic = %request.topic, lang = request.language.code(), "sending explanation request");

    let result = transport.post_json(&url, &body);
    if token.is_cancelled() {
        return Outcome::Aborted;
    }

    let raw = match result {
        Ok(raw) => raw,
        Err(err) => return Outcome::Failed(ExplainError::Network(err.to_string())),
    };

    if !raw.is_success() {
        let body = raw.body.unwrap_or(raw.status_text);
        return Outcome::Failed(ExplainError::Server {
            status: raw.status,
            body,
        });
    }

    let Some(body) = raw.body else {
        return Outcome::Failed(ExplainError::Parse(
            "response body could not be read".to_string(),
        ));
    };
    match serde_json::from_str::<ChatReply>(&body) {
        Ok(reply) => {
            let text = reply
                .text
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NO_RESPONSE.to_string());
            Outcome::Success { text }
        }
        Err(err) => Outcome::Failed(ExplainError::Parse(err.to_string())),
    }
}

/// Runs [`fetch_explanation`] on a worker thread and hands the outcome to
/// `on_done` together with the request id.
pub fn spawn_request<F>(
    transport: Arc<dyn ChatTransport>,
    endpoint: Endpoint,
    request: ExplanationRequest,
    token: CancelToken,
    on_done: F,
) -> thread::JoinHandle<()>
where
    F: FnOnce(u64, Outcome) + Send + 'static,
{
    thread::spawn(move || {
        let outcome = fetch_explanation(transport.as_ref(), &endpoint, &request, &token);
        on_done(request.id, outcome);
    })
}
