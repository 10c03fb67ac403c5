//! Scripted transport double for controller and API tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use reqwest::Method;
use serde_json::Value;

use super::api::BackendApi;
use super::transport::{Transport, TransportError};

/// What the mock should do for one call to a path.
pub enum Reply {
    Ok(Value),
    Err(TransportError),
    /// Never settles; exercises the timeout path.
    Hang,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Replies are queued per path and consumed in order.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<Vec<(String, VecDeque<Reply>)>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, path: &str, reply: Reply) {
        let mut replies = self.replies.lock().unwrap();
        if let Some((_, queue)) = replies.iter_mut().find(|(p, _)| p == path) {
            queue.push_back(reply);
        } else {
            replies.push((path.to_owned(), VecDeque::from([reply])));
        }
    }

    pub fn ok(&self, path: &str, body: Value) {
        self.reply(path, Reply::Ok(body));
    }

    pub fn fail(&self, path: &str, status: u16, message: &str) {
        self.reply(path, Reply::Err(TransportError::Application { status, message: message.to_owned() }));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_reply(&self, path: &str) -> Option<Reply> {
        let mut replies = self.replies.lock().unwrap();
        replies
            .iter_mut()
            .find(|(p, _)| p == path)
            .and_then(|(_, queue)| queue.pop_front())
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall { method, path: path.to_owned(), body });
        match self.next_reply(path) {
            Some(Reply::Ok(value)) => Ok(value),
            Some(Reply::Err(err)) => Err(err),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(TransportError::Network(format!("no reply scripted for {path}"))),
        }
    }
}

pub fn api_with(mock: &Arc<MockTransport>) -> BackendApi {
    BackendApi::new(mock.clone())
}

/// Controller context over `mock` with telemetry off and a short deadline.
pub fn context_with(mock: &Arc<MockTransport>) -> crate::controller::ClientContext {
    crate::controller::ClientContext::new(
        api_with(mock),
        crate::telemetry::Telemetry::disabled(),
        crate::background::Background::new(),
        std::time::Duration::from_secs(5),
    )
}
