// Realtime channel trait - push updates delivered to caller callbacks
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RealtimeError {
    #[error("cannot open realtime channel: {0}")]
    Connect(String),

    #[error("realtime transport error: {0}")]
    Transport(String),

    #[error("malformed realtime message: {0}")]
    Parse(String),
}

pub type MessageHandler = Arc<dyn Fn(Value) + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(RealtimeError) + Send + Sync>;

/// Parse one inbound message and hand it to `on_message`.
///
/// Malformed messages are logged and dropped; the channel stays open.
pub fn dispatch_message(text: &str, on_message: &MessageHandler) {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => on_message(value),
        Err(e) => {
            let err = RealtimeError::Parse(e.to_string());
            tracing::warn!("Dropping realtime message: {}", err);
        }
    }
}

/// An open push channel. The caller owns it; dropping it closes the channel.
pub struct ConnectionHandle {
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    pub fn new(connected: Arc<AtomicBool>, cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            connected,
            cancel,
            task: Some(task),
        }
    }

    /// `true` between open and the first close or transport error.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Wait for the reader task to finish (after a close from either side).
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Realtime reader task failed: {}", e);
            }
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    /// Open a channel on the stream endpoint, or on `endpoint` beneath it.
    /// No reconnect is attempted once it closes.
    async fn connect_to(
        &self,
        endpoint: Option<&str>,
        on_message: MessageHandler,
        on_error: ErrorHandler,
    ) -> Result<ConnectionHandle, RealtimeError>;

    async fn connect(
        &self,
        on_message: MessageHandler,
        on_error: ErrorHandler,
    ) -> Result<ConnectionHandle, RealtimeError> {
        self.connect_to(None, on_message, on_error).await
    }
}

/// Subscription that remembers the latest push update and last error.
pub struct RealtimeFeed {
    handle: ConnectionHandle,
    last_message: Arc<Mutex<Option<Value>>>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl RealtimeFeed {
    pub async fn subscribe(
        channel: &dyn RealtimeChannel,
        endpoint: Option<&str>,
    ) -> Result<Self, RealtimeError> {
        let last_message = Arc::new(Mutex::new(None));
        let last_error = Arc::new(Mutex::new(None));

        let messages = last_message.clone();
        let on_message: MessageHandler = Arc::new(move |value| {
            if let Ok(mut slot) = messages.lock() {
                *slot = Some(value);
            }
        });

        let errors = last_error.clone();
        let on_error: ErrorHandler = Arc::new(move |err| {
            tracing::warn!("Realtime channel error: {}", err);
            if let Ok(mut slot) = errors.lock() {
                *slot = Some(err.to_string());
            }
        });

        let handle = channel.connect_to(endpoint, on_message, on_error).await?;
        Ok(Self {
            handle,
            last_message,
            last_error,
        })
    }

    pub fn connected(&self) -> bool {
        self.handle.is_connected()
    }

    pub fn last_message(&self) -> Option<Value> {
        self.last_message.lock().ok().and_then(|m| m.clone())
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }

    pub fn close(&self) {
        self.handle.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dispatch_forwards_json_and_drops_garbage() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let on_message: MessageHandler = Arc::new(move |v| sink.lock().unwrap().push(v));

        dispatch_message(r#"{"type":"vitals","hr":72}"#, &on_message);
        dispatch_message("not json", &on_message);
        dispatch_message("[1,2]", &on_message);

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![json!({"type": "vitals", "hr": 72}), json!([1, 2])]);
    }

    #[tokio::test]
    async fn test_dropping_handle_cancels_reader() {
        let cancel = CancellationToken::new();
        let watched = cancel.clone();
        let connected = Arc::new(AtomicBool::new(true));
        let flag = connected.clone();
        let task = tokio::spawn(async move {
            watched.cancelled().await;
            flag.store(false, Ordering::SeqCst);
        });

        let mut handle = ConnectionHandle::new(connected.clone(), cancel, task);
        assert!(handle.is_connected());
        handle.close();
        handle.join().await;
        assert!(!connected.load(Ordering::SeqCst));
    }
}
