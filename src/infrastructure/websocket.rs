// WebSocket realtime channel - `/stream` beside the REST API, ws/wss scheme
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::client_store::{ClientStore, FACILITY_ID_KEY};
use crate::application::realtime::{
    dispatch_message, ConnectionHandle, ErrorHandler, MessageHandler, RealtimeChannel,
    RealtimeError,
};

pub struct WebSocketChannel {
    base_url: String,
    store: Arc<dyn ClientStore>,
}

impl WebSocketChannel {
    pub fn new(base_url: &str, store: Arc<dyn ClientStore>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    /// Stream URL for the default channel, or for `endpoint` beneath it.
    pub fn stream_url(&self, endpoint: Option<&str>) -> Result<String, RealtimeError> {
        let swapped = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if self.base_url.starts_with("ws://") || self.base_url.starts_with("wss://") {
            self.base_url.clone()
        } else {
            return Err(RealtimeError::Connect(format!(
                "unsupported base URL: {}",
                self.base_url
            )));
        };

        let mut url = format!("{}/stream", swapped);
        if let Some(endpoint) = endpoint.map(|e| e.trim_matches('/')).filter(|e| !e.is_empty()) {
            url.push('/');
            url.push_str(endpoint);
        }
        if let Some(facility) = self.store.get_item(FACILITY_ID_KEY) {
            url.push_str("?facility=");
            url.push_str(&urlencoding::encode(&facility));
        }
        Ok(url)
    }
}

#[async_trait]
impl RealtimeChannel for WebSocketChannel {
    async fn connect_to(
        &self,
        endpoint: Option<&str>,
        on_message: MessageHandler,
        on_error: ErrorHandler,
    ) -> Result<ConnectionHandle, RealtimeError> {
        let url = self.stream_url(endpoint)?;
        let (socket, response) = connect_async(url.as_str())
            .await
            .map_err(|e| RealtimeError::Connect(e.to_string()))?;

        info!(url = %url, status = ?response.status(), "Realtime channel open");

        let connected = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(read_loop(
            socket,
            connected.clone(),
            cancel.clone(),
            on_message,
            on_error,
        ));

        Ok(ConnectionHandle::new(connected, cancel, task))
    }
}

async fn read_loop(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
    on_message: MessageHandler,
    on_error: ErrorHandler,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Closing realtime channel");
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => dispatch_message(&text, &on_message),
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => dispatch_message(text, &on_message),
                    Err(_) => warn!("Dropping non UTF-8 realtime frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Realtime channel closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    on_error(RealtimeError::Transport(e.to_string()));
                    break;
                }
                None => break,
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_store::MemoryStore;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    fn channel(base_url: &str, store: MemoryStore) -> WebSocketChannel {
        WebSocketChannel::new(base_url, Arc::new(store))
    }

    #[test]
    fn test_stream_url_swaps_scheme() {
        let ch = channel("https://neocare.example.org/api/", MemoryStore::new());
        assert_eq!(ch.stream_url(None).unwrap(), "wss://neocare.example.org/api/stream");

        let ch = channel("http://localhost:8000/api", MemoryStore::new());
        assert_eq!(
            ch.stream_url(Some("/icu/alerts")).unwrap(),
            "ws://localhost:8000/api/stream/icu/alerts"
        );

        assert!(channel("ftp://x", MemoryStore::new()).stream_url(None).is_err());
    }

    #[test]
    fn test_stream_url_carries_facility() {
        let store = MemoryStore::new().with_item(FACILITY_ID_KEY, "st mary's");
        let ch = channel("http://localhost:8000/api", store);
        assert_eq!(
            ch.stream_url(None).unwrap(),
            "ws://localhost:8000/api/stream?facility=st%20mary%27s"
        );
    }

    async fn serve_once<F, Fut>(script: F) -> String
    where
        F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            script(socket).await;
        });
        format!("http://{}", addr)
    }

    fn collecting() -> (MessageHandler, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (Arc::new(move |v| sink.lock().unwrap().push(v)), seen)
    }

    #[tokio::test]
    async fn test_forwards_messages_and_skips_malformed() {
        let base = serve_once(|mut socket| async move {
            socket.send(Message::Text(r#"{"bed":1}"#.to_string())).await.unwrap();
            socket.send(Message::Text("garbage".to_string())).await.unwrap();
            socket.send(Message::Binary(br#"{"bed":2}"#.to_vec())).await.unwrap();
            socket.close(None).await.unwrap();
        })
        .await;

        let (on_message, seen) = collecting();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let error_sink = errors.clone();
        let on_error: ErrorHandler = Arc::new(move |e| error_sink.lock().unwrap().push(e));

        let mut handle = channel(&base, MemoryStore::new())
            .connect(on_message, on_error)
            .await
            .unwrap();
        handle.join().await;

        assert_eq!(*seen.lock().unwrap(), vec![json!({"bed": 1}), json!({"bed": 2})]);
        assert!(errors.lock().unwrap().is_empty());
        assert!(!handle.is_connected());
    }

    #[tokio::test]
    async fn test_abrupt_disconnect_reports_error() {
        let base = serve_once(|socket| async move {
            drop(socket);
        })
        .await;

        let (on_message, _) = collecting();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let error_sink = errors.clone();
        let on_error: ErrorHandler = Arc::new(move |e| error_sink.lock().unwrap().push(e));

        let mut handle = channel(&base, MemoryStore::new())
            .connect(on_message, on_error)
            .await
            .unwrap();
        handle.join().await;

        assert!(!handle.is_connected());
        assert_eq!(errors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (on_message, _) = collecting();
        let on_error: ErrorHandler = Arc::new(|_| {});
        let result = channel(&format!("http://{}", addr), MemoryStore::new())
            .connect(on_message, on_error)
            .await;
        assert!(matches!(result, Err(RealtimeError::Connect(_))));
    }
}
