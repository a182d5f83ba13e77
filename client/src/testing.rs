//! Test doubles shared by the unit tests: an in-memory indexer and a local HTTP server.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use arcade_shared::{EntityPayload, Fields, Notification, Query};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::{Error, Result};
use crate::transport::{IndexerTransport, NotificationStream};

pub(crate) async fn spawn_test_server(app: axum::Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });
    (addr, handle)
}

pub(crate) fn fields(value: serde_json::Value) -> Fields {
    value.as_object().cloned().expect("object literal")
}

#[derive(Default)]
pub(crate) struct MemoryTransport {
    payload: Mutex<EntityPayload>,
    fail: bool,
    pub fetches: AtomicUsize,
    pub subscribes: AtomicUsize,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Result<Notification>>>>,
}

impl MemoryTransport {
    pub fn with_payload(payload: EntityPayload) -> Self {
        Self {
            payload: Mutex::new(payload),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Deliver a push to every open subscription. Returns how many received it.
    pub fn push(&self, notification: Notification) -> usize {
        let mut subscribers = self.subscribers.lock().expect("subscribers lock");
        subscribers.retain(|tx| tx.send(Ok(notification.clone())).is_ok());
        subscribers.len()
    }

    pub fn push_error(&self, message: &str) {
        let subscribers = self.subscribers.lock().expect("subscribers lock");
        for tx in subscribers.iter() {
            let _ = tx.send(Err(Error::Rpc {
                code: -1,
                message: message.to_string(),
            }));
        }
    }

    /// Drop every open push stream, as a service closing its connections would. Returns how
    /// many were open.
    pub fn disconnect_all(&self) -> usize {
        let mut subscribers = self.subscribers.lock().expect("subscribers lock");
        let open = subscribers.iter().filter(|tx| !tx.is_closed()).count();
        subscribers.clear();
        open
    }

    /// Subscriptions whose receiving side is still alive.
    pub fn open_subscriptions(&self) -> usize {
        let mut subscribers = self.subscribers.lock().expect("subscribers lock");
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

impl IndexerTransport for MemoryTransport {
    async fn fetch_entities(&self, _query: &Query) -> Result<EntityPayload> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Http {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.payload.lock().expect("payload lock").clone())
    }

    async fn subscribe_entities(&self, _query: &Query) -> Result<NotificationStream> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Http {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().expect("subscribers lock").push(tx);
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}
