// ── Per-message dispatch ──
//
// Every received message becomes its own tokio task. An optional
// semaphore caps how many runs hold a controller session at once.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::provisioner::{ProvisionOutcome, Provisioner};

/// A stream of raw bus messages.
#[async_trait]
pub trait MessageSource: Send {
    /// Next message payload, or `None` once the source is exhausted.
    async fn next_message(&mut self) -> Option<Bytes>;
}

/// In-process source backed by an mpsc channel.
pub struct ChannelSource {
    rx: mpsc::Receiver<Bytes>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<Bytes>) -> Self {
        Self { rx }
    }

    pub fn channel(capacity: usize) -> (mpsc::Sender<Bytes>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn next_message(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

/// Spawns one provisioning run per message.
#[derive(Clone)]
pub struct Dispatcher {
    provisioner: Arc<Provisioner>,
    limit: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    /// `max_in_flight = None` leaves concurrency unbounded.
    pub fn new(provisioner: Arc<Provisioner>, max_in_flight: Option<usize>) -> Self {
        Self {
            provisioner,
            limit: max_in_flight.map(|n| Arc::new(Semaphore::new(n.max(1)))),
        }
    }

    /// Start a run for `payload` without waiting for it.
    pub fn dispatch(&self, payload: Bytes) -> JoinHandle<ProvisionOutcome> {
        let provisioner = Arc::clone(&self.provisioner);
        let limit = self.limit.clone();
        tokio::spawn(async move {
            let _permit = match limit {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };
            provisioner.handle_message(&payload).await
        })
    }

    /// Drain `source` until it ends or `cancel` fires. In-flight runs are
    /// left running; nothing waits for them.
    pub async fn run<S: MessageSource>(&self, mut source: S, cancel: CancellationToken) {
        let mut received: u64 = 0;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!(received, "intake cancelled");
                    break;
                }
                next = source.next_message() => match next {
                    Some(payload) => {
                        received += 1;
                        debug!(bytes = payload.len(), "message received");
                        drop(self.dispatch(payload));
                    }
                    None => {
                        info!(received, "message source closed");
                        break;
                    }
                },
            }
        }
    }
}
