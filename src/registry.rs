use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::payload::Frame;
use crate::provider::MetricsProvider;
use crate::render::ChartRenderer;
use crate::sampler::MetricsSampler;
use crate::session::{CloseReason, StreamingSession};

/// Frames buffered per connection before a tick waits on the observer.
const FRAME_BUFFER: usize = 16;

struct RegistryInner {
    sampler: MetricsSampler,
    renderer: Arc<dyn ChartRenderer>,
    tick_interval: Duration,
    next_id: AtomicU64,
    active: AtomicUsize,
    shutdown: CancellationToken,
}

/// Starts one [`StreamingSession`] per observer connection.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

/// Handle to a running session, returned to whoever accepted the connection.
pub struct SessionHandle {
    pub id: u64,
    cancel: CancellationToken,
    task: JoinHandle<CloseReason>,
}

impl SessionHandle {
    /// Signals the session that its observer is gone.
    pub fn disconnect(&self) {
        self.cancel.cancel();
    }

    /// Cancels the session when the returned guard is dropped.
    pub fn disconnect_on_drop(&self) -> DropGuard {
        self.cancel.clone().drop_guard()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn closed(self) -> Option<CloseReason> {
        self.task.await.ok()
    }
}

impl SessionRegistry {
    pub fn new(
        provider: Arc<dyn MetricsProvider>,
        renderer: Arc<dyn ChartRenderer>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sampler: MetricsSampler::new(provider),
                renderer,
                tick_interval,
                next_id: AtomicU64::new(1),
                active: AtomicUsize::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn sampler(&self) -> &MetricsSampler {
        &self.inner.sampler
    }

    pub fn renderer(&self) -> &dyn ChartRenderer {
        self.inner.renderer.as_ref()
    }

    pub fn active_sessions(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Opens a connection channel and starts a session writing to it.
    pub fn open(&self) -> (SessionHandle, Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        (self.start(tx), rx)
    }

    /// Spawns a session that pushes to `connection` until it closes.
    pub fn start(&self, connection: mpsc::Sender<Frame>) -> SessionHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = self.inner.shutdown.child_token();

        let session = StreamingSession::new(
            id,
            self.inner.sampler.clone(),
            self.inner.renderer.clone(),
            connection,
            self.inner.tick_interval,
            cancel.clone(),
        );

        let active = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        counter!("health_sessions_total").increment(1);
        gauge!("health_sessions_active").set(active as f64);

        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let reason = session.run().await;
            let active = inner.active.fetch_sub(1, Ordering::SeqCst) - 1;
            gauge!("health_sessions_active").set(active as f64);
            reason
        });

        SessionHandle { id, cancel, task }
    }

    /// Closes every running session.
    pub fn shutdown(&self) {
        tracing::info!(
            active = self.active_sessions(),
            "closing all streaming sessions"
        );
        self.inner.shutdown.cancel();
    }
}
