use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::sync::mpsc::Sender;
use tokio::time::{self, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::chart::{build_cpu_chart, build_memory_chart};
use crate::error::TransportError;
use crate::payload::{Frame, TickPayload};
use crate::render::ChartRenderer;
use crate::sampler::MetricsSampler;
use crate::types::Sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Active,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The cancellation token fired: the observer went away or the server is
    /// shutting down.
    Cancelled,
    /// The receiving end of the connection was dropped.
    Disconnected,
    /// A push failed.
    Transport,
}

/// Resolves both charts for `sample` and builds the tick payload. A chart
/// whose link can't be resolved is left out of the payload.
pub async fn render_tick(sample: &Sample, renderer: &dyn ChartRenderer) -> TickPayload {
    let cpu_chart = build_cpu_chart(sample);
    let mem_chart = build_memory_chart(sample);

    let (cpu_url, mem_url) = tokio::join!(
        renderer.resolve(&cpu_chart),
        renderer.resolve(&mem_chart)
    );

    let cpu_url = cpu_url
        .inspect_err(|e| {
            tracing::warn!("cpu chart unavailable: {}", e);
            counter!("chart_render_failures_total", "chart" => "cpu").increment(1);
        })
        .ok();
    let mem_url = mem_url
        .inspect_err(|e| {
            tracing::warn!("memory chart unavailable: {}", e);
            counter!("chart_render_failures_total", "chart" => "memory").increment(1);
        })
        .ok();

    TickPayload::new(sample, cpu_url, mem_url)
}

/// One observer connection and the tick loop feeding it.
///
/// The first cycle runs before the timer is armed. From then on ticks run one
/// at a time inside [`StreamingSession::run`], so pushes to the connection
/// are never interleaved. The session closes when `cancel` fires, when the
/// receiver is dropped, or when a push fails; closing drops the timer and the
/// connection exactly once.
pub struct StreamingSession {
    id: u64,
    sampler: MetricsSampler,
    renderer: Arc<dyn ChartRenderer>,
    connection: Option<Sender<Frame>>,
    timer: Option<Interval>,
    tick_interval: Duration,
    state: SessionState,
    cancel: CancellationToken,
}

impl StreamingSession {
    pub fn new(
        id: u64,
        sampler: MetricsSampler,
        renderer: Arc<dyn ChartRenderer>,
        connection: Sender<Frame>,
        tick_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            sampler,
            renderer,
            connection: Some(connection),
            timer: None,
            tick_interval,
            state: SessionState::Starting,
            cancel,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub async fn run(mut self) -> CloseReason {
        tracing::info!(session = self.id, "session started");

        if let Err(e) = self.cycle().await {
            tracing::debug!(session = self.id, "initial push failed: {}", e);
            return self.close(CloseReason::Transport);
        }

        let mut timer = time::interval_at(
            time::Instant::now() + self.tick_interval,
            self.tick_interval,
        );
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
        self.state = SessionState::Active;

        let reason = loop {
            let (Some(timer), Some(connection)) = (self.timer.as_mut(), self.connection.as_ref())
            else {
                break CloseReason::Cancelled;
            };

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break CloseReason::Cancelled,
                _ = connection.closed() => break CloseReason::Disconnected,
                _ = timer.tick() => {}
            }

            if self.cancel.is_cancelled() {
                break CloseReason::Cancelled;
            }

            if let Err(e) = self.cycle().await {
                tracing::debug!(session = self.id, "push failed: {}", e);
                break CloseReason::Transport;
            }
        };

        self.close(reason)
    }

    /// Sample, render and push one frame.
    async fn cycle(&self) -> Result<(), TransportError> {
        let started = Instant::now();

        let frame = match self.sampler.sample().await {
            Ok(sample) => {
                let payload = render_tick(&sample, self.renderer.as_ref()).await;
                let outcome = if payload.cpu_chart_url.is_some() && payload.mem_chart_url.is_some()
                {
                    "ok"
                } else {
                    "degraded"
                };
                counter!("health_ticks_total", "outcome" => outcome).increment(1);
                Frame::Tick(payload)
            }
            Err(e) => {
                tracing::warn!(session = self.id, "error retrieving system metrics: {}", e);
                counter!("health_ticks_total", "outcome" => "error").increment(1);
                Frame::Error
            }
        };

        histogram!("health_tick_duration_ms").record(started.elapsed().as_millis() as f64);

        self.push(frame).await
    }

    async fn push(&self, frame: Frame) -> Result<(), TransportError> {
        let connection = self.connection.as_ref().ok_or(TransportError::Closed)?;
        connection
            .send(frame)
            .await
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self, reason: CloseReason) -> CloseReason {
        if self.state == SessionState::Closed {
            return reason;
        }
        self.state = SessionState::Closed;
        self.timer.take();
        self.connection.take();
        self.cancel.cancel();

        tracing::info!(session = self.id, reason = ?reason, "session closed");
        reason
    }
}
