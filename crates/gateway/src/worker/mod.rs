// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-camera stream worker supervision.
//!
//! One supervisor task per worker owns the media-tool child process, the
//! viewer set, and the restart policy. Viewers attach through bounded
//! per-viewer queues; a slow viewer is dropped rather than ever blocking
//! the frame pump. Restarts are bounded: after `MAX_RESTARTS` failures
//! the worker is permanently failed and its viewers are disconnected.

pub mod ffmpeg;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::sources::CameraSource;
use crate::worker::ffmpeg::{mask_credentials, StreamProfile};

/// Frames a slow viewer may queue before being dropped.
pub const VIEWER_QUEUE_DEPTH: usize = 64;

/// Grace period between SIGTERM and hard kill on stop.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Interval between idle-worker sweeps.
pub const IDLE_REAPER_INTERVAL: Duration = Duration::from_secs(30);

pub type ViewerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkerStatus {
    Starting,
    Running,
    Stopping,
    Stopped,
    Error,
}

impl WorkerStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Error => "ERROR",
        }
    }
}

// -- Viewer set ---------------------------------------------------------------

/// Attached viewers of one worker, each behind a bounded frame queue.
pub struct ViewerSet {
    slots: RwLock<HashMap<ViewerId, mpsc::Sender<Bytes>>>,
    next_id: AtomicU64,
    max_viewers: usize,
    last_activity: RwLock<Instant>,
}

impl ViewerSet {
    pub fn new(max_viewers: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            max_viewers,
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Attach a viewer. Fails when the per-camera cap is reached; the
    /// cap check and insertion happen under one lock so the count can
    /// never overshoot.
    pub async fn add(&self) -> Option<(ViewerId, mpsc::Receiver<Bytes>)> {
        let mut slots = self.slots.write().await;
        if slots.len() >= self.max_viewers {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(VIEWER_QUEUE_DEPTH);
        slots.insert(id, tx);
        *self.last_activity.write().await = Instant::now();
        Some((id, rx))
    }

    pub async fn remove(&self, id: ViewerId) -> bool {
        self.slots.write().await.remove(&id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Fan a frame out to every viewer. Queue overflow (or a gone
    /// receiver) drops that viewer; the pump never waits. Frame order
    /// within each surviving viewer is the send order.
    pub async fn broadcast(&self, frame: Bytes) -> usize {
        let mut slots = self.slots.write().await;
        if slots.is_empty() {
            return 0;
        }

        let mut dropped: Vec<ViewerId> = Vec::new();
        for (id, tx) in slots.iter() {
            if tx.try_send(frame.clone()).is_err() {
                dropped.push(*id);
            }
        }
        for id in &dropped {
            slots.remove(id);
            tracing::warn!(viewer_id = *id, "dropping viewer: frame queue overflow");
        }

        *self.last_activity.write().await = Instant::now();
        slots.len()
    }

    /// Disconnect every viewer by dropping their queues.
    pub async fn clear(&self) {
        self.slots.write().await.clear();
    }

    /// How long the worker has been without any viewer activity.
    pub async fn idle_for(&self) -> Duration {
        self.last_activity.read().await.elapsed()
    }
}

// -- Worker record ------------------------------------------------------------

/// Everything a supervisor needs to run one worker.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub camera_id: String,
    pub rtsp_url: String,
    pub profile: StreamProfile,
    pub ffmpeg_bin: String,
    pub hls_dir: PathBuf,
    pub restart_delay: Duration,
    pub max_restarts: u32,
    pub max_viewers: usize,
}

impl WorkerSpec {
    pub fn from_config(
        config: &GatewayConfig,
        source: &CameraSource,
        profile: StreamProfile,
    ) -> Self {
        Self {
            camera_id: source.camera_id.clone(),
            rtsp_url: source.rtsp_url.clone(),
            profile,
            ffmpeg_bin: config.ffmpeg_bin.clone(),
            hls_dir: config.hls_dir.clone(),
            restart_delay: config.auto_restart_delay(),
            max_restarts: config.max_restarts,
            max_viewers: config.max_viewers_per_camera,
        }
    }
}

/// Supervised per-camera worker record.
pub struct StreamWorker {
    pub camera_id: String,
    pub profile: StreamProfile,
    pub viewers: ViewerSet,
    pub restart_count: AtomicU32,
    pub started_at: DateTime<Utc>,
    pub cancel: CancellationToken,
    status: RwLock<WorkerStatus>,
    last_error: RwLock<Option<String>>,
}

/// Snapshot of one worker for the `/health` endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSnapshot {
    pub camera_id: String,
    pub profile: &'static str,
    pub status: WorkerStatus,
    pub viewer_count: usize,
    pub restart_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl StreamWorker {
    fn new(spec: &WorkerSpec, cancel: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            camera_id: spec.camera_id.clone(),
            profile: spec.profile,
            viewers: ViewerSet::new(spec.max_viewers),
            restart_count: AtomicU32::new(0),
            started_at: Utc::now(),
            cancel,
            status: RwLock::new(WorkerStatus::Starting),
            last_error: RwLock::new(None),
        })
    }

    pub async fn current_status(&self) -> WorkerStatus {
        *self.status.read().await
    }

    async fn set_status(&self, next: WorkerStatus) {
        let mut status = self.status.write().await;
        if *status != next {
            tracing::debug!(
                camera_id = %self.camera_id,
                prev = %status.label(),
                next = %next.label(),
                "worker status"
            );
            *status = next;
        }
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    async fn record_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
        self.set_status(WorkerStatus::Error).await;
    }

    pub async fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            camera_id: self.camera_id.clone(),
            profile: self.profile.label(),
            status: self.current_status().await,
            viewer_count: self.viewers.count().await,
            restart_count: self.restart_count.load(Ordering::Relaxed),
            last_error: self.last_error().await,
            started_at: self.started_at,
        }
    }

    /// Request a graceful stop; the supervisor completes it.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

// -- Supervisor loop ----------------------------------------------------------

enum PumpExit {
    Cancelled,
    ChildExited,
}

/// Run one worker to completion: spawn the child, pump frames, restart
/// on unexpected exits up to the cap, and honor graceful stops.
pub async fn run_supervisor(worker: Arc<StreamWorker>, spec: WorkerSpec) {
    let masked_url = mask_credentials(&spec.rtsp_url);

    loop {
        if worker.cancel.is_cancelled() {
            worker.set_status(WorkerStatus::Stopped).await;
            return;
        }

        worker.set_status(WorkerStatus::Starting).await;
        tracing::info!(
            camera_id = %spec.camera_id,
            url = %masked_url,
            profile = spec.profile.label(),
            "starting stream worker"
        );

        if spec.profile == StreamProfile::Hls {
            let segment_dir = spec.hls_dir.join(&spec.camera_id);
            if let Err(e) = tokio::fs::create_dir_all(&segment_dir).await {
                tracing::warn!(camera_id = %spec.camera_id, err = %e, "cannot create HLS dir");
            }
        }

        let args = ffmpeg::build_args(&spec.rtsp_url, spec.profile, &spec.hls_dir, &spec.camera_id);
        match ffmpeg::spawn(&spec.ffmpeg_bin, &args) {
            Ok(mut child) => match pump_frames(&worker, &mut child).await {
                PumpExit::Cancelled => {
                    graceful_stop(&worker, child).await;
                    worker.viewers.clear().await;
                    worker.set_status(WorkerStatus::Stopped).await;
                    tracing::info!(camera_id = %spec.camera_id, "stream worker stopped");
                    return;
                }
                PumpExit::ChildExited => {
                    let detail = match child.wait().await {
                        Ok(status) => format!("child exited unexpectedly: {status}"),
                        Err(e) => format!("child wait failed: {e}"),
                    };
                    tracing::warn!(camera_id = %spec.camera_id, %detail, "worker error");
                    worker.record_error(detail).await;
                }
            },
            Err(e) => {
                tracing::warn!(camera_id = %spec.camera_id, err = %e, "failed to spawn media tool");
                worker.record_error(format!("failed to spawn media tool: {e}")).await;
            }
        }

        let failures = worker.restart_count.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= spec.max_restarts {
            tracing::error!(
                camera_id = %spec.camera_id,
                failures,
                "max restart attempts reached; worker permanently failed"
            );
            worker.record_error("Max restart attempts reached".to_owned()).await;
            worker.viewers.clear().await;
            return;
        }

        tracing::info!(
            camera_id = %spec.camera_id,
            failures,
            delay_ms = spec.restart_delay.as_millis() as u64,
            "scheduling worker restart"
        );
        tokio::select! {
            _ = worker.cancel.cancelled() => {
                worker.set_status(WorkerStatus::Stopped).await;
                return;
            }
            _ = tokio::time::sleep(spec.restart_delay) => {}
        }
    }
}

/// Read child output and fan frames out until cancellation or exit.
/// The first successful read moves the worker to RUNNING.
async fn pump_frames(worker: &StreamWorker, child: &mut Child) -> PumpExit {
    let Some(mut stdout) = child.stdout.take() else {
        return PumpExit::ChildExited;
    };
    let mut buf = BytesMut::with_capacity(32 * 1024);

    loop {
        tokio::select! {
            _ = worker.cancel.cancelled() => return PumpExit::Cancelled,

            read = stdout.read_buf(&mut buf) => match read {
                Ok(0) => return PumpExit::ChildExited,
                Ok(_) => {
                    if worker.current_status().await == WorkerStatus::Starting {
                        worker.set_status(WorkerStatus::Running).await;
                        tracing::info!(camera_id = %worker.camera_id, "stream worker producing output");
                    }
                    let frame = buf.split().freeze();
                    worker.viewers.broadcast(frame).await;
                }
                Err(e) => {
                    tracing::warn!(camera_id = %worker.camera_id, err = %e, "worker read error");
                    return PumpExit::ChildExited;
                }
            }
        }
    }
}

/// SIGTERM, then a hard kill if the child outlives the grace period.
async fn graceful_stop(worker: &StreamWorker, mut child: Child) {
    worker.set_status(WorkerStatus::Stopping).await;

    if let Some(pid) = child.id().and_then(|p| i32::try_from(p).ok()) {
        let _ = signal::kill(Pid::from_raw(pid), Signal::SIGTERM);
    }

    match tokio::time::timeout(STOP_GRACE, child.wait()).await {
        Ok(_) => {}
        Err(_) => {
            tracing::warn!(camera_id = %worker.camera_id, "worker ignored SIGTERM; killing");
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }
}

// -- Worker table -------------------------------------------------------------

type WorkerKey = (String, StreamProfile);

/// Shared table of live workers, keyed by camera and profile.
#[derive(Default)]
pub struct WorkerTable {
    workers: RwLock<HashMap<WorkerKey, Arc<StreamWorker>>>,
}

impl WorkerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live worker for a camera/profile pair, starting one
    /// when none exists or the previous one is stopped or failed.
    pub async fn acquire(
        &self,
        spec: WorkerSpec,
        shutdown: &CancellationToken,
    ) -> Arc<StreamWorker> {
        let key = (spec.camera_id.clone(), spec.profile);
        let mut workers = self.workers.write().await;

        if let Some(existing) = workers.get(&key) {
            match existing.current_status().await {
                WorkerStatus::Starting | WorkerStatus::Running => return Arc::clone(existing),
                WorkerStatus::Stopping | WorkerStatus::Stopped | WorkerStatus::Error => {
                    existing.stop();
                }
            }
        }

        let worker = StreamWorker::new(&spec, shutdown.child_token());
        workers.insert(key, Arc::clone(&worker));
        tokio::spawn(run_supervisor(Arc::clone(&worker), spec));
        worker
    }

    pub async fn get(&self, camera_id: &str, profile: StreamProfile) -> Option<Arc<StreamWorker>> {
        self.workers.read().await.get(&(camera_id.to_owned(), profile)).map(Arc::clone)
    }

    pub async fn snapshot(&self) -> Vec<Arc<StreamWorker>> {
        self.workers.read().await.values().map(Arc::clone).collect()
    }

    /// Drop table entries whose supervisor has fully stopped.
    pub async fn remove_stopped(&self) {
        let mut workers = self.workers.write().await;
        let mut stopped: Vec<WorkerKey> = Vec::new();
        for (key, worker) in workers.iter() {
            if worker.current_status().await == WorkerStatus::Stopped {
                stopped.push(key.clone());
            }
        }
        for key in stopped {
            workers.remove(&key);
        }
    }
}

/// Spawn the idle-worker reaper: a worker left without viewers past the
/// configured timeout is stopped, and fully stopped workers leave the
/// table.
pub fn spawn_idle_reaper(state: Arc<crate::state::GatewayState>) {
    let timeout = state.config.stream_timeout_no_viewers();

    tokio::spawn(async move {
        let mut timer = tokio::time::interval(IDLE_REAPER_INTERVAL);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = state.shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            for worker in state.workers.snapshot().await {
                let status = worker.current_status().await;
                let running =
                    matches!(status, WorkerStatus::Starting | WorkerStatus::Running);
                if running
                    && worker.viewers.count().await == 0
                    && worker.viewers.idle_for().await > timeout
                {
                    tracing::info!(
                        camera_id = %worker.camera_id,
                        "stopping idle stream worker"
                    );
                    worker.stop();
                }
            }

            state.workers.remove_stopped().await;
        }
    });
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
