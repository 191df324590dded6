//! One worker thread per camera, each owning its own [`CameraPipeline`].

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{error, info, warn};

use crate::config::{PipelineConfig, WorkerConfig};
use crate::counting::{CountSnapshot, SharedCounts};
use crate::error::{ConfigError, WorkerError};
use crate::integration::pipeline::CameraPipeline;
use crate::integration::report::{FrameInput, FrameReport};
use crate::tracker::TrackIdAllocator;

/// Outgoing transport for frame reports.
pub trait ReportSink: Send + Sync {
    fn emit(&self, report: FrameReport);
}

impl ReportSink for Sender<FrameReport> {
    fn emit(&self, report: FrameReport) {
        if self.send(report).is_err() {
            warn!("Report receiver dropped, discarding report");
        }
    }
}

/// What happened to a submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Queued,
    /// The queue was full; its oldest frame was discarded to make room.
    ReplacedOldest,
    /// The queue stayed full even after eviction and this frame was discarded.
    Dropped,
}

/// Bounded send with a drop-oldest policy.
fn push_drop_oldest(
    queue: &Sender<FrameInput>,
    evict: &Receiver<FrameInput>,
    frame: FrameInput,
) -> Result<Submission, WorkerError> {
    match queue.try_send(frame) {
        Ok(()) => Ok(Submission::Queued),
        Err(TrySendError::Full(frame)) => {
            // The worker may have drained the queue in the meantime.
            let evicted = evict.try_recv().is_ok();
            match queue.try_send(frame) {
                Ok(()) if evicted => Ok(Submission::ReplacedOldest),
                Ok(()) => Ok(Submission::Queued),
                Err(TrySendError::Full(frame)) => {
                    warn!("[Camera {}] Queue still full, dropping frame", frame.camera_id);
                    Ok(Submission::Dropped)
                }
                Err(TrySendError::Disconnected(_)) => Err(WorkerError::Stopped),
            }
        }
        Err(TrySendError::Disconnected(_)) => Err(WorkerError::Stopped),
    }
}

struct CameraWorker {
    queue: Sender<FrameInput>,
    /// Producer-side handle used only to evict the oldest queued frame.
    evict: Receiver<FrameInput>,
    counts: SharedCounts,
    handle: Option<JoinHandle<()>>,
}

/// Routes frames to per-camera workers, spawning them on first sight.
pub struct CameraRegistry {
    config: PipelineConfig,
    worker_config: WorkerConfig,
    running: Arc<AtomicBool>,
    ids: TrackIdAllocator,
    sink: Arc<dyn ReportSink>,
    workers: HashMap<String, CameraWorker>,
}

impl CameraRegistry {
    pub fn new(
        config: PipelineConfig,
        worker_config: WorkerConfig,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        worker_config.validate()?;
        Ok(Self {
            config,
            worker_config,
            running: Arc::new(AtomicBool::new(true)),
            ids: TrackIdAllocator::new(),
            sink,
            workers: HashMap::new(),
        })
    }

    /// Queue a frame for its camera's worker. When the queue is full the
    /// oldest pending frame is dropped in favour of this one.
    pub fn submit(&mut self, frame: FrameInput) -> Result<Submission, WorkerError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(WorkerError::Stopped);
        }
        if !self.workers.contains_key(&frame.camera_id) {
            let worker = self.spawn_worker(&frame.camera_id)?;
            self.workers.insert(frame.camera_id.clone(), worker);
        }
        let Some(worker) = self.workers.get(&frame.camera_id) else {
            return Err(WorkerError::Stopped);
        };
        if worker.handle.as_ref().is_none_or(JoinHandle::is_finished) {
            return Err(WorkerError::Exited {
                camera_id: frame.camera_id,
            });
        }

        push_drop_oldest(&worker.queue, &worker.evict, frame)
    }

    fn spawn_worker(&self, camera_id: &str) -> Result<CameraWorker, WorkerError> {
        let (queue, rx) = crossbeam_channel::bounded(self.worker_config.queue_capacity);
        let counts = SharedCounts::new();
        let pipeline =
            CameraPipeline::new(camera_id, self.config.clone()).with_id_allocator(self.ids.clone());
        counts.publish(pipeline.counts());

        let job = WorkerJob {
            pipeline,
            frames: rx.clone(),
            running: Arc::clone(&self.running),
            poll_timeout: self.worker_config.poll_timeout(),
            sink: Arc::clone(&self.sink),
            counts: counts.clone(),
        };
        let handle = thread::Builder::new()
            .name(format!("camera-{camera_id}"))
            .spawn(move || job.run())
            .map_err(|source| WorkerError::Spawn {
                camera_id: camera_id.to_owned(),
                source,
            })?;

        Ok(CameraWorker {
            queue,
            evict: rx,
            counts,
            handle: Some(handle),
        })
    }

    /// Latest published counts for a camera.
    pub fn counts(&self, camera_id: &str) -> Option<CountSnapshot> {
        self.workers.get(camera_id).map(|w| w.counts.snapshot())
    }

    pub fn cameras(&self) -> impl Iterator<Item = &str> {
        self.workers.keys().map(String::as_str)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Clear the running flag and wait for every worker to finish its current frame.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        for (camera_id, worker) in self.workers.iter_mut() {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    error!("[Camera {camera_id}] Worker panicked");
                }
            }
        }
    }
}

impl Drop for CameraRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct WorkerJob {
    pipeline: CameraPipeline,
    frames: Receiver<FrameInput>,
    running: Arc<AtomicBool>,
    poll_timeout: Duration,
    sink: Arc<dyn ReportSink>,
    counts: SharedCounts,
}

impl WorkerJob {
    fn run(mut self) {
        let camera_id = self.pipeline.camera_id().to_owned();
        info!("[Camera {camera_id}] Frame processing worker started");

        while self.running.load(Ordering::Acquire) {
            let frame = match self.frames.recv_timeout(self.poll_timeout) {
                Ok(frame) => frame,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.handle_frame(&frame)));
            if outcome.is_err() {
                error!("[Camera {camera_id}] Panic while handling frame {}", frame.image_id);
            }
        }

        info!("[Camera {camera_id}] Frame processing worker stopped");
    }

    fn handle_frame(&mut self, frame: &FrameInput) {
        match self.pipeline.process(frame) {
            Ok(report) => {
                self.counts.publish(self.pipeline.counts());
                if !report.detections.is_empty() {
                    self.sink.emit(report);
                }
            }
            Err(e) => warn!(
                "[Camera {}] Skipping frame {}: {e}",
                frame.camera_id, frame.image_id
            ),
        }
    }
}
