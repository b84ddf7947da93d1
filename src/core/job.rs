//! Cancellable background mixing jobs
//!
//! A [`JobController`] runs at most one mix-and-reconstruct job at a time on a
//! named worker thread. Each job owns its cancellation flag and progress cell
//! and is identified by a monotonically increasing generation id, so a job
//! that was replaced can never overwrite an output port.
//!
//! Progress moves through fixed checkpoints: 10 before mixing, 50 after the
//! mix, 70 after the un-shift, 90 after the inverse transform, 100 when done.
//! Cancellation is cooperative and observed after the mix, after the inverse
//! transform and once more before the result is committed.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use super::dsp::{Fft2d, Grid};
use super::mixer::{self, common_shape};
use super::reconstruct::{inverse_real, normalize_output, unshift};
use super::spectrum::Spectrum;
use crate::config::{MixSettings, OutputPort};
use crate::error::{MixResult, MixerError};

/// Controller tunables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobConfig {
    /// How long `start` waits for a replaced job to exit
    pub cancel_wait: Duration,
    /// Invoke the callback for cancelled jobs (with [`JobResult::Cancelled`])
    pub notify_on_cancel: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            cancel_wait: Duration::from_secs(1),
            notify_on_cancel: true,
        }
    }
}

/// Lifecycle of the most recent job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Idle,
    Processing,
    Completed,
    Cancelled,
    Failed,
}

impl JobPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => JobPhase::Processing,
            2 => JobPhase::Completed,
            3 => JobPhase::Cancelled,
            4 => JobPhase::Failed,
            _ => JobPhase::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            JobPhase::Idle => 0,
            JobPhase::Processing => 1,
            JobPhase::Completed => 2,
            JobPhase::Cancelled => 3,
            JobPhase::Failed => 4,
        }
    }
}

/// What a job produced
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    /// Normalized output, already written to the job's port
    Completed(Grid<f64>),
    Cancelled,
    Failed(String),
}

impl JobResult {
    pub fn phase(&self) -> JobPhase {
        match self {
            JobResult::Completed(_) => JobPhase::Completed,
            JobResult::Cancelled => JobPhase::Cancelled,
            JobResult::Failed(_) => JobPhase::Failed,
        }
    }

    pub fn image(&self) -> Option<&Grid<f64>> {
        match self {
            JobResult::Completed(image) => Some(image),
            _ => None,
        }
    }
}

/// Result of one job, tagged with its generation and target port
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub generation: u64,
    pub port: OutputPort,
    pub result: JobResult,
}

#[derive(Debug)]
struct JobState {
    generation: u64,
    port: OutputPort,
    progress: AtomicU8,
    cancelled: AtomicBool,
    phase: AtomicU8,
}

impl JobState {
    fn new(generation: u64, port: OutputPort) -> Self {
        Self {
            generation,
            port,
            progress: AtomicU8::new(0),
            cancelled: AtomicBool::new(false),
            phase: AtomicU8::new(JobPhase::Processing.as_u8()),
        }
    }

    fn phase(&self) -> JobPhase {
        JobPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    fn is_processing(&self) -> bool {
        self.phase() == JobPhase::Processing
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// View of the running job handed to its work function
pub struct JobContext {
    state: Arc<JobState>,
}

impl JobContext {
    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    /// Record a progress checkpoint; progress never moves backwards
    pub fn checkpoint(&self, progress: u8) {
        let progress = progress.min(100);
        self.state.progress.fetch_max(progress, Ordering::AcqRel);
        debug!("Job {}: {}%", self.state.generation, progress);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// `Err(Cancelled)` once cancellation has been requested
    pub fn ensure_active(&self) -> MixResult<()> {
        if self.state.is_cancelled() {
            Err(MixerError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Caller-side handle to one job
#[derive(Debug)]
pub struct JobHandle {
    state: Arc<JobState>,
    outcome: Receiver<JobOutcome>,
    exited: Receiver<()>,
}

impl JobHandle {
    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn port(&self) -> OutputPort {
        self.state.port
    }

    pub fn progress(&self) -> u8 {
        self.state.progress.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> JobPhase {
        self.state.phase()
    }

    /// Request cancellation of this job; false if it already finished
    pub fn cancel(&self) -> bool {
        if self.state.is_processing() {
            self.state.cancel();
            true
        } else {
            false
        }
    }

    pub fn is_finished(&self) -> bool {
        !self.state.is_processing()
    }

    /// Block until the job reports its outcome
    pub fn wait(self) -> MixResult<JobOutcome> {
        self.outcome
            .recv()
            .map_err(|_| MixerError::JobFailed("worker exited without reporting".to_string()))
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<JobOutcome> {
        self.outcome.recv_timeout(timeout).ok()
    }

    pub fn try_outcome(&self) -> Option<JobOutcome> {
        self.outcome.try_recv().ok()
    }

    /// Block until the worker thread has exited, up to `timeout`
    pub fn join_timeout(&self, timeout: Duration) -> bool {
        wait_exit(&self.exited, timeout)
    }
}

struct RunningJob {
    state: Arc<JobState>,
    exited: Receiver<()>,
}

struct Shared {
    outputs: Mutex<[Option<Grid<f64>>; 2]>,
    last_error: Mutex<Option<String>>,
}

/// Single-flight job runner with two output ports
pub struct JobController {
    config: JobConfig,
    shared: Arc<Shared>,
    next_generation: AtomicU64,
    current: Mutex<Option<RunningJob>>,
    // Serializes `start_with` so only one replacement waits at a time
    start_gate: Mutex<()>,
}

impl JobController {
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                outputs: Mutex::new([None, None]),
                last_error: Mutex::new(None),
            }),
            next_generation: AtomicU64::new(0),
            current: Mutex::new(None),
            start_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Start mixing `spectra` with `settings`, replacing any running job.
    ///
    /// Shapes and weight counts are validated before the job is spawned.
    pub fn start<C>(
        &self,
        spectra: Vec<Arc<Spectrum>>,
        settings: MixSettings,
        port: OutputPort,
        callback: C,
    ) -> MixResult<JobHandle>
    where
        C: FnOnce(&JobOutcome) + Send + 'static,
    {
        {
            let refs: Vec<&Spectrum> = spectra.iter().map(|s| s.as_ref()).collect();
            common_shape(&refs)?;
        }
        if settings.slot_count() != spectra.len() {
            return Err(MixerError::InvalidWeight(format!(
                "weights describe {} slots but {} spectra were supplied",
                settings.slot_count(),
                spectra.len()
            )));
        }

        self.start_with(port, move |ctx| run_pipeline(ctx, &spectra, &settings), callback)
    }

    /// Start an arbitrary unit of work under the controller's rules.
    ///
    /// `work` reports progress through the [`JobContext`] and returns
    /// `Err(MixerError::Cancelled)` when it stops early.
    pub fn start_with<W, C>(&self, port: OutputPort, work: W, callback: C) -> MixResult<JobHandle>
    where
        W: FnOnce(&JobContext) -> MixResult<Grid<f64>> + Send + 'static,
        C: FnOnce(&JobOutcome) + Send + 'static,
    {
        let _gate = lock(&self.start_gate);

        // Waiting happens outside `current` so progress and cancel stay readable
        let previous = lock(&self.current)
            .as_ref()
            .map(|job| (Arc::clone(&job.state), job.exited.clone()));
        if let Some((state, exited)) = previous {
            if state.is_processing() {
                state.cancel();
                debug!(
                    "Job {}: cancel requested by replacement, waiting up to {:?}",
                    state.generation, self.config.cancel_wait
                );
                if !wait_exit(&exited, self.config.cancel_wait) {
                    warn!(
                        "Job {} did not exit within {:?}; it will finish as cancelled",
                        state.generation, self.config.cancel_wait
                    );
                }
            }
        }

        let generation = self.next_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let state = Arc::new(JobState::new(generation, port));
        let (outcome_tx, outcome_rx) = bounded(1);
        let (exit_tx, exit_rx) = bounded::<()>(0);

        let worker = Worker {
            state: Arc::clone(&state),
            shared: Arc::clone(&self.shared),
            notify_on_cancel: self.config.notify_on_cancel,
            outcome: outcome_tx,
            _exit: exit_tx,
        };

        thread::Builder::new()
            .name(format!("mix-job-{}", generation))
            .spawn(move || worker.run(work, callback))
            .map_err(|e| MixerError::JobFailed(format!("failed to spawn worker: {}", e)))?;

        debug!("Job {} started for port {}", generation, port.index());
        *lock(&self.current) = Some(RunningJob {
            state: Arc::clone(&state),
            exited: exit_rx.clone(),
        });

        Ok(JobHandle {
            state,
            outcome: outcome_rx,
            exited: exit_rx,
        })
    }

    /// Request cancellation of the running job; false if none is running
    pub fn cancel(&self) -> bool {
        match lock(&self.current).as_ref() {
            Some(job) if job.state.is_processing() => {
                job.state.cancel();
                info!("Job {}: cancellation requested", job.state.generation);
                true
            }
            _ => false,
        }
    }

    /// Last checkpoint of the most recent job, 0 before any job
    pub fn progress(&self) -> u8 {
        lock(&self.current)
            .as_ref()
            .map(|job| job.state.progress.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    pub fn is_processing(&self) -> bool {
        self.phase() == JobPhase::Processing
    }

    pub fn phase(&self) -> JobPhase {
        lock(&self.current)
            .as_ref()
            .map(|job| job.state.phase())
            .unwrap_or(JobPhase::Idle)
    }

    /// Generation of the most recent job, 0 before any job
    pub fn generation(&self) -> u64 {
        self.next_generation.load(Ordering::Acquire)
    }

    /// Message of the most recent failed job
    pub fn last_error(&self) -> Option<String> {
        lock(&self.shared.last_error).clone()
    }

    pub fn output(&self, port: OutputPort) -> Option<Grid<f64>> {
        lock(&self.shared.outputs)[port.index()].clone()
    }

    pub fn set_output(&self, port: OutputPort, image: Grid<f64>) {
        lock(&self.shared.outputs)[port.index()] = Some(image);
    }

    pub fn clear_outputs(&self) {
        *lock(&self.shared.outputs) = [None, None];
        *lock(&self.shared.last_error) = None;
    }

    /// Wait for the current worker thread to exit; true if idle within `timeout`
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        let exited = match lock(&self.current).as_ref() {
            Some(job) => job.exited.clone(),
            None => return true,
        };
        wait_exit(&exited, timeout)
    }
}

impl Default for JobController {
    fn default() -> Self {
        Self::new(JobConfig::default())
    }
}

struct Worker {
    state: Arc<JobState>,
    shared: Arc<Shared>,
    notify_on_cancel: bool,
    outcome: Sender<JobOutcome>,
    // Dropped when the worker returns; observers see the channel disconnect
    _exit: Sender<()>,
}

impl Worker {
    fn run<W, C>(self, work: W, callback: C)
    where
        W: FnOnce(&JobContext) -> MixResult<Grid<f64>>,
        C: FnOnce(&JobOutcome),
    {
        let generation = self.state.generation;
        let ctx = JobContext {
            state: Arc::clone(&self.state),
        };

        let result = match panic::catch_unwind(AssertUnwindSafe(|| work(&ctx))) {
            Ok(Ok(image)) => self.commit(image),
            Ok(Err(MixerError::Cancelled)) => JobResult::Cancelled,
            Ok(Err(e)) => JobResult::Failed(e.to_string()),
            Err(payload) => JobResult::Failed(panic_message(payload.as_ref())),
        };

        match &result {
            JobResult::Completed(image) => {
                info!("Job {} completed: {:?} output", generation, image.shape());
                *lock(&self.shared.last_error) = None;
            }
            JobResult::Cancelled => warn!("Job {} cancelled", generation),
            JobResult::Failed(message) => {
                error!("Job {} failed: {}", generation, message);
                *lock(&self.shared.last_error) = Some(message.clone());
            }
        }

        let outcome = JobOutcome {
            generation,
            port: self.state.port,
            result,
        };

        if self.notify_on_cancel || outcome.result != JobResult::Cancelled {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(&outcome))).is_err() {
                error!("Job {}: completion callback panicked", generation);
            }
        }

        self.state
            .phase
            .store(outcome.result.phase().as_u8(), Ordering::Release);
        // The handle may already be gone
        let _ = self.outcome.send(outcome);
    }

    /// Write the output port unless cancellation arrived first
    fn commit(&self, image: Grid<f64>) -> JobResult {
        let mut outputs = lock(&self.shared.outputs);
        if self.state.is_cancelled() {
            return JobResult::Cancelled;
        }
        outputs[self.state.port.index()] = Some(image.clone());
        JobResult::Completed(image)
    }
}

/// Mix, un-shift, inverse transform and normalize with progress checkpoints
pub fn run_pipeline(
    ctx: &JobContext,
    spectra: &[Arc<Spectrum>],
    settings: &MixSettings,
) -> MixResult<Grid<f64>> {
    ctx.checkpoint(10);
    let refs: Vec<&Spectrum> = spectra.iter().map(|s| s.as_ref()).collect();
    let mixed = mixer::mix(&refs, settings)?;
    ctx.ensure_active()?;

    ctx.checkpoint(50);
    let uncentered = unshift(&mixed);

    ctx.checkpoint(70);
    let image = inverse_real(&mut Fft2d::new(), &uncentered);
    ctx.ensure_active()?;

    ctx.checkpoint(90);
    let output = normalize_output(&image);

    ctx.checkpoint(100);
    Ok(output)
}

/// True once the worker behind `exited` has dropped its sender
fn wait_exit(exited: &Receiver<()>, timeout: Duration) -> bool {
    match exited.recv_timeout(timeout) {
        Err(RecvTimeoutError::Disconnected) | Ok(()) => true,
        Err(RecvTimeoutError::Timeout) => false,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("job panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("job panicked: {}", message)
    } else {
        "job panicked".to_string()
    }
}
