use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::RendererError;
use crate::uniforms::UniformStore;

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let elapsed = self.origin.elapsed();
        let sample = TimeSample::new(elapsed.as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Synthetic clock advancing by a fixed delta on every sample, starting at zero.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepTimeSource {
    step: f32,
    frame: u64,
}

impl FixedStepTimeSource {
    pub fn new(step: f32) -> Self {
        Self { step, frame: 0 }
    }
}

impl TimeSource for FixedStepTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.frame as f32 * self.step, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Whatever consumes the uniform snapshot once per tick.
pub trait DrawTarget {
    type Error;

    fn draw(&mut self, uniforms: &UniformStore) -> Result<(), Self::Error>;
}

/// Blocks until the host is ready for the next frame (vsync, a timer, a test step).
pub trait FramePacer {
    fn wait_for_next_frame(&mut self);
}

/// Pacer for hosts where presentation itself blocks, such as a FIFO swapchain.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentPacer;

impl FramePacer for PresentPacer {
    fn wait_for_next_frame(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Running,
    Stopped,
}

/// Cloneable, thread-safe request to end a [`RenderLoop`].
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

struct FrameStats {
    last_update: Instant,
    frames_since_update: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frames_since_update: 0,
        }
    }

    fn record(&mut self, sample: TimeSample) {
        self.frames_since_update += 1;
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_update);
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames_since_update as f32 / elapsed.as_secs_f32();
            debug!(
                fps = fps.round(),
                frame_count = sample.frame_index + 1,
                time = sample.seconds,
                "render stats"
            );
            self.frames_since_update = 0;
            self.last_update = now;
        }
    }
}

/// Drives the per-frame cycle: sample the clock, write the elapsed time, draw.
///
/// ```text
///   Idle ──start()──▶ Running ──stop() / StopHandle──▶ Stopped
/// ```
///
/// A loop is started once and never restarts.
pub struct RenderLoop {
    phase: LoopPhase,
    clock: BoxedTimeSource,
    stop: StopHandle,
    frames: u64,
    stats: FrameStats,
}

impl RenderLoop {
    pub fn new(clock: BoxedTimeSource) -> Self {
        Self::with_stop_handle(clock, StopHandle::new())
    }

    /// Shares `stop` so a caller created before the loop can end it.
    pub fn with_stop_handle(clock: BoxedTimeSource, stop: StopHandle) -> Self {
        Self {
            phase: LoopPhase::Idle,
            clock,
            stop,
            frames: 0,
            stats: FrameStats::new(),
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn start(&mut self) -> Result<(), RendererError> {
        match self.phase {
            LoopPhase::Idle => {
                self.clock.reset();
                self.phase = LoopPhase::Running;
                Ok(())
            }
            LoopPhase::Running => Err(RendererError::LoopState("running")),
            LoopPhase::Stopped => Err(RendererError::LoopState("stopped")),
        }
    }

    pub fn stop(&mut self) {
        self.stop.request_stop();
        self.phase = LoopPhase::Stopped;
    }

    /// Folds a pending stop request into the phase.
    pub fn is_running(&mut self) -> bool {
        if self.phase == LoopPhase::Running && self.stop.is_stop_requested() {
            self.phase = LoopPhase::Stopped;
        }
        self.phase == LoopPhase::Running
    }

    /// Runs one frame. Returns `Ok(None)` without drawing unless running.
    pub fn tick<T>(
        &mut self,
        uniforms: &mut UniformStore,
        target: &mut T,
    ) -> Result<Option<TimeSample>, T::Error>
    where
        T: DrawTarget + ?Sized,
    {
        if !self.is_running() {
            return Ok(None);
        }

        let mut sample = self.clock.sample();
        sample.seconds = uniforms.set_elapsed_time(sample.seconds);
        target.draw(uniforms)?;

        self.frames = self.frames.saturating_add(1);
        self.stats.record(sample);
        Ok(Some(sample))
    }

    /// The explicit frame loop: tick, then wait for the pacer, until stopped.
    /// Returns the number of frames drawn by this call.
    pub fn run<T, P>(
        &mut self,
        uniforms: &mut UniformStore,
        target: &mut T,
        pacer: &mut P,
    ) -> Result<u64, T::Error>
    where
        T: DrawTarget + ?Sized,
        P: FramePacer + ?Sized,
    {
        let before = self.frames;
        while self.is_running() {
            self.tick(uniforms, target)?;
            pacer.wait_for_next_frame();
        }
        Ok(self.frames - before)
    }
}
