use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

pub const DEFAULT_STEP: f64 = 0.2;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10);

/// Drives the wave phase and asks for repaints.
///
/// The phase is stored as f64 bits in an atomic so the ticker thread can
/// advance it while the render thread reads a snapshot. Repaint requests are a
/// single flag, so any number of ticks between two frames collapse into one
/// pending repaint.
#[derive(Debug)]
pub struct AnimationClock {
    phase: AtomicU64,
    step: f64,
    ticks: AtomicU64,
    repaint: AtomicBool,
}

impl AnimationClock {
    pub fn new(start: f64, step: f64) -> Self {
        Self {
            phase: AtomicU64::new(start.to_bits()),
            step,
            ticks: AtomicU64::new(0),
            repaint: AtomicBool::new(false),
        }
    }

    pub fn tick(&self) {
        let step = self.step;
        // the closure always returns Some, so this never fails
        let _ = self
            .phase
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + step).to_bits())
            });
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.repaint.store(true, Ordering::Release);
    }

    pub fn phase(&self) -> f64 {
        f64::from_bits(self.phase.load(Ordering::Acquire))
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Ask for a repaint without moving the phase.
    pub fn invalidate(&self) {
        self.repaint.store(true, Ordering::Release);
    }

    /// Consume the pending repaint, if any.
    pub fn take_repaint(&self) -> bool {
        self.repaint.swap(false, Ordering::AcqRel)
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(0.0, DEFAULT_STEP)
    }
}

/// Background thread that calls [`AnimationClock::tick`] every `interval`.
/// Stops and joins when dropped.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(clock: Arc<AnimationClock>, interval: Duration) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("wave-ticker".into())
            .spawn(move || {
                debug!("Ticker running every {:?}", interval);
                while !thread_stop.load(Ordering::Acquire) {
                    thread::sleep(interval);
                    clock.tick();
                }
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Ticker thread panicked");
            }
        }
    }
}
