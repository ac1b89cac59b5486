//! # Sampling Loop
//!
//! Reads the controller every cycle and relays a frame whenever anything changed.
//!
//! ## Change Detection
//!
//! The last transmitted [`InputSnapshot`] is kept by the sampler alone. A new
//! frame goes out when any of the six live fields (four axes, buttons, keypad)
//! differs from it; the whole snapshot is then replaced. The first cycle
//! always transmits. Unchanged cycles send nothing.
//!
//! ## Pacing
//!
//! With `cycle_interval` unset the loop runs as fast as the ADC conversions
//! and GPIO reads allow, yielding to the runtime between cycles. With an
//! interval, cycles are paced by a tokio interval. Either way a detected
//! change is sent in the cycle it is seen.
//!
//! ## Threading
//!
//! ADC conversions and GPIO reads are blocking calls. [`Sampler::spawn`]
//! runs the loop on a thread from tokio's blocking pool, driving the async
//! sends through the current runtime handle, so runtime workers never stall
//! on hardware.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::{self, JoinError, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::error::{RelayError, Result};
use crate::frame::protocol::{Centers, DEFAULT_CENTER};
use crate::frame::Frame;
use crate::hardware::{AnalogSource, ControllerDevice, GpioLines, InputSnapshot};
use crate::relay::{DatagramTransport, Relay};

/// Number of transmitted frames between status log messages
pub const LOG_INTERVAL_FRAMES: u64 = 1000;

/// Period of the diagnostic dump
pub const DIAGNOSTIC_PERIOD: Duration = Duration::from_millis(100);

/// What a spawned sampler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Change-driven relay ([`Sampler::run`])
    Relay,
    /// Stdout state dump ([`Sampler::diagnostics`])
    Diagnostics,
}

/// Handle to a sampler running on a blocking thread.
///
/// Dropping the handle also stops the loop.
#[derive(Debug)]
pub struct SamplerTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<()>>,
}

impl SamplerTask {
    /// Wait for the loop to end on its own, which only a hardware error does.
    pub async fn finished(&mut self) -> Result<()> {
        joined(&mut self.handle).await
    }

    /// Stop the loop after its current cycle and wait for the thread to exit.
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop.send(());
        joined(self.handle).await
    }
}

async fn joined<F>(handle: F) -> Result<()>
where
    F: Future<Output = std::result::Result<Result<()>, JoinError>>,
{
    handle.await.map_err(|e| RelayError::Task(e.to_string()))?
}

/// Controller sampler and change-driven frame relay.
pub struct Sampler<A, G, T> {
    device: ControllerDevice<A, G>,
    relay: Relay<T>,
    centers: Centers,
    cycle_interval: Option<Duration>,
    last: Option<InputSnapshot>,
    frames_sent: u64,
}

impl<A, G, T> std::fmt::Debug for Sampler<A, G, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("centers", &self.centers)
            .field("cycle_interval", &self.cycle_interval)
            .field("frames_sent", &self.frames_sent)
            .finish_non_exhaustive()
    }
}

impl<A, G, T> Sampler<A, G, T>
where
    A: AnalogSource,
    G: GpioLines,
    T: DatagramTransport,
{
    /// Create a sampler with default centers and no pacing.
    pub fn new(device: ControllerDevice<A, G>, relay: Relay<T>) -> Self {
        Self {
            device,
            relay,
            centers: [DEFAULT_CENTER; 4],
            cycle_interval: None,
            last: None,
            frames_sent: 0,
        }
    }

    /// Set the calibration centers sent with every frame.
    #[must_use]
    pub fn with_centers(mut self, centers: Centers) -> Self {
        self.centers = centers;
        self
    }

    /// Pace cycles at `period`; `Duration::ZERO` means unpaced.
    #[must_use]
    pub fn with_cycle_interval(mut self, period: Duration) -> Self {
        self.cycle_interval = (!period.is_zero()).then_some(period);
        self
    }

    /// Re-center. Takes effect on the next transmitted frame.
    pub fn set_centers(&mut self, centers: Centers) {
        info!("Calibration centers set to {:?}", centers);
        self.centers = centers;
    }

    pub fn centers(&self) -> Centers {
        self.centers
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Run one sampling cycle
    ///
    /// # Returns
    ///
    /// * `Result<Option<Frame>>` - The frame sent this cycle, or `None` when
    ///   nothing changed
    ///
    /// # Errors
    ///
    /// Propagates `Hardware` errors from the device
    pub async fn cycle(&mut self) -> Result<Option<Frame>> {
        let snapshot = self.device.read_inputs()?;

        if self.last == Some(snapshot) {
            return Ok(None);
        }

        let frame = Frame::telemetry(snapshot.axes, self.centers, snapshot.buttons, snapshot.keys);
        let delivered = self.relay.send_frame(&frame).await;
        self.last = Some(snapshot);
        self.frames_sent += 1;

        debug!(
            "Frame {:?} buttons 0x{:02X} keys 0x{:04X} -> {} destinations",
            snapshot.axes,
            snapshot.buttons,
            snapshot.keys,
            delivered
        );
        if self.frames_sent % LOG_INTERVAL_FRAMES == 0 {
            info!("Sent {} frames", self.frames_sent);
        }

        Ok(Some(frame))
    }

    /// Sample forever
    ///
    /// Only returns on a hardware error.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Starting sampling loop ({} destinations, {})",
            self.relay.destinations().len(),
            match self.cycle_interval {
                Some(p) => format!("every {} ms", p.as_millis()),
                None => "unpaced".to_string(),
            }
        );

        let mut ticker = self.cycle_interval.map(|period| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            match ticker.as_mut() {
                Some(t) => {
                    t.tick().await;
                }
                None => tokio::task::yield_now().await,
            }

            if let Err(e) = self.cycle().await {
                error!("Sampling loop stopped: {}", e);
                return Err(e);
            }
        }
    }

    /// Move the sampler onto a blocking-pool thread and run `mode` there
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(self, mode: LoopMode) -> SamplerTask
    where
        A: Send + 'static,
        G: Send + 'static,
        T: 'static,
    {
        let runtime = Handle::current();
        let (stop, stopped) = oneshot::channel::<()>();

        let handle = task::spawn_blocking(move || {
            let mut sampler = self;
            runtime.block_on(async move {
                let work = async {
                    match mode {
                        LoopMode::Relay => sampler.run().await,
                        LoopMode::Diagnostics => sampler.diagnostics().await,
                    }
                };
                tokio::select! {
                    result = work => result,
                    _ = stopped => {
                        info!("Sampling loop stopped after {} frames", sampler.frames_sent);
                        Ok(())
                    }
                }
            })
        });

        SamplerTask { stop, handle }
    }

    /// Print one line of raw state every 100 ms, forever
    ///
    /// Writes to stdout; nothing is relayed.
    pub async fn diagnostics(&mut self) -> Result<()> {
        let mut ticker = interval(DIAGNOSTIC_PERIOD);
        loop {
            ticker.tick().await;
            let snapshot = self.device.read_inputs()?;
            println!("{}", diagnostic_line(&snapshot));
        }
    }
}

/// Render a snapshot for the diagnostic dump.
pub fn diagnostic_line(snapshot: &InputSnapshot) -> String {
    let [x1, y1, x2, y2] = snapshot.axes;
    format!(
        "Pots {} {} {} {} Buttons {:02X} Keypad {:02X}",
        x1, y1, x2, y2, snapshot.buttons, snapshot.keys
    )
}
