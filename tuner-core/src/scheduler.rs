//! # Scheduling Module
//!
//! Drives the analysis pipeline at the host's cadence.
//!
//! ## Architecture
//! - **FrameSource**: capability that yields the next captured frame, if any
//! - **AnalysisLoop**: pulls at most one frame per tick and runs it through the [`Tuner`]
//! - **TunerWorker**: dedicated thread running the loop off a crossbeam ticker;
//!   selection changes come in and reports go out over channels
//!
//! Capture is acquired once, inside the worker thread (audio streams are
//! not always `Send`). A failed acquisition is reported and ends the
//! worker; restarting means spawning a new one.

use crate::config::TunerSettings;
use crate::error::TunerError;
use crate::instruments::InstrumentProfile;
use crate::pipeline::Tuner;
use crate::{AudioFrame, TickReport};
use crossbeam_channel::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Source of captured audio frames.
pub trait FrameSource {
    /// The next frame, or `None` when nothing new has been captured.
    /// Must not block.
    fn pull_frame(&mut self) -> Option<AudioFrame>;

    /// Rate in Hz of the frames this source yields.
    fn sample_rate(&self) -> u32;
}

/// One analysis step per tick over a frame source.
#[derive(Debug)]
pub struct AnalysisLoop<S> {
    source: S,
    tuner: Tuner,
}

impl<S: FrameSource> AnalysisLoop<S> {
    pub fn new(source: S, tuner: Tuner) -> Self {
        Self { source, tuner }
    }

    /// Pulls one frame and processes it against `profile`.
    ///
    /// Returns `None` without side effects when no frame is available.
    pub fn tick(&mut self, profile: &InstrumentProfile) -> Option<TickReport> {
        let frame = self.source.pull_frame()?;
        Some(self.tuner.process_frame(&frame, profile))
    }

    pub fn tuner(&self) -> &Tuner {
        &self.tuner
    }

    /// Releases the frame source.
    pub fn into_source(self) -> S {
        self.source
    }
}

/// Messages from the worker thread to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TunerEvent {
    /// Capture acquired, ticks are running.
    CaptureStarted { sample_rate: u32 },
    /// Capture could not be acquired; the worker has stopped.
    CaptureFailed(TunerError),
    Report(TickReport),
}

/// Handle to the analysis thread.
///
/// Dropping the handle stops the thread and releases the capture.
#[derive(Debug)]
pub struct TunerWorker {
    shutdown_tx: Sender<()>,
    selection_tx: Sender<InstrumentProfile>,
    events_rx: Receiver<TunerEvent>,
    thread_handle: Option<JoinHandle<()>>,
}

impl TunerWorker {
    /// Starts the analysis thread.
    ///
    /// `open_source` runs on the new thread and acquires the capture. The
    /// loop then ticks every `settings.tick_interval_ms`, classifying
    /// against `profile` until [`select`](Self::select) replaces it.
    pub fn spawn<S, F>(open_source: F, settings: TunerSettings, profile: InstrumentProfile) -> Self
    where
        S: FrameSource + 'static,
        F: FnOnce() -> Result<S, TunerError> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let (selection_tx, selection_rx) = crossbeam_channel::unbounded::<InstrumentProfile>();
        let (events_tx, events_rx) = crossbeam_channel::unbounded::<TunerEvent>();

        let thread_handle = thread::spawn(move || {
            info!("analysis worker starting");
            let source = match open_source() {
                Ok(source) => source,
                Err(e) => {
                    error!(error = %e, "capture acquisition failed");
                    if events_tx.send(TunerEvent::CaptureFailed(e)).is_err() {
                        warn!("event receiver dropped");
                    }
                    return;
                }
            };
            let sample_rate = source.sample_rate();
            if Duration::from_millis(settings.tick_interval_ms) > settings.frame_duration(sample_rate) {
                warn!(
                    sample_rate,
                    tick_interval_ms = settings.tick_interval_ms,
                    "ticks are slower than capture, frames will be dropped"
                );
            }
            if events_tx.send(TunerEvent::CaptureStarted { sample_rate }).is_err() {
                warn!("event receiver dropped");
                return;
            }

            let ticker = crossbeam_channel::tick(Duration::from_millis(settings.tick_interval_ms));
            let mut analysis = AnalysisLoop::new(source, Tuner::new(settings));
            let mut profile = profile;

            loop {
                crossbeam_channel::select! {
                    recv(ticker) -> _ => {
                        if let Some(report) = analysis.tick(&profile) {
                            if events_tx.send(TunerEvent::Report(report)).is_err() {
                                warn!("event receiver dropped");
                                break;
                            }
                        }
                    },
                    recv(selection_rx) -> msg => match msg {
                        Ok(selected) => {
                            info!(instrument = %selected.id, "instrument selected");
                            profile = selected;
                            // Re-classify the displayed value right away.
                            let report = analysis.tuner().report(&profile);
                            if events_tx.send(TunerEvent::Report(report)).is_err() {
                                warn!("event receiver dropped");
                                break;
                            }
                        }
                        Err(_) => break,
                    },
                    recv(shutdown_rx) -> _ => {
                        debug!("shutdown signal received");
                        break;
                    },
                }
            }

            drop(analysis);
            info!("analysis worker stopped, capture released");
        });

        Self {
            shutdown_tx,
            selection_tx,
            events_rx,
            thread_handle: Some(thread_handle),
        }
    }

    /// Switches the instrument subsequent ticks classify against.
    pub fn select(&self, profile: InstrumentProfile) {
        if self.selection_tx.send(profile).is_err() {
            debug!("selection ignored, worker has stopped");
        }
    }

    /// Event channel, for callers that want to block on it.
    pub fn events(&self) -> &Receiver<TunerEvent> {
        &self.events_rx
    }

    /// All events received since the last call, without blocking.
    pub fn drain_events(&self) -> Vec<TunerEvent> {
        self.events_rx.try_iter().collect()
    }

    /// Stops the thread and waits for it to release the capture.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = self.shutdown_tx.try_send(());
            if handle.join().is_err() {
                error!("analysis worker panicked");
            }
        }
    }
}

impl Drop for TunerWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
