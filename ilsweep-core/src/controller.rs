use crate::{signals::Tone, AudioBackendError, Error, SweepParameters, SweepPlan};

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

/// Plays a buffer of 16 bit mono samples and blocks until the audio
/// has finished.
pub trait PlaybackPort {
    fn play(&mut self, samples: &[i16]) -> Result<(), AudioBackendError>;
}

/// Receives one [`Snapshot`] per state change of a running sweep.
pub trait ProgressSink {
    fn update(&mut self, snapshot: &Snapshot);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tone(u16),
    Waiting,
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Tone(frequency) => write!(f, "{frequency} Hz"),
            Stage::Waiting => write!(f, "Waiting"),
            Stage::Complete => write!(f, "Sweep Complete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub stage: Stage,
    pub remaining: Duration,
    pub total: Duration,
}

impl Snapshot {
    fn new(stage: Stage, remaining: Duration, total: Duration) -> Self {
        Self {
            stage,
            remaining,
            total,
        }
    }

    /// Fraction of the sweep already behind us, in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.total.is_zero() {
            return 1.0;
        }

        1.0 - self.remaining.as_secs_f32() / self.total.as_secs_f32()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
    AlreadyRunning,
}

/// Cancellation handle of a [`SweepController`], clonable into other
/// threads.
#[derive(Debug, Clone)]
pub struct SweepHandle {
    running: Arc<AtomicBool>,
}

impl SweepHandle {
    /// Requests cancellation. The tone playing right now finishes,
    /// the flag is only observed between tones.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct SweepController {
    sample_rate: u32,
    running: Arc<AtomicBool>,
}

impl SweepController {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handle(&self) -> SweepHandle {
        SweepHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Runs a whole sweep and blocks until it completed, was cancelled
    /// through [`SweepHandle::stop`], or the playback port failed.
    ///
    /// Invalid parameters are rejected before any tone is synthesized.
    /// A second call while a sweep is in flight returns
    /// [`Outcome::AlreadyRunning`] and leaves the active sweep alone.
    pub fn run<P, S>(
        &self,
        parameters: &SweepParameters,
        playback: &mut P,
        progress: &mut S,
    ) -> Result<Outcome, Error>
    where
        P: PlaybackPort,
        S: ProgressSink,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(Outcome::AlreadyRunning);
        }

        let plan = match SweepPlan::new(parameters) {
            Ok(plan) => plan,
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };

        let total = plan.total_duration();
        let mut remaining = total;

        for (index, &frequency) in plan.iter().enumerate() {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            progress.update(&Snapshot::new(Stage::Tone(frequency), remaining, total));

            let played = Tone::new(frequency, plan.tone_duration(), self.sample_rate)
                .and_then(|tone| {
                    let buffer: Vec<i16> = tone.collect();
                    playback.play(&buffer).map_err(Error::from)
                });

            if let Err(err) = played {
                progress.update(&Snapshot::new(Stage::Complete, Duration::ZERO, total));
                self.running.store(false, Ordering::SeqCst);
                return Err(err);
            }

            // No pause after the last tone, and none once a stop
            // request came in during the tone that just finished.
            if index + 1 != plan.len() && self.running.load(Ordering::SeqCst) {
                progress.update(&Snapshot::new(Stage::Waiting, remaining, total));
                remaining = remaining.saturating_sub(plan.slot_duration());
                thread::sleep(plan.inter_tone_delay());
            }
        }

        // A leftover true means the sequence ran dry on its own.
        let outcome = match self.running.swap(false, Ordering::SeqCst) {
            true => Outcome::Completed,
            false => Outcome::Cancelled,
        };

        progress.update(&Snapshot::new(Stage::Complete, Duration::ZERO, total));

        Ok(outcome)
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::{mpsc, Arc},
        thread,
        time::{Duration, Instant},
    };

    use crate::{AudioBackendError, Error, SweepParameters};

    use super::{Outcome, PlaybackPort, ProgressSink, Snapshot, Stage, SweepController};

    fn parameters() -> SweepParameters {
        SweepParameters {
            start_frequency: 100,
            end_frequency: 500,
            step: 100,
            tone_duration: Duration::from_millis(1),
            inter_tone_delay: Duration::from_millis(1),
        }
    }

    #[derive(Default)]
    struct RecordingPort {
        buffer_sizes: Vec<usize>,
        fail_at: Option<usize>,
    }

    impl PlaybackPort for RecordingPort {
        fn play(&mut self, samples: &[i16]) -> Result<(), AudioBackendError> {
            if self.fail_at == Some(self.buffer_sizes.len()) {
                return Err(AudioBackendError::Stopped);
            }

            self.buffer_sizes.push(samples.len());

            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        snapshots: Vec<Snapshot>,
    }

    impl ProgressSink for RecordingSink {
        fn update(&mut self, snapshot: &Snapshot) {
            self.snapshots.push(*snapshot);
        }
    }

    #[test]
    fn plays_every_tone_in_order_and_completes() {
        let controller = SweepController::new(44_100);
        let mut port = RecordingPort::default();
        let mut sink = RecordingSink::default();

        let outcome = controller
            .run(&parameters(), &mut port, &mut sink)
            .unwrap();

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(port.buffer_sizes.len(), 5);

        let stages: Vec<Stage> = sink.snapshots.iter().map(|s| s.stage).collect();
        assert_eq!(
            stages,
            [
                Stage::Tone(100),
                Stage::Waiting,
                Stage::Tone(200),
                Stage::Waiting,
                Stage::Tone(300),
                Stage::Waiting,
                Stage::Tone(400),
                Stage::Waiting,
                Stage::Tone(500),
                Stage::Complete,
            ]
        );
    }

    #[test]
    fn reports_remaining_time_counting_down_to_zero() {
        let controller = SweepController::new(44_100);
        let mut port = RecordingPort::default();
        let mut sink = RecordingSink::default();

        controller
            .run(&parameters(), &mut port, &mut sink)
            .unwrap();

        let total = Duration::from_millis(10);

        let first = sink.snapshots.first().unwrap();
        assert_eq!(first.total, total);
        assert_eq!(first.remaining, total);

        let remaining: Vec<Duration> = sink
            .snapshots
            .iter()
            .filter(|s| matches!(s.stage, Stage::Tone(_)))
            .map(|s| s.remaining)
            .collect();
        let expected: Vec<Duration> = (0u64..5)
            .map(|slot| total - Duration::from_millis(slot * 2))
            .collect();
        assert_eq!(remaining, expected);

        let last = sink.snapshots.last().unwrap();
        assert_eq!(last.stage, Stage::Complete);
        assert_eq!(last.remaining, Duration::ZERO);
        assert_eq!(last.progress(), 1.0);
    }

    #[test]
    fn rejects_invalid_parameters_before_playing() {
        let invalid = SweepParameters {
            start_frequency: 500,
            end_frequency: 100,
            ..parameters()
        };

        let controller = SweepController::new(44_100);
        let mut port = RecordingPort::default();
        let mut sink = RecordingSink::default();

        let result = controller.run(&invalid, &mut port, &mut sink);

        assert!(matches!(result, Err(Error::InvalidParameters { .. })));
        assert!(port.buffer_sizes.is_empty());
        assert!(sink.snapshots.is_empty());
        assert!(!controller.handle().is_running());
    }

    struct StoppingPort {
        inner: RecordingPort,
        stop_at: usize,
        handle: super::SweepHandle,
    }

    impl PlaybackPort for StoppingPort {
        fn play(&mut self, samples: &[i16]) -> Result<(), AudioBackendError> {
            if self.inner.buffer_sizes.len() == self.stop_at {
                self.handle.stop();
            }

            self.inner.play(samples)
        }
    }

    #[test]
    fn stop_during_a_tone_prevents_any_later_tone() {
        let controller = SweepController::new(44_100);
        let mut port = StoppingPort {
            inner: RecordingPort::default(),
            stop_at: 2,
            handle: controller.handle(),
        };
        let mut sink = RecordingSink::default();

        let outcome = controller
            .run(&parameters(), &mut port, &mut sink)
            .unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        // The tone in flight finishes, nothing beyond it is submitted.
        assert_eq!(port.inner.buffer_sizes.len(), 3);

        let last = sink.snapshots.last().unwrap();
        assert_eq!(last.stage, Stage::Complete);
        assert_eq!(last.remaining, Duration::ZERO);
    }

    #[test]
    fn playback_failure_aborts_with_a_terminal_snapshot() {
        let controller = SweepController::new(44_100);
        let mut port = RecordingPort {
            fail_at: Some(1),
            ..RecordingPort::default()
        };
        let mut sink = RecordingSink::default();

        let result = controller.run(&parameters(), &mut port, &mut sink);

        assert!(matches!(result, Err(Error::AudioBackend(_))));
        assert_eq!(port.buffer_sizes.len(), 1);

        let last = sink.snapshots.last().unwrap();
        assert_eq!(last.stage, Stage::Complete);
        assert_eq!(last.remaining, Duration::ZERO);

        // The run is over, the controller accepts a fresh one.
        let mut port = RecordingPort::default();
        let mut sink = RecordingSink::default();
        let outcome = controller
            .run(&parameters(), &mut port, &mut sink)
            .unwrap();
        assert_eq!(outcome, Outcome::Completed);
    }

    struct BlockingPort {
        started: mpsc::Sender<()>,
        release: mpsc::Receiver<()>,
    }

    impl PlaybackPort for BlockingPort {
        fn play(&mut self, _samples: &[i16]) -> Result<(), AudioBackendError> {
            let _ = self.started.send(());
            let _ = self.release.recv();

            Ok(())
        }
    }

    struct NullSink;

    impl ProgressSink for NullSink {
        fn update(&mut self, _snapshot: &Snapshot) {}
    }

    #[test]
    fn second_run_while_running_is_a_no_op() {
        let controller = Arc::new(SweepController::new(44_100));
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();

        let background = {
            let controller = Arc::clone(&controller);
            let handle = controller.handle();

            thread::spawn(move || {
                let mut port = BlockingPort {
                    started: started_tx,
                    release: release_rx,
                };

                let outcome = controller
                    .run(&parameters(), &mut port, &mut NullSink)
                    .unwrap();

                // Cancelled by the main thread after the first tone.
                assert!(!handle.is_running());
                outcome
            })
        };

        started_rx.recv().unwrap();

        let mut port = RecordingPort::default();
        let mut sink = RecordingSink::default();
        let outcome = controller
            .run(&parameters(), &mut port, &mut sink)
            .unwrap();

        assert_eq!(outcome, Outcome::AlreadyRunning);
        assert!(port.buffer_sizes.is_empty());
        assert!(sink.snapshots.is_empty());

        controller.handle().stop();
        release_tx.send(()).unwrap();
        drop(release_tx);

        assert_eq!(background.join().unwrap(), Outcome::Cancelled);
    }

    #[test]
    fn delay_between_tones_is_paced_in_real_time() {
        let fast = SweepParameters {
            start_frequency: 100,
            end_frequency: 300,
            step: 100,
            tone_duration: Duration::from_millis(1),
            inter_tone_delay: Duration::from_millis(20),
        };

        let controller = SweepController::new(44_100);
        let mut port = RecordingPort::default();
        let mut sink = RecordingSink::default();

        let begin = Instant::now();
        controller.run(&fast, &mut port, &mut sink).unwrap();
        let elapsed = begin.elapsed();

        // Two pauses between three tones.
        assert!(elapsed >= Duration::from_millis(40));
    }
}
