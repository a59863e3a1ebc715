use crate::config::FeedbackConfig;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Device ringer setting, as reported by the platform audio service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingerMode {
    Normal,
    Vibrate,
    Silent,
}

impl RingerMode {
    pub fn allows_sound(&self) -> bool {
        matches!(self, RingerMode::Normal)
    }

    pub fn allows_vibration(&self) -> bool {
        matches!(self, RingerMode::Normal | RingerMode::Vibrate)
    }
}

/// Platform audio service
pub trait AudioService: Send + Sync {
    fn ringer_mode(&self) -> RingerMode;
}

/// Shutter click player. The underlying sound resource is owned by the
/// view-model and released when it is destroyed.
pub trait ShutterSound: Send + Sync {
    fn play(&self);
    fn release(&self);
}

/// Platform vibrator
pub trait Vibrator: Send + Sync {
    fn vibrate(&self, duration: Duration);
}

/// Shutter feedback bundle injected into the view-model
#[derive(Clone)]
pub struct Feedback {
    audio: Arc<dyn AudioService>,
    shutter: Arc<dyn ShutterSound>,
    vibrator: Arc<dyn Vibrator>,
    sound_enabled: bool,
    vibration: Duration,
    released: Arc<AtomicBool>,
}

impl Feedback {
    pub fn new(
        audio: Arc<dyn AudioService>,
        shutter: Arc<dyn ShutterSound>,
        vibrator: Arc<dyn Vibrator>,
        config: &FeedbackConfig,
    ) -> Self {
        Self {
            audio,
            shutter,
            vibrator,
            sound_enabled: config.shutter_sound,
            vibration: config.vibration(),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Feedback that never makes a sound or vibrates
    pub fn silent() -> Self {
        Self::new(
            Arc::new(FixedRinger(RingerMode::Silent)),
            Arc::new(NoShutterSound),
            Arc::new(NoVibrator),
            &FeedbackConfig {
                shutter_sound: false,
                vibration_ms: 100,
            },
        )
    }

    /// Click and vibrate as the ringer mode allows
    pub fn on_shutter(&self) {
        let mode = self.audio.ringer_mode();
        trace!("Shutter feedback with ringer mode {:?}", mode);

        if self.sound_enabled && mode.allows_sound() && !self.released.load(Ordering::SeqCst) {
            self.shutter.play();
        }
        if mode.allows_vibration() {
            self.vibrator.vibrate(self.vibration);
        }
    }

    /// Release the shutter sound. Only the first call reaches the player.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        debug!("Releasing shutter sound");
        self.shutter.release();
        true
    }
}

/// Audio service pinned to one ringer mode
#[derive(Debug, Clone, Copy)]
pub struct FixedRinger(pub RingerMode);

impl AudioService for FixedRinger {
    fn ringer_mode(&self) -> RingerMode {
        self.0
    }
}

/// Ringer mode that can be changed at runtime
#[derive(Debug)]
pub struct SwitchableRinger {
    mode: Mutex<RingerMode>,
}

impl SwitchableRinger {
    pub fn new(mode: RingerMode) -> Self {
        Self {
            mode: Mutex::new(mode),
        }
    }

    pub fn set(&self, mode: RingerMode) {
        *self.mode.lock() = mode;
    }

    /// Advance Normal → Vibrate → Silent → Normal
    pub fn cycle(&self) -> RingerMode {
        let mut mode = self.mode.lock();
        *mode = match *mode {
            RingerMode::Normal => RingerMode::Vibrate,
            RingerMode::Vibrate => RingerMode::Silent,
            RingerMode::Silent => RingerMode::Normal,
        };
        *mode
    }
}

impl AudioService for SwitchableRinger {
    fn ringer_mode(&self) -> RingerMode {
        *self.mode.lock()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NoShutterSound;

impl ShutterSound for NoShutterSound {
    fn play(&self) {}
    fn release(&self) {}
}

#[derive(Debug, Clone, Copy)]
pub struct NoVibrator;

impl Vibrator for NoVibrator {
    fn vibrate(&self, _duration: Duration) {}
}

/// Shutter click rendered as the terminal bell
#[derive(Debug, Clone, Copy)]
pub struct TerminalBell;

impl ShutterSound for TerminalBell {
    fn play(&self) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }

    fn release(&self) {}
}

/// Vibrator that only logs the pulse
#[derive(Debug, Clone, Copy)]
pub struct LoggingVibrator;

impl Vibrator for LoggingVibrator {
    fn vibrate(&self, duration: Duration) {
        debug!("Vibrating for {:?}", duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingShutter {
        plays: AtomicUsize,
        releases: AtomicUsize,
    }

    impl ShutterSound for CountingShutter {
        fn play(&self) {
            self.plays.fetch_add(1, Ordering::SeqCst);
        }
        fn release(&self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct RecordingVibrator {
        pulses: Mutex<Vec<Duration>>,
    }

    impl Vibrator for RecordingVibrator {
        fn vibrate(&self, duration: Duration) {
            self.pulses.lock().push(duration);
        }
    }

    fn feedback_for(
        mode: RingerMode,
    ) -> (Feedback, Arc<CountingShutter>, Arc<RecordingVibrator>) {
        let shutter = Arc::new(CountingShutter::default());
        let vibrator = Arc::new(RecordingVibrator::default());
        let feedback = Feedback::new(
            Arc::new(FixedRinger(mode)),
            shutter.clone(),
            vibrator.clone(),
            &FeedbackConfig {
                shutter_sound: true,
                vibration_ms: 100,
            },
        );
        (feedback, shutter, vibrator)
    }

    #[test]
    fn test_normal_mode_clicks_and_vibrates() {
        let (feedback, shutter, vibrator) = feedback_for(RingerMode::Normal);
        feedback.on_shutter();

        assert_eq!(shutter.plays.load(Ordering::SeqCst), 1);
        assert_eq!(*vibrator.pulses.lock(), vec![Duration::from_millis(100)]);
    }

    #[test]
    fn test_vibrate_mode_only_vibrates() {
        let (feedback, shutter, vibrator) = feedback_for(RingerMode::Vibrate);
        feedback.on_shutter();

        assert_eq!(shutter.plays.load(Ordering::SeqCst), 0);
        assert_eq!(vibrator.pulses.lock().len(), 1);
    }

    #[test]
    fn test_silent_mode_does_nothing() {
        let (feedback, shutter, vibrator) = feedback_for(RingerMode::Silent);
        feedback.on_shutter();

        assert_eq!(shutter.plays.load(Ordering::SeqCst), 0);
        assert!(vibrator.pulses.lock().is_empty());
    }

    #[test]
    fn test_release_reaches_player_once() {
        let (feedback, shutter, _) = feedback_for(RingerMode::Normal);

        assert!(feedback.release());
        assert!(!feedback.clone().release());
        assert_eq!(shutter.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_switchable_ringer_cycles() {
        let ringer = SwitchableRinger::new(RingerMode::Normal);

        assert_eq!(ringer.cycle(), RingerMode::Vibrate);
        assert_eq!(ringer.cycle(), RingerMode::Silent);
        assert_eq!(ringer.cycle(), RingerMode::Normal);
    }
}
