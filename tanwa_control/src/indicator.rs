//! Status LED and buzzer.
//!
//! Only the triggering contract lives here: entry callbacks pick a pattern,
//! the implementation decides how it is shown.

use parking_lot::Mutex;
use std::sync::Arc;
use tanwa_common::hal::consts::{BUZZER_PIN, LED_BLUE_PIN, LED_GREEN_PIN, LED_RED_PIN};
use tanwa_common::hal::driver::{GpioPort, HalError};
use tracing::warn;

/// LED indication per mission phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedPattern {
    #[default]
    Off,
    Idle,
    Fueling,
    Armed,
    Ready,
    Countdown,
    Fire,
    Hold,
    Abort,
}

impl LedPattern {
    /// Red, green, blue channel levels.
    const fn rgb(self) -> (bool, bool, bool) {
        match self {
            Self::Off => (false, false, false),
            Self::Idle => (false, true, false),
            Self::Fueling => (false, false, true),
            Self::Armed => (true, true, false),
            Self::Ready => (true, false, true),
            Self::Countdown | Self::Fire => (true, true, true),
            Self::Hold => (false, true, true),
            Self::Abort => (true, false, false),
        }
    }
}

/// Buzzer indication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuzzerPattern {
    #[default]
    Off,
    Countdown,
}

/// Sink for indications.
pub trait Indicators: Send + Sync {
    fn set_led(&self, pattern: LedPattern);
    fn set_buzzer(&self, pattern: BuzzerPattern);
}

/// Indicators on board GPIO. Failures are logged, never propagated.
pub struct GpioIndicators {
    gpio: Arc<dyn GpioPort>,
    current: Mutex<(LedPattern, BuzzerPattern)>,
}

impl GpioIndicators {
    /// Indicators on the board LED and buzzer pins. Both patterns start `Off`.
    pub fn new(gpio: Arc<dyn GpioPort>) -> Self {
        Self {
            gpio,
            current: Mutex::new((LedPattern::Off, BuzzerPattern::Off)),
        }
    }

    /// Last LED pattern requested.
    pub fn led(&self) -> LedPattern {
        self.current.lock().0
    }

    /// Last buzzer pattern requested.
    pub fn buzzer(&self) -> BuzzerPattern {
        self.current.lock().1
    }

    fn drive_led(&self, pattern: LedPattern) -> Result<(), HalError> {
        let (r, g, b) = pattern.rgb();
        self.gpio.set_level(LED_RED_PIN, r)?;
        self.gpio.set_level(LED_GREEN_PIN, g)?;
        self.gpio.set_level(LED_BLUE_PIN, b)
    }
}

impl Indicators for GpioIndicators {
    fn set_led(&self, pattern: LedPattern) {
        self.current.lock().0 = pattern;
        if let Err(e) = self.drive_led(pattern) {
            warn!(?pattern, "LED update failed: {e}");
        }
    }

    fn set_buzzer(&self, pattern: BuzzerPattern) {
        self.current.lock().1 = pattern;
        let on = matches!(pattern, BuzzerPattern::Countdown);
        if let Err(e) = self.gpio.set_level(BUZZER_PIN, on) {
            warn!(?pattern, "buzzer update failed: {e}");
        }
    }
}
