//! Central-longitude sequencing for a rotating globe.
//!
//! Each rendered frame takes the next value from a [`LongitudeCursor`]; the
//! cursor advances by a fixed step and wraps back into `[start, stop)`
//! carrying the overshoot, so the rotation is periodic with a period of
//! `360 / gcd(step, 360)` frames for a full-circle range.

use crate::error::ProjectionError;

/// Initial central longitude of the spin (degrees).
pub const DEFAULT_INITIAL_LONGITUDE: i32 = -95;
/// Degrees of rotation between consecutive frames.
pub const DEFAULT_LONGITUDE_STEP: i32 = 6;

/// Stateful cursor producing one central longitude per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongitudeCursor {
    current: i32,
    start: i32,
    stop: i32,
    step: i32,
}

impl LongitudeCursor {
    /// Create a cursor yielding `initial` first, then advancing by `step`
    /// within `[start, stop)`.
    pub fn new(initial: i32, start: i32, stop: i32, step: i32) -> Result<Self, ProjectionError> {
        if stop <= start {
            return Err(ProjectionError::InvalidRange { start, stop });
        }
        if step <= 0 || step >= stop - start {
            return Err(ProjectionError::InvalidStep {
                step,
                span: stop - start,
            });
        }
        if !(start..stop).contains(&initial) {
            return Err(ProjectionError::InitialOutOfRange {
                initial,
                start,
                stop,
            });
        }

        Ok(Self {
            current: initial,
            start,
            stop,
            step,
        })
    }

    /// The default spin: start at -95°, 6° per frame, range [-180, 180).
    pub fn spin() -> Self {
        Self {
            current: DEFAULT_INITIAL_LONGITUDE,
            start: -180,
            stop: 180,
            step: DEFAULT_LONGITUDE_STEP,
        }
    }

    /// Same as [`LongitudeCursor::spin`] with a custom first value and step.
    pub fn with_start(initial: i32, step: i32) -> Result<Self, ProjectionError> {
        Self::new(initial, -180, 180, step)
    }

    /// Return the current longitude and advance the cursor.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> i32 {
        let value = self.current;

        self.current += self.step;
        if self.current >= self.stop {
            self.current = self.start + (self.current - self.stop);
        }

        value
    }

    /// The value the next call to [`LongitudeCursor::next`] will return.
    pub fn peek(&self) -> i32 {
        self.current
    }

    /// Number of calls after which the sequence repeats.
    pub fn period(&self) -> usize {
        let span = self.stop - self.start;
        (span / gcd(self.step, span)) as usize
    }
}

fn gcd(a: i32, b: i32) -> i32 {
    if b == 0 {
        a.abs()
    } else {
        gcd(b, a % b)
    }
}
