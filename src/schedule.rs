use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;

/// Minutes-before-expiry at which session warnings are raised.
pub const WARNING_THRESHOLDS_MIN: [u64; 4] = [30, 15, 5, 1];

/// Remaining time at or below which a token is treated as already expired on
/// the read paths.
pub(crate) const EXPIRY_SLACK: Duration = Duration::from_secs(30);

/// Below this remaining time the warning ladder is not worth arming; the
/// next reactive check handles the session instead.
pub(crate) const LADDER_CUTOFF: Duration = Duration::from_secs(5 * 60);

/// The forced-logout timer is only armed when more than this remains.
pub(crate) const EXPIRY_TIMER_FLOOR: Duration = Duration::from_secs(60);

/// `has_valid_token` requires more than this much life left.
pub(crate) const VALID_TOKEN_MARGIN: Duration = Duration::from_secs(2 * 60);

/// Conventional threshold for `is_token_expiring_soon`.
pub const DEFAULT_EXPIRING_SOON_MINUTES: u64 = 30;

/// Ladder thresholds that already fired for the current token generation.
/// One bit per entry of `WARNING_THRESHOLDS_MIN`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WarnedMask(u8);

impl WarnedMask {
    pub fn contains(self, threshold_min: u64) -> bool {
        match threshold_index(threshold_min) {
            Some(index) => self.0 & (1 << index) != 0,
            None => false,
        }
    }

    pub fn record(&mut self, threshold_min: u64) {
        if let Some(index) = threshold_index(threshold_min) {
            self.0 |= 1 << index;
        }
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

fn threshold_index(threshold_min: u64) -> Option<usize> {
    WARNING_THRESHOLDS_MIN.iter().position(|t| *t == threshold_min)
}

/// One pending warning: how many minutes will remain when it fires, and how
/// far away the fire instant is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WarningSlot {
    pub minutes_remaining: u64,
    pub fire_in: Duration,
}

/// The full set of timers to arm for a token generation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimerPlan {
    pub warnings: Vec<WarningSlot>,
    pub expiry_in: Option<Duration>,
}

/// Computes which timers to arm for a token expiring at `expires_at`.
///
/// Warnings are planned for every ladder threshold whose fire instant is
/// still ahead, that the remaining lifetime actually crosses, and that has
/// not already fired for this token generation; the whole ladder is skipped
/// when under five minutes remain. The forced-logout timer is planned
/// independently whenever more than sixty seconds remain, so short sessions
/// still get a hard stop; under that floor the read paths catch expiry.
pub fn plan_timers(now: SystemTime, expires_at: SystemTime, warned: WarnedMask) -> TimerPlan {
    let remaining = match expires_at.duration_since(now) {
        Ok(remaining) => remaining,
        Err(_) => return TimerPlan::default(),
    };

    let mut warnings = Vec::new();
    if remaining >= LADDER_CUTOFF {
        for threshold_min in WARNING_THRESHOLDS_MIN {
            let threshold = Duration::from_secs(threshold_min * 60);
            if remaining > threshold && !warned.contains(threshold_min) {
                warnings.push(WarningSlot {
                    minutes_remaining: threshold_min,
                    fire_in: remaining - threshold,
                });
            }
        }
    }

    let expiry_in = (remaining > EXPIRY_TIMER_FLOOR).then_some(remaining);

    TimerPlan {
        warnings,
        expiry_in,
    }
}

/// Owns the live timer generation: at most one expiry handle plus the armed
/// warning handles. Cancelling aborts everything so a superseded generation
/// can never fire.
#[derive(Default)]
pub(crate) struct TimerSet {
    handles: Vec<JoinHandle<()>>,
}

impl TimerSet {
    pub(crate) fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    pub(crate) fn cancel_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
