//! Display values derived from a will's inactivity clock.
//!
//! All arithmetic is done on integer seconds; only the progress percentage is
//! turned into a float, and only at the very end.

use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle};

use crate::client::model::WillRecord;

pub const SECS_PER_DAY: u64 = 86_400;
pub const SECS_PER_YEAR: u64 = 365 * SECS_PER_DAY;
pub const CLAIM_AVAILABLE: &str = "Beneficiary can claim";

#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    /// Seconds until the beneficiary may claim; zero or negative once eligible.
    pub remaining: i128,
    pub eligible: bool,
    pub display: String,
    /// Elapsed share of the wait, in percent, clamped to `[0, 100]`.
    pub progress: f64,
    pub since_last_activity: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WillStatus {
    Claimed,
    Claimable,
    /// Less than a tenth of the wait is left.
    ActionNeeded,
    Active,
}

pub fn remaining(last_activity: u64, claim_wait: u64, now: u64) -> i128 {
    last_activity as i128 + claim_wait as i128 - now as i128
}

pub fn is_claimable(last_activity: u64, claim_wait: u64, now: u64) -> bool {
    remaining(last_activity, claim_wait, now) <= 0
}

pub fn format_remaining(remaining: i128) -> String {
    if remaining <= 0 {
        return CLAIM_AVAILABLE.to_string();
    }
    let day = SECS_PER_DAY as i128;
    let days = remaining / day;
    let hours = remaining % day / 3600;
    let minutes = remaining % 3600 / 60;
    let seconds = remaining % 60;
    format!("{days}d {hours}h {minutes}m {seconds}s")
}

pub fn progress(claim_wait: u64, remaining: i128) -> f64 {
    if claim_wait == 0 {
        return 100.0;
    }
    let elapsed = (claim_wait as i128 - remaining).clamp(0, claim_wait as i128);
    elapsed as f64 / claim_wait as f64 * 100.0
}

pub fn since_last_activity(last_activity: u64, now: u64) -> String {
    match now.saturating_sub(last_activity) / SECS_PER_DAY {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        days => format!("{days} days ago"),
    }
}

pub fn derive(last_activity: u64, claim_wait: u64, now: u64) -> Countdown {
    let remaining = remaining(last_activity, claim_wait, now);
    Countdown {
        remaining,
        eligible: remaining <= 0,
        display: format_remaining(remaining),
        progress: progress(claim_wait, remaining),
        since_last_activity: since_last_activity(last_activity, now),
    }
}

pub fn status(will: &WillRecord, now: u64) -> WillStatus {
    if will.is_claimed {
        return WillStatus::Claimed;
    }
    let remaining = remaining(will.last_activity, will.claim_wait, now);
    if remaining <= 0 {
        WillStatus::Claimable
    } else if remaining <= (will.claim_wait / 10) as i128 {
        WillStatus::ActionNeeded
    } else {
        WillStatus::Active
    }
}

/// Owners may withdraw once a full year has passed since creation.
pub fn withdrawal_available(created_at: u64, now: u64) -> bool {
    now >= created_at.saturating_add(SECS_PER_YEAR)
}

pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Recomputes a [`Countdown`] every second for one record.
///
/// A timer is bound to the record it was started with; when the record is
/// re-fetched, drop this timer and start a new one.
pub struct CountdownTimer {
    rx: watch::Receiver<Countdown>,
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    /// Must be called inside a tokio runtime: the ticking task is spawned
    /// here.
    pub fn start(record: &WillRecord) -> Self {
        Self::start_with_clock(record, unix_now)
    }

    /// [`CountdownTimer::start`] with an injectable wall clock.
    pub fn start_with_clock<F>(record: &WillRecord, clock: F) -> Self
    where
        F: Fn() -> u64 + Send + 'static,
    {
        let (last_activity, claim_wait) = (record.last_activity, record.claim_wait);
        let (tx, rx) = watch::channel(derive(last_activity, claim_wait, clock()));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                if tx.send(derive(last_activity, claim_wait, clock())).is_err() {
                    break;
                }
            }
        });

        Self { rx, handle }
    }

    pub fn current(&self) -> Countdown {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Countdown> {
        self.rx.clone()
    }

    pub fn cancel(self) {}
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
