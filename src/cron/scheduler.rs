//! Fixed-interval timer driving real-time price ticks.
//!
//! The scheduler does not own the store. The dashboard loop awaits
//! [`UpdateScheduler::next_tick`] next to its other events and applies the
//! tick itself, so a tick never overlaps another mutation and stopping the
//! scheduler takes effect before the next loop iteration.

use std::time::Duration;

use log::info;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub struct UpdateScheduler {
    period: Duration,
    interval: Option<Interval>,
    ticks: u64,
}

impl UpdateScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
            ticks: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Number of ticks fired since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Start ticking; the first tick fires one period from now.
    ///
    /// Returns false if already running. Must be called within a tokio
    /// runtime.
    pub fn start(&mut self) -> bool {
        if self.interval.is_some() {
            return false;
        }

        // Ticks stay on the fixed grid; a late tick does not shift later ones.
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);

        info!("Update scheduler started (every {:?})", self.period);
        true
    }

    /// Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        if self.interval.take().is_none() {
            return false;
        }
        info!("Update scheduler stopped after {} ticks", self.ticks);
        true
    }

    /// Start or stop to match `enabled`. Returns true if the state changed.
    pub fn set_running(&mut self, enabled: bool) -> bool {
        if enabled {
            self.start()
        } else {
            self.stop()
        }
    }

    /// Wait for the next tick and return its sequence number.
    ///
    /// Never completes while stopped. Cancel safe, so it can sit in a
    /// `tokio::select!` branch.
    pub async fn next_tick(&mut self) -> u64 {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
                self.ticks += 1;
                self.ticks
            },
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const PERIOD: Duration = Duration::from_millis(5_000);

    #[tokio::test(start_paused = true)]
    async fn test_stopped_scheduler_never_ticks() {
        let mut scheduler = UpdateScheduler::new(PERIOD);
        assert!(!scheduler.is_running());
        assert!(timeout(PERIOD * 10, scheduler.next_tick()).await.is_err());
        assert_eq!(scheduler.ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let mut scheduler = UpdateScheduler::new(PERIOD);
        let started = Instant::now();
        assert!(scheduler.start());
        assert!(!scheduler.start());

        assert_eq!(scheduler.next_tick().await, 1);
        assert_eq!(started.elapsed(), PERIOD);

        assert_eq!(scheduler.next_tick().await, 2);
        assert_eq!(started.elapsed(), PERIOD * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_ticks() {
        let mut scheduler = UpdateScheduler::new(PERIOD);
        scheduler.start();
        scheduler.next_tick().await;

        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert!(timeout(PERIOD * 10, scheduler.next_tick()).await.is_err());
        assert_eq!(scheduler.ticks(), 1);

        assert!(scheduler.set_running(true));
        scheduler.next_tick().await;
        assert_eq!(scheduler.ticks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_ticks_are_skipped() {
        let mut scheduler = UpdateScheduler::new(PERIOD);
        let started = Instant::now();
        scheduler.start();

        tokio::time::advance(PERIOD * 3 + Duration::from_millis(100)).await;

        // One late tick fires immediately, then the schedule resumes on the grid.
        assert_eq!(scheduler.next_tick().await, 1);
        scheduler.next_tick().await;
        assert_eq!(started.elapsed(), PERIOD * 4);
        assert_eq!(scheduler.ticks(), 2);
    }
}
