//! services/courier/src/adapters/clock.rs
//!
//! Wall-clock implementations of the `Clock` and `Backoff` ports.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use dailylit_core::ports::{Backoff, Clock};
use std::time::Duration;
use tracing::info;

/// Today's date in the host's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Sleeps a fixed delay between send attempts.
#[derive(Debug, Clone, Copy)]
pub struct TokioBackoff {
    delay: Duration,
}

impl TokioBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Backoff for TokioBackoff {
    async fn pause(&self, attempt: u32) {
        info!(attempt, delay_secs = self.delay.as_secs(), "Waiting before retry.");
        tokio::time::sleep(self.delay).await;
    }
}
