use crate::time::Instant;

impl From<tokio::time::Instant> for Instant {
    fn from(value: tokio::time::Instant) -> Self {
        value.into_std().into()
    }
}

impl From<Instant> for tokio::time::Instant {
    fn from(value: Instant) -> Self {
        std::time::Instant::from(value).into()
    }
}

/// A [DelayNs](embedded_hal_async::delay::DelayNs) that runs on the
/// tokio timer, so paused-time tests control it.
///
/// The tokio timer rounds every deadline up to the next millisecond.
/// Whole-millisecond delays are exact, anything finer fires late.
#[derive(Clone, Copy)]
pub struct Delay;

impl embedded_hal_async::delay::DelayNs for Delay {
    async fn delay_ns(&mut self, ns: u32) {
        tokio::time::sleep(std::time::Duration::from_nanos(ns as u64)).await
    }

    async fn delay_us(&mut self, us: u32) {
        tokio::time::sleep(std::time::Duration::from_micros(us as u64)).await
    }

    async fn delay_ms(&mut self, ms: u32) {
        tokio::time::sleep(std::time::Duration::from_millis(ms as u64)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{DelayNsExt, Duration};

    #[tokio::test(start_paused = true)]
    async fn whole_millisecond_delays_are_exact() {
        let start = tokio::time::Instant::now();

        // An acknowledgment window of 54 symbols at a millisecond each
        Delay.delay_duration(Duration::from_millis(54)).await;

        assert_eq!(start.elapsed(), std::time::Duration::from_millis(54));
    }
}
