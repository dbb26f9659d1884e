//! A scriptable radio for engine unit tests

use core::convert::Infallible;

use crate::{
    phy::{CcaResult, Phy, ReceivedMessage, SendResult, TransceiverState},
    time::Instant,
};

/// A radio that reports a scripted CCA result, records every
/// transmission and never receives anything.
pub struct MockPhy {
    pub max_frame_size: usize,
    pub cca_result: CcaResult,
    pub cca_requests: usize,
    pub transmissions: Vec<Vec<u8>>,
}

impl MockPhy {
    pub fn new() -> Self {
        Self {
            max_frame_size: crate::consts::MAX_PHY_PACKET_SIZE,
            cca_result: CcaResult::Idle,
            cca_requests: 0,
            transmissions: Vec::new(),
        }
    }
}

impl Phy for MockPhy {
    type Error = Infallible;

    async fn reset(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn get_instant(&mut self) -> Result<Instant, Self::Error> {
        Ok(Instant::from_ticks(0))
    }

    async fn request_cca(&mut self) -> Result<CcaResult, Self::Error> {
        self.cca_requests += 1;
        Ok(self.cca_result)
    }

    async fn set_transceiver_state(
        &mut self,
        _state: TransceiverState,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn transmit(&mut self, data: &[u8]) -> Result<SendResult, Self::Error> {
        if data.len() > self.max_frame_size() {
            return Ok(SendResult::FrameTooLong);
        }

        self.transmissions.push(data.to_vec());
        Ok(SendResult::Success(Instant::from_ticks(0)))
    }

    async fn receive(&mut self) -> Result<ReceivedMessage, Self::Error> {
        core::future::pending().await
    }

    fn symbol_rate(&self) -> f32 {
        1_000.0
    }

    fn symbols_per_octet(&self) -> f32 {
        2.0
    }

    fn shr_duration(&self) -> u32 {
        10
    }

    fn turnaround_time(&self) -> u32 {
        crate::consts::TURNAROUND_TIME
    }

    fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}
