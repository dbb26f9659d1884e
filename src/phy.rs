use heapless::Vec;

use crate::{consts::MAX_PHY_PACKET_SIZE, time::Instant};

/// The interface the MAC engine drives the radio through.
///
/// The MAC performs clear channel assessment, backoff timing and
/// acknowledgment handling itself, so the PHY only has to expose raw
/// CCA, raw transmission and raw reception plus a handful of static
/// characteristics of the modulation in use.
pub trait Phy {
    #[cfg(not(feature = "defmt-03"))]
    type Error: core::error::Error;
    #[cfg(feature = "defmt-03")]
    type Error: core::error::Error + defmt::Format;

    /// Reset the phy back to the defaults as if it was newly created.
    async fn reset(&mut self) -> Result<(), Self::Error>;

    /// Get the current time of the radio.
    async fn get_instant(&mut self) -> Result<Instant, Self::Error>;

    /// Perform one clear channel assessment and report the result.
    async fn request_cca(&mut self) -> Result<CcaResult, Self::Error>;

    /// Put the transceiver in the given state.
    ///
    /// Calls with the state the transceiver is already in must succeed
    /// and do nothing.
    async fn set_transceiver_state(&mut self, state: TransceiverState)
        -> Result<(), Self::Error>;

    /// Send a fully formed frame, without carrier sensing.
    ///
    /// Returns [SendResult::FrameTooLong] when the frame does not fit
    /// the PHY, in which case nothing is emitted.
    async fn transmit(&mut self, data: &[u8]) -> Result<SendResult, Self::Error>;

    /// Wait for a frame to arrive. Only resolves while the transceiver
    /// is in the receiving state.
    ///
    /// This function is cancel-safe so it can be parked in a select
    /// while the other functions of this trait stay accessible.
    async fn receive(&mut self) -> Result<ReceivedMessage, Self::Error>;

    /// The rate of the current modulation in symbols per second
    fn symbol_rate(&self) -> f32;

    /// The number of symbols it takes to send one octet
    fn symbols_per_octet(&self) -> f32;

    /// The duration of the synchronization header in symbols
    fn shr_duration(&self) -> u32;

    /// The receive-to-transmit turnaround time in symbols
    fn turnaround_time(&self) -> u32;

    /// The largest PSDU this PHY can carry, in octets
    fn max_frame_size(&self) -> usize;
}

/// The outcome of a clear channel assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum CcaResult {
    Idle,
    Busy,
}

/// The state of the transceiver hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum TransceiverState {
    RxOn,
    TxOn,
    TrxOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum SendResult {
    /// The message has been sent successfully at the given time
    Success(Instant),
    /// The frame was rejected because it does not fit the PHY
    FrameTooLong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// The time at which the message was received
    pub timestamp: Instant,
    pub data: Vec<u8, MAX_PHY_PACKET_SIZE>,
    /// The link quality of the reception. Lower values represent lower
    /// quality.
    pub lqi: u8,
}
