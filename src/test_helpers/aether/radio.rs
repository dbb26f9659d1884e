use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::Receiver;

use crate::{
    consts::{MAX_PHY_PACKET_SIZE, TURNAROUND_TIME},
    phy::{CcaResult, Phy, ReceivedMessage, SendResult, TransceiverState},
    test_helpers::aether::{AetherInner, AirPacket, Coordinate, NodeId},
    time::{Duration, Instant, TICKS_PER_SECOND},
};

/// The PHY characteristics every simulated radio shares.
///
/// One symbol takes exactly one millisecond. The tokio timer that runs
/// the virtual clock does not resolve anything finer, so every backoff,
/// turnaround and acknowledgment window must be a whole number of
/// milliseconds to fire when the protocol arithmetic says it does.
const SYMBOL_RATE: f32 = 1_000.0;
const SYMBOLS_PER_OCTET: f32 = 2.0;
const SHR_DURATION: u32 = 10;

/// Single radio connected to an [`Aether`](super::Aether)
#[derive(Debug)]
pub struct AetherRadio {
    pub(super) inner: Arc<Mutex<AetherInner>>,
    pub(super) node_id: NodeId,
    pub(super) antenna: Receiver<AirPacket>,
}

impl AetherRadio {
    pub fn move_to(&mut self, position: Coordinate) {
        self.with_node(|node| node.position = position);
    }

    fn aether(&mut self) -> AetherGuard<'_> {
        AetherGuard {
            aether: self.inner.lock().unwrap(),
            node_id: self.node_id.clone(),
        }
    }

    fn with_node<R>(&mut self, f: impl FnOnce(&mut super::Node) -> R) -> R {
        let AetherGuard {
            mut aether,
            node_id,
        } = self.aether();
        let node = aether
            .nodes
            .get_mut(&node_id)
            .expect("we exist therefore there must be a node with our id");

        f(node)
    }

    fn position(&mut self) -> Coordinate {
        self.with_node(|node| node.position)
    }

    /// The time the given number of octets keeps the medium occupied,
    /// synchronization header included
    fn air_time(&self, octets: usize) -> Duration {
        let symbols = SHR_DURATION as f64 + octets as f64 * SYMBOLS_PER_OCTET as f64;
        Duration::from_ticks((symbols * TICKS_PER_SECOND as f64 / SYMBOL_RATE as f64) as i64)
    }
}

impl Phy for AetherRadio {
    type Error = core::convert::Infallible;

    async fn reset(&mut self) -> Result<(), Self::Error> {
        self.with_node(|node| {
            node.rx_enable = false;
        });

        Ok(())
    }

    async fn get_instant(&mut self) -> Result<Instant, Self::Error> {
        Ok(self.aether().aether.now())
    }

    async fn request_cca(&mut self) -> Result<CcaResult, Self::Error> {
        let position = self.position();
        let mut guard = self.aether();
        let now = guard.aether.now();

        Ok(if guard.aether.medium_busy(position, now) {
            CcaResult::Busy
        } else {
            CcaResult::Idle
        })
    }

    async fn set_transceiver_state(
        &mut self,
        state: TransceiverState,
    ) -> Result<(), Self::Error> {
        self.with_node(|node| {
            node.rx_enable = matches!(state, TransceiverState::RxOn);
        });

        Ok(())
    }

    async fn transmit(&mut self, data: &[u8]) -> Result<SendResult, Self::Error> {
        if data.len() > self.max_frame_size() {
            return Ok(SendResult::FrameTooLong);
        }

        let position = self.position();
        let air_time = self.air_time(data.len());

        let end = {
            let mut guard = self.aether();
            let start = guard.aether.now();
            let end = start + air_time;
            guard.aether.record_transmission(position, start, end);
            end
        };

        // The medium is occupied until the last symbol has left
        tokio::time::sleep_until(end.into()).await;

        self.aether().send(AirPacket::new(data, end));

        Ok(SendResult::Success(end))
    }

    async fn receive(&mut self) -> Result<ReceivedMessage, Self::Error> {
        let msg = self
            .antenna
            .recv()
            .await
            .expect("only we can close the antenna");

        tokio::time::sleep_until(msg.time_stamp.into()).await;

        Ok(ReceivedMessage {
            timestamp: msg.time_stamp,
            data: heapless::Vec::from_slice(&msg.data).expect("air packets always fit"),
            lqi: 255,
        })
    }

    fn symbol_rate(&self) -> f32 {
        SYMBOL_RATE
    }

    fn symbols_per_octet(&self) -> f32 {
        SYMBOLS_PER_OCTET
    }

    fn shr_duration(&self) -> u32 {
        SHR_DURATION
    }

    fn turnaround_time(&self) -> u32 {
        TURNAROUND_TIME
    }

    fn max_frame_size(&self) -> usize {
        MAX_PHY_PACKET_SIZE
    }
}

struct AetherGuard<'a> {
    aether: MutexGuard<'a, AetherInner>,
    node_id: NodeId,
}

impl AetherGuard<'_> {
    fn send(&mut self, data: AirPacket) {
        self.aether.send(&self.node_id, data)
    }
}
