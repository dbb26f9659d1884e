//! Optical medium simulation
//!
//! This module provides a simulated [Aether](https://en.wikipedia.org/wiki/Luminiferous_aether)
//! to connect several radios. Every transmission occupies the medium
//! for its real airtime, so clear channel assessment behaves like it
//! would over the air. Light does not bend around corners, so delivery
//! and carrier sensing are limited to [RANGE].
//!
//! # Example
//! ```
//! use vpan_rs::phy::{Phy, SendResult, TransceiverState};
//! use vpan_rs::test_helpers::aether::{Aether, Coordinate};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().start_paused(true).build().unwrap().block_on(async {
//! let mut aether = Aether::new();
//!
//! // Create two new radios connected to the aether
//! let mut alice = aether.radio();
//! let mut bob = aether.radio();
//! bob.move_to(Coordinate::new(0.0, 3.0));
//!
//! bob.set_transceiver_state(TransceiverState::RxOn).await.unwrap();
//!
//! let tx_res = alice.transmit(b"Hello, world!").await.unwrap();
//! let SendResult::Success(tx_time) = tx_res else { unreachable!() };
//!
//! let msg = bob.receive().await.unwrap();
//! assert_eq!(&msg.data[..], b"Hello, world!");
//! assert!(msg.timestamp >= tx_time);
//! # });
//! ```

use std::{
    collections::HashMap,
    fs::File,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use arrayvec::ArrayVec;
use byte::TryRead;
use core::fmt::Debug;
use pcap_file::{
    pcapng::{
        blocks::{
            enhanced_packet::EnhancedPacketBlock,
            interface_description::{InterfaceDescriptionBlock, InterfaceDescriptionOption},
        },
        Block, PcapNgReader, PcapNgWriter,
    },
    DataLink,
};
use tokio::sync::mpsc::{channel, error::TrySendError, Sender};

use crate::{
    consts::MAX_PHY_PACKET_SIZE,
    time::{Duration, Instant},
    wire::Frame,
};

mod radio;
mod space_time;

pub use radio::AetherRadio;
pub use space_time::{Coordinate, Meters};

/// The distance beyond which a transmitter can neither be received nor
/// carrier-sensed
pub const RANGE: Meters = Meters(10.0);

/// A medium to which radios are connected
///
/// This takes care of routing the packets to the right radios and of
/// keeping track of who is occupying the medium.
pub struct Aether {
    inner: Arc<Mutex<AetherInner>>,
}

impl Default for Aether {
    fn default() -> Self {
        Self::new()
    }
}

impl Aether {
    /// Create a new empty aether
    pub fn new() -> Self {
        let inner = AetherInner {
            nodes: Default::default(),
            transmissions: Vec::new(),
            pcap_dump: None,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Create a radio which lives in the aether
    pub fn radio(&mut self) -> AetherRadio {
        let (tx, rx) = channel(16);

        let node = Node {
            position: Coordinate::default(),
            antenna: tx,
            rx_enable: false,
        };
        let inner = Arc::clone(&self.inner);
        let node_id = NodeId::new();

        let old = self.inner().nodes.insert(node_id.clone(), node);
        assert!(old.is_none(), "node_id must be unique");

        AetherRadio {
            inner,
            node_id,
            antenna: rx,
        }
    }

    /// Occupy the medium around the given position for the given
    /// duration, as an unmodulated jammer would
    pub fn occupy(&mut self, position: Coordinate, duration: Duration) {
        let mut inner = self.inner();
        let now = inner.now();
        inner.transmissions.push(Transmission {
            position,
            start: now,
            end: now + duration,
        });
    }

    pub fn start_trace(&mut self, file: File) {
        self.inner().start_trace(file);
    }

    pub fn stop_trace(&mut self) {
        self.inner().stop_trace();
    }

    /// Read back a pcap trace written by [Self::start_trace] as parsed
    /// frames, in the order they hit the medium
    pub fn parse_trace(&mut self, file: File) -> impl Iterator<Item = Frame<'static>> {
        let mut reader = PcapNgReader::new(file).unwrap();

        std::iter::from_fn(move || {
            while let Some(b) = reader.next_block() {
                let block = b.unwrap();

                match block {
                    Block::InterfaceDescription(_) => continue,
                    Block::EnhancedPacket(enhanced_packet_block) => {
                        return Some(
                            Frame::try_read(enhanced_packet_block.data.to_vec().leak(), ())
                                .unwrap()
                                .0,
                        );
                    }
                    _ => continue,
                }
            }

            None
        })
    }

    fn inner(&self) -> MutexGuard<'_, AetherInner> {
        self.inner.lock().unwrap()
    }
}

pub struct AetherInner {
    nodes: HashMap<NodeId, Node>,
    /// Everything currently or recently on the air. Pruned lazily.
    transmissions: Vec<Transmission>,
    pcap_dump: Option<(PcapNgWriter<File>, HashMap<NodeId, u32>)>,
}

impl Debug for AetherInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.debug_struct("AetherInner")
            .field("nodes", &self.nodes)
            .field("transmissions", &self.transmissions)
            .field("pcap_dump", &self.pcap_dump.as_ref().map(|(_, h)| ((), h)))
            .finish()
    }
}

impl AetherInner {
    fn now(&mut self) -> Instant {
        tokio::time::Instant::now().into()
    }

    pub fn start_trace(&mut self, file: File) {
        if self.pcap_dump.is_some() {
            panic!("Already capturing pcap");
        }
        self.pcap_dump = Some((PcapNgWriter::new(file).unwrap(), HashMap::new()));
    }

    pub fn stop_trace(&mut self) {
        self.pcap_dump = None;
    }

    /// Whether a receiver at the given position senses energy at the
    /// given time
    fn medium_busy(&mut self, position: Coordinate, now: Instant) -> bool {
        self.transmissions.retain(|t| t.end >= now);

        self.transmissions
            .iter()
            .any(|t| t.start <= now && position.dist(t.position) <= RANGE)
    }

    fn record_transmission(&mut self, position: Coordinate, start: Instant, end: Instant) {
        self.transmissions.push(Transmission {
            position,
            start,
            end,
        });
    }

    fn trace(&mut self, node_id: &NodeId, pkt: &AirPacket) {
        let Some((pcap, nodes)) = &mut self.pcap_dump else {
            return;
        };

        let len = nodes.len();
        let interface_id = *nodes.entry(node_id.clone()).or_insert_with(|| {
            pcap.write_pcapng_block(InterfaceDescriptionBlock {
                linktype: DataLink::USER0,
                snaplen: MAX_PHY_PACKET_SIZE as u32,
                options: vec![InterfaceDescriptionOption::IfName(
                    format!("{node_id:?}").into(),
                )],
            })
            .unwrap();

            len as u32
        });

        let block = EnhancedPacketBlock {
            interface_id,
            timestamp: pkt.time_stamp.duration_since_epoch().into(),
            original_len: pkt.data.len().try_into().unwrap(),
            data: std::borrow::Cow::Borrowed(pkt.data.as_ref()),
            options: vec![],
        };
        pcap.write_pcapng_block(block).unwrap();
    }

    /// Deliver a packet to every listening node in range of the sender
    fn send(&mut self, from: &NodeId, data: AirPacket) {
        self.trace(from, &data);

        let mut closed_radios = vec![];
        let from_pos = self.nodes.get(from).expect("sender always exists").position;

        for (to, node) in &self.nodes {
            if from == to || !node.rx_enable || node.position.dist(from_pos) > RANGE {
                continue;
            }

            let mut delayed_data = data.clone();
            let dist = node.position.dist(from_pos);
            delayed_data.time_stamp += dist.as_duration();

            match node.antenna.try_send(delayed_data) {
                Ok(()) => {}
                Err(TrySendError::Closed(_)) => closed_radios.push(to.clone()),
                Err(TrySendError::Full(_)) => {
                    log::warn!("Radio antenna of {to:?} is full")
                }
            }
        }

        for closed_radio in closed_radios {
            self.nodes.remove(&closed_radio);
        }
    }
}

#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Clone)]
pub struct NodeId(usize);

impl NodeId {
    fn new() -> Self {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
pub struct Node {
    position: Coordinate,
    antenna: Sender<AirPacket>,
    rx_enable: bool,
}

/// A transmission occupying the medium around its origin from start
/// to end
#[derive(Debug, Clone, Copy)]
struct Transmission {
    position: Coordinate,
    start: Instant,
    end: Instant,
}

#[derive(Debug, Clone)]
pub struct AirPacket {
    pub data: ArrayVec<u8, MAX_PHY_PACKET_SIZE>,
    pub time_stamp: Instant,
}

impl AirPacket {
    pub fn new(data: impl TryInto<ArrayVec<u8, MAX_PHY_PACKET_SIZE>>, time_stamp: Instant) -> Self {
        let Ok(data) = data.try_into() else {
            unreachable!("Test data always fits the PHY");
        };

        Self { data, time_stamp }
    }
}
