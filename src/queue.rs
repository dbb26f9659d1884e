//! The FIFO of outgoing data frames
//!
//! The element at the head is the frame currently being worked on. It
//! stays at the head across backoffs and retransmissions so the
//! per-frame counters survive until the frame is either acknowledged
//! or given up on.

use arraydeque::{ArrayDeque, CapacityError};
use heapless::Vec;

use crate::consts::MAX_PHY_PACKET_SIZE;

/// The number of frames that can wait for transmission
pub const TX_QUEUE_CAPACITY: usize = 8;

/// One queued frame together with its transmission bookkeeping
#[derive(Debug, Clone)]
pub struct TxQueueElement {
    /// The handle the next higher layer gave the frame. Echoed in the
    /// data confirm.
    pub handle: u8,
    /// The encoded frame, trailer included
    pub frame: Vec<u8, MAX_PHY_PACKET_SIZE>,
    /// The sequence number inside the frame, kept out here so matching
    /// an acknowledgment does not require re-parsing
    pub seq: u8,
    pub ack_request: bool,
    retransmission: u8,
    csma_retries: u8,
}

impl TxQueueElement {
    pub fn new(handle: u8, frame: Vec<u8, MAX_PHY_PACKET_SIZE>, seq: u8, ack_request: bool) -> Self {
        Self {
            handle,
            frame,
            seq,
            ack_request,
            retransmission: 0,
            csma_retries: 0,
        }
    }

    /// How often this frame has been retransmitted
    pub fn retransmission(&self) -> u8 {
        self.retransmission
    }

    /// The total number of CSMA backoffs spent on this frame over all
    /// of its transmissions
    pub fn csma_retries(&self) -> u8 {
        self.csma_retries
    }

    /// Note that the frame is going to be transmitted again after
    /// spending the given number of backoffs on the failed attempt
    pub fn record_retry(&mut self, csma_backoffs: u8) {
        self.retransmission += 1;
        self.csma_retries = self.csma_retries.saturating_add(csma_backoffs);
    }
}

/// The transmit FIFO
#[derive(Debug, Default)]
pub struct TxQueue {
    queue: ArrayDeque<TxQueueElement, TX_QUEUE_CAPACITY>,
}

impl TxQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn push(
        &mut self,
        element: TxQueueElement,
    ) -> Result<(), CapacityError<TxQueueElement>> {
        self.queue.push_back(element)
    }

    /// The frame currently being worked on
    pub fn head(&self) -> Option<&TxQueueElement> {
        self.queue.front()
    }

    pub fn head_mut(&mut self) -> Option<&mut TxQueueElement> {
        self.queue.front_mut()
    }

    /// Drop the head and expose the next frame with fresh counters
    pub fn remove_head(&mut self) -> Option<TxQueueElement> {
        self.queue.pop_front()
    }

    /// Drop every queued frame
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
