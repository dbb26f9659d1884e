use rand_core::RngCore;

use super::{commander::RequestResponder, MacConfig};
use crate::{
    csma::CsmaCa,
    queue::{TxQueue, TX_QUEUE_CAPACITY},
    sap::{
        data::{DataConfirm, DataRequest},
        Status,
    },
    time::{DelayNsExt, Instant},
};

/// The four states of the transmit side of the MAC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum EngineState {
    /// Nothing in flight. The receiver is on or off depending on
    /// macRxOnWhenIdle.
    Idle,
    /// Contending for the medium on behalf of the queue head
    Csma,
    /// The queue head has been handed to the radio
    Sending,
    /// Waiting for the acknowledgment of the queue head
    AckPending,
}

/// All mutable state of a running MAC engine
pub struct MacState<'a> {
    pub state: EngineState,
    pub csma: CsmaCa,
    pub tx_queue: TxQueue,
    /// When armed, the moment the current backoff ends and a CCA is due
    pub backoff_deadline: Option<Instant>,
    /// When armed, the moment the acknowledgment of the queue head is
    /// considered lost
    pub ack_deadline: Option<Instant>,
    /// The responders of the data requests that sit in the queue. Each
    /// gets its confirm when its frame reaches a terminal outcome.
    pending_confirms: heapless::Vec<(u8, RequestResponder<'a, DataRequest>), TX_QUEUE_CAPACITY>,
}

impl<'a> MacState<'a> {
    pub fn new<Rng: RngCore, Delay: DelayNsExt>(config: &MacConfig<Rng, Delay>) -> Self {
        Self {
            state: EngineState::Idle,
            csma: CsmaCa::new(config.slotted_csma),
            tx_queue: TxQueue::new(),
            backoff_deadline: None,
            ack_deadline: None,
            pending_confirms: heapless::Vec::new(),
        }
    }

    /// Track the responder of a queued data request.
    ///
    /// The queue and this list share a capacity, so pushing after a
    /// successful enqueue cannot fail.
    pub fn push_pending_confirm(
        &mut self,
        handle: u8,
        responder: RequestResponder<'a, DataRequest>,
    ) {
        unwrap!(self.pending_confirms.push((handle, responder)).ok());
    }

    /// Send the confirm of the data request with the given handle.
    /// Terminal outcomes are reported exactly once.
    pub fn confirm(&mut self, msdu_handle: u8, status: Status) {
        let index = self
            .pending_confirms
            .iter()
            .position(|(handle, _)| *handle == msdu_handle);

        match index {
            Some(index) => {
                let (_, responder) = self.pending_confirms.remove(index);
                responder.respond(DataConfirm {
                    msdu_handle,
                    status,
                });
            }
            None => {
                error!("No pending confirm for handle {}", msdu_handle);
            }
        }
    }

    /// Abandon everything in flight, confirming every queued request
    /// with the given status
    pub fn flush(&mut self, status: Status) {
        self.state = EngineState::Idle;
        self.backoff_deadline = None;
        self.ack_deadline = None;
        self.csma.cancel();
        self.tx_queue.clear();

        while let Some((handle, responder)) = self.pending_confirms.pop() {
            responder.respond(DataConfirm {
                msdu_handle: handle,
                status,
            });
        }
    }
}
