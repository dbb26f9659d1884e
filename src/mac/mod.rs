use crate::{
    consts::ACK_MPDU_SIZE,
    csma::CsmaOutcome,
    phy::{CcaResult, Phy, ReceivedMessage, SendResult, TransceiverState},
    pib::{MacPib, SequenceNumber},
    sap::{data::DataIndication, RequestValue, Status},
    time::{DelayNsExt, Duration},
    wire::{fcs, fcs::FcsMode, Address, ExtendedAddress, Frame, FrameType, Header},
};

mod commander;
mod mcps_data;
mod mlme_get;
mod mlme_reset;
mod mlme_set;
#[cfg(test)]
pub(crate) mod mock;
mod state;

use byte::{TryRead, TryWrite};
use commander::MacHandler;
pub use commander::{IndicationResponder, MacCommander};
use embassy_futures::select::{select, Either};
use futures::FutureExt;
use mcps_data::process_data_request;
use mlme_get::process_get_request;
use mlme_reset::process_reset_request;
use mlme_set::process_set_request;
use rand_core::RngCore;
pub use state::EngineState;
use state::MacState;

/// Run the MAC layer of the VLC protocol.
///
/// This is an async function that should always be polled in the background.
/// The given [MacCommander] is the method of communicating with the MAC.
pub async fn run_mac_engine<'a, Rng: RngCore, Delay: DelayNsExt>(
    mut phy: impl Phy + 'a,
    commander: &'a MacCommander,
    mut config: MacConfig<Rng, Delay>,
) -> ! {
    let handler = commander.get_handler();
    let mut mac_pib = MacPib::unassociated(config.extended_address);
    mac_pib.dsn = SequenceNumber::new(config.rng.next_u32() as u8);
    let mut mac_state = MacState::new(&config);

    loop {
        if let Err(e) = prepare_radio(&mut phy, &mac_pib, &mut mac_state, &mut config).await {
            error!("Could not prepare the radio: {}", e);
        }

        let result = select(
            wait_for_radio_event(&mut phy, &mac_state, &mut config.delay),
            handler.wait_for_request(),
        )
        .await;

        match result {
            Either::First(event) => {
                handle_radio_event(
                    event,
                    &mut phy,
                    &mut mac_pib,
                    &mut mac_state,
                    &handler,
                    &mut config,
                )
                .await
            }
            Either::Second(responder) => {
                handle_request(
                    responder,
                    &mut phy,
                    &mut mac_pib,
                    &mut mac_state,
                    &mut config,
                )
                .await;
            }
        }
    }
}

async fn handle_request<'a, Rng: RngCore, Delay: DelayNsExt>(
    responder: commander::RequestResponder<'a, RequestValue>,
    phy: &mut (impl Phy + 'a),
    mac_pib: &mut MacPib,
    mac_state: &mut MacState<'a>,
    config: &mut MacConfig<Rng, Delay>,
) {
    match &responder.request {
        RequestValue::Data(_) => {
            process_data_request(
                phy,
                mac_pib,
                mac_state,
                config.fcs_mode,
                responder.into_concrete(),
            )
            .await
        }
        RequestValue::Get(_) => {
            process_get_request(&*phy, &*mac_pib, responder.into_concrete()).await
        }
        RequestValue::Reset(_) => {
            process_reset_request(phy, mac_pib, mac_state, config, responder.into_concrete()).await
        }
        RequestValue::Set(_) => {
            process_set_request(&mut mac_pib.pib_write, responder.into_concrete()).await
        }
    }
}

/// Configuration for the MAC layer
#[derive(Debug, Clone)]
pub struct MacConfig<Rng: RngCore, Delay: DelayNsExt> {
    /// The unique EUI-64 address used by the mac layer
    pub extended_address: ExtendedAddress,
    pub rng: Rng,
    pub delay: Delay,
    /// Use the slotted variant of CSMA-CA
    pub slotted_csma: bool,
    /// Whether outgoing frames carry a real FCS and incoming frames are
    /// checked against theirs
    pub fcs_mode: FcsMode,
}

/// The wall-clock time a number of symbol periods takes at the given
/// symbol rate
fn symbols_to_duration(symbols: u32, symbol_rate: f32) -> Duration {
    Duration::from_micros((symbols as f32 * 1_000_000.0 / symbol_rate) as i64)
}

/// Drive the engine towards the queue and set the transceiver state
/// that belongs to the current engine state.
///
/// When the engine is idle and a frame waits in the queue, this is
/// where a new channel access attempt starts.
async fn prepare_radio<P: Phy, Rng: RngCore, Delay: DelayNsExt>(
    phy: &mut P,
    mac_pib: &MacPib,
    mac_state: &mut MacState<'_>,
    config: &mut MacConfig<Rng, Delay>,
) -> Result<(), P::Error> {
    if mac_state.state != EngineState::Idle {
        return Ok(());
    }

    if !mac_state.tx_queue.is_empty() {
        // CCA needs the receiver
        phy.set_transceiver_state(TransceiverState::RxOn).await?;

        mac_state.csma.start(mac_pib);
        let backoff = mac_state
            .csma
            .random_backoff(&mut config.rng, phy.symbol_rate());
        let now = phy.get_instant().await?;

        mac_state.state = EngineState::Csma;
        mac_state.backoff_deadline = Some(now + backoff);
        trace!("Starting channel access, first backoff {}", backoff);
    } else if mac_pib.rx_on_when_idle || mac_pib.promiscuous_mode {
        phy.set_transceiver_state(TransceiverState::RxOn).await?;
    } else {
        phy.set_transceiver_state(TransceiverState::TrxOff).await?;
    }

    Ok(())
}

enum RadioEvent {
    Error,
    /// A frame arrived from the radio
    Received(ReceivedMessage),
    /// The current backoff ran out, a CCA is due
    BackoffExpired,
    /// The acknowledgment of the queue head did not arrive in time
    AckWaitTimeout,
    /// CSMA-CA declared the channel clear, the queue head may be sent
    ChannelClear,
    SendAck {
        /// The sequence number of the frame being acknowledged
        seq: u8,
    },
}

/// Wait for a radio event. The event must be processed by the
/// [handle_radio_event] function. The split is there because it allows
/// this function to be cancellable.
async fn wait_for_radio_event(
    phy: &mut impl Phy,
    mac_state: &MacState<'_>,
    delay: &mut impl DelayNsExt,
) -> RadioEvent {
    let current_time = match phy.get_instant().await {
        Ok(current_time) => current_time,
        Err(e) => {
            error!("Could not get current time: {}", e);
            return RadioEvent::Error;
        }
    };

    let backoff_expired = wait_for_deadline(
        mac_state.backoff_deadline,
        current_time,
        delay.clone(),
        RadioEvent::BackoffExpired,
    );
    let ack_wait_timeout = wait_for_deadline(
        mac_state.ack_deadline,
        current_time,
        delay.clone(),
        RadioEvent::AckWaitTimeout,
    );
    let reception = phy.receive();

    futures::select_biased! {
        received = reception.fuse() => {
            match received {
                Ok(message) => RadioEvent::Received(message),
                Err(e) => {
                    error!("Phy receive error: {}", e);
                    RadioEvent::Error
                }
            }
        },
        event = backoff_expired.fuse() => event,
        event = ack_wait_timeout.fuse() => event,
    }
}

async fn wait_for_deadline(
    deadline: Option<crate::time::Instant>,
    current_time: crate::time::Instant,
    mut delay: impl DelayNsExt,
    event: RadioEvent,
) -> RadioEvent {
    match deadline {
        Some(deadline) => {
            delay
                .delay_duration(deadline.duration_since(current_time))
                .await;
            event
        }
        None => core::future::pending().await,
    }
}

async fn handle_radio_event<P: Phy, Rng: RngCore, Delay: DelayNsExt>(
    mut event: RadioEvent,
    phy: &mut P,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState<'_>,
    mac_handler: &MacHandler<'_>,
    config: &mut MacConfig<Rng, Delay>,
) {
    loop {
        match event {
            RadioEvent::Error => {}
            RadioEvent::BackoffExpired => {
                mac_state.backoff_deadline = None;
                mac_state.csma.begin_cca();

                let channel_idle = match phy.request_cca().await {
                    Ok(CcaResult::Idle) => true,
                    Ok(CcaResult::Busy) => false,
                    Err(e) => {
                        error!("Could not assess the channel: {}", e);
                        false
                    }
                };

                match mac_state.csma.cca_confirm(channel_idle) {
                    None => {
                        // The attempt was cancelled while the radio was
                        // measuring
                    }
                    Some(CsmaOutcome::ChannelIdle) => {
                        event = RadioEvent::ChannelClear;
                        continue;
                    }
                    Some(CsmaOutcome::RepeatCca) => {
                        // The contention window has not closed, assess
                        // again right away
                        event = RadioEvent::BackoffExpired;
                        continue;
                    }
                    Some(CsmaOutcome::Backoff) => {
                        let backoff = mac_state
                            .csma
                            .random_backoff(&mut config.rng, phy.symbol_rate());
                        match phy.get_instant().await {
                            Ok(now) => mac_state.backoff_deadline = Some(now + backoff),
                            Err(e) => error!("Could not get current time: {}", e),
                        }
                    }
                    Some(CsmaOutcome::ChannelAccessFailure) => {
                        warn!("Channel access failure");
                        if let Some(head) = mac_state.tx_queue.remove_head() {
                            mac_state.confirm(head.handle, Status::ChannelAccessFailure);
                        }
                        mac_state.state = EngineState::Idle;
                    }
                }
            }
            RadioEvent::ChannelClear => transmit_queue_head(phy, mac_pib, mac_state).await,
            RadioEvent::AckWaitTimeout => {
                debug!("No acknowledgment arrived in time");
                mac_state.ack_deadline = None;
                apply_retry_policy(mac_pib, mac_state);
            }
            RadioEvent::Received(message) => {
                if let Some(next_event) =
                    process_message(message, mac_state, mac_pib, mac_handler, config.fcs_mode)
                        .await
                {
                    event = next_event;
                    continue;
                }
            }
            RadioEvent::SendAck { seq } => send_ack(phy, seq, config).await,
        }

        break;
    }
}

/// Hand the queue head to the radio after CSMA-CA declared the channel
/// clear
async fn transmit_queue_head(
    phy: &mut impl Phy,
    mac_pib: &MacPib,
    mac_state: &mut MacState<'_>,
) {
    let Some(head) = mac_state.tx_queue.head() else {
        mac_state.state = EngineState::Idle;
        return;
    };
    let handle = head.handle;
    let ack_request = head.ack_request;

    mac_state.state = EngineState::Sending;

    if let Err(e) = phy.set_transceiver_state(TransceiverState::TxOn).await {
        error!("Could not turn the transmitter on: {}", e);
        mac_state.tx_queue.remove_head();
        mac_state.confirm(handle, Status::PhyError);
        mac_state.state = EngineState::Idle;
        return;
    }

    let result = match mac_state.tx_queue.head() {
        Some(head) => phy.transmit(&head.frame).await,
        None => unreachable!(),
    };

    match result {
        Ok(SendResult::Success(sent_time)) => {
            if ack_request {
                let ack_wait =
                    symbols_to_duration(mac_pib.ack_wait_duration(&*phy), phy.symbol_rate());
                mac_state.ack_deadline = Some(sent_time + ack_wait);
                mac_state.state = EngineState::AckPending;

                if let Err(e) = phy.set_transceiver_state(TransceiverState::RxOn).await {
                    error!("Could not turn the receiver on for the ack: {}", e);
                }
            } else {
                mac_state.tx_queue.remove_head();
                mac_state.confirm(handle, Status::Success);
                mac_state.state = EngineState::Idle;
            }
        }
        Ok(SendResult::FrameTooLong) => {
            mac_state.tx_queue.remove_head();
            mac_state.confirm(handle, Status::FrameTooLong);
            mac_state.state = EngineState::Idle;
        }
        Err(e) => {
            error!("Could not transmit: {}", e);
            mac_state.tx_queue.remove_head();
            mac_state.confirm(handle, Status::PhyError);
            mac_state.state = EngineState::Idle;
        }
    }
}

/// Decide the fate of the queue head after its transmission failed.
///
/// Within the retry budget the frame stays at the head of the queue and
/// the engine starts a fresh channel access attempt for it. Beyond the
/// budget the frame is given up with [Status::NoAck].
fn apply_retry_policy(mac_pib: &MacPib, mac_state: &mut MacState<'_>) {
    mac_state.ack_deadline = None;
    mac_state.state = EngineState::Idle;

    let csma_backoffs = mac_state.csma.backoff_count() + 1;
    let Some(head) = mac_state.tx_queue.head_mut() else {
        return;
    };

    if head.retransmission() < mac_pib.max_frame_retries {
        head.record_retry(csma_backoffs);
        debug!(
            "Retransmitting frame {}, attempt {}",
            head.handle,
            head.retransmission()
        );
    } else {
        let handle = head.handle;
        mac_state.tx_queue.remove_head();
        mac_state.confirm(handle, Status::NoAck);
    }
}

/// Build and send an acknowledgment. Acks never go through the queue or
/// CSMA-CA.
async fn send_ack<Rng: RngCore, Delay: DelayNsExt>(
    phy: &mut impl Phy,
    seq: u8,
    config: &mut MacConfig<Rng, Delay>,
) {
    let frame = Frame {
        header: Header {
            frame_type: FrameType::Acknowledgment,
            frame_pending: false,
            ack_request: false,
            frame_version: 0,
            seq,
            destination: None,
            source: None,
            auxiliary_security_header: None,
        },
        payload: &[],
        footer: [0, 0],
    };

    let mut buffer = [0u8; ACK_MPDU_SIZE];
    let len = match frame.try_write(&mut buffer, config.fcs_mode) {
        Ok(len) => len,
        Err(_) => unreachable!(),
    };

    // RX-to-TX turnaround before the ack goes out
    config
        .delay
        .delay_duration(symbols_to_duration(
            phy.turnaround_time(),
            phy.symbol_rate(),
        ))
        .await;

    if let Err(e) = phy.set_transceiver_state(TransceiverState::TxOn).await {
        error!("Could not turn the transmitter on for an ack: {}", e);
        return;
    }

    trace!("Sending ack for sequence number {}", seq);
    match phy.transmit(&buffer[..len]).await {
        Ok(SendResult::Success(_)) => {}
        Ok(SendResult::FrameTooLong) => unreachable!(),
        Err(e) => error!("Could not send an ack: {}", e),
    }
}

async fn process_message(
    message: ReceivedMessage,
    mac_state: &mut MacState<'_>,
    mac_pib: &MacPib,
    mac_handler: &MacHandler<'_>,
    fcs_mode: FcsMode,
) -> Option<RadioEvent> {
    if !fcs::verify(&message.data, fcs_mode) {
        trace!("Dropping a frame with a bad FCS");
        return None;
    }

    let Ok((frame, _)) = Frame::try_read(&message.data, ()) else {
        trace!("Received a frame that could not be parsed");
        return None;
    };

    if mac_pib.promiscuous_mode {
        // Monitor mode: every frame with a valid FCS goes up, acks
        // included, and no MAC processing happens
        let indication = data_indication(&frame, &message);
        mac_handler.indicate(indication).await;
        return None;
    }

    // Acks are MAC internal and never reach the upper layer
    if frame.header.frame_type == FrameType::Acknowledgment {
        process_ack(frame.header.seq, mac_pib, mac_state);
        return None;
    }

    if !accepts_frame(&frame.header, mac_pib) {
        trace!("Dropping a filtered frame");
        return None;
    }

    let should_ack = matches!(
        frame.header.frame_type,
        FrameType::Data | FrameType::MacCommand
    ) && frame.header.ack_request
        && !frame
            .header
            .destination
            .is_some_and(|destination| destination.is_broadcast());

    if should_ack {
        // Ack generation preempts any user frame in flight
        match mac_state.state {
            EngineState::AckPending => apply_retry_policy(mac_pib, mac_state),
            EngineState::Csma => {
                mac_state.csma.cancel();
                mac_state.backoff_deadline = None;
            }
            _ => {}
        }
        mac_state.state = EngineState::Idle;
    }

    if frame.header.frame_type == FrameType::Data {
        let indication = data_indication(&frame, &message);
        mac_handler.indicate(indication).await;
    }

    should_ack.then_some(RadioEvent::SendAck {
        seq: frame.header.seq,
    })
}

fn data_indication(frame: &Frame<'_>, message: &ReceivedMessage) -> DataIndication {
    DataIndication {
        source: frame.header.source,
        destination: frame.header.destination,
        msdu: unwrap!(heapless::Vec::from_slice(frame.payload).ok()),
        mpdu_link_quality: message.lqi,
        dsn: frame.header.seq,
    }
}

fn process_ack(seq: u8, mac_pib: &MacPib, mac_state: &mut MacState<'_>) {
    if mac_state.state != EngineState::AckPending {
        trace!("Ignoring an unexpected acknowledgment");
        return;
    }

    mac_state.ack_deadline = None;

    match mac_state.tx_queue.head().map(|head| (head.seq, head.handle)) {
        Some((head_seq, handle)) if head_seq == seq => {
            mac_state.tx_queue.remove_head();
            mac_state.confirm(handle, Status::Success);
            mac_state.state = EngineState::Idle;
        }
        _ => {
            // An ack for some other frame counts as a failed attempt
            debug!("Received an ack with an unexpected sequence number");
            apply_retry_policy(mac_pib, mac_state);
        }
    }
}

/// Receive filtering as applied to every non-ack frame.
///
/// Promiscuous mode bypasses this entirely.
fn accepts_frame(header: &Header, mac_pib: &MacPib) -> bool {
    if matches!(header.frame_type, FrameType::Reserved) {
        return false;
    }

    if header.frame_version > 1 {
        return false;
    }

    if let Some(destination) = header.destination {
        if destination.vpan_id() != mac_pib.vpan_id && !destination.vpan_id().is_broadcast() {
            return false;
        }

        match destination {
            Address::Short(_, address) => {
                if address != mac_pib.short_address && !address.is_broadcast() {
                    return false;
                }
            }
            Address::Extended(_, address) => {
                if address != mac_pib.extended_address {
                    return false;
                }
            }
        }
    }

    match header.frame_type {
        FrameType::Beacon => {
            // An unassociated device accepts beacons from every VPAN
            let Some(source) = header.source else {
                return false;
            };
            if !mac_pib.vpan_id.is_broadcast() && source.vpan_id() != mac_pib.vpan_id {
                return false;
            }
        }
        FrameType::Data | FrameType::MacCommand if header.destination.is_none() => {
            // Source-only frames must come from our own VPAN
            let Some(source) = header.source else {
                return false;
            };
            if source.vpan_id() != mac_pib.vpan_id {
                return false;
            }
        }
        _ => {}
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mac::mock::MockPhy,
        wire::{ShortAddress, VpanId},
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn test_pib() -> MacPib {
        let mut pib = MacPib::unassociated(ExtendedAddress(0xaabbccdd));
        pib.vpan_id = VpanId(100);
        pib.short_address = ShortAddress(0x0011);
        pib
    }

    fn data_header(destination: Option<Address>, source: Option<Address>) -> Header {
        Header {
            frame_type: FrameType::Data,
            frame_pending: false,
            ack_request: false,
            frame_version: 0,
            seq: 1,
            destination,
            source,
            auxiliary_security_header: None,
        }
    }

    #[test]
    fn filter_accepts_own_and_broadcast_destinations() {
        let pib = test_pib();
        let source = Some(Address::Short(VpanId(100), ShortAddress(0x0022)));

        let own = data_header(
            Some(Address::Short(VpanId(100), ShortAddress(0x0011))),
            source,
        );
        let broadcast = data_header(
            Some(Address::Short(VpanId::BROADCAST, ShortAddress::BROADCAST)),
            source,
        );
        let extended = data_header(
            Some(Address::Extended(VpanId(100), ExtendedAddress(0xaabbccdd))),
            source,
        );

        assert!(accepts_frame(&own, &pib));
        assert!(accepts_frame(&broadcast, &pib));
        assert!(accepts_frame(&extended, &pib));
    }

    #[test]
    fn filter_rejects_other_destinations() {
        let pib = test_pib();
        let source = Some(Address::Short(VpanId(100), ShortAddress(0x0022)));

        let other_vpan = data_header(
            Some(Address::Short(VpanId(200), ShortAddress(0x0011))),
            source,
        );
        let other_short = data_header(
            Some(Address::Short(VpanId(100), ShortAddress(0x0033))),
            source,
        );
        let other_extended = data_header(
            Some(Address::Extended(VpanId(100), ExtendedAddress(1))),
            source,
        );

        assert!(!accepts_frame(&other_vpan, &pib));
        assert!(!accepts_frame(&other_short, &pib));
        assert!(!accepts_frame(&other_extended, &pib));
    }

    #[test]
    fn filter_rejects_reserved_type_and_future_versions() {
        let pib = test_pib();
        let destination = Some(Address::Short(VpanId(100), ShortAddress(0x0011)));
        let source = Some(Address::Short(VpanId(100), ShortAddress(0x0022)));

        let reserved = Header {
            frame_type: FrameType::Reserved,
            ..data_header(destination, source)
        };
        let future_version = Header {
            frame_version: 2,
            ..data_header(destination, source)
        };

        assert!(!accepts_frame(&reserved, &pib));
        assert!(!accepts_frame(&future_version, &pib));
    }

    #[test]
    fn filter_checks_the_source_vpan_of_source_only_frames() {
        let pib = test_pib();

        let own_vpan = data_header(None, Some(Address::Short(VpanId(100), ShortAddress(2))));
        let other_vpan = data_header(None, Some(Address::Short(VpanId(200), ShortAddress(2))));

        assert!(accepts_frame(&own_vpan, &pib));
        assert!(!accepts_frame(&other_vpan, &pib));
    }

    #[tokio::test]
    async fn slotted_contention_window_repeats_the_cca_immediately() {
        let commander = MacCommander::new();
        let handler = commander.get_handler();
        let mut config = MacConfig {
            extended_address: ExtendedAddress(1),
            rng: StdRng::seed_from_u64(0x5107),
            delay: crate::test_helpers::time::Delay,
            slotted_csma: true,
            fcs_mode: FcsMode::Enabled,
        };

        let mut phy = MockPhy::new();
        let mut mac_pib = MacPib::unassociated(ExtendedAddress(1));
        let mut mac_state = MacState::new(&config);
        mac_state.csma.start(&mac_pib);
        mac_state.state = EngineState::Csma;

        handle_radio_event(
            RadioEvent::BackoffExpired,
            &mut phy,
            &mut mac_pib,
            &mut mac_state,
            &handler,
            &mut config,
        )
        .await;

        // Both assessments of the contention window run back to back,
        // without a backoff in between
        assert_eq!(phy.cca_requests, 2);
        assert!(mac_state.backoff_deadline.is_none());
        assert_eq!(mac_state.state, EngineState::Idle);
    }

    #[test]
    fn unassociated_devices_accept_beacons_from_every_vpan() {
        let unassociated = MacPib::unassociated(ExtendedAddress(1));
        let associated = test_pib();

        let beacon = Header {
            frame_type: FrameType::Beacon,
            ..data_header(None, Some(Address::Short(VpanId(200), ShortAddress(2))))
        };

        assert!(accepts_frame(&beacon, &unassociated));
        assert!(!accepts_frame(&beacon, &associated));
    }
}
