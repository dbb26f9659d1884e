use byte::TryWrite;

use super::{commander::RequestResponder, state::MacState};
use crate::{
    consts::{MAX_PHY_PACKET_SIZE, MIN_MPDU_OVERHEAD},
    phy::Phy,
    pib::MacPib,
    queue::TxQueueElement,
    sap::{
        data::{DataConfirm, DataRequest},
        Status,
    },
    wire::{fcs::FcsMode, Address, AddressingMode, Frame, FrameType, Header},
    DeviceAddress,
};

/// Validate an MCPS-DATA.request, build the frame around the MSDU and
/// put it on the transmit queue.
///
/// Only requests that pass validation and fit the queue get a pending
/// confirm. Everything else is confirmed negatively right here.
pub async fn process_data_request<'a>(
    phy: &mut impl Phy,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState<'a>,
    fcs_mode: FcsMode,
    responder: RequestResponder<'a, DataRequest>,
) {
    let request = &responder.request;
    let msdu_handle = request.msdu_handle;

    let max_msdu_len = phy.max_frame_size().saturating_sub(MIN_MPDU_OVERHEAD);
    if request.msdu.len() > max_msdu_len {
        responder.respond(DataConfirm {
            msdu_handle,
            status: Status::FrameTooLong,
        });
        return;
    }

    let (destination, source) = match build_addresses(request, mac_pib) {
        Ok(addresses) => addresses,
        Err(status) => {
            responder.respond(DataConfirm {
                msdu_handle,
                status,
            });
            return;
        }
    };

    if request.tx_options.gts || request.tx_options.indirect {
        responder.respond(DataConfirm {
            msdu_handle,
            status: Status::InvalidParameter,
        });
        return;
    }

    let seq = mac_pib.dsn.value();
    mac_pib.dsn.increment();

    // Broadcasts are never acknowledged, even when the option asks for it
    let ack_request = request.tx_options.acknowledged
        && !destination.is_some_and(|destination| destination.is_broadcast());

    let frame = Frame {
        header: Header {
            frame_type: FrameType::Data,
            frame_pending: false,
            ack_request,
            frame_version: 0,
            seq,
            destination,
            source,
            auxiliary_security_header: None,
        },
        payload: &request.msdu,
        footer: [0, 0],
    };

    let mut buffer = [0u8; MAX_PHY_PACKET_SIZE];
    let len = match frame.try_write(&mut buffer, fcs_mode) {
        Ok(len) => len,
        Err(_) => {
            // The MSDU fits, but not together with this header
            responder.respond(DataConfirm {
                msdu_handle,
                status: Status::FrameTooLong,
            });
            return;
        }
    };

    let element = TxQueueElement::new(
        msdu_handle,
        unwrap!(heapless::Vec::from_slice(&buffer[..len]).ok()),
        seq,
        ack_request,
    );

    if mac_state.tx_queue.push(element).is_err() {
        responder.respond(DataConfirm {
            msdu_handle,
            status: Status::TransactionOverflow,
        });
        return;
    }

    trace!("Queued frame {} with sequence number {}", msdu_handle, seq);
    mac_state.push_pending_confirm(msdu_handle, responder);
}

/// Turn the addressing fields of the request into header addresses.
///
/// Source addresses are filled in from the PIB.
fn build_addresses(
    request: &DataRequest,
    mac_pib: &MacPib,
) -> Result<(Option<Address>, Option<Address>), Status> {
    if request.src_addr_mode == AddressingMode::None
        && request.dst_addr_mode == AddressingMode::None
    {
        return Err(Status::InvalidAddress);
    }

    if request.src_addr_mode == AddressingMode::Reserved
        || request.dst_addr_mode == AddressingMode::Reserved
    {
        return Err(Status::InvalidParameter);
    }

    let destination = match (request.dst_addr_mode, request.dst_address) {
        (AddressingMode::None, _) => None,
        (AddressingMode::Short, Some(DeviceAddress::Short(address))) => {
            Some(Address::Short(request.dst_vpan_id, address))
        }
        (AddressingMode::Extended, Some(DeviceAddress::Extended(address))) => {
            Some(Address::Extended(request.dst_vpan_id, address))
        }
        // The address is missing or does not match its mode
        _ => return Err(Status::InvalidParameter),
    };

    let source = match request.src_addr_mode {
        AddressingMode::None => None,
        AddressingMode::Short => Some(Address::Short(mac_pib.vpan_id, mac_pib.short_address)),
        AddressingMode::Extended => {
            Some(Address::Extended(mac_pib.vpan_id, mac_pib.extended_address))
        }
        AddressingMode::Reserved => unreachable!(),
    };

    Ok((destination, source))
}
