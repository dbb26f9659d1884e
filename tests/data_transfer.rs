use std::fs::File;

use vpan_rs::{
    mac::MacCommander,
    pib::PibValue,
    sap::{
        data::{DataIndication, DataRequest, TxOptions},
        set::SetRequest,
        Status,
    },
    wire::{Address, AddressingMode, FrameType, ShortAddress, VpanId},
    DeviceAddress,
};

const VPAN: VpanId = VpanId(100);

async fn configure(commander: &MacCommander, short_address: u16, rx_on_when_idle: bool) {
    let attributes = [
        (PibValue::MAC_VPAN_ID, PibValue::MacVpanId(VPAN)),
        (
            PibValue::MAC_SHORT_ADDRESS,
            PibValue::MacShortAddress(ShortAddress(short_address)),
        ),
        (
            PibValue::MAC_RX_ON_WHEN_IDLE,
            PibValue::MacRxOnWhenIdle(rx_on_when_idle),
        ),
    ];

    for (pib_attribute, pib_attribute_value) in attributes {
        let confirm = commander
            .request(SetRequest {
                pib_attribute,
                pib_attribute_value,
            })
            .await;
        assert_eq!(confirm.status, Status::Success);
    }
}

fn data_request(destination: u16, payload: &[u8], handle: u8, tx_options: TxOptions) -> DataRequest {
    DataRequest {
        src_addr_mode: AddressingMode::Short,
        dst_addr_mode: AddressingMode::Short,
        dst_vpan_id: VPAN,
        dst_address: Some(DeviceAddress::Short(ShortAddress(destination))),
        msdu: heapless::Vec::from_slice(payload).unwrap(),
        msdu_handle: handle,
        tx_options,
    }
}

/// Receive one data indication and release the engine that delivered it
async fn receive_indication(commander: &MacCommander) -> DataIndication {
    let responder = commander.wait_for_indication().await;
    let responder = responder.into_concrete::<DataIndication>();
    let indication = responder.indication.clone();
    responder.respond(());
    indication
}

#[test_log::test(tokio::test(unhandled_panic = "shutdown_runtime", start_paused = true))]
async fn acknowledged_transfer_in_both_directions() {
    let mut runner = vpan_rs::test_helpers::run::run_mac_engine_multi(2);
    let trace_path = std::env::temp_dir().join("acknowledged_transfer.pcap");
    runner.aether.start_trace(File::create(&trace_path).unwrap());

    let a = runner.commanders[0];
    let b = runner.commanders[1];
    configure(a, 0x0001, true).await;
    configure(b, 0x0002, true).await;

    // A to B
    let (confirm, indication) = tokio::join!(
        a.request(data_request(0x0002, b"ping", 1, TxOptions::acknowledged())),
        receive_indication(b),
    );
    assert_eq!(confirm.msdu_handle, 1);
    assert_eq!(confirm.status, Status::Success);
    assert_eq!(&indication.msdu[..], b"ping");
    pretty_assertions::assert_eq!(
        indication.source,
        Some(Address::Short(VPAN, ShortAddress(0x0001)))
    );
    pretty_assertions::assert_eq!(
        indication.destination,
        Some(Address::Short(VPAN, ShortAddress(0x0002)))
    );

    // B back to A
    let (confirm, indication) = tokio::join!(
        b.request(data_request(0x0001, b"pong", 2, TxOptions::acknowledged())),
        receive_indication(a),
    );
    assert_eq!(confirm.status, Status::Success);
    assert_eq!(&indication.msdu[..], b"pong");

    runner.aether.stop_trace();

    // Every data frame must be followed by its acknowledgment
    let frames: Vec<_> = runner
        .aether
        .parse_trace(File::open(&trace_path).unwrap())
        .collect();
    assert_eq!(frames.len(), 4);

    assert_eq!(frames[0].header.frame_type, FrameType::Data);
    assert!(frames[0].header.ack_request);
    assert_eq!(&frames[0].payload[..], b"ping");
    assert_eq!(frames[1].header.frame_type, FrameType::Acknowledgment);
    assert_eq!(frames[1].header.seq, frames[0].header.seq);

    assert_eq!(frames[2].header.frame_type, FrameType::Data);
    assert_eq!(&frames[2].payload[..], b"pong");
    assert_eq!(frames[3].header.frame_type, FrameType::Acknowledgment);
    assert_eq!(frames[3].header.seq, frames[2].header.seq);
}

#[test_log::test(tokio::test(unhandled_panic = "shutdown_runtime", start_paused = true))]
async fn unacknowledged_transfers_send_one_frame_and_succeed() {
    let mut runner = vpan_rs::test_helpers::run::run_mac_engine_multi(2);
    let trace_path = std::env::temp_dir().join("unacknowledged_transfer.pcap");
    runner.aether.start_trace(File::create(&trace_path).unwrap());

    let a = runner.commanders[0];
    let b = runner.commanders[1];
    configure(a, 0x0001, true).await;
    configure(b, 0x0002, true).await;

    // A unicast without the acknowledged option succeeds on its own
    let (confirm, indication) = tokio::join!(
        a.request(data_request(0x0002, b"fire and forget", 5, TxOptions::default())),
        receive_indication(b),
    );
    assert_eq!(confirm.msdu_handle, 5);
    assert_eq!(confirm.status, Status::Success);
    assert_eq!(&indication.msdu[..], b"fire and forget");

    runner.aether.stop_trace();

    // A single data frame, no ack request, no acknowledgment
    let frames: Vec<_> = runner
        .aether
        .parse_trace(File::open(&trace_path).unwrap())
        .collect();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].header.frame_type, FrameType::Data);
    assert!(!frames[0].header.ack_request);
}

#[test_log::test(tokio::test(unhandled_panic = "shutdown_runtime", start_paused = true))]
async fn broadcasts_complete_without_acknowledgment() {
    let mut runner = vpan_rs::test_helpers::run::run_mac_engine_multi(2);
    let trace_path = std::env::temp_dir().join("broadcast_transfer.pcap");
    runner.aether.start_trace(File::create(&trace_path).unwrap());

    let a = runner.commanders[0];
    let b = runner.commanders[1];
    configure(a, 0x0001, true).await;
    configure(b, 0x0002, true).await;

    let request = DataRequest {
        dst_vpan_id: VpanId::BROADCAST,
        // The acknowledged option is ignored for broadcasts
        ..data_request(0xffff, b"to everyone", 3, TxOptions::acknowledged())
    };

    let (confirm, indication) = tokio::join!(a.request(request), receive_indication(b));
    assert_eq!(confirm.status, Status::Success);
    assert_eq!(&indication.msdu[..], b"to everyone");

    runner.aether.stop_trace();

    let frames: Vec<_> = runner
        .aether
        .parse_trace(File::open(&trace_path).unwrap())
        .collect();
    assert_eq!(frames.len(), 1);
    assert!(!frames[0].header.ack_request);
}

#[test_log::test(tokio::test(unhandled_panic = "shutdown_runtime", start_paused = true))]
async fn unacknowledged_frames_are_retried_then_given_up() {
    let mut runner = vpan_rs::test_helpers::run::run_mac_engine_multi(2);
    let trace_path = std::env::temp_dir().join("no_ack_retries.pcap");
    runner.aether.start_trace(File::create(&trace_path).unwrap());

    let a = runner.commanders[0];
    let b = runner.commanders[1];
    configure(a, 0x0001, true).await;
    configure(b, 0x0002, true).await;

    // Nobody owns this address, so no acknowledgment ever comes
    let confirm = a
        .request(data_request(0x0099, b"anyone there?", 4, TxOptions::acknowledged()))
        .await;
    assert_eq!(confirm.msdu_handle, 4);
    assert_eq!(confirm.status, Status::NoAck);

    runner.aether.stop_trace();

    // The original attempt plus macMaxFrameRetries retransmissions
    let frames: Vec<_> = runner
        .aether
        .parse_trace(File::open(&trace_path).unwrap())
        .collect();
    assert_eq!(frames.len(), 4);
    assert!(frames
        .iter()
        .all(|frame| frame.header.frame_type == FrameType::Data));
    assert!(frames
        .iter()
        .all(|frame| frame.header.seq == frames[0].header.seq));
}

#[test_log::test(tokio::test(unhandled_panic = "shutdown_runtime", start_paused = true))]
async fn invalid_requests_are_rejected_before_transmission() {
    let runner = vpan_rs::test_helpers::run::run_mac_engine_simple();
    let commander = runner.commander;
    configure(commander, 0x0001, false).await;

    // Oversized MSDU
    let confirm = commander
        .request(data_request(0x0002, &[0; 119], 1, TxOptions::default()))
        .await;
    assert_eq!(confirm.status, Status::FrameTooLong);

    // No addresses at all
    let confirm = commander
        .request(DataRequest {
            src_addr_mode: AddressingMode::None,
            dst_addr_mode: AddressingMode::None,
            dst_address: None,
            ..data_request(0x0002, b"x", 2, TxOptions::default())
        })
        .await;
    assert_eq!(confirm.status, Status::InvalidAddress);

    // Unsupported transmission options
    let confirm = commander
        .request(data_request(
            0x0002,
            b"x",
            3,
            TxOptions {
                gts: true,
                ..TxOptions::default()
            },
        ))
        .await;
    assert_eq!(confirm.status, Status::InvalidParameter);

    // Reserved addressing mode
    let confirm = commander
        .request(DataRequest {
            dst_addr_mode: AddressingMode::Reserved,
            ..data_request(0x0002, b"x", 4, TxOptions::default())
        })
        .await;
    assert_eq!(confirm.status, Status::InvalidParameter);
}
