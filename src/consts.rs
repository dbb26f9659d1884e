//! The constants of the MAC and PHY sublayers

/// The number of octets added by the MAC sublayer to form an
/// acknowledgment frame (frame control, sequence number and FCS).
#[doc(alias = "aAckMPDUSize")]
pub const ACK_MPDU_SIZE: usize = 5;

/// The maximum number of octets that can be transmitted in the MAC Payload field.
#[doc(alias = "aMaxMACPayloadSize")]
pub const MAX_MAC_PAYLOAD_SIZE: usize = MAX_PHY_PACKET_SIZE - MIN_MPDU_OVERHEAD;

/// The minimum number of octets added by the MAC
/// sublayer to the PSDU.
#[doc(alias = "aMinMPDUOverhead")]
pub const MIN_MPDU_OVERHEAD: usize = 9;

/// The number of symbols forming the basic time period
/// used by the CSMA-CA algorithm.
#[doc(alias = "aUnitBackoffPeriod")]
pub const UNIT_BACKOFF_PERIOD: u32 = 20;

/// The maximum PSDU size (in octets) the PHY shall be able to receive.
#[doc(alias = "aMaxPHYPacketSize")]
pub const MAX_PHY_PACKET_SIZE: usize = 127;

/// RX-to-TX or TX-to-RX turnaround time (in symbol periods).
#[doc(alias = "aTurnaroundTime")]
pub const TURNAROUND_TIME: u32 = 12;

/// The short address reserved for broadcast transmissions.
pub const BROADCAST_SHORT_ADDRESS: u16 = 0xffff;

/// The VPAN identifier that addresses all VPANs in range.
pub const BROADCAST_VPAN_ID: u16 = 0xffff;

/// The VPAN identifier a device carries while it is not associated
/// with any VPAN. Equal to the broadcast VPAN id, which makes an
/// unassociated device accept beacons from every VPAN.
pub const UNASSOCIATED_VPAN_ID: u16 = 0xffff;
