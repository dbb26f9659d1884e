use heapless::Vec;

use super::{ConfirmValue, Indication, IndicationValue, Request, RequestValue, Status};
use crate::{
    consts::MAX_PHY_PACKET_SIZE,
    wire::{Address, AddressingMode, VpanId},
    DeviceAddress,
};

/// The MCPS-DATA.request primitive requests the transfer of an MSDU to
/// another device.
///
/// The MAC validates the request, builds the data frame around the
/// MSDU and queues it for CSMA-CA transmission. The result of the
/// transfer is reported in a [DataConfirm] carrying the same handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub src_addr_mode: AddressingMode,
    pub dst_addr_mode: AddressingMode,
    pub dst_vpan_id: VpanId,
    pub dst_address: Option<DeviceAddress>,
    /// The payload to carry. Anything that does not fit the PHY after
    /// the MAC header is added is rejected with
    /// [Status::FrameTooLong].
    pub msdu: Vec<u8, MAX_PHY_PACKET_SIZE>,
    /// Echoed in the confirm so the next higher layer can match
    /// confirms to requests
    pub msdu_handle: u8,
    pub tx_options: TxOptions,
}

/// The transmission options of a data request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct TxOptions {
    /// Request an acknowledgment from the receiver.
    ///
    /// Ignored for broadcast destinations, which are never acknowledged.
    pub acknowledged: bool,
    /// GTS transmission. Not supported, requests with this option are
    /// rejected.
    pub gts: bool,
    /// Indirect transmission. Not supported, requests with this option
    /// are rejected.
    pub indirect: bool,
}

impl TxOptions {
    pub fn acknowledged() -> Self {
        Self {
            acknowledged: true,
            ..Default::default()
        }
    }
}

impl From<RequestValue> for DataRequest {
    fn from(value: RequestValue) -> Self {
        match value {
            RequestValue::Data(val) => val,
            _ => panic!("Bad cast"),
        }
    }
}

impl Request for DataRequest {
    type Confirm = DataConfirm;
}

/// The MCPS-DATA.confirm primitive reports the result of a data
/// transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct DataConfirm {
    pub msdu_handle: u8,
    pub status: Status,
}

impl From<ConfirmValue> for DataConfirm {
    fn from(value: ConfirmValue) -> Self {
        match value {
            ConfirmValue::Data(val) => val,
            _ => panic!("Bad cast"),
        }
    }
}

/// The MCPS-DATA.indication primitive hands a received MSDU to the
/// next higher layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataIndication {
    pub source: Option<Address>,
    pub destination: Option<Address>,
    pub msdu: Vec<u8, MAX_PHY_PACKET_SIZE>,
    /// The link quality of the reception
    pub mpdu_link_quality: u8,
    /// The sequence number of the received frame
    pub dsn: u8,
}

impl From<IndicationValue> for DataIndication {
    fn from(value: IndicationValue) -> Self {
        match value {
            IndicationValue::Data(val) => val,
        }
    }
}

impl Indication for DataIndication {
    type Response = ();
}
