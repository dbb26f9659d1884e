//! The MCPS and MLME service access points
//!
//! Every primitive comes as a request/confirm pair (or an
//! indication/response pair for traffic that originates at the MAC).

use data::{DataConfirm, DataIndication, DataRequest};
use get::{GetConfirm, GetRequest};
use reset::{ResetConfirm, ResetRequest};
use set::{SetConfirm, SetRequest};

pub mod data;
pub mod get;
pub mod reset;
pub mod set;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Status {
    #[default]
    Success,
    NoAck,
    ChannelAccessFailure,
    FrameTooLong,
    InvalidParameter,
    InvalidAddress,
    InvalidHandle,
    /// The transmit queue is full
    TransactionOverflow,
    /// A queued frame was flushed before it could be sent
    TransactionExpired,
    UnsupportedAttribute,
    ReadOnly,
    PhyError,
}

#[allow(private_bounds)]
pub trait Request: From<RequestValue> + Into<RequestValue> {
    type Confirm: From<ConfirmValue> + Into<ConfirmValue>;
}

pub(crate) enum RequestValue {
    Data(DataRequest),
    Get(GetRequest),
    Reset(ResetRequest),
    Set(SetRequest),
}

impl From<DataRequest> for RequestValue {
    fn from(v: DataRequest) -> Self {
        Self::Data(v)
    }
}

impl From<GetRequest> for RequestValue {
    fn from(v: GetRequest) -> Self {
        Self::Get(v)
    }
}

impl From<ResetRequest> for RequestValue {
    fn from(v: ResetRequest) -> Self {
        Self::Reset(v)
    }
}

impl From<SetRequest> for RequestValue {
    fn from(v: SetRequest) -> Self {
        Self::Set(v)
    }
}

pub(crate) enum ConfirmValue {
    Data(DataConfirm),
    Get(GetConfirm),
    Reset(ResetConfirm),
    Set(SetConfirm),
    None,
}

impl From<ConfirmValue> for () {
    fn from(v: ConfirmValue) -> Self {
        match v {
            ConfirmValue::None => (),
            _ => panic!("Bad cast"),
        }
    }
}

impl From<()> for ConfirmValue {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl From<DataConfirm> for ConfirmValue {
    fn from(v: DataConfirm) -> Self {
        Self::Data(v)
    }
}

impl From<GetConfirm> for ConfirmValue {
    fn from(v: GetConfirm) -> Self {
        Self::Get(v)
    }
}

impl From<ResetConfirm> for ConfirmValue {
    fn from(v: ResetConfirm) -> Self {
        Self::Reset(v)
    }
}

impl From<SetConfirm> for ConfirmValue {
    fn from(v: SetConfirm) -> Self {
        Self::Set(v)
    }
}

#[allow(private_bounds)]
pub trait Indication: From<IndicationValue> + Into<IndicationValue> {
    type Response: From<ResponseValue> + Into<ResponseValue>;
}

pub enum IndicationValue {
    Data(DataIndication),
}

impl From<DataIndication> for IndicationValue {
    fn from(v: DataIndication) -> Self {
        Self::Data(v)
    }
}

pub(crate) enum ResponseValue {
    None,
}

impl From<ResponseValue> for () {
    fn from(v: ResponseValue) -> Self {
        match v {
            ResponseValue::None => (),
        }
    }
}

impl From<()> for ResponseValue {
    fn from(_: ()) -> Self {
        Self::None
    }
}
