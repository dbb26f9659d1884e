use super::{ConfirmValue, Request, RequestValue, Status};
use crate::pib::PibValue;

/// The MLME-SET.request primitive attempts to write the given value to
/// the indicated PIB attribute.
///
/// The write only happens when the attribute exists, is writable, the
/// value has the right type and the value is within the attribute's
/// range. Otherwise the confirm reports why the PIB was left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SetRequest {
    pub pib_attribute: &'static str,
    pub pib_attribute_value: PibValue,
}

impl From<RequestValue> for SetRequest {
    fn from(value: RequestValue) -> Self {
        match value {
            RequestValue::Set(val) => val,
            _ => panic!("Bad cast"),
        }
    }
}

impl Request for SetRequest {
    type Confirm = SetConfirm;
}

/// The MLME-SET.confirm primitive reports the result of a write to a
/// PIB attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetConfirm {
    pub status: Status,
    pub pib_attribute: &'static str,
}

impl From<ConfirmValue> for SetConfirm {
    fn from(value: ConfirmValue) -> Self {
        match value {
            ConfirmValue::Set(val) => val,
            _ => panic!("Bad cast"),
        }
    }
}
