use super::commander::RequestResponder;
use crate::{
    phy::Phy,
    pib::{MacPib, PibValue},
    sap::{
        get::{GetConfirm, GetRequest},
        Status,
    },
};

pub async fn process_get_request(
    phy: &impl Phy,
    mac_pib: &MacPib,
    responder: RequestResponder<'_, GetRequest>,
) {
    let pib_attribute = responder.request.pib_attribute;

    match mac_pib.get(pib_attribute, phy) {
        Some(value) => responder.respond(GetConfirm {
            pib_attribute,
            status: Status::Success,
            value,
        }),
        None => responder.respond(GetConfirm {
            pib_attribute,
            status: Status::UnsupportedAttribute,
            value: PibValue::None,
        }),
    }
}
