use super::commander::RequestResponder;
use crate::{
    pib::MacPibWrite,
    sap::{
        set::{SetConfirm, SetRequest},
        Status,
    },
};

pub async fn process_set_request(
    mac_pib_write: &mut MacPibWrite,
    responder: RequestResponder<'_, SetRequest>,
) {
    let pib_attribute = responder.request.pib_attribute;

    let status = mac_pib_write
        .try_set(pib_attribute, &responder.request.pib_attribute_value)
        .unwrap_or(Status::UnsupportedAttribute);

    responder.respond(SetConfirm {
        status,
        pib_attribute,
    });
}
