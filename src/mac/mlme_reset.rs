use rand_core::RngCore;

use super::{commander::RequestResponder, state::MacState, MacConfig};
use crate::{
    phy::Phy,
    pib::{MacPib, SequenceNumber},
    sap::{
        reset::{ResetConfirm, ResetRequest},
        Status,
    },
    time::DelayNsExt,
};

/// Put the MAC back in its power-on state.
///
/// Every queued frame is flushed and gets its confirm. The PIB is only
/// reset to its defaults when the request asks for that.
pub async fn process_reset_request<P: Phy, Rng: RngCore, Delay: DelayNsExt>(
    phy: &mut P,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState<'_>,
    config: &mut MacConfig<Rng, Delay>,
    responder: RequestResponder<'_, ResetRequest>,
) {
    let result = phy.reset().await;

    mac_state.flush(Status::TransactionExpired);
    *mac_state = MacState::new(config);

    if responder.request.set_default_pib {
        *mac_pib = MacPib::unassociated(config.extended_address);
        mac_pib.dsn = SequenceNumber::new(config.rng.next_u32() as u8);
    }

    responder.respond(ResetConfirm {
        status: match result {
            Ok(()) => Status::Success,
            Err(e) => {
                error!("Could not reset the radio: {}", e);
                Status::PhyError
            }
        },
    });
}
