use vpan_rs::{
    pib::PibValue,
    sap::{get::GetRequest, reset::ResetRequest, set::SetRequest, Status},
    wire::VpanId,
};

#[test_log::test(tokio::test(unhandled_panic = "shutdown_runtime", start_paused = true))]
async fn reset_optionally_restores_the_default_pib() {
    let runner = vpan_rs::test_helpers::run::run_mac_engine_simple();
    let commander = runner.commander;

    let confirm = commander
        .request(SetRequest {
            pib_attribute: PibValue::MAC_VPAN_ID,
            pib_attribute_value: PibValue::MacVpanId(VpanId(100)),
        })
        .await;
    assert_eq!(confirm.status, Status::Success);

    // A reset that keeps the PIB
    let confirm = commander
        .request(ResetRequest {
            set_default_pib: false,
        })
        .await;
    assert_eq!(confirm.status, Status::Success);

    let confirm = commander
        .request(GetRequest {
            pib_attribute: PibValue::MAC_VPAN_ID,
        })
        .await;
    assert_eq!(confirm.value, PibValue::MacVpanId(VpanId(100)));

    // A reset that restores the defaults
    let confirm = commander
        .request(ResetRequest {
            set_default_pib: true,
        })
        .await;
    assert_eq!(confirm.status, Status::Success);

    let confirm = commander
        .request(GetRequest {
            pib_attribute: PibValue::MAC_VPAN_ID,
        })
        .await;
    assert_eq!(confirm.value, PibValue::MacVpanId(VpanId::BROADCAST));
}
