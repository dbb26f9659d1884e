use vpan_rs::{
    mac::MacCommander,
    pib::PibValue,
    sap::{get::GetRequest, set::SetRequest, Status},
};

#[test_log::test(tokio::test(unhandled_panic = "shutdown_runtime"))]
async fn get_set() {
    let runner = vpan_rs::test_helpers::run::run_mac_engine_simple();

    test_get(runner.commander).await;
    test_set(runner.commander).await;
}

async fn test_get(commander: &MacCommander) {
    let response = commander
        .request(GetRequest {
            pib_attribute: PibValue::MAC_MIN_BE,
        })
        .await;

    assert_eq!(response.pib_attribute, PibValue::MAC_MIN_BE);
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.value, PibValue::MacMinBe(3));

    // Derived from the PHY characteristics at the moment of the request
    let response = commander
        .request(GetRequest {
            pib_attribute: PibValue::MAC_ACK_WAIT_DURATION,
        })
        .await;

    assert_eq!(response.status, Status::Success);
    assert_eq!(response.value, PibValue::MacAckWaitDuration(20 + 12 + 10 + 12));

    let response = commander
        .request(GetRequest {
            pib_attribute: "macDoesNotExist",
        })
        .await;

    assert_eq!(response.pib_attribute, "macDoesNotExist");
    assert_eq!(response.status, Status::UnsupportedAttribute);
    assert!(matches!(response.value, PibValue::None));
}

async fn test_set(commander: &MacCommander) {
    let response = commander
        .request(SetRequest {
            pib_attribute: PibValue::MAC_MAX_BE,
            pib_attribute_value: PibValue::MacMaxBe(6),
        })
        .await;

    assert_eq!(response.pib_attribute, PibValue::MAC_MAX_BE);
    assert_eq!(response.status, Status::Success);

    let response = commander
        .request(SetRequest {
            pib_attribute: PibValue::MAC_MAX_BE,
            pib_attribute_value: PibValue::MacMaxBe(2), // Below allowed range
        })
        .await;

    assert_eq!(response.pib_attribute, PibValue::MAC_MAX_BE);
    assert_eq!(response.status, Status::InvalidParameter);

    let response = commander
        .request(SetRequest {
            pib_attribute: PibValue::MAC_ACK_WAIT_DURATION, // Read only
            pib_attribute_value: PibValue::MacAckWaitDuration(0),
        })
        .await;

    assert_eq!(response.pib_attribute, PibValue::MAC_ACK_WAIT_DURATION);
    assert_eq!(response.status, Status::ReadOnly);

    let response = commander
        .request(SetRequest {
            pib_attribute: "macDoesNotExist",
            pib_attribute_value: PibValue::None,
        })
        .await;

    assert_eq!(response.pib_attribute, "macDoesNotExist");
    assert_eq!(response.status, Status::UnsupportedAttribute);

    // The new value is visible through MLME-GET
    let response = commander
        .request(GetRequest {
            pib_attribute: PibValue::MAC_MAX_BE,
        })
        .await;

    assert_eq!(response.value, PibValue::MacMaxBe(6));
}
