use petadopt_core::error::PublishError;
use petadopt_core::messaging::EventPublisher;

use crate::helpers::{EXCHANGE, PetAdopted, broker, pet_name_of, registry};

#[tokio::test]
async fn should_use_routing_key_of_registered_event() {
    let broker = broker();
    let publisher = EventPublisher::new(broker.clone(), EXCHANGE, registry());
    let event = PetAdopted::new("Rex");

    publisher.publish(&event).await.unwrap();

    let published = broker.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].exchange, EXCHANGE);
    assert_eq!(published[0].routing_key, "pet.adopted.v1");
    assert_eq!(published[0].message_id, Some(event.event_id.to_string()));
    assert_eq!(pet_name_of(&published[0].payload), "Rex");
}

#[tokio::test]
async fn should_reencode_raw_payload_with_event_id_as_message_id() {
    let broker = broker();
    let publisher = EventPublisher::new(broker.clone(), EXCHANGE, registry());
    let event = PetAdopted::new("Bella");
    let payload = format!(
        "{{ \"petName\": \"Bella\", \"eventId\": \"{}\", \"aggregateId\": \"{}\", \"occurredOn\": \"{}\" }}",
        event.event_id,
        event.aggregate_id,
        event.occurred_on.to_rfc3339()
    );

    publisher
        .publish_raw("PetAdoptedEvent", &payload)
        .await
        .unwrap();

    let published = broker.published();
    assert_eq!(published[0].message_id, Some(event.event_id.to_string()));
    let body = String::from_utf8(published[0].payload.clone()).unwrap();
    assert!(!body.contains(' '), "canonical JSON has no padding: {body}");
    assert_eq!(pet_name_of(&published[0].payload), "Bella");
}

#[tokio::test]
async fn should_send_unknown_event_type_with_empty_routing_key() {
    let broker = broker();
    let publisher = EventPublisher::new(broker.clone(), EXCHANGE, registry());

    publisher
        .publish_raw("PetVaccinatedEvent", r#"{"petName":"Rex"}"#)
        .await
        .unwrap();

    let published = broker.published();
    assert_eq!(published[0].routing_key, "");
    assert_eq!(published[0].payload, br#"{"petName":"Rex"}"#.to_vec());
    assert_eq!(published[0].message_id, None);
}

#[tokio::test]
async fn should_reject_undecodable_payload_before_sending() {
    let broker = broker();
    let publisher = EventPublisher::new(broker.clone(), EXCHANGE, registry());

    let err = publisher
        .publish_raw("PetAdoptedEvent", r#"{"petName":42}"#)
        .await
        .unwrap_err();

    match err {
        PublishError::Decode { event_type, .. } => assert_eq!(event_type, "PetAdoptedEvent"),
        other => panic!("expected decode error, got {other:?}"),
    }
    assert!(broker.published().is_empty());
}

#[tokio::test]
async fn should_cache_channel_and_reopen_once_closed() {
    let broker = broker();
    let publisher = EventPublisher::new(broker.clone(), EXCHANGE, registry());

    publisher.publish(&PetAdopted::new("Rex")).await.unwrap();
    publisher.publish(&PetAdopted::new("Bella")).await.unwrap();
    assert_eq!(broker.channels_opened(), 1);

    broker.close_channels();
    publisher.publish(&PetAdopted::new("Milo")).await.unwrap();

    assert_eq!(broker.channels_opened(), 2);
    assert_eq!(broker.published().len(), 3);
}

#[tokio::test]
async fn should_stop_publish_all_at_first_failure() {
    let broker = broker();
    broker.fail_publish_matching(|m| pet_name_of(&m.payload) == "Bella");
    let publisher = EventPublisher::new(broker.clone(), EXCHANGE, registry());
    let events = vec![
        PetAdopted::new("Rex"),
        PetAdopted::new("Bella"),
        PetAdopted::new("Milo"),
    ];

    let err = publisher.publish_all(&events).await.unwrap_err();

    assert!(matches!(err, PublishError::Broker(_)));
    let names: Vec<_> = broker
        .published()
        .iter()
        .map(|m| pet_name_of(&m.payload))
        .collect();
    assert_eq!(names, vec!["Rex"]);
}

#[tokio::test]
async fn should_surface_broker_outage_as_publish_error() {
    let broker = broker();
    broker.fail_connections(1);
    let publisher = EventPublisher::new(broker.clone(), EXCHANGE, registry());

    let err = publisher.publish(&PetAdopted::new("Rex")).await.unwrap_err();
    assert!(matches!(err, PublishError::Broker(_)));

    publisher.publish(&PetAdopted::new("Rex")).await.unwrap();
    assert_eq!(broker.published().len(), 1);
}
