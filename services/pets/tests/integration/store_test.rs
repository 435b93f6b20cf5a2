use sea_orm::ConnectionTrait;

use petadopt_core::domain::{Aggregate, AggregateStore};
use petadopt_core::error::StoreError;
use petadopt_pets::domain::repository::{PetRepository, PetTypeRepository};
use petadopt_pets::domain::types::{PetStatus, PetType, PetTypeCode};

use crate::helpers::{
    outbox_rows, pet_store, pet_type_store, pets_db, saved_dog_type, saved_pet,
};

#[tokio::test]
async fn should_insert_new_pet_without_events() {
    let db = pets_db().await;
    let store = pet_store(&db);

    let pet = saved_pet(&store, "Rex").await;

    assert!(!pet.is_new());
    assert_eq!(pet.version(), 0);
    let loaded = store.find_by_id(pet.id()).await.unwrap().unwrap();
    assert_eq!(loaded.name().as_str(), "Rex");
    assert_eq!(loaded.pet_type_id(), saved_dog_type(&db).await.id());
    assert_eq!(loaded.status(), PetStatus::Available);
    assert!(outbox_rows(&db).await.is_empty());
}

#[tokio::test]
async fn should_bump_version_and_enqueue_one_event_on_reserve() {
    let db = pets_db().await;
    let store = pet_store(&db);
    let pet = saved_pet(&store, "Rex").await;

    let mut loaded = store.find_by_id(pet.id()).await.unwrap().unwrap();
    loaded.reserve().unwrap();
    store.save(&mut loaded).await.unwrap();

    assert_eq!(loaded.version(), 1);
    assert!(loaded.pending_events().is_empty());
    let rows = outbox_rows(&db).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_type, "PetReservedEvent");
    assert!(!rows[0].is_processed);
    assert_eq!(rows[0].retry_count, 0);
    let payload: serde_json::Value = serde_json::from_str(&rows[0].event_data).unwrap();
    assert_eq!(payload["aggregateId"], pet.id().to_string());
    assert_eq!(payload["petName"], "Rex");

    let reloaded = store.find_by_id(pet.id()).await.unwrap().unwrap();
    assert_eq!(reloaded.version(), 1);
    assert_eq!(reloaded.status(), PetStatus::Reserved);
}

#[tokio::test]
async fn should_reject_stale_writer_with_concurrency_conflict() {
    let db = pets_db().await;
    let store = pet_store(&db);
    let pet = saved_pet(&store, "Rex").await;

    let mut first = store.find_by_id(pet.id()).await.unwrap().unwrap();
    let mut second = store.find_by_id(pet.id()).await.unwrap().unwrap();
    first.reserve().unwrap();
    second.reserve().unwrap();

    store.save(&mut first).await.unwrap();
    let err = store.save(&mut second).await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::ConcurrencyConflict {
            expected_version: 0,
            ..
        }
    ));
    assert_eq!(second.version(), 0);
    assert_eq!(second.pending_events().len(), 1);
    assert_eq!(outbox_rows(&db).await.len(), 1);
}

#[tokio::test]
async fn should_roll_back_pet_when_outbox_write_fails() {
    let db = pets_db().await;
    let store = pet_store(&db);
    let pet = saved_pet(&store, "Rex").await;
    db.execute_unprepared("DROP TABLE outbox_events")
        .await
        .unwrap();

    let mut loaded = store.find_by_id(pet.id()).await.unwrap().unwrap();
    loaded.reserve().unwrap();
    let err = store.save(&mut loaded).await.unwrap_err();

    assert!(matches!(err, StoreError::Storage(_)));
    assert_eq!(loaded.version(), 0);
    assert_eq!(loaded.pending_events().len(), 1);
    let stored = store.find_by_id(pet.id()).await.unwrap().unwrap();
    assert_eq!(stored.version(), 0);
    assert_eq!(stored.status(), PetStatus::Available);
}

#[tokio::test]
async fn should_enqueue_lifecycle_events_in_order() {
    let db = pets_db().await;
    let store = pet_store(&db);
    let mut pet = saved_pet(&store, "Rex").await;

    pet.reserve().unwrap();
    store.save(&mut pet).await.unwrap();
    pet.cancel_reservation().unwrap();
    store.save(&mut pet).await.unwrap();
    pet.reserve().unwrap();
    pet.adopt().unwrap();
    store.save(&mut pet).await.unwrap();

    assert_eq!(pet.version(), 3);
    let mut rows = outbox_rows(&db).await;
    rows.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    let types: Vec<_> = rows.iter().map(|r| r.event_type.as_str()).collect();
    assert_eq!(
        types,
        vec![
            "PetReservedEvent",
            "PetReservationCancelledEvent",
            "PetReservedEvent",
            "PetAdoptedEvent",
        ]
    );
}

#[tokio::test]
async fn should_filter_pets_by_status() {
    let db = pets_db().await;
    let store = pet_store(&db);
    saved_pet(&store, "Rex").await;
    let mut bella = saved_pet(&store, "Bella").await;
    bella.reserve().unwrap();
    store.save(&mut bella).await.unwrap();

    let available = store.list_by_status(PetStatus::Available).await.unwrap();
    let reserved = store.list_by_status(PetStatus::Reserved).await.unwrap();

    assert_eq!(available.len(), 1);
    assert_eq!(available[0].name().as_str(), "Rex");
    assert_eq!(reserved[0].id(), bella.id());
}

// ── Pet types ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_store_and_find_pet_type_by_code() {
    let db = pets_db().await;
    let store = pet_type_store(&db);
    let cat = PetType::create("Cat", "Cat").unwrap();

    store.insert(&cat).await.unwrap();

    let by_code = store
        .find_by_code(&PetTypeCode::parse("cat").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_code.id(), cat.id());
    assert!(by_code.is_active());
    assert!(store.find_by_id(cat.id()).await.unwrap().is_some());
}

#[tokio::test]
async fn should_report_taken_pet_type_code_as_duplicate() {
    let db = pets_db().await;
    let store = pet_type_store(&db);
    store
        .insert(&PetType::create("dog", "Dog").unwrap())
        .await
        .unwrap();

    let err = store
        .insert(&PetType::create("DOG", "Big dog").unwrap())
        .await
        .unwrap_err();

    assert!(err.is_duplicate());
    assert_eq!(store.list(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn should_persist_pet_type_changes() {
    let db = pets_db().await;
    let store = pet_type_store(&db);
    let mut bird = PetType::create("bird", "Bird").unwrap();
    store.insert(&bird).await.unwrap();

    bird.update_name("Parrot").unwrap();
    bird.deactivate().unwrap();
    store.update(&bird).await.unwrap();

    let loaded = store.find_by_id(bird.id()).await.unwrap().unwrap();
    assert_eq!(loaded.name(), "Parrot");
    assert!(!loaded.is_active());
    assert!(loaded.updated_at().is_some());
}

#[tokio::test]
async fn should_list_pet_types_by_code() {
    let db = pets_db().await;
    let store = pet_type_store(&db);
    let mut fish = PetType::create("fish", "Fish").unwrap();
    fish.deactivate().unwrap();
    for pet_type in [
        PetType::create("hamster", "Hamster").unwrap(),
        fish,
        PetType::create("cat", "Cat").unwrap(),
    ] {
        store.insert(&pet_type).await.unwrap();
    }

    let codes = |types: Vec<PetType>| -> Vec<String> {
        types.iter().map(|t| t.code().to_string()).collect()
    };
    assert_eq!(codes(store.list(true).await.unwrap()), vec!["cat", "hamster"]);
    assert_eq!(
        codes(store.list(false).await.unwrap()),
        vec!["cat", "fish", "hamster"]
    );
}
