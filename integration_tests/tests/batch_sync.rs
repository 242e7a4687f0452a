use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chain_mirror::{
    Address, EntityBundle, EntityKind, StateSync, StorageSchema, SyncError,
};
use field_core::FieldElement;

mod common;

use common::{MockReader, SCHEMA_DOC};

fn planet_fields(index: u64) -> Vec<FieldElement> {
    vec![
        FieldElement::from(index),       // owner
        FieldElement::from(1000 + index), // population
        FieldElement::from(index * 2),    // silver
        FieldElement::from(index % 5),    // level
        FieldElement::from(index as u128 | ((index + 1) as u128) << 64),
        FieldElement::from(7777u64),      // last updated
    ]
}

fn build_sync(reader: Arc<MockReader>) -> StateSync<MockReader> {
    let schema = Arc::new(StorageSchema::from_json(SCHEMA_DOC).expect("schema parses"));
    StateSync::new(reader, schema, Address::new("0xabc"))
}

fn seed_planets(reader: &MockReader, schema: &StorageSchema, count: u64) -> Vec<FieldElement> {
    let template = schema.resolve_map("planets").expect("planets is a map");
    (0..count)
        .map(|index| {
            let id = FieldElement::from(100 + index);
            let base = template.derive(&id);
            reader.put_span(&base, &planet_fields(index));
            id
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn batch_honors_concurrency_bound_and_matches_sequential() {
    let reader = Arc::new(MockReader::new());
    let schema = StorageSchema::from_json(SCHEMA_DOC).unwrap();
    let ids = seed_planets(&reader, &schema, 50);
    let sync = build_sync(Arc::clone(&reader));

    let progress: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
    let progress_sink = Arc::clone(&progress);
    let mut batched = HashMap::new();
    sync.fetch_batch(
        EntityKind::Planet,
        &ids,
        8,
        move |fraction| progress_sink.lock().unwrap().push(fraction),
        &mut batched,
    )
    .await
    .expect("batch succeeds");

    assert!(
        reader.peak_in_flight() <= 8,
        "peak in-flight {} exceeded the limit",
        reader.peak_in_flight()
    );
    assert_eq!(batched.len(), 50);

    // Content must equal what sequential fetching produces.
    for id in &ids {
        let sequential = sync
            .fetch_entity(EntityKind::Planet, id)
            .await
            .expect("sequential fetch succeeds");
        assert_eq!(batched.get(id), Some(&sequential));
    }

    // Progress is monotonic and reaches 1.0.
    let reported = progress.lock().unwrap().clone();
    assert!(reported.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(reported.last().copied(), Some(1.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn transient_failures_are_omitted_not_fatal() {
    let reader = Arc::new(MockReader::new());
    let schema = StorageSchema::from_json(SCHEMA_DOC).unwrap();
    let ids = seed_planets(&reader, &schema, 10);

    // Break one entity's first slot.
    let template = schema.resolve_map("planets").unwrap();
    reader.fail_slot(template.derive(&ids[3]));

    let sync = build_sync(Arc::clone(&reader));
    let mut out = HashMap::new();
    sync.fetch_batch(EntityKind::Planet, &ids, 4, |_| {}, &mut out)
        .await
        .expect("partial failure does not abort the batch");

    assert_eq!(out.len(), 9);
    assert!(!out.contains_key(&ids[3]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unreachable_endpoint_aborts_the_batch() {
    let reader = Arc::new(MockReader::new());
    let schema = StorageSchema::from_json(SCHEMA_DOC).unwrap();
    let ids = seed_planets(&reader, &schema, 10);
    reader.set_unreachable(true);

    let sync = build_sync(Arc::clone(&reader));
    let mut out = HashMap::new();
    let result = sync
        .fetch_batch(EntityKind::Planet, &ids, 4, |_| {}, &mut out)
        .await;

    assert!(matches!(result, Err(SyncError::Read(_))));
    assert!(out.is_empty());
}

#[tokio::test]
async fn uninitialized_entities_decode_to_zero_bundles() {
    let reader = Arc::new(MockReader::new());
    let sync = build_sync(Arc::clone(&reader));

    let bundle = sync
        .fetch_entity(EntityKind::Planet, &FieldElement::from(424242u64))
        .await
        .expect("absent storage reads as zero");
    let EntityBundle::Planet(planet) = bundle else {
        panic!("wrong kind");
    };
    assert_eq!(planet.population, 0);
    assert_eq!(planet.owner, FieldElement::zero());
}

#[tokio::test]
async fn empty_batch_reports_completion_immediately() {
    let reader = Arc::new(MockReader::new());
    let sync = build_sync(Arc::clone(&reader));

    let mut out = HashMap::new();
    let mut fractions = Vec::new();
    sync.fetch_batch(EntityKind::Planet, &[], 8, |f| fractions.push(f), &mut out)
        .await
        .unwrap();
    assert!(out.is_empty());
    assert_eq!(fractions, vec![1.0]);
}
