use crate::sqlite::SqliteStore;
use canis_core::state::{ActiveBehavior, BehaviorKind};
use canis_core::{PetState, StateStore};

#[tokio::test]
async fn test_in_memory_database() {
    let store = SqliteStore::new(":memory:")
        .await
        .expect("Failed to create store");

    assert!(store.load_pet_state().await.unwrap().is_none());
    assert!(store.last_saved_at().await.unwrap().is_none());

    let state = PetState::default();
    store.save_pet_state(&state).await.unwrap();
    assert_eq!(store.load_pet_state().await.unwrap(), Some(state));
    assert!(store.last_saved_at().await.unwrap().is_some());
}

#[tokio::test]
async fn test_upsert_keeps_single_row() {
    let store = SqliteStore::new(":memory:").await.unwrap();

    let mut state = PetState::default();
    for i in 0..5 {
        state.hunger = 10.0 * i as f64;
        store.save_state(&state).await.unwrap();
    }

    let loaded = store.load_state().await.unwrap().unwrap();
    assert_eq!(loaded.hunger, 40.0);
}

#[tokio::test]
async fn test_roundtrip_every_field_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("canis.db");

    let mut state = PetState::default();
    state.hunger = 12.5;
    state.thirst = 33.0;
    state.fatigue = 44.25;
    state.boredom = 55.0;
    state.happiness = 66.0;
    state.just_completed = true;
    state.activity = Some(ActiveBehavior {
        kind: BehaviorKind::Eating,
        started_at: state.last_update,
        duration_minutes: 12.0,
        description: "eating".to_string(),
        initial_hunger: Some(71.0),
        initial_thirst: None,
    });

    {
        let store = SqliteStore::new(&path).await.unwrap();
        store.save_state(&state).await.unwrap();
        store.close().await;
    }

    // Reopen: data survives the process boundary
    let store = SqliteStore::new(&path).await.unwrap();
    let loaded = store.load_state().await.unwrap().unwrap();
    assert_eq!(loaded, state);
}

#[tokio::test]
async fn test_corrupt_row_is_an_error() {
    let store = SqliteStore::new(":memory:").await.unwrap();
    sqlx::query("INSERT INTO pet_state (id, state_json, updated_at) VALUES (1, 'not json', 0)")
        .execute(store.pool_for_tests())
        .await
        .unwrap();
    assert!(store.load_state().await.is_err());
}

mod roundtrip_props {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn attribute() -> impl Strategy<Value = f64> {
        0.0f64..=100.0
    }

    fn timestamp() -> impl Strategy<Value = chrono::DateTime<Utc>> {
        (0i64..4_102_444_800, 0u32..1_000_000_000)
            .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
    }

    fn activity() -> impl Strategy<Value = Option<ActiveBehavior>> {
        let kind = prop_oneof![
            Just(BehaviorKind::Sleeping),
            Just(BehaviorKind::Eating),
            Just(BehaviorKind::Drinking),
        ];
        proptest::option::of(
            (kind, timestamp(), 0.001f64..1e4, attribute()).prop_map(
                |(kind, started_at, duration_minutes, initial)| ActiveBehavior {
                    kind,
                    started_at,
                    duration_minutes,
                    description: kind.as_str().to_string(),
                    initial_hunger: (kind == BehaviorKind::Eating).then_some(initial),
                    initial_thirst: (kind == BehaviorKind::Drinking).then_some(initial),
                },
            ),
        )
    }

    fn pet_state() -> impl Strategy<Value = PetState> {
        (
            [attribute(), attribute(), attribute(), attribute(), attribute()],
            timestamp(),
            activity(),
            any::<bool>(),
        )
            .prop_map(|(values, last_update, activity, just_completed)| {
                let [hunger, thirst, fatigue, boredom, happiness] = values;
                PetState {
                    hunger,
                    thirst,
                    fatigue,
                    boredom,
                    happiness,
                    last_update,
                    activity,
                    just_completed,
                }
            })
    }

    fn bits(state: &PetState) -> Vec<u64> {
        let mut out = vec![
            state.hunger.to_bits(),
            state.thirst.to_bits(),
            state.fatigue.to_bits(),
            state.boredom.to_bits(),
            state.happiness.to_bits(),
        ];
        if let Some(a) = &state.activity {
            out.push(a.duration_minutes.to_bits());
            out.extend(a.initial_hunger.map(f64::to_bits));
            out.extend(a.initial_thirst.map(f64::to_bits));
        }
        out
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn saved_state_reloads_bit_for_bit(state in pet_state()) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let loaded = rt.block_on(async {
                let store = SqliteStore::new(":memory:").await.unwrap();
                store.save_state(&state).await.unwrap();
                store.load_state().await.unwrap().unwrap()
            });
            prop_assert_eq!(bits(&loaded), bits(&state));
            prop_assert_eq!(loaded, state);
        }
    }

    #[tokio::test]
    async fn test_decayed_value_survives_reload() {
        let store = SqliteStore::new(":memory:").await.unwrap();
        let mut state = PetState::default();
        state.thirst = 23.406199660587774;
        state.hunger = 20.0 + 2.0 * (7.0 / 3.0);
        store.save_state(&state).await.unwrap();

        let loaded = store.load_state().await.unwrap().unwrap();
        assert_eq!(loaded.thirst.to_bits(), state.thirst.to_bits());
        assert_eq!(loaded.hunger.to_bits(), state.hunger.to_bits());
    }
}
