use person_store_core::{
    person_collection_uri, Person, PersonStore, StoreConfig, UnknownIdPolicy,
};
use rusqlite::Connection;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn successful_put_fires_exactly_one_event() {
    let store = PersonStore::open_in_memory().unwrap();
    let subscription = store.subscribe();

    let mut person = Person::with_names("Ada", "Lovelace", "mathematician");
    store.put(&mut person).unwrap();
    let events = subscription.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].collection, person_collection_uri());

    person.bio = "analyst".to_string();
    store.put(&mut person).unwrap();
    assert_eq!(subscription.drain().len(), 1);
}

#[test]
fn successful_remove_fires_one_event_and_miss_fires_none() {
    let store = PersonStore::open_in_memory().unwrap();
    let subscription = store.subscribe();

    assert_eq!(store.remove_id(999).unwrap(), 0);
    assert!(subscription.try_recv().is_none());

    assert_eq!(store.remove_id(1).unwrap(), 1);
    assert_eq!(subscription.drain().len(), 1);
}

#[test]
fn reads_fire_nothing() {
    let store = PersonStore::open_in_memory().unwrap();
    let subscription = store.subscribe();

    store.get(1).unwrap();
    store.list().unwrap();
    assert!(subscription.try_recv().is_none());
}

#[test]
fn failed_put_fires_nothing() {
    let store = PersonStore::open(&StoreConfig {
        unknown_id_policy: UnknownIdPolicy::Reject,
        ..StoreConfig::in_memory()
    })
    .unwrap();
    let subscription = store.subscribe();

    let mut person = Person {
        id: 321,
        ..Person::with_names("Nobody", "Known", "")
    };
    assert!(store.put(&mut person).is_err());
    assert!(subscription.try_recv().is_none());
}

#[test]
fn storage_failure_on_put_and_remove_fires_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.sqlite3");
    let store = PersonStore::open(&StoreConfig::with_path(&path)).unwrap();
    let subscription = store.subscribe();

    Connection::open(&path)
        .unwrap()
        .execute_batch("DROP TABLE Person;")
        .unwrap();

    let mut person = Person::with_names("Ada", "Lovelace", "mathematician");
    assert!(store.put(&mut person).is_err());
    assert!(subscription.try_recv().is_none());

    assert!(store.remove_id(1).is_err());
    assert!(subscription.try_recv().is_none());
    assert_eq!(store.subscriber_count(), 1);
}

#[test]
fn every_subscriber_sees_each_event_in_order() {
    let store = PersonStore::open_in_memory().unwrap();
    let first = store.subscribe();
    let second = store.subscribe();

    let mut person = Person::with_names("Grace", "Hopper", "");
    store.put(&mut person).unwrap();
    store.remove(&person).unwrap();

    for subscription in [&first, &second] {
        let sequences: Vec<u64> = subscription.drain().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
    }
}

#[test]
fn dropped_subscriber_does_not_block_writes() {
    let store = PersonStore::open(&StoreConfig {
        subscriber_buffer: 1,
        ..StoreConfig::in_memory()
    })
    .unwrap();
    let slow = store.subscribe();
    drop(store.subscribe());

    for index in 0..5 {
        let mut person = Person::with_names(format!("p{index}"), "", "");
        store.put(&mut person).unwrap();
    }

    assert_eq!(slow.drain().len(), 1);
    assert_eq!(store.subscriber_count(), 1);
}

#[test]
fn unsubscribed_listener_gets_nothing() {
    let store = PersonStore::open_in_memory().unwrap();
    let subscription = store.subscribe();
    assert!(store.unsubscribe(subscription.id()));

    store.remove_id(1).unwrap();
    assert!(subscription.try_recv().is_none());
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn listener_thread_can_read_store_when_notified() {
    let store = Arc::new(PersonStore::open_in_memory().unwrap());
    let subscription = store.subscribe();

    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            let event = subscription
                .recv_timeout(Duration::from_secs(5))
                .expect("writer should notify");
            assert_eq!(event.collection, store.collection_uri());
            store.list().unwrap().len()
        })
    };

    let mut person = Person::with_names("Ada", "Lovelace", "mathematician");
    store.put(&mut person).unwrap();

    assert_eq!(reader.join().unwrap(), 3);
}
