mod common;

use common::{for_each_backend, note, unseeded_notes, FlakyStore};
use std::collections::HashSet;
use zenith_core::db::open_db;
use zenith_core::store::{RecordStore, SecondaryIndex};
use zenith_core::{EntityError, EntityRepository, KvStore, Page, SqliteKvStore, StoreError};

#[test]
fn create_then_get_state_returns_identical_record() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();
        let input = note("n1", 1000);

        let created = repo.create(input.clone()).unwrap();
        assert_eq!(created, input);

        let loaded = repo.entity("n1").get_state().unwrap();
        assert_eq!(loaded, input);
        assert!(repo.entity("n1").exists().unwrap());
    });
}

#[test]
fn delete_removes_record_and_index_entry() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();
        repo.create(note("n1", 1000)).unwrap();
        repo.create(note("keep", 1000)).unwrap();

        assert!(repo.delete("n1").unwrap());
        assert!(!repo.entity("n1").exists().unwrap());

        let ids: Vec<String> = repo.list_all().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["keep"]);
        assert!(!repo.delete("n1").unwrap(), "second delete reports absence");
    });
}

#[test]
fn save_without_create_fails_and_writes_nothing() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();

        let err = repo.entity("n2").save(&note("n2", 5)).unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err}");

        assert!(!repo.entity("n2").exists().unwrap());
        assert!(repo.list_all().unwrap().is_empty());
        assert!(SecondaryIndex::new(store)
            .list(descriptor.index_name)
            .unwrap()
            .is_empty());
    });
}

#[test]
fn get_state_of_unknown_id_is_not_found_not_initial_state() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();

        match repo.entity("ghost").get_state() {
            Err(EntityError::NotFound { entity, id }) => {
                assert_eq!(entity, "note");
                assert_eq!(id, "ghost");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(record) => panic!("absent id returned a record: {record:?}"),
        }
    });
}

#[test]
fn blank_record_is_distinct_from_missing_record() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();
        let mut blank = repo.initial_state();
        blank.id = "blank".into();
        blank.title.clear();
        repo.create(blank.clone()).unwrap();

        assert_eq!(repo.entity("blank").get_state().unwrap(), blank);
        assert!(repo.entity("missing").get_state().unwrap_err().is_not_found());
    });
}

#[test]
fn list_returns_created_ids_and_caller_sorts_by_updated_at() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();
        repo.create(note("a", 100)).unwrap();
        repo.create(note("b", 200)).unwrap();

        let mut notes = repo.list_all().unwrap();
        let ids: HashSet<String> = notes.iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, HashSet::from(["a".to_string(), "b".to_string()]));

        notes.sort_by(|x, y| y.updated_at.cmp(&x.updated_at));
        let sorted: Vec<&str> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(sorted, ["b", "a"]);
    });
}

#[test]
fn list_agrees_with_exists() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();
        for (idx, id) in ["a", "b", "c", "d"].iter().enumerate() {
            repo.create(note(id, idx as i64)).unwrap();
        }
        repo.delete("b").unwrap();
        repo.delete("d").unwrap();

        let listed: HashSet<String> = repo.list_all().unwrap().into_iter().map(|n| n.id).collect();
        for id in ["a", "b", "c", "d", "never"] {
            assert_eq!(
                listed.contains(id),
                repo.entity(id).exists().unwrap(),
                "list/exists disagree for {id}"
            );
        }
    });
}

#[test]
fn save_replaces_whole_record_and_keeps_index_stable() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();
        repo.create(note("n1", 1)).unwrap();

        let mut replacement = note("n1", 2);
        replacement.title = "renamed".into();
        replacement.content.clear();
        repo.entity("n1").save(&replacement).unwrap();

        assert_eq!(repo.entity("n1").get_state().unwrap(), replacement);
        assert_eq!(repo.list_all().unwrap().len(), 1);
    });
}

#[test]
fn save_rejects_id_mismatch() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();
        repo.create(note("n1", 1)).unwrap();

        let err = repo.entity("n1").save(&note("other", 2)).unwrap_err();
        assert!(matches!(err, EntityError::Validation(_)));
        assert_eq!(repo.entity("n1").get_state().unwrap(), note("n1", 1));
        assert!(!repo.entity("other").exists().unwrap());
    });
}

#[test]
fn stored_record_under_wrong_id_is_a_store_failure() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();
        repo.create(note("n1", 1)).unwrap();
        RecordStore::new(store)
            .put(descriptor.entity_name, "n1", &note("n2", 1))
            .unwrap();

        let err = repo.entity("n1").get_state().unwrap_err();
        assert!(matches!(err, EntityError::Store(StoreError::Backend(_))));
        assert!(repo.entity("n1").mutate(|n| n.title.clear()).is_err());
    });
}

#[test]
fn mutate_applies_update_and_persists() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();
        repo.create(note("n1", 1)).unwrap();

        let updated = repo
            .entity("n1")
            .mutate(|n| {
                n.title = "edited".into();
                n.updated_at = 99;
            })
            .unwrap();
        assert_eq!(updated.title, "edited");
        assert_eq!(repo.entity("n1").get_state().unwrap(), updated);

        let err = repo.entity("nope").mutate(|_| {}).unwrap_err();
        assert!(err.is_not_found());
    });
}

#[test]
fn create_rejects_blank_id_without_writing() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();

        let err = repo.create(note("", 1)).unwrap_err();
        assert!(matches!(err, EntityError::Validation(_)));
        assert!(repo.list_all().unwrap().is_empty());
        assert!(!store.exists(descriptor.entity_name, "").unwrap());
    });
}

#[test]
fn delete_many_counts_only_existing_records() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();
        for id in ["a", "b", "c"] {
            repo.create(note(id, 1)).unwrap();
        }

        assert_eq!(repo.delete_many(["a", "c", "zzz"]).unwrap(), 2);
        let ids: Vec<String> = repo.list_all().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["b"]);
    });
}

#[test]
fn list_pages_through_index_in_insertion_order() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();
        for (idx, id) in ["e1", "e2", "e3", "e4", "e5"].iter().enumerate() {
            repo.create(note(id, 100 - idx as i64)).unwrap();
        }

        let first = repo.list(&Page::first(2)).unwrap();
        assert_eq!(ids_of(&first.items), ["e1", "e2"]);
        let cursor = first.next.expect("more pages expected");

        let second = repo.list(&Page::after(cursor, 2)).unwrap();
        assert_eq!(ids_of(&second.items), ["e3", "e4"]);

        let third = repo.list(&Page::after(second.next.unwrap(), 2)).unwrap();
        assert_eq!(ids_of(&third.items), ["e5"]);
        assert!(third.next.is_none());
    });
}

#[test]
fn list_rejects_malformed_cursor_and_zero_limit() {
    for_each_backend(|store| {
        let descriptor = unseeded_notes();
        let repo = EntityRepository::try_new(store, &descriptor).unwrap();

        let bad_cursor = repo.list(&Page::after("not-a-cursor", 5)).unwrap_err();
        assert!(matches!(bad_cursor, EntityError::Validation(_)));

        let zero = repo.list(&Page::first(0)).unwrap_err();
        assert!(matches!(zero, EntityError::Validation(_)));
    });
}

#[test]
fn index_write_failure_leaves_orphan_record_invisible_to_list() {
    let store = FlakyStore::default();
    let descriptor = unseeded_notes();
    let repo = EntityRepository::try_new(&store, &descriptor).unwrap();

    // Record write succeeds, index write fails.
    store.fail_writes_after(1);
    let err = repo.create(note("orphan", 1)).unwrap_err();
    assert!(matches!(err, EntityError::Store(StoreError::Backend(_))));
    store.heal();

    assert!(repo.entity("orphan").exists().unwrap());
    assert!(repo.list_all().unwrap().is_empty());
    assert!(repo.prune_dangling().unwrap().is_empty());
}

#[test]
fn dangling_index_entry_is_skipped_by_list_and_pruned_on_request() {
    let store = FlakyStore::default();
    let descriptor = unseeded_notes();
    let repo = EntityRepository::try_new(&store, &descriptor).unwrap();
    repo.create(note("a", 1)).unwrap();
    repo.create(note("b", 2)).unwrap();

    // Record delete succeeds, index rewrite fails.
    store.fail_writes_after(0);
    assert!(repo.delete("a").is_err());
    store.heal();

    let index = SecondaryIndex::new(&store);
    assert_eq!(index.list(descriptor.index_name).unwrap(), vec!["a", "b"]);
    assert_eq!(ids_of(&repo.list_all().unwrap()), ["b"]);

    assert_eq!(repo.prune_dangling().unwrap(), vec!["a".to_string()]);
    assert_eq!(index.list(descriptor.index_name).unwrap(), vec!["b"]);
}

#[test]
fn delete_prunes_dangling_entry_but_reports_absence() {
    let store = FlakyStore::default();
    let descriptor = unseeded_notes();
    let repo = EntityRepository::try_new(&store, &descriptor).unwrap();
    repo.create(note("a", 1)).unwrap();
    store.inner.delete(descriptor.entity_name, "a").unwrap();

    assert!(!repo.delete("a").unwrap());
    assert!(SecondaryIndex::new(&store)
        .list(descriptor.index_name)
        .unwrap()
        .is_empty());
}

#[test]
fn records_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");
    let descriptor = unseeded_notes();

    {
        let conn = open_db(&path).unwrap();
        let store = SqliteKvStore::try_new(&conn).unwrap();
        let repo = EntityRepository::try_new(&store, &descriptor).unwrap();
        repo.create(note("durable", 7)).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = SqliteKvStore::try_new(&conn).unwrap();
    let repo = EntityRepository::try_new(&store, &descriptor).unwrap();
    assert_eq!(repo.entity("durable").get_state().unwrap(), note("durable", 7));
    assert_eq!(ids_of(&repo.list_all().unwrap()), ["durable"]);
}

#[test]
fn repository_rejects_reserved_entity_name() {
    let store = zenith_core::MemoryKvStore::new();
    let mut descriptor = unseeded_notes();
    descriptor.entity_name = "__index";

    let err = EntityRepository::try_new(&store, &descriptor).err().unwrap();
    assert!(matches!(err, EntityError::Validation(_)));
}

fn ids_of(notes: &[zenith_core::Note]) -> Vec<&str> {
    notes.iter().map(|n| n.id.as_str()).collect()
}
