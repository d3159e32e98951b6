// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[test]
fn insert_and_list_messages_in_insertion_order() {
    let db = Database::open_in_memory().unwrap();

    let first = db.insert_message("hello", 1000).unwrap();
    let second = db.insert_message("what is the syllabus", 2000).unwrap();

    assert!(second.id > first.id);
    let all = db.get_all_messages().unwrap();
    assert_eq!(all, vec![first, second]);
}

#[test]
fn repeated_reads_do_not_duplicate_messages() {
    let db = Database::open_in_memory().unwrap();
    db.insert_message("a", 1).unwrap();
    db.insert_message("b", 2).unwrap();

    let first_read = db.get_all_messages().unwrap();
    let second_read = db.get_all_messages().unwrap();
    assert_eq!(first_read, second_read);
    assert_eq!(db.count_messages().unwrap(), 2);
}

#[test]
fn message_timestamps_never_go_backwards() {
    let db = Database::open_in_memory().unwrap();

    let first = db.insert_message("first", 5000).unwrap();
    // Wall clock stepped back
    let second = db.insert_message("second", 4000).unwrap();

    assert_eq!(first.created_at, 5000);
    assert_eq!(second.created_at, 5000);
}

#[test]
fn identical_messages_are_separate_records() {
    let db = Database::open_in_memory().unwrap();
    db.insert_message("same", 1).unwrap();
    db.insert_message("same", 1).unwrap();
    assert_eq!(db.count_messages().unwrap(), 2);
}

#[test]
fn insert_response_and_find_by_exact_query() {
    let db = Database::open_in_memory().unwrap();
    let stored = db
        .insert_response("test message", "cached response", 1000)
        .unwrap();

    assert_eq!(stored.usage_count, 0);
    let found = db.find_response_for_query("test message").unwrap().unwrap();
    assert_eq!(found, stored);
}

#[parameterized(
    different_case = { "Test Message" },
    trailing_space = { "test message " },
    prefix = { "test" },
    empty = { "" },
)]
fn find_response_requires_exact_match(query: &str) {
    let db = Database::open_in_memory().unwrap();
    db.insert_response("test message", "cached response", 1000)
        .unwrap();

    assert!(db.find_response_for_query(query).unwrap().is_none());
}

#[test]
fn insert_response_overwrites_text_and_keeps_usage() {
    let db = Database::open_in_memory().unwrap();
    let original = db.insert_response("q", "old answer", 1000).unwrap();
    db.increment_usage(original.id).unwrap();
    db.increment_usage(original.id).unwrap();

    let updated = db.insert_response("q", "new answer", 2000).unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.response, "new answer");
    assert_eq!(updated.created_at, 2000);
    assert_eq!(updated.usage_count, 2);
    assert_eq!(db.count_responses().unwrap(), 1);
}

#[test]
fn insert_response_if_absent_leaves_existing_record() {
    let db = Database::open_in_memory().unwrap();
    db.insert_response("contact", "live answer", 1000).unwrap();

    assert!(!db
        .insert_response_if_absent("contact", "seeded answer", 2000)
        .unwrap());
    assert!(db
        .insert_response_if_absent("duration", "Two years.", 2000)
        .unwrap());

    let contact = db.find_response_for_query("contact").unwrap().unwrap();
    assert_eq!(contact.response, "live answer");
    assert_eq!(db.count_responses().unwrap(), 2);
}

#[test]
fn empty_query_is_rejected() {
    let db = Database::open_in_memory().unwrap();

    assert!(matches!(
        db.insert_response("", "a", 1).unwrap_err(),
        Error::InvalidInput(_)
    ));
    assert!(matches!(
        db.insert_response_if_absent("", "a", 1).unwrap_err(),
        Error::InvalidInput(_)
    ));
    assert_eq!(db.count_responses().unwrap(), 0);
}

#[test]
fn increment_usage_returns_new_count() {
    let db = Database::open_in_memory().unwrap();
    let stored = db.insert_response("q", "a", 1000).unwrap();

    assert_eq!(db.increment_usage(stored.id).unwrap(), 1);
    assert_eq!(db.increment_usage(stored.id).unwrap(), 2);
    assert_eq!(db.get_response(stored.id).unwrap().usage_count, 2);
}

#[test]
fn increment_usage_unknown_id() {
    let db = Database::open_in_memory().unwrap();
    let err = db.increment_usage(404).unwrap_err();
    assert!(matches!(err, Error::ResponseNotFound(404)));
}

#[test]
fn get_response_unknown_id() {
    let db = Database::open_in_memory().unwrap();
    assert!(matches!(
        db.get_response(9).unwrap_err(),
        Error::ResponseNotFound(9)
    ));
}

#[test]
fn most_used_orders_by_usage_then_recency() {
    let db = Database::open_in_memory().unwrap();
    let old_popular = db.insert_response("old popular", "a", 1000).unwrap();
    let tie_old = db.insert_response("tie old", "b", 2000).unwrap();
    let tie_new = db.insert_response("tie new", "c", 3000).unwrap();
    db.insert_response("unused", "d", 4000).unwrap();

    for _ in 0..3 {
        db.increment_usage(old_popular.id).unwrap();
    }
    db.increment_usage(tie_old.id).unwrap();
    db.increment_usage(tie_new.id).unwrap();

    let ranked: Vec<String> = db
        .get_most_used_responses(10)
        .unwrap()
        .into_iter()
        .map(|r| r.query)
        .collect();
    assert_eq!(ranked, vec!["old popular", "tie new", "tie old", "unused"]);
}

#[test]
fn most_used_respects_limit() {
    let db = Database::open_in_memory().unwrap();
    for i in 0..8 {
        db.insert_response(&format!("q{i}"), "a", 1000 + i).unwrap();
    }

    assert_eq!(db.get_most_used_responses(5).unwrap().len(), 5);
    assert!(db.get_most_used_responses(0).unwrap().is_empty());
}

#[test]
fn most_used_empty_cache() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_most_used_responses(5).unwrap().is_empty());
}

#[test]
fn delete_older_than_is_strict() {
    let db = Database::open_in_memory().unwrap();
    db.insert_message("old", 1000).unwrap();
    db.insert_message("boundary", 2000).unwrap();
    db.insert_message("new", 3000).unwrap();
    db.insert_response("old", "a", 1000).unwrap();
    db.insert_response("boundary", "b", 2000).unwrap();

    assert_eq!(db.delete_messages_older_than(2000).unwrap(), 1);
    assert_eq!(db.delete_responses_older_than(2000).unwrap(), 1);

    let texts: Vec<String> = db
        .get_all_messages()
        .unwrap()
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(texts, vec!["boundary", "new"]);
    assert!(db.find_response_for_query("old").unwrap().is_none());
    assert!(db.find_response_for_query("boundary").unwrap().is_some());
}

#[test]
fn purge_older_than_removes_both_collections() {
    let mut db = Database::open_in_memory().unwrap();
    db.insert_message("old", 1000).unwrap();
    db.insert_message("new", 9000).unwrap();
    db.insert_response("old", "a", 1000).unwrap();
    db.insert_response("older", "b", 1500).unwrap();
    db.insert_response("new", "c", 9000).unwrap();

    let counts = db.purge_older_than(5000).unwrap();
    assert_eq!(
        counts,
        PurgeCounts {
            messages: 1,
            responses: 2
        }
    );
    assert_eq!(counts.total(), 3);

    // Second purge with no inserts in between changes nothing
    let again = db.purge_older_than(5000).unwrap();
    assert_eq!(again.total(), 0);
    assert_eq!(db.count_messages().unwrap(), 1);
    assert_eq!(db.count_responses().unwrap(), 1);
}

#[test]
fn open_on_disk_creates_parent_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("chat.db");

    {
        let db = Database::open(&path).unwrap();
        db.insert_message("persisted", 1000).unwrap();
        db.insert_response("persisted", "yes", 1000).unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.count_messages().unwrap(), 1);
    assert_eq!(
        db.find_response_for_query("persisted")
            .unwrap()
            .unwrap()
            .response,
        "yes"
    );
}

#[test]
fn schema_is_idempotent_and_indexes_usage() {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    // Running twice is harmless
    init_schema(&conn).unwrap();

    let indexes: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_responses_usage'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(indexes, 1);

    let db = Database { conn };
    let response = db.insert_response("q", "a", 10).unwrap();
    assert_eq!(response.usage_count, 0);
    assert_eq!(db.increment_usage(response.id).unwrap(), 1);
}

#[test]
fn corrupted_usage_count_is_reported() {
    let db = Database::open_in_memory().unwrap();
    let stored = db.insert_response("q", "a", 1).unwrap();
    // Bypass the CHECK constraint to simulate a damaged file
    db.conn
        .execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    db.conn
        .execute(
            "UPDATE responses SET usage_count = -1 WHERE id = ?1",
            params![stored.id],
        )
        .unwrap();

    assert!(db.find_response_for_query("q").is_err());
}
