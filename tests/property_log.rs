//! Property-based tests for codec and log correctness
//!
//! Uses proptest to verify the on-disk invariants across many random inputs

use jot::header;
use jot::log;
use jot::record::{decode, encode, Record, Status, MAX_TEXT_LEN};
use jot::JotError;
use proptest::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;

fn empty_log() -> Cursor<Vec<u8>> {
    let mut file = Cursor::new(Vec::new());
    header::init_or_validate(&mut file).unwrap();
    file
}

fn status_strategy() -> impl Strategy<Value = Status> {
    prop_oneof![Just(Status::Active), Just(Status::Deleted)]
}

proptest! {
    #[test]
    fn prop_codec_round_trip(
        status in status_strategy(),
        id in any::<u64>(),
        timestamp in any::<u64>(),
        text in prop::collection::vec(any::<u8>(), 0..4096)
    ) {
        let record = Record::from_parts(status, id, timestamp, text);
        let bytes = encode(&record).unwrap();
        prop_assert_eq!(bytes.len(), record.encoded_len());

        let mut cursor = Cursor::new(bytes);
        let (decoded, offset) = decode(&mut cursor).unwrap().unwrap();
        prop_assert_eq!(decoded, record);
        prop_assert_eq!(offset, 0);
        prop_assert!(decode(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn prop_ids_are_consecutive(count in 1usize..64) {
        let mut file = empty_log();

        let ids: Vec<u64> = (0..count)
            .map(|_| header::allocate_id(&mut file).unwrap())
            .collect();

        let expected: Vec<u64> = (10_000..10_000 + count as u64).collect();
        prop_assert_eq!(ids, expected);
        prop_assert_eq!(header::read_header(&mut file).unwrap().next_id, 10_000 + count as u64);
    }

    #[test]
    fn prop_payload_bound(len in (MAX_TEXT_LEN - 2)..(MAX_TEXT_LEN + 3)) {
        let record = Record::new(1, 1, vec![0u8; len]);
        let result = encode(&record);

        if len <= MAX_TEXT_LEN {
            prop_assert!(result.is_ok());
        } else {
            let is_too_large = matches!(result, Err(JotError::PayloadTooLarge { .. }));
            prop_assert!(is_too_large);
        }
    }

    #[test]
    fn prop_list_matches_appends(
        texts in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..256), 0..40),
        deletes in prop::collection::vec(any::<prop::sample::Index>(), 0..10)
    ) {
        let mut file = empty_log();

        let created: Vec<Record> = texts
            .iter()
            .map(|t| log::create_and_persist_at(&mut file, t, 42).unwrap())
            .collect();

        let mut deleted = HashSet::new();
        if !created.is_empty() {
            for idx in &deletes {
                let id = created[idx.index(created.len())].id();
                log::remove_soft(&mut file, id).unwrap();
                deleted.insert(id);
            }
        }

        let listed = log::list(&mut file).unwrap();
        prop_assert_eq!(listed.len(), created.len());

        for (got, want) in listed.iter().zip(&created) {
            prop_assert_eq!(got.id(), want.id());
            prop_assert_eq!(got.text(), want.text());
            prop_assert_eq!(got.timestamp(), want.timestamp());
            prop_assert_eq!(got.is_deleted(), deleted.contains(&want.id()));
        }
    }

    #[test]
    fn prop_garbage_never_panics(tail in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut file = empty_log();
        file.get_mut().extend_from_slice(&tail);

        // Any outcome is fine as long as it is a value, not a panic
        let _ = log::list(&mut file);
        let report = log::check(&mut file).unwrap();
        prop_assert!(report.valid_len <= report.file_len);
    }
}
