//! Property-based tests using proptest.
//!
//! These tests verify invariants of the archive engine using randomly
//! generated inputs and edit sequences.

use std::collections::BTreeMap;

use proptest::prelude::*;

use assetpack::crypto::{Cipher, EncryptionKey};
use assetpack::{Archive, ArchiveOptions, EntryName, MemoryStorage, Mode};

/// Strategy for generating valid entry names.
fn valid_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-][a-zA-Z0-9_.-]{0,20}".prop_filter("must not be a dot name", |s| s != "." && s != "..")
}

/// One step of an edit sequence, applied to both the archive and a model.
#[derive(Debug, Clone)]
enum Op {
    Add(String, Vec<u8>),
    Remove(usize),
    Rename(usize, String),
    Compact,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => ("[a-d]{1,2}(\\.bin)?", proptest::collection::vec(any::<u8>(), 0..64))
            .prop_map(|(n, d)| Op::Add(n, d)),
        2 => any::<usize>().prop_map(Op::Remove),
        1 => (any::<usize>(), "[e-h]{1,2}").prop_map(|(i, n)| Op::Rename(i, n)),
        1 => Just(Op::Compact),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Valid names are accepted and survive the fixed-width field.
    #[test]
    fn valid_names_are_accepted(name in valid_name_strategy()) {
        let entry = EntryName::new(&name).unwrap();
        prop_assert_eq!(EntryName::from_field(&entry.to_field()), Some(entry));
    }

    /// Names with a path separator are always rejected.
    #[test]
    fn separators_are_rejected(a in "[a-z]{1,5}", b in "[a-z]{1,5}", sep in "[/\\\\]") {
        let name = format!("{}{}{}", a, sep, b);
        prop_assert!(EntryName::new(&name).is_err());
    }

    /// `unique` never returns a taken name.
    #[test]
    fn unique_avoids_taken(base in valid_name_strategy(), extra in 0usize..6) {
        let base = EntryName::new(&base).unwrap();
        let mut taken = vec![base.to_string()];
        for n in 1..=extra as u64 {
            taken.push(base.numbered(n).unwrap().to_string());
        }
        let unique = base.unique(|n| taken.iter().any(|t| t == n)).unwrap();
        prop_assert!(!taken.contains(&unique.to_string()));
    }

    /// XOR keystream output does not depend on how the payload is split.
    #[test]
    fn keystream_ignores_chunking(
        key in proptest::collection::vec(any::<u8>(), 1..16),
        data in proptest::collection::vec(any::<u8>(), 0..256),
        split in any::<prop::sample::Index>(),
    ) {
        let key = EncryptionKey::new(&key).unwrap();
        let mut whole = data.clone();
        Cipher::Xor(&key).begin().apply(&mut whole);

        let at = if data.is_empty() { 0 } else { split.index(data.len()) };
        let mut parts = data.clone();
        let mut stream = Cipher::Xor(&key).begin();
        let (head, tail) = parts.split_at_mut(at);
        stream.apply(head);
        stream.apply(tail);
        prop_assert_eq!(&whole, &parts);

        let mut back = whole.clone();
        Cipher::Xor(&key).begin().apply(&mut back);
        prop_assert_eq!(back, data);
    }

    /// Random bytes never panic the parser in read mode.
    #[test]
    fn arbitrary_bytes_do_not_panic(bytes in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let options = ArchiveOptions::new().mode(Mode::Read);
        if let Ok(mut archive) = Archive::open_stream_with(MemoryStorage::from_vec(bytes), options) {
            let _ = archive.list();
            let _ = archive.scan();
            let _ = archive.validate();
        }
    }

    /// Any edit sequence leaves an archive whose contents match a simple model.
    #[test]
    fn edits_match_model(ops in proptest::collection::vec(op_strategy(), 1..24)) {
        let mut archive = Archive::open_stream(MemoryStorage::new()).unwrap();
        let mut model: BTreeMap<String, (u64, Vec<u8>)> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Add(name, data) => {
                    let entry = archive.add_bytes(&name, &data).unwrap();
                    prop_assert!(!model.contains_key(entry.name.as_str()));
                    model.insert(entry.name.to_string(), (entry.id, data));
                }
                Op::Remove(i) if !model.is_empty() => {
                    let name = model.keys().nth(i % model.len()).cloned().unwrap();
                    let (id, _) = model.remove(&name).unwrap();
                    archive.remove(id).unwrap();
                }
                Op::Rename(i, new_name) if !model.is_empty() => {
                    let name = model.keys().nth(i % model.len()).cloned().unwrap();
                    let result = archive.rename_by_name(&name, &new_name);
                    if name == new_name {
                        prop_assert!(result.is_ok());
                    } else if model.contains_key(&new_name) {
                        prop_assert!(result.is_err());
                    } else {
                        prop_assert!(result.is_ok());
                        let value = model.remove(&name).unwrap();
                        model.insert(new_name, value);
                    }
                }
                Op::Compact => {
                    let result = archive.compact().unwrap();
                    prop_assert_eq!(result.kept, model.len());
                }
                _ => {}
            }
        }

        let bytes = archive.close().unwrap().into_inner();
        let mut archive = Archive::open_stream(MemoryStorage::from_vec(bytes)).unwrap();
        let listed: Vec<String> = archive.list().unwrap().into_iter().map(|e| e.name.to_string()).collect();
        let expected: Vec<String> = model.keys().cloned().collect();
        prop_assert_eq!(listed, expected);

        for (name, (id, data)) in &model {
            prop_assert_eq!(archive.id_of(name), Some(*id));
            prop_assert_eq!(&archive.read(*id).unwrap(), data);
        }
        prop_assert!(archive.validate().unwrap().is_valid());
    }
}
