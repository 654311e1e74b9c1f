//! # Codec Flows
//!
//! Contract records and dictionaries through bags of cells and their text
//! forms, the way they arrive from an endpoint.

use std::collections::HashMap;

use csm_cell::{boc, Builder, CellRef};
use csm_contracts::messages::{BuyPlace, MessageBody};
use csm_contracts::records::{
    CellCodec, NftContent, PlaceChildren, PlacePos, PlaceRecord, ProfileContent, ProfilePrograms,
    ProgramData, Side,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::fixtures::{addr, level, place};

fn leaf(value: u64) -> CellRef {
    let mut builder = Builder::new();
    builder.store_uint(value, 16).unwrap();
    builder.end_cell().unwrap()
}

fn pair(left: CellRef, right: CellRef) -> CellRef {
    let mut builder = Builder::new();
    builder.store_ref(left).unwrap().store_ref(right).unwrap();
    builder.end_cell().unwrap()
}

#[test]
fn test_level_two_place_through_text_forms() {
    let record = place(
        level(2),
        addr(1),
        12,
        None,
        3,
        Some(PlaceChildren {
            left: addr(2),
            right: None,
        }),
    );
    let cell = record.to_cell().unwrap();

    for text in [boc::to_hex(&cell).unwrap(), boc::to_base64(&cell).unwrap()] {
        let back = PlaceRecord::from_cell(&boc::from_text(&text).unwrap()).unwrap();
        assert_eq!(back, record);
        assert!(back.is_root());
        assert_eq!(back.left_child(), Some(addr(2)));
        assert_eq!(back.right_child(), None);
    }
}

#[test]
fn test_shared_subtree_is_stored_once() {
    let shared = leaf(7);
    let root = pair(shared.clone(), shared);
    let distinct = pair(leaf(7), leaf(8));

    let shared_bytes = boc::to_boc(&root).unwrap();
    let distinct_bytes = boc::to_boc(&distinct).unwrap();
    assert!(shared_bytes.len() < distinct_bytes.len());

    let back = boc::from_boc(&shared_bytes).unwrap();
    assert_eq!(back.unique_cell_count(), 2);
    assert_eq!(back.hash(), root.hash());
}

#[test]
fn test_corrupted_bag_is_rejected() {
    let record = place(level(1), addr(1), 1, None, 0, None);
    let mut bytes = record.to_boc().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    assert!(PlaceRecord::from_boc(&bytes).is_err());
    assert!(PlaceRecord::from_boc(&bytes[..last]).is_err());
}

#[test]
fn test_random_program_dictionary() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut expected = HashMap::new();
    let mut programs = ProfilePrograms::new();
    for seq_no in 0..300u32 {
        let key: u32 = rng.gen();
        let data = ProgramData {
            inviter: addr(rng.gen()),
            seq_no,
            invite: addr(rng.gen()),
            confirmed: rng.gen_bool(0.5),
        };
        programs.set(key, data);
        expected.insert(key, data);
    }

    let root = programs.build_root().unwrap().unwrap();
    let back = ProfilePrograms::load_root(&boc::from_boc(&boc::to_boc(&root).unwrap()).unwrap())
        .unwrap();
    assert_eq!(back.len(), expected.len());
    for (key, data) in &expected {
        assert_eq!(back.get(key), Some(data));
    }
}

#[test]
fn test_profile_content_survives_item_storage() {
    let profile = ProfileContent::normalized(
        "  Alice ",
        Some("https://example.org/A.png"),
        Some("alice"),
        Some("SMITH"),
        Some("Alice_TG"),
    );
    assert_eq!(profile.login, "alice");

    let bytes = profile.to_nft_content().to_boc().unwrap();
    let content = NftContent::from_boc(&bytes).unwrap();
    assert_eq!(ProfileContent::from_nft_content(&content).unwrap(), profile);
}

proptest! {
    #[test]
    fn prop_buy_place_bytes_are_reproducible(
        m in 1u8..=6,
        profile: u8,
        parent: u8,
        right: bool,
        query_id: u64,
    ) {
        let body = BuyPlace {
            m: level(m),
            profile: addr(profile),
            pos: Some(PlacePos::new(addr(parent), Side::from_bit(right))),
        };
        let first = boc::to_boc(&body.to_cell(query_id).unwrap()).unwrap();
        let second = boc::to_boc(&body.to_cell(query_id).unwrap()).unwrap();
        prop_assert_eq!(&first, &second);

        let (decoded_id, decoded) = BuyPlace::from_cell(&boc::from_boc(&first).unwrap()).unwrap();
        prop_assert_eq!(decoded_id, query_id);
        prop_assert_eq!(decoded, body);
    }
}
