//! # Matrix Flows
//!
//! The matrix service over the in-memory chain: subtree assembly, the
//! next position, buy/lock/unlock messages and request supersession.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use csm_cell::Address;
use csm_contracts::messages::{BuyPlace, MessageBody};
use csm_contracts::records::{PlaceChildren, PlacePos, Side};
use csm_matrix::adapters::stored_places;
use csm_matrix::algorithms::next_position;
use csm_matrix::{
    Channel, InMemoryChain, LockSet, MatrixApi, MatrixConfig, MatrixError, PositionAction,
    PositionState, ServiceError, SubtreeQuery,
};

use crate::fixtures::{addr, level, place, service_with_fees, TEST_FEE};

const OWNER: u8 = 1;

/// Level-2 root owned by `OWNER` with fill count 3, a left child and no
/// right child. Returns (root, left).
fn level_two_matrix(chain: &InMemoryChain) -> (Address, Address) {
    let (root, left) = (addr(10), addr(11));
    let m2 = level(2);
    chain
        .insert_place(
            root,
            &place(
                m2,
                addr(OWNER),
                1,
                None,
                3,
                Some(PlaceChildren { left, right: None }),
            ),
        )
        .unwrap();
    chain
        .insert_place(left, &place(m2, addr(20), 2, Some(root), 0, None))
        .unwrap();
    chain.set_root_place(addr(OWNER), m2, root);
    chain.set_place_count(addr(OWNER), m2, 1);
    chain.set_place_count(addr(OWNER), level(1), 1);
    (root, left)
}

#[tokio::test]
async fn test_level_two_right_slot_is_buyable_next_position() {
    let chain = Arc::new(InMemoryChain::new());
    let (root, left) = level_two_matrix(&chain);
    let service = service_with_fees(&chain, MatrixConfig::default());

    let token = service.begin(Channel::Subtree);
    let tree = service
        .load_subtree(
            &token,
            SubtreeQuery {
                level: level(2),
                root,
                viewer: Some(addr(OWNER)),
                depth: Some(2),
            },
        )
        .await
        .unwrap();

    let right = tree.child(Side::Right).unwrap().as_empty().unwrap();
    assert_eq!(right.position.get(), 3);
    assert_eq!(right.pos(), PlacePos::new(root, Side::Right));
    assert!(right.is_next);
    assert!(right.can_buy);

    let left_node = tree.child(Side::Left).unwrap();
    assert_eq!(left_node.as_filled().unwrap().address, left);
    for side in [Side::Left, Side::Right] {
        let below = left_node.child(side).unwrap().as_empty().unwrap();
        assert!(!below.is_next);
        assert!(!below.can_buy);
    }

    let action = PositionAction {
        level: level(2),
        profile: addr(OWNER),
        pos: right.pos(),
    };
    let token = service.begin(Channel::Submit);
    let envelope = service.buy(&token, &action, root, 99).await.unwrap();
    assert_eq!(envelope.value, 45_000_000_000 + TEST_FEE);
    let (_, body) = BuyPlace::from_cell(&envelope.body).unwrap();
    assert_eq!(body.pos, Some(right.pos()));
}

#[tokio::test]
async fn test_level_two_requires_a_level_one_place() {
    let chain = Arc::new(InMemoryChain::new());
    let (root, _) = level_two_matrix(&chain);
    chain.set_place_count(addr(OWNER), level(1), 0);
    let service = service_with_fees(&chain, MatrixConfig::default());

    let action = PositionAction {
        level: level(2),
        profile: addr(OWNER),
        pos: PlacePos::new(root, Side::Right),
    };
    let token = service.begin(Channel::Eligibility);
    let err = service.check_buy(&token, &action, root).await.unwrap_err();
    assert!(matches!(err, ServiceError::Policy(_)));
    assert!(chain.submitted().is_empty());
}

#[tokio::test]
async fn test_seeded_matrix_service_and_algorithm_agree() {
    let chain = Arc::new(InMemoryChain::new());
    let root = chain.seed_matrix(addr(OWNER), level(1), 6).unwrap().unwrap();
    let service = service_with_fees(&chain, MatrixConfig::default());

    let token = service.begin(Channel::NextPosition);
    let from_service = service
        .next_position(&token, level(1), root, addr(OWNER))
        .await
        .unwrap();

    let places: HashMap<_, _> = stored_places(&chain, root).into_iter().collect();
    let from_memory =
        next_position(&places, root, level(1), 4, &LockSet::new(), 1_000).unwrap();

    assert_eq!(from_service, from_memory);
    assert_eq!(from_service.unwrap().position.get(), 7);
}

#[tokio::test]
async fn test_lock_cycle_as_seen_in_the_tree() {
    let chain = Arc::new(InMemoryChain::new());
    let root = chain.seed_matrix(addr(OWNER), level(1), 6).unwrap().unwrap();
    let places = stored_places(&chain, root);
    let service = service_with_fees(&chain, MatrixConfig::default());
    let token = service.begin(Channel::Submit);

    // position 3, the right child of the root
    let action = PositionAction {
        level: level(1),
        profile: addr(OWNER),
        pos: PlacePos::new(root, Side::Right),
    };
    let empty_slot = PositionAction {
        pos: PlacePos::new(places[3].0, Side::Left),
        ..action
    };
    assert_eq!(
        service.position_state(&token, &empty_slot).await.unwrap(),
        PositionState::Empty
    );
    assert!(service.check_lock(&token, &empty_slot).await.is_err());

    let envelope = service.lock(&token, &action, 1).await.unwrap();
    assert_eq!(envelope.value, TEST_FEE);

    // the chain applies the lock
    chain.set_locks(addr(OWNER), level(1), LockSet::from([action.pos]));

    let subtree = SubtreeQuery {
        level: level(1),
        root,
        viewer: Some(addr(OWNER)),
        depth: Some(2),
    };
    let tree = service.load_subtree(&token, subtree).await.unwrap();
    let locked = tree.child(Side::Right).unwrap().as_filled().unwrap();
    assert!(locked.locked);
    assert!(locked.can_unlock);
    assert!(!locked.can_lock);

    // nothing goes below a locked place; position 8 is past the loaded depth
    assert!(tree.next_position().is_none());
    let next = service
        .next_position(&token, level(1), root, addr(OWNER))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.position.get(), 8);

    service.unlock(&token, &action, 2).await.unwrap();
    chain.set_locks(addr(OWNER), level(1), LockSet::new());
    assert_eq!(
        service.position_state(&token, &action).await.unwrap(),
        PositionState::Filled
    );
    assert_eq!(chain.submitted().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_newer_subtree_request_wins() {
    let chain = Arc::new(InMemoryChain::with_latency(Duration::from_millis(50)));
    let root = chain.seed_matrix(addr(OWNER), level(1), 6).unwrap().unwrap();
    let service = service_with_fees(&chain, MatrixConfig::default());
    let query = SubtreeQuery {
        level: level(1),
        root,
        viewer: None,
        depth: None,
    };

    let stale = service.begin(Channel::Subtree);
    let (stale_result, fresh) = tokio::join!(service.load_subtree(&stale, query), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        service.begin(Channel::Subtree)
    });
    assert_eq!(stale_result.unwrap_err(), ServiceError::Cancelled);

    let tree = service.load_subtree(&fresh, query).await.unwrap();
    assert_eq!(tree.breadth_first().len(), 7);

    // other channels are unaffected
    let crumbs = service.begin(Channel::Breadcrumbs);
    let _ = service.begin(Channel::Subtree);
    assert_eq!(service.breadcrumbs(&crumbs, root, root).await.unwrap(), vec![root]);
}

#[tokio::test]
async fn test_breadcrumb_depth_guard() {
    let chain = Arc::new(InMemoryChain::new());
    let root = chain.seed_matrix(addr(OWNER), level(1), 15).unwrap().unwrap();
    let places = stored_places(&chain, root);
    let config = MatrixConfig {
        breadcrumb_depth: 2,
        ..MatrixConfig::default()
    };
    let service = service_with_fees(&chain, config);
    let token = service.begin(Channel::Breadcrumbs);

    // position 4 is two hops below the root
    let path = service.breadcrumbs(&token, places[3].0, root).await.unwrap();
    assert_eq!(path, vec![root, places[1].0, places[3].0]);

    // position 8 is three hops below
    let err = service.breadcrumbs(&token, places[7].0, root).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Matrix(MatrixError::PathTooDeep { max_depth: 2, .. })
    ));
}
