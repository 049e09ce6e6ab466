//! Inventory membership tests
//!
//! Tests for the membership rules:
//! - Removing the last member deletes the inventory with its items
//! - Account deletion branches per inventory: sole member takes the
//!   inventory along, shared inventories only lose the membership row
//! - Repeated removals are no-ops that report false
//! - No inventory is ever left with zero members

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

// ============================================================================
// Membership Simulation Helpers
// ============================================================================

type UserId = u32;
type InventoryId = u32;

/// In-memory model of households: members and item counts per inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Households {
    members: BTreeMap<InventoryId, BTreeSet<UserId>>,
    items: BTreeMap<InventoryId, u32>,
}

impl Households {
    fn with_inventory(mut self, inventory: InventoryId, users: &[UserId], items: u32) -> Self {
        self.members
            .insert(inventory, users.iter().copied().collect());
        self.items.insert(inventory, items);
        self
    }

    /// Remove one membership. Returns false when no such membership exists.
    /// Removing the last member deletes the whole inventory.
    fn remove_member(&mut self, inventory: InventoryId, user: UserId) -> bool {
        let Some(members) = self.members.get_mut(&inventory) else {
            return false;
        };
        if !members.remove(&user) {
            return false;
        }
        if members.is_empty() {
            self.members.remove(&inventory);
            self.items.remove(&inventory);
        }
        true
    }

    /// Delete an account. Per inventory: a sole member takes the inventory
    /// with them, in a shared inventory only the membership goes. Returns
    /// false when the user had no memberships left to unwind.
    fn delete_user(&mut self, user: UserId) -> bool {
        let touched: Vec<InventoryId> = self
            .members
            .iter()
            .filter(|(_, m)| m.contains(&user))
            .map(|(&id, _)| id)
            .collect();

        for inventory in &touched {
            self.remove_member(*inventory, user);
        }
        !touched.is_empty()
    }

    fn member_count(&self, inventory: InventoryId) -> usize {
        self.members.get(&inventory).map_or(0, BTreeSet::len)
    }

    fn inventory_exists(&self, inventory: InventoryId) -> bool {
        self.members.contains_key(&inventory)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn removing_the_sole_member_deletes_the_inventory() {
        let mut h = Households::default().with_inventory(1, &[10], 5);

        assert!(h.remove_member(1, 10));
        assert!(!h.inventory_exists(1));
        assert!(h.items.get(&1).is_none());
    }

    #[test]
    fn removing_one_of_two_members_keeps_the_inventory() {
        let mut h = Households::default().with_inventory(1, &[10, 11], 5);

        assert!(h.remove_member(1, 10));
        assert!(h.inventory_exists(1));
        assert_eq!(h.member_count(1), 1);
        assert_eq!(h.items.get(&1), Some(&5));
    }

    #[test]
    fn removing_an_absent_member_reports_false_and_changes_nothing() {
        let mut h = Households::default().with_inventory(1, &[10], 5);
        let before = h.clone();

        assert!(!h.remove_member(1, 99));
        assert!(!h.remove_member(2, 10));
        assert_eq!(h, before);
    }

    #[test]
    fn second_removal_of_the_same_member_reports_false() {
        let mut h = Households::default().with_inventory(1, &[10, 11], 5);

        assert!(h.remove_member(1, 10));
        assert!(!h.remove_member(1, 10));
        assert_eq!(h.member_count(1), 1);
    }

    #[test]
    fn account_deletion_branches_per_inventory() {
        // User 10 is sole member of inventory 1 and shares inventory 2
        let mut h = Households::default()
            .with_inventory(1, &[10], 3)
            .with_inventory(2, &[10, 11], 7);

        assert!(h.delete_user(10));

        assert!(!h.inventory_exists(1));
        assert!(h.inventory_exists(2));
        assert_eq!(h.member_count(2), 1);
        assert_eq!(h.items.get(&2), Some(&7));
    }

    #[test]
    fn deleting_an_account_twice_reports_false() {
        let mut h = Households::default()
            .with_inventory(1, &[10], 3)
            .with_inventory(2, &[10, 11], 7);

        assert!(h.delete_user(10));
        assert!(!h.delete_user(10));
    }

    #[test]
    fn deleting_an_unknown_account_reports_false() {
        let mut h = Households::default().with_inventory(1, &[10], 3);
        assert!(!h.delete_user(99));
        assert!(h.inventory_exists(1));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn arbitrary_households() -> impl Strategy<Value = Households> {
        proptest::collection::btree_map(
            0u32..5,
            (proptest::collection::btree_set(0u32..6, 1..4), 0u32..20),
            0..5,
        )
        .prop_map(|raw| {
            let mut h = Households::default();
            for (inventory, (members, items)) in raw {
                h.members.insert(inventory, members);
                h.items.insert(inventory, items);
            }
            h
        })
    }

    proptest! {
        /// No sequence of removals ever leaves a zero-member inventory.
        #[test]
        fn no_inventory_survives_with_zero_members(
            h in arbitrary_households(),
            removals in proptest::collection::vec((0u32..5, 0u32..6), 0..15),
        ) {
            let mut h = h;
            for (inventory, user) in removals {
                h.remove_member(inventory, user);
            }
            prop_assert!(h.members.values().all(|m| !m.is_empty()));
        }

        /// After account deletion the user holds no memberships and every
        /// surviving inventory still has at least one member.
        #[test]
        fn account_deletion_unwinds_all_memberships(
            h in arbitrary_households(),
            user in 0u32..6,
        ) {
            let mut h = h;
            h.delete_user(user);
            prop_assert!(h.members.values().all(|m| !m.contains(&user)));
            prop_assert!(h.members.values().all(|m| !m.is_empty()));
        }

        /// Repeating a successful removal reports false and is a no-op.
        #[test]
        fn removal_is_idempotent(
            h in arbitrary_households(),
            inventory in 0u32..5,
            user in 0u32..6,
        ) {
            let mut h = h;
            if h.remove_member(inventory, user) {
                let after_first = h.clone();
                prop_assert!(!h.remove_member(inventory, user));
                prop_assert_eq!(h, after_first);
            }
        }
    }
}
