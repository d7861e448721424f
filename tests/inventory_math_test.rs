// Inventory weight and capacity laws, exercised against the pure batch
// helpers the service builds on.

use idler_server::services::inventory::{fits_capacity, group_weight_deltas, InventoryUpdate};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone, Copy)]
struct ItemDef {
    id: i32,
    weight: i32,
}

const WOOD: ItemDef = ItemDef { id: 1, weight: 2 };
const ORE: ItemDef = ItemDef { id: 2, weight: 5 };

struct InventoryModel {
    weight: i32,
    capacity: i32,
    items: HashMap<i32, i32>,
}

impl InventoryModel {
    fn new(capacity: i32) -> Self {
        Self {
            weight: 0,
            capacity,
            items: HashMap::new(),
        }
    }

    /// Apply an addition the way the service does: capacity check first,
    /// then the quantity upsert and the additive weight delta.
    fn add(&mut self, item: ItemDef, quantity: i32) -> bool {
        if !fits_capacity(self.weight, self.capacity, item.weight, quantity) {
            return false;
        }
        *self.items.entry(item.id).or_insert(0) += quantity;
        self.weight += item.weight * quantity;
        true
    }

    fn drop_items(&mut self, item: ItemDef, quantity: i32) -> bool {
        let held = self.items.get(&item.id).copied().unwrap_or(0);
        if quantity > held {
            return false;
        }
        let remaining = held - quantity;
        if remaining == 0 {
            self.items.remove(&item.id);
        } else {
            self.items.insert(item.id, remaining);
        }
        self.weight -= item.weight * quantity;
        true
    }

    fn recomputed_weight(&self) -> i32 {
        self.items
            .iter()
            .map(|(&id, &qty)| {
                let def = if id == WOOD.id { WOOD } else { ORE };
                def.weight * qty
            })
            .sum()
    }
}

#[test]
fn weight_equals_sum_of_item_weights_over_any_sequence() {
    let mut inventory = InventoryModel::new(50);

    let script: Vec<(ItemDef, i32, bool)> = vec![
        (WOOD, 5, true),   // weight 10
        (ORE, 4, true),    // weight 30
        (WOOD, 10, true),  // weight 50, exactly at capacity
        (ORE, 1, false),   // would exceed
        (WOOD, 3, false),  // would exceed
    ];

    for (item, qty, expect) in script {
        assert_eq!(inventory.add(item, qty), expect);
        assert_eq!(inventory.weight, inventory.recomputed_weight());
        assert!(inventory.weight <= inventory.capacity);
    }

    assert!(inventory.drop_items(ORE, 2));
    assert_eq!(inventory.weight, inventory.recomputed_weight());

    assert!(inventory.drop_items(WOOD, 15));
    assert_eq!(inventory.weight, inventory.recomputed_weight());
    assert!(!inventory.items.contains_key(&WOOD.id));

    // Dropping more than held fails fast and changes nothing
    let before = inventory.weight;
    assert!(!inventory.drop_items(ORE, 100));
    assert_eq!(inventory.weight, before);
}

#[test]
fn capacity_is_never_exceeded_by_allowed_updates() {
    let mut inventory = InventoryModel::new(20);

    let mut rejected = 0;
    for _ in 0..30 {
        if !inventory.add(WOOD, 1) {
            rejected += 1;
        }
    }

    assert_eq!(inventory.weight, 20);
    assert_eq!(rejected, 20);
    assert!(inventory.weight <= inventory.capacity);
}

#[test]
fn batch_weight_deltas_sum_per_inventory() {
    let alpha = Uuid::new_v4();
    let beta = Uuid::new_v4();

    let allowed = vec![
        (
            InventoryUpdate {
                inventory_id: alpha,
                item_id: WOOD.id,
                quantity: 1,
            },
            WOOD.weight,
        ),
        (
            InventoryUpdate {
                inventory_id: alpha,
                item_id: ORE.id,
                quantity: 3,
            },
            ORE.weight,
        ),
        (
            InventoryUpdate {
                inventory_id: beta,
                item_id: WOOD.id,
                quantity: 1,
            },
            WOOD.weight,
        ),
    ];

    let deltas = group_weight_deltas(&allowed);
    assert_eq!(deltas[&alpha], WOOD.weight + 3 * ORE.weight);
    assert_eq!(deltas[&beta], WOOD.weight);
}
