// Distribution properties of the tick scheduler's weighted drop roll.

use idler_server::models::catalog::Resource;
use idler_server::services::scheduler::roll_drop;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::HashMap;

fn resource(id: i32, item_id: i32, drop_chance: i32) -> Resource {
    Resource {
        id,
        resource_node_id: 1,
        item_id,
        drop_chance,
    }
}

#[test]
fn empirical_frequencies_converge_to_relative_weights() {
    // Weights 1/3/6 out of 10
    let table = vec![
        resource(1, 100, 1),
        resource(2, 200, 3),
        resource(3, 300, 6),
    ];

    let mut rng = SmallRng::seed_from_u64(0xD1CE);
    let rolls = 50_000;
    let mut counts: HashMap<i32, u32> = HashMap::new();

    for _ in 0..rolls {
        *counts.entry(roll_drop(&table, &mut rng).item_id).or_insert(0) += 1;
    }

    let freq = |item_id: i32| counts.get(&item_id).copied().unwrap_or(0) as f64 / rolls as f64;

    assert!((freq(100) - 0.1).abs() < 0.01, "freq(100) = {}", freq(100));
    assert!((freq(200) - 0.3).abs() < 0.01, "freq(200) = {}", freq(200));
    assert!((freq(300) - 0.6).abs() < 0.01, "freq(300) = {}", freq(300));
}

#[test]
fn every_roll_lands_on_a_table_entry() {
    let table = vec![resource(1, 100, 7), resource(2, 200, 13)];
    let mut rng = SmallRng::seed_from_u64(99);

    for _ in 0..1_000 {
        let drop = roll_drop(&table, &mut rng);
        assert!(drop.item_id == 100 || drop.item_id == 200);
    }
}

#[test]
fn zero_total_weight_returns_first_entry() {
    let table = vec![resource(1, 100, 0), resource(2, 200, 0)];
    let mut rng = SmallRng::seed_from_u64(1);

    for _ in 0..100 {
        assert_eq!(roll_drop(&table, &mut rng).item_id, 100);
    }
}
