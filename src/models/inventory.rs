// Inventory database model
// An inventory is 1:1 with its character. The weight column is maintained
// additively (delta updates) so concurrent tick batches compose.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Array, Int4, Uuid as SqlUuid};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{inventories, inventory_items};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = inventories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Inventory {
    pub id: Uuid,
    pub character_id: Uuid,
    pub weight: i32,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = inventory_items)]
pub struct InventoryItem {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub item_id: i32,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = inventories)]
struct NewInventory {
    id: Uuid,
    character_id: Uuid,
    weight: i32,
    capacity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Inventory {
    pub async fn create(
        conn: &mut AsyncPgConnection,
        character_id: Uuid,
        capacity: i32,
    ) -> Result<Inventory, diesel::result::Error> {
        let now = Utc::now();
        diesel::insert_into(inventories::table)
            .values(&NewInventory {
                id: Uuid::new_v4(),
                character_id,
                weight: 0,
                capacity,
                created_at: now,
                updated_at: now,
            })
            .get_result(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        inventory_id: Uuid,
    ) -> Result<Option<Inventory>, diesel::result::Error> {
        inventories::table
            .find(inventory_id)
            .first(conn)
            .await
            .optional()
    }

    pub async fn find_by_character_id(
        conn: &mut AsyncPgConnection,
        character_id: Uuid,
    ) -> Result<Option<Inventory>, diesel::result::Error> {
        inventories::table
            .filter(inventories::character_id.eq(character_id))
            .first(conn)
            .await
            .optional()
    }

    /// Additive weight update. Takes a delta, never an absolute value.
    pub async fn adjust_weight(
        conn: &mut AsyncPgConnection,
        inventory_id: Uuid,
        delta: i32,
    ) -> Result<usize, diesel::result::Error> {
        diesel::update(inventories::table.find(inventory_id))
            .set((
                inventories::weight.eq(inventories::weight + delta),
                inventories::updated_at.eq(Utc::now()),
            ))
            .execute(conn)
            .await
    }
}

impl InventoryItem {
    pub async fn by_inventory_id(
        conn: &mut AsyncPgConnection,
        inventory_id: Uuid,
    ) -> Result<Vec<InventoryItem>, diesel::result::Error> {
        inventory_items::table
            .filter(inventory_items::inventory_id.eq(inventory_id))
            .load(conn)
            .await
    }

    pub async fn find(
        conn: &mut AsyncPgConnection,
        inventory_id: Uuid,
        item_id: i32,
    ) -> Result<Option<InventoryItem>, diesel::result::Error> {
        inventory_items::table
            .filter(inventory_items::inventory_id.eq(inventory_id))
            .filter(inventory_items::item_id.eq(item_id))
            .first(conn)
            .await
            .optional()
    }

    /// Upsert a batch of additions in one statement; the three slices must
    /// have the same length. Relies on the (inventory_id, item_id) unique
    /// constraint.
    pub async fn batch_add(
        conn: &mut AsyncPgConnection,
        inventory_ids: &[Uuid],
        item_ids: &[i32],
        quantities: &[i32],
    ) -> Result<usize, diesel::result::Error> {
        assert_eq!(inventory_ids.len(), item_ids.len());
        assert_eq!(inventory_ids.len(), quantities.len());
        if inventory_ids.is_empty() {
            return Ok(0);
        }

        diesel::sql_query(
            "INSERT INTO inventory_items (id, inventory_id, item_id, quantity, created_at, updated_at) \
             SELECT gen_random_uuid(), data.inventory_id, data.item_id, data.quantity, NOW(), NOW() \
             FROM unnest($1::uuid[], $2::int[], $3::int[]) AS data(inventory_id, item_id, quantity) \
             ON CONFLICT (inventory_id, item_id) \
             DO UPDATE SET quantity = inventory_items.quantity + EXCLUDED.quantity, updated_at = NOW()",
        )
        .bind::<Array<SqlUuid>, _>(inventory_ids.to_vec())
        .bind::<Array<Int4>, _>(item_ids.to_vec())
        .bind::<Array<Int4>, _>(quantities.to_vec())
        .execute(conn)
        .await
    }

    /// Guarded decrement: touches the row only when at least `quantity` is
    /// present. Returns the number of rows updated (0 means fail fast).
    pub async fn remove(
        conn: &mut AsyncPgConnection,
        inventory_id: Uuid,
        item_id: i32,
        quantity: i32,
    ) -> Result<usize, diesel::result::Error> {
        diesel::update(
            inventory_items::table
                .filter(inventory_items::inventory_id.eq(inventory_id))
                .filter(inventory_items::item_id.eq(item_id))
                .filter(inventory_items::quantity.ge(quantity)),
        )
        .set((
            inventory_items::quantity.eq(inventory_items::quantity - quantity),
            inventory_items::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .await
    }

    /// Rows that hit zero (or below) are removed rather than kept around.
    pub async fn delete_empty(
        conn: &mut AsyncPgConnection,
        inventory_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        diesel::delete(
            inventory_items::table
                .filter(inventory_items::inventory_id.eq(inventory_id))
                .filter(inventory_items::quantity.le(0)),
        )
        .execute(conn)
        .await
    }
}
