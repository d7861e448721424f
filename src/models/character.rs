// Character database model
// A character is pinned to the coordinates it was created at; the mutable
// surface is its current action (id, target spawn, optional amount limit
// and progress).

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Array, Int4, Uuid as SqlUuid};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::inventory::Inventory;
use crate::schema::characters;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = characters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Character {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub position_x: i32,
    pub position_y: i32,
    pub action_id: i32,
    pub action_target: Option<i32>,
    pub action_amount_limit: Option<i32>,
    pub action_amount_progress: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = characters)]
struct NewCharacter<'a> {
    id: Uuid,
    user_id: Uuid,
    name: &'a str,
    position_x: i32,
    position_y: i32,
    action_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Character {
    /// Characters spawn at the origin with the idle action and an empty
    /// inventory; both rows are written in one transaction.
    pub async fn create_with_inventory(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        name: &str,
        idle_action_id: i32,
        inventory_capacity: i32,
    ) -> Result<(Character, Inventory), diesel::result::Error> {
        let name = name.to_string();
        conn.transaction::<_, diesel::result::Error, _>(|tx| {
            Box::pin(async move {
                let now = Utc::now();
                let character: Character = diesel::insert_into(characters::table)
                    .values(&NewCharacter {
                        id: Uuid::new_v4(),
                        user_id,
                        name: &name,
                        position_x: 0,
                        position_y: 0,
                        action_id: idle_action_id,
                        created_at: now,
                        updated_at: now,
                    })
                    .get_result(tx)
                    .await?;

                let inventory =
                    Inventory::create(tx, character.id, inventory_capacity).await?;

                Ok((character, inventory))
            })
        })
        .await
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        character_id: Uuid,
    ) -> Result<Option<Character>, diesel::result::Error> {
        characters::table
            .find(character_id)
            .first(conn)
            .await
            .optional()
    }

    pub async fn find_by_name(
        conn: &mut AsyncPgConnection,
        name: &str,
    ) -> Result<Option<Character>, diesel::result::Error> {
        characters::table
            .filter(characters::name.eq(name))
            .first(conn)
            .await
            .optional()
    }

    pub async fn find_by_coordinates(
        conn: &mut AsyncPgConnection,
        x: i32,
        y: i32,
    ) -> Result<Vec<Character>, diesel::result::Error> {
        characters::table
            .filter(characters::position_x.eq(x))
            .filter(characters::position_y.eq(y))
            .load(conn)
            .await
    }

    /// Every character whose current action is not the idle action.
    pub async fn find_active(
        conn: &mut AsyncPgConnection,
        idle_action_id: i32,
    ) -> Result<Vec<Character>, diesel::result::Error> {
        characters::table
            .filter(characters::action_id.ne(idle_action_id))
            .load(conn)
            .await
    }

    /// Point the character at a new action. A fresh amount limit restarts
    /// progress at zero; clearing the limit clears progress with it.
    pub async fn update_action(
        conn: &mut AsyncPgConnection,
        character_id: Uuid,
        action_id: i32,
        action_target: Option<i32>,
        amount_limit: Option<i32>,
    ) -> Result<Character, diesel::result::Error> {
        let progress = amount_limit.map(|_| 0);
        diesel::update(characters::table.find(character_id))
            .set((
                characters::action_id.eq(action_id),
                characters::action_target.eq(action_target),
                characters::action_amount_limit.eq(amount_limit),
                characters::action_amount_progress.eq(progress),
                characters::updated_at.eq(Utc::now()),
            ))
            .get_result(conn)
            .await
    }

    pub async fn set_idle(
        conn: &mut AsyncPgConnection,
        character_id: Uuid,
        idle_action_id: i32,
    ) -> Result<Character, diesel::result::Error> {
        diesel::update(characters::table.find(character_id))
            .set((
                characters::action_id.eq(idle_action_id),
                characters::action_target.eq(None::<i32>),
                characters::action_amount_limit.eq(None::<i32>),
                characters::action_amount_progress.eq(None::<i32>),
                characters::updated_at.eq(Utc::now()),
            ))
            .get_result(conn)
            .await
    }

    /// Write a tick's worth of progress values in one statement so the batch
    /// is atomic. Both slices must have the same length.
    pub async fn batch_update_progress(
        conn: &mut AsyncPgConnection,
        character_ids: &[Uuid],
        progress: &[i32],
    ) -> Result<usize, diesel::result::Error> {
        assert_eq!(character_ids.len(), progress.len());
        if character_ids.is_empty() {
            return Ok(0);
        }

        diesel::sql_query(
            "UPDATE characters \
             SET action_amount_progress = data.progress, updated_at = NOW() \
             FROM unnest($1::uuid[], $2::int[]) AS data(id, progress) \
             WHERE characters.id = data.id",
        )
        .bind::<Array<SqlUuid>, _>(character_ids.to_vec())
        .bind::<Array<Int4>, _>(progress.to_vec())
        .execute(conn)
        .await
    }
}
