// Static catalog data: actions, items, tool types, resource nodes, their
// placements and drop tables. Populated at boot by external seeding and
// treated as read-only here.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};

use crate::schema::{actions, items, resource_node_spawns, resource_nodes, resources, tool_types};

/// Name of the action every character starts (and finishes) in.
pub const IDLE_ACTION_NAME: &str = "IDLE";

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = actions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Action {
    pub id: i32,
    pub name: String,
    pub required_tool_type_id: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub weight: i32,
    pub tool_type_id: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = tool_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ToolType {
    pub id: i32,
    pub name: String,
    pub tier: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = resource_nodes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ResourceNode {
    pub id: i32,
    pub name: String,
    pub action_id: i32,
    pub min_tool_tier: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = resource_node_spawns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ResourceNodeSpawn {
    pub id: i32,
    pub node_id: i32,
    pub position_x: i32,
    pub position_y: i32,
}

/// One drop-table entry. `drop_chance` is a relative weight among the node's
/// resources, not a probability.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = resources)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Resource {
    pub id: i32,
    pub resource_node_id: i32,
    pub item_id: i32,
    pub drop_chance: i32,
}

impl Action {
    pub async fn by_id(
        conn: &mut AsyncPgConnection,
        action_id: i32,
    ) -> Result<Option<Action>, diesel::result::Error> {
        actions::table.find(action_id).first(conn).await.optional()
    }

    pub async fn by_name(
        conn: &mut AsyncPgConnection,
        name: &str,
    ) -> Result<Option<Action>, diesel::result::Error> {
        actions::table
            .filter(actions::name.eq(name))
            .first(conn)
            .await
            .optional()
    }

    pub async fn all(conn: &mut AsyncPgConnection) -> Result<Vec<Action>, diesel::result::Error> {
        actions::table.order(actions::id.asc()).load(conn).await
    }
}

impl Item {
    pub async fn by_id(
        conn: &mut AsyncPgConnection,
        item_id: i32,
    ) -> Result<Option<Item>, diesel::result::Error> {
        items::table.find(item_id).first(conn).await.optional()
    }

    pub async fn by_name(
        conn: &mut AsyncPgConnection,
        name: &str,
    ) -> Result<Option<Item>, diesel::result::Error> {
        items::table
            .filter(items::name.eq(name))
            .first(conn)
            .await
            .optional()
    }
}

impl ToolType {
    pub async fn by_id(
        conn: &mut AsyncPgConnection,
        tool_type_id: i32,
    ) -> Result<Option<ToolType>, diesel::result::Error> {
        tool_types::table
            .find(tool_type_id)
            .first(conn)
            .await
            .optional()
    }
}

impl ResourceNode {
    pub async fn by_id(
        conn: &mut AsyncPgConnection,
        node_id: i32,
    ) -> Result<Option<ResourceNode>, diesel::result::Error> {
        resource_nodes::table
            .find(node_id)
            .first(conn)
            .await
            .optional()
    }
}

impl ResourceNodeSpawn {
    pub async fn by_id(
        conn: &mut AsyncPgConnection,
        spawn_id: i32,
    ) -> Result<Option<ResourceNodeSpawn>, diesel::result::Error> {
        resource_node_spawns::table
            .find(spawn_id)
            .first(conn)
            .await
            .optional()
    }

    pub async fn by_coordinates(
        conn: &mut AsyncPgConnection,
        x: i32,
        y: i32,
    ) -> Result<Vec<ResourceNodeSpawn>, diesel::result::Error> {
        resource_node_spawns::table
            .filter(resource_node_spawns::position_x.eq(x))
            .filter(resource_node_spawns::position_y.eq(y))
            .load(conn)
            .await
    }
}

impl Resource {
    pub async fn by_node_id(
        conn: &mut AsyncPgConnection,
        node_id: i32,
    ) -> Result<Vec<Resource>, diesel::result::Error> {
        resources::table
            .filter(resources::resource_node_id.eq(node_id))
            .order(resources::id.asc())
            .load(conn)
            .await
    }
}
