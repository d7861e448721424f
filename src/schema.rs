// Typed query surface over the relational store. The DDL itself lives in
// external migration scripts; this file must stay in sync with them.

diesel::table! {
    users (id) {
        id -> Uuid,
        #[max_length = 320]
        email -> Varchar,
        hashed_password -> Text,
        #[max_length = 20]
        surname -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    refresh_tokens (token) {
        #[max_length = 64]
        token -> Varchar,
        user_id -> Uuid,
        expires_at -> Timestamptz,
        revoked_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    characters (id) {
        id -> Uuid,
        user_id -> Uuid,
        #[max_length = 20]
        name -> Varchar,
        position_x -> Int4,
        position_y -> Int4,
        action_id -> Int4,
        action_target -> Nullable<Int4>,
        action_amount_limit -> Nullable<Int4>,
        action_amount_progress -> Nullable<Int4>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    inventories (id) {
        id -> Uuid,
        character_id -> Uuid,
        weight -> Int4,
        capacity -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    inventory_items (id) {
        id -> Uuid,
        inventory_id -> Uuid,
        item_id -> Int4,
        quantity -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    items (id) {
        id -> Int4,
        #[max_length = 50]
        name -> Varchar,
        weight -> Int4,
        tool_type_id -> Nullable<Int4>,
    }
}

diesel::table! {
    tool_types (id) {
        id -> Int4,
        #[max_length = 50]
        name -> Varchar,
        tier -> Int4,
    }
}

diesel::table! {
    actions (id) {
        id -> Int4,
        #[max_length = 50]
        name -> Varchar,
        required_tool_type_id -> Nullable<Int4>,
    }
}

diesel::table! {
    resource_nodes (id) {
        id -> Int4,
        #[max_length = 50]
        name -> Varchar,
        action_id -> Int4,
        min_tool_tier -> Int4,
    }
}

diesel::table! {
    resource_node_spawns (id) {
        id -> Int4,
        node_id -> Int4,
        position_x -> Int4,
        position_y -> Int4,
    }
}

diesel::table! {
    resources (id) {
        id -> Int4,
        resource_node_id -> Int4,
        item_id -> Int4,
        drop_chance -> Int4,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    refresh_tokens,
    characters,
    inventories,
    inventory_items,
    items,
    tool_types,
    actions,
    resource_nodes,
    resource_node_spawns,
    resources,
);
