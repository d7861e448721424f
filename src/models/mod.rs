pub mod catalog;
pub mod character;
pub mod inventory;
pub mod refresh_token;
pub mod user;

// Re-export common types
pub use catalog::{
    Action, Item, Resource, ResourceNode, ResourceNodeSpawn, ToolType, IDLE_ACTION_NAME,
};
pub use character::Character;
pub use inventory::{Inventory, InventoryItem};
pub use refresh_token::RefreshToken;
pub use user::User;
