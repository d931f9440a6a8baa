pub mod category;
pub mod id;

pub use category::{EntityCategory, EntityCategoryError};
pub use id::{EntityId, EntityRef};
