pub mod builders;
pub mod models;

pub use builders::*;
pub use models::*;
