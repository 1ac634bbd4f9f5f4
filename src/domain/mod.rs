pub mod errors;
pub mod ids;
pub mod models;
pub mod time;

pub use errors::*;
pub use ids::*;
pub use models::*;
pub use time::*;
