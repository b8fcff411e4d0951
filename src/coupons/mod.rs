pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

pub use engine::{discount_for, validate_at, CouponCheck};
pub use error::*;
pub use handlers::*;
pub use models::*;
pub use repository::*;
