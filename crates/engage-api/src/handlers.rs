//! HTTP handlers.

pub mod health;
pub mod predict;

pub use health::{health, ping, ready};
pub use predict::{predict, predict_frame};
