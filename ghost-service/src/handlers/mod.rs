//! HTTP handlers for ghost-service.

pub mod echo;
pub mod ghost;
pub mod health;

pub use echo::echo;
pub use ghost::{ask_ghost, ghost_info, post_only};
pub use health::{health_check, metrics_endpoint, readiness_check};
