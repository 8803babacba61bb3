pub mod metrics;
pub mod prompt;
pub mod providers;
pub mod proxy;

pub use prompt::Prompt;
pub use proxy::{GhostProxy, ProxyResult};
