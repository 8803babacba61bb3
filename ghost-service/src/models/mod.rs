pub mod question;
pub mod responses;

pub use question::{Question, MISSING_QUESTION};
pub use responses::{EchoResponse, GhostDiagnostic, HealthResponse};
