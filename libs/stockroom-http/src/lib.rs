//! HTTP plumbing shared by Stockroom modules.
//!
//! - [`problem`]: RFC 9457 problem details returned by every REST handler
//! - [`cors`]: CORS configuration and the `tower-http` layer built from it

pub mod cors;
pub mod problem;

pub use cors::{CorsConfig, CorsConfigError, build_cors_layer};
pub use problem::{APPLICATION_PROBLEM_JSON, Problem, ValidationViolation};

/// Result type returned by REST handlers.
pub type ApiResult<T> = Result<T, Problem>;
