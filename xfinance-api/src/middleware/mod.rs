/// Middleware for the API server
///
/// JWT authentication lives in `app.rs` next to the router it guards.

pub mod security;
