/// Middleware for the API server
///
/// - `security`: response security headers
/// - `session`: session cookie authentication for `/app`

pub mod security;
pub mod session;
