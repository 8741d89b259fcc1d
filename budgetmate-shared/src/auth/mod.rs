/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and password rules
/// - [`token`]: Session token and invite code generation, token hashing
/// - [`session_cache`]: TTL cache of resolved sessions behind a trait
/// - [`session`]: Session lifecycle over the database and the cache
///
/// Cookie handling lives in the API crate's middleware.

pub mod password;
pub mod session;
pub mod session_cache;
pub mod token;
