/// Random tokens for sessions and invite links
///
/// - **Session tokens**: 32 random bytes, hex-encoded (64 chars). The cookie
///   carries the plaintext; the database stores `hash_token(token)`.
/// - **Invite codes**: 16 random bytes, hex-encoded (32 chars). Stored as-is,
///   since a leaked invite only grants what the link itself grants.
///
/// # Example
///
/// ```
/// use budgetmate_shared::auth::token::{generate_session_token, hash_token};
///
/// let token = generate_session_token();
/// assert_eq!(token.len(), 64);
///
/// let stored = hash_token(&token);
/// assert_eq!(stored.len(), 64);
/// assert_ne!(stored, token);
/// ```

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes behind a session token
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Random bytes behind an invite code
pub const INVITE_CODE_BYTES: usize = 16;

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

pub fn generate_session_token() -> String {
    random_hex(SESSION_TOKEN_BYTES)
}

pub fn generate_invite_code() -> String {
    random_hex(INVITE_CODE_BYTES)
}

/// SHA-256 of a token, lowercase hex. This is the session table key.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cheap shape check before touching the cache or the database.
pub fn is_well_formed_session_token(token: &str) -> bool {
    token.len() == SESSION_TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_shape() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(is_well_formed_session_token(&token));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: std::collections::HashSet<String> =
            (0..100).map(|_| generate_session_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_invite_code_shape() {
        let code = generate_invite_code();
        assert_eq!(code.len(), 32);
        assert!(code.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_token_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(!is_well_formed_session_token(""));
        assert!(!is_well_formed_session_token("not-hex"));
        assert!(!is_well_formed_session_token(&"g".repeat(64)));
        assert!(!is_well_formed_session_token(&"a".repeat(63)));
    }
}
