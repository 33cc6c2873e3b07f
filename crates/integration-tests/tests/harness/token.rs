//! HS256 token minting for auth tests

use jwt_compact::alg::{Hs256, Hs256Key};
use jwt_compact::{AlgorithmExt, Claims, Header};
use wayfarer_server::UserClaims;

/// Sign a token for `subject` expiring `expires_in` seconds from now
///
/// A negative `expires_in` yields an already expired token.
pub fn mint(secret: &str, subject: &str, expires_in: i64) -> String {
    let claims: Claims<UserClaims> = serde_json::from_value(serde_json::json!({
        "sub": subject,
        "exp": jiff::Timestamp::now().as_second() + expires_in,
    }))
    .expect("valid claims");

    Hs256
        .token(&Header::empty(), &claims, &Hs256Key::new(secret.as_bytes()))
        .expect("token signs")
}
