use jsonwebtoken::{DecodingKey, Validation, decode, errors::Error};
use serde::{Deserialize, Serialize};

/// Claims carried by access tokens. Tokens are issued elsewhere; this service
/// only verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
