//! JWT claims types

use serde::{Deserialize, Serialize};

/// JWT claims issued by the hosted identity service (Supabase)
#[derive(Debug, Serialize, Deserialize)]
pub struct SupabaseClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: Option<String>,
    pub iat: u64,
    pub exp: u64,
    pub aud: String,
    pub role: String,
}
