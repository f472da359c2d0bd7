//! Authentication configuration

/// Token verification settings for the identity provider
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret shared with the identity provider
    pub jwt_secret: String,
    /// Expected `iss`, checked only when set
    pub issuer: Option<String>,
    /// Expected `aud`, checked only when set
    pub audience: Option<String>,
}
