//! Auth header injection (§4.2 "Auth injection").

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

use crate::config::AuthConfig;

pub fn auth_headers(auth: &AuthConfig) -> BTreeMap<String, String> {
    match auth {
        AuthConfig::Bearer { token } => {
            BTreeMap::from([("Authorization".to_string(), format!("Bearer {token}"))])
        }
        AuthConfig::ApiKey { key, header } => {
            BTreeMap::from([(header.clone(), key.clone())])
        }
        AuthConfig::Basic { user, pass } => {
            let encoded = BASE64_STANDARD.encode(format!("{user}:{pass}"));
            BTreeMap::from([("Authorization".to_string(), format!("Basic {encoded}"))])
        }
        AuthConfig::Custom { headers } => headers.clone(),
    }
}

/// Parses the `set_auth` step's `{target, value}` pair into an `AuthConfig`,
/// following §4.2's parsing rule: `target` names the auth type; `value` is
/// `"header:key"` for apikey, `"user:pass"` for basic, else the bearer token.
pub fn parse_set_auth(target: &str, value: &str) -> Option<AuthConfig> {
    match target.trim().to_ascii_lowercase().as_str() {
        "bearer" => Some(AuthConfig::Bearer {
            token: value.to_string(),
        }),
        "apikey" | "api_key" => {
            let (header, key) = value.split_once(':').unwrap_or(("X-API-Key", value));
            Some(AuthConfig::ApiKey {
                key: key.to_string(),
                header: header.to_string(),
            })
        }
        "basic" => {
            let (user, pass) = value.split_once(':')?;
            Some(AuthConfig::Basic {
                user: user.to_string(),
                pass: pass.to_string(),
            })
        }
        _ => None,
    }
}
