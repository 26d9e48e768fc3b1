use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::warn;

/// Cross-origin policy for the public HTTP surface.
///
/// The default is permissive: any origin, the methods the inventory API uses,
/// and any request header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_owned()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            allowed_headers: vec!["*".to_owned()],
            allow_credentials: false,
            max_age_seconds: 0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CorsConfigError {
    #[error(
        "allowed_origins=['*'] cannot be combined with allow_credentials=true; \
         specify explicit origins when using credentials"
    )]
    WildcardWithCredentials,
}

/// Build a CORS layer from config.
///
/// # Errors
///
/// Returns [`CorsConfigError::WildcardWithCredentials`] if `allow_credentials` is
/// `true` while `allowed_origins` contains `"*"`. Browsers reject that combination.
pub fn build_cors_layer(cfg: &CorsConfig) -> Result<CorsLayer, CorsConfigError> {
    let has_wildcard_origin = cfg.allowed_origins.iter().any(|o| o == "*");

    if has_wildcard_origin && cfg.allow_credentials {
        return Err(CorsConfigError::WildcardWithCredentials);
    }

    let mut layer = CorsLayer::new();

    if has_wildcard_origin {
        warn!("CORS allows any origin; set cors.allowed_origins for production deployments");
        layer = layer.allow_origin(tower_http::cors::Any);
    } else {
        let origins: Vec<axum::http::HeaderValue> = cfg
            .allowed_origins
            .iter()
            .filter_map(|s| axum::http::HeaderValue::from_str(s).ok())
            .collect();
        if !origins.is_empty() {
            layer = layer.allow_origin(origins);
        }
    }

    if cfg.allowed_methods.iter().any(|m| m == "*") {
        layer = layer.allow_methods(tower_http::cors::Any);
    } else {
        let methods: Vec<axum::http::Method> = cfg
            .allowed_methods
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        if !methods.is_empty() {
            layer = layer.allow_methods(methods);
        }
    }

    if cfg.allowed_headers.iter().any(|h| h == "*") {
        layer = layer.allow_headers(tower_http::cors::Any);
    } else {
        let headers: Vec<axum::http::HeaderName> = cfg
            .allowed_headers
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        if !headers.is_empty() {
            layer = layer.allow_headers(headers);
        }
    }

    if cfg.allow_credentials {
        layer = layer.allow_credentials(true);
    }

    if cfg.max_age_seconds > 0 {
        layer = layer.max_age(std::time::Duration::from_secs(cfg.max_age_seconds));
    }

    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_permissive() {
        let cfg = CorsConfig::default();
        assert_eq!(cfg.allowed_origins, vec!["*"]);
        assert!(cfg.allowed_methods.iter().any(|m| m == "DELETE"));
        assert!(build_cors_layer(&cfg).is_ok());
    }

    #[test]
    fn wildcard_with_credentials_is_rejected() {
        let cfg = CorsConfig {
            allow_credentials: true,
            ..CorsConfig::default()
        };
        assert!(matches!(
            build_cors_layer(&cfg),
            Err(CorsConfigError::WildcardWithCredentials)
        ));
    }

    #[test]
    fn explicit_origins_with_credentials_are_accepted() {
        let cfg = CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_owned()],
            allow_credentials: true,
            max_age_seconds: 600,
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&cfg).is_ok());
    }
}
