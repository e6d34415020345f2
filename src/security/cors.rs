use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl CorsConfig {
    /// Any well-formed http(s) origin may call the API.
    pub fn development() -> Self {
        Self {
            allowed_origins: vec![],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Accept".to_string(),
                "Origin".to_string(),
                "X-Request-ID".to_string(),
            ],
            allow_credentials: false,
            max_age_secs: 3600,
        }
    }

    /// Only the listed origins may call the API.
    pub fn production(origins: Vec<String>) -> Self {
        Self {
            allowed_origins: origins,
            max_age_secs: 7200,
            ..Self::development()
        }
    }

    pub fn build(self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        let mut cors = if origins.is_empty() {
            CorsLayer::new().allow_origin(AllowOrigin::predicate(validate_origin))
        } else {
            CorsLayer::new().allow_origin(origins)
        };

        let headers: Vec<header::HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        cors = cors
            .allow_methods(self.allowed_methods)
            .allow_headers(headers)
            .max_age(std::time::Duration::from_secs(self.max_age_secs));

        if self.allow_credentials {
            cors = cors.allow_credentials(true);
        }

        cors
    }
}

pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        info!("Creating CORS layer with development defaults (no origins configured)");
        CorsConfig::development().build()
    } else {
        info!("Creating CORS layer with {} configured origins", allowed_origins.len());
        CorsConfig::production(allowed_origins.to_vec()).build()
    }
}

fn validate_origin(origin: &HeaderValue, _request: &axum::http::request::Parts) -> bool {
    origin.to_str().map(is_valid_origin_format).unwrap_or(false)
}

fn is_valid_origin_format(origin: &str) -> bool {
    if !origin.starts_with("http://") && !origin.starts_with("https://") {
        return false;
    }
    if origin.contains("..") || origin.matches("//").count() > 1 {
        return false;
    }

    let origin_lower = origin.to_lowercase();
    !["<script", "javascript:", "data:", "%3c", "%3e", "\\x", "\\u"]
        .iter()
        .any(|pattern| origin_lower.contains(pattern))
}
