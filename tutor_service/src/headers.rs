//! `X-{app}-alert` style response headers consumed by the client application.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt::Display;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct HeaderUtil {
    app_name: Arc<str>,
}

impl HeaderUtil {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: Arc::from(app_name),
        }
    }

    pub fn entity_created(&self, entity: &str, id: impl Display) -> HeaderMap {
        self.alert(&format!("{}.{}.created", self.app_name, entity), &id.to_string())
    }

    pub fn entity_updated(&self, entity: &str, id: impl Display) -> HeaderMap {
        self.alert(&format!("{}.{}.updated", self.app_name, entity), &id.to_string())
    }

    pub fn entity_deleted(&self, entity: &str, id: impl Display) -> HeaderMap {
        self.alert(&format!("{}.{}.deleted", self.app_name, entity), &id.to_string())
    }

    pub fn failure(&self, entity: &str, error_key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.insert(&mut headers, "error", &format!("error.{}", error_key));
        self.insert(&mut headers, "params", entity);
        headers
    }

    fn alert(&self, message: &str, param: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.insert(&mut headers, "alert", message);
        self.insert(&mut headers, "params", param);
        headers
    }

    fn insert(&self, headers: &mut HeaderMap, suffix: &str, value: &str) {
        let name = format!("x-{}-{}", self.app_name, suffix).to_ascii_lowercase();
        match (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!("Skipping invalid alert header {}: {}", name, value),
        }
    }
}
