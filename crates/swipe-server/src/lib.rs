//! Process-level wiring for the Swipe server: configuration and the
//! top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use serde::Deserialize;
use swipe_api::{AppState, auth::AuthConfig};
use swipe_core::store::SwipeStore;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Which [`SwipeStore`] implementation backs the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
  #[default]
  Sqlite,
  Memory,
}

/// Runtime server configuration, deserialised from `config.toml` layered
/// under `SWIPE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default)]
  pub backend:             StoreBackend,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  #[serde(default = "default_admin_username")]
  pub admin_username:      String,
  /// Empty means no admin login can succeed.
  #[serde(default)]
  pub admin_password_hash: String,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("swipe.db") }

fn default_admin_username() -> String { "admin".to_string() }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.admin_username.clone(),
      password_hash: self.admin_password_hash.clone(),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The API router for `store`, with request tracing.
pub fn app<S>(store: S, config: &ServerConfig) -> Router
where
  S: SwipeStore + Clone + 'static,
{
  let state = AppState {
    store: Arc::new(store),
    auth:  Arc::new(config.auth()),
  };
  swipe_api::api_router(state).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use config::{Config, File, FileFormat};
  use swipe_store_memory::MemoryStore;
  use tower::ServiceExt as _;

  fn parse(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.backend, StoreBackend::Sqlite);
    assert_eq!(cfg.store_path, PathBuf::from("swipe.db"));
    assert_eq!(cfg.admin_username, "admin");
    assert!(cfg.admin_password_hash.is_empty());
  }

  #[test]
  fn explicit_values_override_defaults() {
    let cfg = parse(
      r#"
        host = "0.0.0.0"
        port = 9000
        backend = "memory"
        store_path = "/tmp/s.db"
        admin_username = "root"
      "#,
    );
    assert_eq!(cfg.address(), "0.0.0.0:9000");
    assert_eq!(cfg.backend, StoreBackend::Memory);
    assert_eq!(cfg.auth().username, "root");
  }

  #[test]
  fn unknown_backend_is_rejected() {
    let result = Config::builder()
      .add_source(File::from_str(r#"backend = "postgres""#, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize::<ServerConfig>();
    assert!(result.is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/swipe.db")),
      PathBuf::from(home).join("swipe.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs.db")), PathBuf::from("/abs.db"));
  }

  #[tokio::test]
  async fn app_serves_health() {
    let app = app(MemoryStore::new(), &parse(""));
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
