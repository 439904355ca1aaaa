//! Router over an in-memory SQLite database with the real migrations.

#![allow(dead_code)]

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tally_api::middleware::{ROLE_HEADER, TENANT_HEADER};
use tally_api::{AppState, create_router};
use tally_db::migration::Migrator;
use tally_shared::LedgerConfig;
use tally_shared::types::TenantId;
use tower::ServiceExt;

pub async fn app() -> Router {
    let state = state().await;
    create_router(state, Duration::from_secs(30))
}

pub async fn state() -> AppState {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    AppState::new(db, &LedgerConfig::default())
}

/// A caller bound to one tenant.
#[derive(Clone)]
pub struct Client {
    pub app: Router,
    pub tenant: TenantId,
    pub role: Option<&'static str>,
}

impl Client {
    pub async fn new() -> Self {
        Self::with_app(app().await)
    }

    pub fn with_app(app: Router) -> Self {
        Self {
            app,
            tenant: TenantId::new(),
            role: None,
        }
    }

    pub fn as_admin(&self) -> Self {
        Self {
            role: Some("admin"),
            ..self.clone()
        }
    }

    pub fn as_tenant(&self, tenant: TenantId) -> Self {
        Self {
            tenant,
            ..self.clone()
        }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(TENANT_HEADER, self.tenant.to_string());
        if let Some(role) = self.role {
            builder = builder.header(ROLE_HEADER, role);
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body)).await
    }
}

/// Reads a decimal serialized as a JSON string.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected a decimal string, got {value}"))
        .parse()
        .unwrap()
}
