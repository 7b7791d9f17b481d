// HTTP handlers, one module per resource

pub mod agents;
pub mod missions;
pub mod reports;

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
