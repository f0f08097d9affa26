//! Liveness report for `/api/health`: storage reachability and whether the redirect
//! gateway has credentials

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{error, warn};

use crate::database::store::DocumentStore;

const STORAGE_PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: HealthState,
    pub checks: HashMap<String, ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Overall health state
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    #[serde(rename = "ok")]
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health status
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub status: ComponentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Component state
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    Up,
    Down,
    Warning,
}

impl HealthStatus {
    fn starting() -> Self {
        Self {
            status: HealthState::Healthy,
            checks: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Records one component and folds its state into the overall status
    fn record(&mut self, name: &str, component: ComponentHealth) {
        self.status = match (self.status, component.status) {
            (_, ComponentState::Down) | (HealthState::Unhealthy, _) => HealthState::Unhealthy,
            (_, ComponentState::Warning) | (HealthState::Degraded, _) => HealthState::Degraded,
            _ => HealthState::Healthy,
        };
        self.checks.insert(name.to_string(), component);
    }

    pub fn is_healthy(&self) -> bool {
        !matches!(self.status, HealthState::Unhealthy)
    }
}

impl ComponentHealth {
    pub fn up(response_time_ms: Option<u128>) -> Self {
        Self {
            status: ComponentState::Up,
            response_time_ms,
            details: None,
        }
    }

    pub fn down(details: Option<String>) -> Self {
        Self {
            status: ComponentState::Down,
            response_time_ms: None,
            details,
        }
    }

    pub fn warning(response_time_ms: Option<u128>, details: Option<String>) -> Self {
        Self {
            status: ComponentState::Warning,
            response_time_ms,
            details,
        }
    }
}

/// Health checker for the application
#[derive(Clone)]
pub struct HealthChecker {
    store: Arc<dyn DocumentStore>,
    paytm_configured: bool,
}

impl HealthChecker {
    pub fn new(store: Arc<dyn DocumentStore>, paytm_configured: bool) -> Self {
        Self {
            store,
            paytm_configured,
        }
    }

    pub async fn check_health(&self) -> HealthStatus {
        let mut health = HealthStatus::starting();
        health.record("storage", self.check_storage().await);
        health.record("paytm", self.check_paytm());
        health
    }

    async fn check_storage(&self) -> ComponentHealth {
        let start = Instant::now();
        match timeout(STORAGE_PING_TIMEOUT, self.store.ping()).await {
            Ok(Ok(())) => ComponentHealth::up(Some(start.elapsed().as_millis())),
            Ok(Err(e)) => {
                error!(error = %e, "storage health check failed");
                ComponentHealth::down(Some(e.to_string()))
            }
            Err(_) => {
                error!("storage health check timed out");
                ComponentHealth::down(Some("Timeout".to_string()))
            }
        }
    }

    fn check_paytm(&self) -> ComponentHealth {
        if self.paytm_configured {
            return ComponentHealth::up(None);
        }
        warn!("Paytm credentials missing; redirect payments unavailable");
        ComponentHealth::warning(None, Some("merchant credentials not set".to_string()))
    }
}
