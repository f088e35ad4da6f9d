//! Background task scheduler
//!
//! Runs the overdue-drop sweep (the "drop overdue" detection the core
//! treats as an external collaborator) and periodic gateway health
//! probes.

use crate::app::AppState;
use anyhow::Result;
use chrono::Utc;
use gateway::{GatewayHealthMonitor, PaymentGateway};
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Background task scheduler
#[derive(Clone)]
pub struct Scheduler {
    state: Arc<AppState>,
    payment_gateway: Arc<dyn PaymentGateway>,
    health_monitor: GatewayHealthMonitor,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(state: Arc<AppState>, payment_gateway: Arc<dyn PaymentGateway>) -> Self {
        let health_monitor = GatewayHealthMonitor::new(vec!["payments".to_string()]);
        Self {
            state,
            payment_gateway,
            health_monitor,
        }
    }

    /// Run the scheduler
    pub async fn run(&mut self) -> Result<()> {
        let mut sweep_interval = interval(Duration::from_secs(
            self.state.config.scheduler.overdue_sweep_interval_seconds,
        ));
        let mut health_check_interval = interval(Duration::from_secs(
            self.state.config.scheduler.gateway_health_interval_seconds,
        ));

        loop {
            tokio::select! {
                _ = sweep_interval.tick() => {
                    if let Err(e) = self.sweep_overdue_drops().await {
                        tracing::error!("Overdue drop sweep failed: {}", e);
                    }
                }
                _ = health_check_interval.tick() => {
                    self.check_gateway_health().await;
                }
            }
        }
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Scheduler shutdown initiated");
        Ok(())
    }

    /// Charge late fees for picked-up bookings past their grace period
    async fn sweep_overdue_drops(&self) -> Result<()> {
        tracing::debug!("Running overdue drop sweep");
        let charged = self.state.engine.sweep_overdue_drops(Utc::now()).await?;
        if charged > 0 {
            tracing::info!(charged, "Late fees charged by sweep");
        }
        Ok(())
    }

    /// Probe the payment gateway
    async fn check_gateway_health(&mut self) {
        tracing::debug!("Running gateway health check");
        match self.payment_gateway.health_check().await {
            Ok(elapsed) => {
                self.health_monitor.update_health("payments", Some(elapsed));
            }
            Err(e) => {
                tracing::warn!("Payment gateway unhealthy: {}", e);
                self.health_monitor.update_health("payments", None);
            }
        }
    }
}
