//! External collaborator health monitoring

use std::time::Duration;
use types::{GatewayHealth, GatewayHealthCheck};

/// Health monitor for the external services this engine depends on
#[derive(Debug, Clone)]
pub struct GatewayHealthMonitor {
    services: Vec<GatewayHealthCheck>,
}

impl GatewayHealthMonitor {
    /// Create a monitor covering the named services
    pub fn new(service_names: Vec<String>) -> Self {
        let services = service_names
            .into_iter()
            .map(|name| GatewayHealthCheck::new(name, GatewayHealth::Unknown))
            .collect();

        Self { services }
    }

    /// Get health status for all services
    pub fn get_all_health(&self) -> &[GatewayHealthCheck] {
        &self.services
    }

    /// Update health status for a service
    pub fn update_health(&mut self, service: &str, response_time: Option<Duration>) {
        if let Some(check) = self.services.iter_mut().find(|s| s.service == service) {
            if let Some(duration) = response_time {
                check.mark_healthy(duration.as_millis() as u64);
            } else {
                check.mark_unhealthy("No response".to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_tracks_services_independently() {
        let mut monitor = GatewayHealthMonitor::new(vec![
            "payments".to_string(),
            "uploads".to_string(),
        ]);

        monitor.update_health("payments", Some(Duration::from_millis(12)));
        monitor.update_health("uploads", None);

        let all = monitor.get_all_health();
        assert_eq!(all[0].health, GatewayHealth::Healthy);
        assert_eq!(all[0].response_time_ms, Some(12));
        assert_eq!(all[1].health, GatewayHealth::Unhealthy);
    }

    #[test]
    fn unknown_service_updates_are_ignored() {
        let mut monitor = GatewayHealthMonitor::new(vec!["payments".to_string()]);
        monitor.update_health("chat", Some(Duration::from_millis(1)));
        assert_eq!(monitor.get_all_health().len(), 1);
        assert_eq!(monitor.get_all_health()[0].health, GatewayHealth::Unknown);
    }
}
