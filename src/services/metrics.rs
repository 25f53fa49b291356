//! Metrics collection and Prometheus integration service.

use prometheus::{CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::time::{Duration, Instant};

/// Application metrics collector for Prometheus integration
#[derive(Clone)]
pub struct AppMetrics {
    pub registry: Registry,
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub gateway_rejections_total: CounterVec,
    pub gateway_backend_requests_total: CounterVec,
    pub gateway_backend_duration_seconds: HistogramVec,
    pub app_uptime_seconds: Gauge,
    pub app_info: CounterVec,
    pub start_time: Instant,
}

impl AppMetrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // HTTP request counter by method, status, and matched route
        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "status", "route"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "route"],
        )?;

        // Requests stopped by the gate before reaching the backend
        let gateway_rejections_total = CounterVec::new(
            Opts::new(
                "gateway_rejections_total",
                "Requests rejected by the gateway before forwarding, by reason",
            ),
            &["reason"],
        )?;

        let gateway_backend_requests_total = CounterVec::new(
            Opts::new(
                "gateway_backend_requests_total",
                "Forwarded requests by service and outcome",
            ),
            &["service", "outcome"],
        )?;

        let gateway_backend_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "gateway_backend_duration_seconds",
                "Duration of forwarded backend calls in seconds",
            )
            .buckets(vec![
                0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
            &["service"],
        )?;

        let app_uptime_seconds = Gauge::new("app_uptime_seconds", "Application uptime in seconds")?;

        let app_info = CounterVec::new(
            Opts::new("app_info", "Application information"),
            &["version", "commit", "build_time"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(gateway_rejections_total.clone()))?;
        registry.register(Box::new(gateway_backend_requests_total.clone()))?;
        registry.register(Box::new(gateway_backend_duration_seconds.clone()))?;
        registry.register(Box::new(app_uptime_seconds.clone()))?;
        registry.register(Box::new(app_info.clone()))?;

        app_info
            .with_label_values(&[
                env!("CARGO_PKG_VERSION"),
                crate::BUILD_COMMIT,
                crate::BUILD_TIMESTAMP,
            ])
            .inc();

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            gateway_rejections_total,
            gateway_backend_requests_total,
            gateway_backend_duration_seconds,
            app_uptime_seconds,
            app_info,
            start_time: Instant::now(),
        })
    }

    /// Record an HTTP request with method, route, status, and duration
    pub fn record_request(&self, method: &str, route: &str, status: u16, duration: Duration) {
        if route == "/metrics" {
            // Don't record metrics for the metrics endpoint itself to avoid noise
            return;
        }

        self.http_requests_total
            .with_label_values(&[method, &status.to_string(), route])
            .inc();

        self.http_request_duration_seconds
            .with_label_values(&[method, route])
            .observe(duration.as_secs_f64());
    }

    /// Count a request stopped at the identity, quota or authorization gate
    pub fn record_rejection(&self, reason: &str) {
        self.gateway_rejections_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record the outcome of a forwarded backend call
    pub fn record_backend(&self, service: &str, outcome: &str, duration: Duration) {
        self.gateway_backend_requests_total
            .with_label_values(&[service, outcome])
            .inc();
        self.gateway_backend_duration_seconds
            .with_label_values(&[service])
            .observe(duration.as_secs_f64());
    }

    /// Update the application uptime gauge
    pub fn update_uptime(&self) {
        let uptime = self.start_time.elapsed().as_secs_f64();
        self.app_uptime_seconds.set(uptime);
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_metrics_rendered() {
        let metrics = AppMetrics::new().unwrap();
        metrics.record_rejection("rate_limited");
        metrics.record_backend("posts", "success", Duration::from_millis(12));
        metrics.record_request("GET", "/api/posts", 200, Duration::from_millis(15));
        metrics.record_request("GET", "/metrics", 200, Duration::from_millis(1));

        let output = metrics.render().unwrap();
        assert!(output.contains("gateway_rejections_total{reason=\"rate_limited\"} 1"));
        assert!(output.contains("gateway_backend_requests_total"));
        assert!(output.contains("route=\"/api/posts\""));
        assert!(!output.contains("route=\"/metrics\""));
    }
}
