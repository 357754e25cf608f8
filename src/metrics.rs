//! Client-side game counters
//!
//! Lock-free counters updated by the board driver and the location poller.
//! Rendered in Prometheus text format or as a serializable snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Counter registry for one client session
#[derive(Debug)]
pub struct ClientMetrics {
    // Spins
    pub spins_started: AtomicU64,
    pub spins_resolved: AtomicU64,
    pub spins_cancelled: AtomicU64,
    pub chance_cards: AtomicU64,

    // Tasks
    pub tasks_completed: AtomicU64,
    pub points_awarded: AtomicU64,

    // Location
    pub location_samples: AtomicU64,
    pub location_failures: AtomicU64,
    pub gate_openings: AtomicU64,

    // Backend
    pub save_failures: AtomicU64,

    start_time: Instant,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub spins_started: u64,
    pub spins_resolved: u64,
    pub spins_cancelled: u64,
    pub chance_cards: u64,
    pub tasks_completed: u64,
    pub points_awarded: u64,
    pub location_samples: u64,
    pub location_failures: u64,
    pub gate_openings: u64,
    pub save_failures: u64,
    pub uptime_seconds: u64,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self {
            spins_started: AtomicU64::new(0),
            spins_resolved: AtomicU64::new(0),
            spins_cancelled: AtomicU64::new(0),
            chance_cards: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            points_awarded: AtomicU64::new(0),
            location_samples: AtomicU64::new(0),
            location_failures: AtomicU64::new(0),
            gate_openings: AtomicU64::new(0),
            save_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_spin_started(&self, superseded: bool) {
        self.spins_started.fetch_add(1, Ordering::Relaxed);
        if superseded {
            self.spins_cancelled.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_spin_resolved(&self, is_chance: bool) {
        self.spins_resolved.fetch_add(1, Ordering::Relaxed);
        if is_chance {
            self.chance_cards.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_points(&self, points: i64, from_task: bool) {
        if from_task {
            self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        }
        if points > 0 {
            self.points_awarded.fetch_add(points as u64, Ordering::Relaxed);
        }
    }

    pub fn record_location_sample(&self) {
        self.location_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_location_failure(&self) {
        self.location_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gate_opened(&self) {
        self.gate_openings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save_failure(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            spins_started: self.spins_started.load(Ordering::Relaxed),
            spins_resolved: self.spins_resolved.load(Ordering::Relaxed),
            spins_cancelled: self.spins_cancelled.load(Ordering::Relaxed),
            chance_cards: self.chance_cards.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            points_awarded: self.points_awarded.load(Ordering::Relaxed),
            location_samples: self.location_samples.load(Ordering::Relaxed),
            location_failures: self.location_failures.load(Ordering::Relaxed),
            gate_openings: self.gate_openings.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
            uptime_seconds: self.uptime_seconds(),
        }
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(1024);
        let s = self.snapshot();

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("climate_spins_started_total", "Spins started", "counter", s.spins_started);
        metric!("climate_spins_resolved_total", "Spins resolved to a face", "counter", s.spins_resolved);
        metric!("climate_spins_cancelled_total", "Spins superseded mid-animation", "counter", s.spins_cancelled);
        metric!("climate_chance_cards_total", "Spins landing on the chance face", "counter", s.chance_cards);
        metric!("climate_tasks_completed_total", "Tasks completed", "counter", s.tasks_completed);
        metric!("climate_points_awarded_total", "Points from tasks and chance cards", "counter", s.points_awarded);
        metric!("climate_location_samples_total", "Successful location samples", "counter", s.location_samples);
        metric!("climate_location_failures_total", "Failed location samples", "counter", s.location_failures);
        metric!("climate_gate_openings_total", "Times the location gate opened", "counter", s.gate_openings);
        metric!("climate_save_failures_total", "Failed game stat saves", "counter", s.save_failures);
        metric!("climate_uptime_seconds", "Client uptime", "gauge", s.uptime_seconds);

        output
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn respond(request: &str, metrics: &ClientMetrics) -> String {
    let (content_type, body) = if request.starts_with("GET /metrics/json") {
        ("application/json", metrics.to_json())
    } else if request.starts_with("GET /metrics") {
        ("text/plain; version=0.0.4", metrics.to_prometheus())
    } else if request.starts_with("GET /health") {
        ("text/plain", "OK".to_string())
    } else {
        return "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string();
    };

    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        content_type,
        body.len(),
        body
    )
}

/// Serve metrics over plain HTTP until the listener fails
pub async fn serve_metrics(metrics: Arc<ClientMetrics>, listener: TcpListener) -> anyhow::Result<()> {
    info!("Metrics available on http://{}/metrics", listener.local_addr()?);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);
                    let response = respond(&request, &metrics);
                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("Failed to write metrics response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Failed to read from metrics socket {}: {}", peer, e);
                }
            }
        });
    }
}

/// Bind `127.0.0.1:port` and serve metrics
pub async fn start_metrics_server(metrics: Arc<ClientMetrics>, port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    serve_metrics(metrics, listener).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = ClientMetrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.spins_started, 0);
        assert_eq!(snapshot.location_samples, 0);
    }

    #[test]
    fn test_spin_counters() {
        let metrics = ClientMetrics::new();
        metrics.record_spin_started(false);
        metrics.record_spin_started(true);
        metrics.record_spin_resolved(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.spins_started, 2);
        assert_eq!(snapshot.spins_cancelled, 1);
        assert_eq!(snapshot.spins_resolved, 1);
        assert_eq!(snapshot.chance_cards, 1);
    }

    #[test]
    fn test_points() {
        let metrics = ClientMetrics::new();
        metrics.record_points(10, true);
        metrics.record_points(5, false);
        metrics.record_points(-3, false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_completed, 1);
        assert_eq!(snapshot.points_awarded, 15);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = ClientMetrics::new();
        metrics.record_location_sample();
        metrics.record_location_sample();
        metrics.record_location_failure();

        let output = metrics.to_prometheus();
        assert!(output.contains("climate_location_samples_total 2"));
        assert!(output.contains("climate_location_failures_total 1"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE climate_uptime_seconds gauge"));
    }

    #[test]
    fn test_routes() {
        let metrics = ClientMetrics::new();
        metrics.record_gate_opened();

        assert!(respond("GET /metrics HTTP/1.1", &metrics).contains("climate_gate_openings_total 1"));
        assert!(respond("GET /metrics/json HTTP/1.1", &metrics).contains("\"gate_openings\":1"));
        assert!(respond("GET /health HTTP/1.1", &metrics).ends_with("OK"));
        assert!(respond("POST /metrics HTTP/1.1", &metrics).starts_with("HTTP/1.1 404"));
    }

    #[tokio::test]
    async fn test_metrics_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let metrics = Arc::new(ClientMetrics::new());
        metrics.record_spin_started(false);
        let server = tokio::spawn(serve_metrics(metrics, listener));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\n\r\n").await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("climate_spins_started_total 1"));
        server.abort();
    }
}
