//! Container health probing.
//!
//! The orchestrator polls the health endpoint on a fixed cadence and flips
//! the instance unhealthy after enough consecutive failures. The constants
//! here are the published contract; the packaged manifest and the
//! `supervise` command both read them, so the behavior in CI matches the
//! behavior in the fleet.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

pub const HEALTHZ_PATH: &str = "/checks/healthz";

pub const PROBE_INTERVAL_SECS: u64 = 30;
pub const PROBE_TIMEOUT_SECS: u64 = 30;
pub const STARTUP_GRACE_SECS: u64 = 5;
pub const PROBE_MAX_FAILURES: u32 = 3;

// ---------------------------------------------------------------------------
// ProbeSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub grace: Duration,
    pub max_failures: u32,
}

impl ProbeSettings {
    /// Contract defaults against a concrete endpoint.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            interval: Duration::from_secs(PROBE_INTERVAL_SECS),
            timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
            grace: Duration::from_secs(STARTUP_GRACE_SECS),
            max_failures: PROBE_MAX_FAILURES,
        }
    }
}

// ---------------------------------------------------------------------------
// ProbeOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Pass,
    Fail(String),
}

impl ProbeOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, ProbeOutcome::Pass)
    }
}

/// One probe: GET the endpoint, bounded by `timeout`. Any 2xx passes;
/// everything else, including transport errors, fails with a reason.
pub async fn probe_once(client: &reqwest::Client, url: &str, timeout: Duration) -> ProbeOutcome {
    match client.get(url).timeout(timeout).send().await {
        Ok(response) if response.status().is_success() => ProbeOutcome::Pass,
        Ok(response) => ProbeOutcome::Fail(format!("status {}", response.status())),
        Err(e) if e.is_timeout() => {
            ProbeOutcome::Fail(format!("timed out after {}s", timeout.as_secs()))
        }
        Err(e) => ProbeOutcome::Fail(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// InstancePhase / HealthMonitor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstancePhase {
    Building,
    Ready,
    Serving,
    Healthy,
    Unhealthy,
    Terminated,
}

impl InstancePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            InstancePhase::Building => "building",
            InstancePhase::Ready => "ready",
            InstancePhase::Serving => "serving",
            InstancePhase::Healthy => "healthy",
            InstancePhase::Unhealthy => "unhealthy",
            InstancePhase::Terminated => "terminated",
        }
    }
}

impl fmt::Display for InstancePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: InstancePhase,
    pub to: InstancePhase,
}

/// Pure record of one instance's lifecycle as seen by the prober. Feeding it
/// probe outcomes moves it between healthy and unhealthy; it never restarts
/// anything, because replacement is the orchestrator's call.
#[derive(Debug)]
pub struct HealthMonitor {
    phase: InstancePhase,
    consecutive_failures: u32,
    max_failures: u32,
}

impl HealthMonitor {
    pub fn new(max_failures: u32) -> Self {
        Self {
            phase: InstancePhase::Building,
            consecutive_failures: 0,
            max_failures,
        }
    }

    pub fn phase(&self) -> InstancePhase {
        self.phase
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    fn advance(&mut self, to: InstancePhase) -> Option<PhaseChange> {
        if self.phase == to {
            return None;
        }
        let from = std::mem::replace(&mut self.phase, to);
        Some(PhaseChange { from, to })
    }

    /// The process exists and is booting.
    pub fn mark_ready(&mut self) -> Option<PhaseChange> {
        match self.phase {
            InstancePhase::Building => self.advance(InstancePhase::Ready),
            _ => None,
        }
    }

    /// The startup grace period is over; probes now count.
    pub fn mark_serving(&mut self) -> Option<PhaseChange> {
        match self.phase {
            InstancePhase::Ready => self.advance(InstancePhase::Serving),
            _ => None,
        }
    }

    /// Fold in one probe outcome. Probes outside the serving phases are
    /// ignored, matching the grace period in the contract.
    pub fn record(&mut self, outcome: &ProbeOutcome) -> Option<PhaseChange> {
        match self.phase {
            InstancePhase::Serving | InstancePhase::Healthy | InstancePhase::Unhealthy => {}
            _ => return None,
        }
        match outcome {
            ProbeOutcome::Pass => {
                self.consecutive_failures = 0;
                self.advance(InstancePhase::Healthy)
            }
            ProbeOutcome::Fail(_) => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.max_failures {
                    self.advance(InstancePhase::Unhealthy)
                } else {
                    None
                }
            }
        }
    }

    /// The process exited. Absorbing; nothing moves out of terminated.
    pub fn mark_terminated(&mut self) -> Option<PhaseChange> {
        self.advance(InstancePhase::Terminated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fail() -> ProbeOutcome {
        ProbeOutcome::Fail("status 503".to_string())
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut m = HealthMonitor::new(3);
        assert_eq!(m.phase(), InstancePhase::Building);

        let change = m.mark_ready().unwrap();
        assert_eq!(change.to, InstancePhase::Ready);

        let change = m.mark_serving().unwrap();
        assert_eq!(change.to, InstancePhase::Serving);

        let change = m.record(&ProbeOutcome::Pass).unwrap();
        assert_eq!(change.to, InstancePhase::Healthy);

        // staying healthy is not a transition
        assert!(m.record(&ProbeOutcome::Pass).is_none());

        let change = m.mark_terminated().unwrap();
        assert_eq!(change.from, InstancePhase::Healthy);
        assert_eq!(change.to, InstancePhase::Terminated);
    }

    #[test]
    fn three_consecutive_failures_flip_unhealthy() {
        let mut m = HealthMonitor::new(3);
        m.mark_ready();
        m.mark_serving();
        m.record(&ProbeOutcome::Pass);

        assert!(m.record(&fail()).is_none());
        assert!(m.record(&fail()).is_none());
        let change = m.record(&fail()).unwrap();
        assert_eq!(change.from, InstancePhase::Healthy);
        assert_eq!(change.to, InstancePhase::Unhealthy);
        assert_eq!(m.consecutive_failures(), 3);
    }

    #[test]
    fn a_pass_resets_the_failure_count() {
        let mut m = HealthMonitor::new(3);
        m.mark_ready();
        m.mark_serving();

        m.record(&fail());
        m.record(&fail());
        m.record(&ProbeOutcome::Pass);
        assert_eq!(m.consecutive_failures(), 0);

        // the streak starts over
        m.record(&fail());
        m.record(&fail());
        assert_eq!(m.phase(), InstancePhase::Healthy);
        m.record(&fail());
        assert_eq!(m.phase(), InstancePhase::Unhealthy);
    }

    #[test]
    fn unhealthy_recovers_on_pass() {
        let mut m = HealthMonitor::new(1);
        m.mark_ready();
        m.mark_serving();
        m.record(&fail());
        assert_eq!(m.phase(), InstancePhase::Unhealthy);

        let change = m.record(&ProbeOutcome::Pass).unwrap();
        assert_eq!(change.to, InstancePhase::Healthy);
    }

    #[test]
    fn probes_before_serving_are_ignored() {
        let mut m = HealthMonitor::new(1);
        assert!(m.record(&fail()).is_none());
        assert_eq!(m.phase(), InstancePhase::Building);

        m.mark_ready();
        assert!(m.record(&fail()).is_none());
        assert_eq!(m.phase(), InstancePhase::Ready);
        assert_eq!(m.consecutive_failures(), 0);
    }

    #[test]
    fn terminated_is_absorbing() {
        let mut m = HealthMonitor::new(3);
        m.mark_ready();
        m.mark_terminated();
        assert!(m.mark_serving().is_none());
        assert!(m.record(&ProbeOutcome::Pass).is_none());
        assert!(m.mark_terminated().is_none());
        assert_eq!(m.phase(), InstancePhase::Terminated);
    }

    #[test]
    fn out_of_order_marks_do_nothing() {
        let mut m = HealthMonitor::new(3);
        assert!(m.mark_serving().is_none());
        assert_eq!(m.phase(), InstancePhase::Building);
        m.mark_ready();
        assert!(m.mark_ready().is_none());
    }

    #[test]
    fn settings_defaults_match_the_contract() {
        let s = ProbeSettings::for_url("http://127.0.0.1:3000/checks/healthz");
        assert_eq!(s.interval, Duration::from_secs(30));
        assert_eq!(s.timeout, Duration::from_secs(30));
        assert_eq!(s.grace, Duration::from_secs(5));
        assert_eq!(s.max_failures, 3);
    }

    #[tokio::test]
    async fn probe_passes_on_200() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/checks/healthz")
            .with_status(200)
            .with_body("OK")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}{}", server.url(), HEALTHZ_PATH);
        let outcome = probe_once(&client, &url, Duration::from_secs(2)).await;
        assert!(outcome.is_pass());
    }

    #[tokio::test]
    async fn probe_fails_on_503_with_reason() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/checks/healthz")
            .with_status(503)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}{}", server.url(), HEALTHZ_PATH);
        match probe_once(&client, &url, Duration::from_secs(2)).await {
            ProbeOutcome::Fail(reason) => assert!(reason.contains("503")),
            ProbeOutcome::Pass => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn probe_fails_on_unreachable_endpoint() {
        let client = reqwest::Client::new();
        let outcome = probe_once(
            &client,
            "http://127.0.0.1:9/checks/healthz",
            Duration::from_secs(2),
        )
        .await;
        assert!(!outcome.is_pass());
    }
}
