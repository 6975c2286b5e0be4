use anyhow::{Context, Result};
use clap::Args;
use ogserve_core::config::RuntimeConfig;
use ogserve_core::notify::{Notifier, NotifyLevel, WARNINGS_CHANNEL};
use ogserve_core::probe::{
    self, HealthMonitor, InstancePhase, PhaseChange, ProbeOutcome, ProbeSettings, HEALTHZ_PATH,
    PROBE_INTERVAL_SECS, PROBE_MAX_FAILURES, PROBE_TIMEOUT_SECS, STARTUP_GRACE_SECS,
};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::{Child, Command};

/// How long a signalled child gets to drain before SIGKILL.
const STOP_GRACE: Duration = Duration::from_secs(10);

#[derive(Args, Debug)]
pub struct SuperviseArgs {
    /// Endpoint to probe (default: loopback healthz for the configured port)
    #[arg(long)]
    pub url: Option<String>,

    /// Seconds between probes
    #[arg(long, default_value_t = PROBE_INTERVAL_SECS)]
    pub interval: u64,

    /// Seconds to wait for each probe answer
    #[arg(long, default_value_t = PROBE_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Seconds before the first probe, so the instance can finish starting
    #[arg(long, default_value_t = STARTUP_GRACE_SECS)]
    pub grace: u64,

    /// Consecutive failures that flip the instance to unhealthy
    #[arg(long, default_value_t = PROBE_MAX_FAILURES)]
    pub max_failures: u32,

    /// Command to run as the instance
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

/// Run a command as the single foreground instance, probing it on an
/// interval and tracking its phase. An unhealthy instance is reported, not
/// restarted: replacement is the orchestrator's call, ours is to exit with
/// the child's status when the child goes down.
pub fn run(args: SuperviseArgs) -> Result<()> {
    let config = RuntimeConfig::from_env()?;
    let url = match &args.url {
        Some(url) => url.clone(),
        None => format!("http://127.0.0.1:{}{}", config.port, HEALTHZ_PATH),
    };
    let settings = ProbeSettings {
        url,
        interval: Duration::from_secs(args.interval),
        timeout: Duration::from_secs(args.timeout),
        grace: Duration::from_secs(args.grace),
        max_failures: args.max_failures,
    };

    let rt = tokio::runtime::Runtime::new()?;
    let status = rt.block_on(supervise(&args.command, &settings, &config))?;
    drop(rt);

    // The child's exit status is the instance's exit status.
    std::process::exit(exit_code(status));
}

async fn supervise(
    command: &[String],
    settings: &ProbeSettings,
    config: &RuntimeConfig,
) -> Result<ExitStatus> {
    let (program, rest) = command
        .split_first()
        .context("supervise needs a command to run")?;

    let mut monitor = HealthMonitor::new(settings.max_failures);
    log_change(monitor.mark_ready());

    let mut child = Command::new(program)
        .args(rest)
        .spawn()
        .with_context(|| format!("failed to spawn '{program}'"))?;
    log_change(monitor.mark_serving());
    tracing::info!(pid = child.id(), url = %settings.url, "supervising instance");

    let client = reqwest::Client::new();
    let notifier = Notifier::from_config(config, client.clone());

    let shutdown = ogserve_server::wait_for_shutdown_signal();
    tokio::pin!(shutdown);

    let mut next_probe = tokio::time::Instant::now() + settings.grace;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status?,
            _ = tokio::time::sleep_until(next_probe) => {
                next_probe += settings.interval;
                let outcome = probe::probe_once(&client, &settings.url, settings.timeout).await;
                let change = monitor.record(&outcome);
                if let ProbeOutcome::Fail(reason) = &outcome {
                    tracing::warn!(
                        failures = monitor.consecutive_failures(),
                        max = settings.max_failures,
                        %reason,
                        "probe failed"
                    );
                }
                if let Some(change) = change {
                    log_change(Some(change));
                    if change.to == InstancePhase::Unhealthy {
                        alert_unhealthy(&notifier, &settings.url, &outcome).await;
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("termination signal received, stopping instance");
                stop_child(&mut child).await;
                break child.wait().await?;
            }
        }
    };

    log_change(monitor.mark_terminated());
    tracing::info!(code = status.code(), "instance exited");
    Ok(status)
}

fn log_change(change: Option<PhaseChange>) {
    let Some(change) = change else { return };
    if change.to == InstancePhase::Unhealthy {
        tracing::error!(from = %change.from, to = %change.to, "instance phase changed");
    } else {
        tracing::info!(from = %change.from, to = %change.to, "instance phase changed");
    }
}

async fn alert_unhealthy(notifier: &Notifier, url: &str, outcome: &ProbeOutcome) {
    if !notifier.has_channel(WARNINGS_CHANNEL) {
        return;
    }
    let reason = match outcome {
        ProbeOutcome::Fail(reason) => reason.as_str(),
        ProbeOutcome::Pass => return,
    };
    let message = format!("instance unhealthy: probe against {url} keeps failing");
    if let Err(e) = notifier
        .send(WARNINGS_CHANNEL, NotifyLevel::Critical, &message, Some(reason))
        .await
    {
        tracing::warn!(error = %e, "could not deliver unhealthy alert");
    }
}

/// SIGTERM lets the instance drain; SIGKILL after STOP_GRACE if it is still
/// running.
async fn stop_child(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: the pid names a child this process spawned and still owns.
        unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
        if tokio::time::timeout(STOP_GRACE, child.wait()).await.is_ok() {
            return;
        }
        tracing::warn!(pid, "instance ignored SIGTERM, killing");
    }
    let _ = child.start_kill();
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    // No code means a signal death; mirror the shell convention.
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
