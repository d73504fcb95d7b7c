//! Supervised local runtime process
//!
//! The supervisor launches the runtime server, polls its readiness route
//! until it answers, and terminates it on teardown. The child handle sits
//! behind a mutex and is taken out by whichever teardown path runs first, so
//! the process is signalled exactly once.

use std::process::Stdio;
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::config::LocalRuntimeConfig;
use crate::core::{poll_until, PollOutcome, RuntimeError, RuntimeResult, SupervisorState};

/// How often a teardown outside any runtime checks whether the child has exited
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Owner of one local runtime process
pub struct ProcessSupervisor {
    config: LocalRuntimeConfig,
    state: StdMutex<SupervisorState>,
    child: Mutex<Option<Child>>,
    pid: Option<u32>,
    probe_attempts: u32,
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("program", &self.config.program)
            .field("endpoint", &self.config.endpoint())
            .field("state", &self.state())
            .field("pid", &self.pid)
            .finish()
    }
}

impl ProcessSupervisor {
    /// Create a supervisor; nothing is launched until `start`
    pub fn new(config: LocalRuntimeConfig) -> Self {
        Self {
            config,
            state: StdMutex::new(SupervisorState::NotStarted),
            child: Mutex::new(None),
            pid: None,
            probe_attempts: 0,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &LocalRuntimeConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> SupervisorState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// OS pid of the child, once spawned
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Number of readiness requests issued by the last `start`
    pub fn probe_attempts(&self) -> u32 {
        self.probe_attempts
    }

    /// Endpoint the child serves on
    pub fn endpoint(&self) -> String {
        self.config.endpoint()
    }

    fn set_state(&self, next: SupervisorState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.can_transition_to(next) {
            tracing::debug!("[Supervisor] Unexpected transition {} -> {}", *state, next);
        }
        *state = next;
    }

    /// Spawn the child and wait until it reports ready
    ///
    /// On failure the child (if any) is already terminated when this returns.
    pub async fn start(&mut self) -> RuntimeResult<()> {
        if self.state() != SupervisorState::NotStarted {
            return Err(RuntimeError::startup(format!(
                "supervisor already used (state: {})",
                self.state()
            )));
        }

        self.spawn().await?;

        if let Err(e) = self.probe().await {
            self.set_state(SupervisorState::Failed);
            if let Err(stop_err) = self.terminate().await {
                tracing::error!("[Supervisor] Failed to stop unready runtime: {}", stop_err);
            }
            return Err(e);
        }

        self.set_state(SupervisorState::Healthy);
        tracing::info!(
            "[Supervisor] Local runtime started on port {} (pid {:?})",
            self.config.port,
            self.pid
        );
        Ok(())
    }

    async fn spawn(&mut self) -> RuntimeResult<()> {
        self.set_state(SupervisorState::Spawning);

        tracing::info!(
            "[Supervisor] Starting local runtime: {} {}",
            self.config.program,
            self.config.args.join(" ")
        );

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .env(&self.config.port_env, self.config.port.to_string())
            .envs(&self.config.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = self.config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.set_state(SupervisorState::Failed);
                tracing::error!("[Supervisor] Failed to spawn {}: {}", self.config.program, e);
                return Err(RuntimeError::startup(format!(
                    "could not spawn '{}': {}",
                    self.config.program, e
                )));
            }
        };

        self.pid = child.id();

        // Drain output so a chatty child never blocks on a full pipe
        if let Some(stdout) = child.stdout.take() {
            forward_output(stdout, "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            forward_output(stderr, "stderr");
        }

        *self.child.get_mut() = Some(child);
        self.set_state(SupervisorState::Probing);
        Ok(())
    }

    async fn probe(&mut self) -> RuntimeResult<()> {
        let url = self.config.readiness_url();
        let policy = self.config.probe;
        let client = Client::builder()
            .timeout(self.config.probe_timeout)
            .build()
            .map_err(|e| RuntimeError::startup(format!("could not build probe client: {}", e)))?;

        tracing::debug!(
            "[Supervisor] Probing {} (up to {} attempts every {:?})",
            url,
            policy.max_attempts,
            policy.interval
        );

        let child = self.child.get_mut();
        let mut exited = None;

        let outcome = poll_until(policy, |attempt| {
            // A dead child ends the wait; whatever answers the port now is not ours
            let dead = match child.as_mut().map(Child::try_wait) {
                Some(Ok(Some(status))) => {
                    exited = Some(status);
                    true
                }
                _ => false,
            };
            let client = client.clone();
            let url = url.clone();
            async move {
                if dead {
                    return true;
                }
                match client.get(&url).send().await {
                    Ok(response) if response.status().is_success() => true,
                    Ok(response) => {
                        tracing::trace!(
                            "[Supervisor] Probe {} answered {}",
                            attempt,
                            response.status()
                        );
                        false
                    }
                    Err(e) => {
                        tracing::trace!("[Supervisor] Probe {} not ready: {}", attempt, e);
                        false
                    }
                }
            }
        })
        .await;

        self.probe_attempts = outcome.attempts();

        if let Some(status) = exited {
            tracing::error!(
                "[Supervisor] Local runtime exited with {} before becoming ready",
                status
            );
            return Err(RuntimeError::startup(format!(
                "local runtime exited with {} before becoming ready",
                status
            )));
        }

        match outcome {
            PollOutcome::Ready { attempts } => {
                tracing::debug!("[Supervisor] Ready after {} probe(s)", attempts);
                Ok(())
            }
            PollOutcome::Exhausted { attempts } => {
                tracing::error!(
                    "[Supervisor] Runtime not ready after {} probes of {}",
                    attempts,
                    url
                );
                Err(RuntimeError::startup(format!(
                    "{} did not become ready after {} attempts",
                    url, attempts
                )))
            }
        }
    }

    /// Stop the child
    ///
    /// Sends a graceful terminate, waits up to the grace period, then kills.
    /// Returns `true` if this call terminated the process and `false` if there
    /// was nothing to stop (never started, or already stopped).
    pub async fn stop(&self) -> RuntimeResult<bool> {
        let stopped = self.terminate().await?;
        if stopped && self.state() != SupervisorState::Failed {
            self.set_state(SupervisorState::Stopped);
        }
        Ok(stopped)
    }

    async fn terminate(&self) -> RuntimeResult<bool> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(false);
        };

        tracing::info!("[Supervisor] Stopping local runtime (pid {:?})", child.id());
        send_terminate(&mut child);

        if let Err(e) = wait_or_kill(&mut child, self.config.grace_period).await {
            tracing::error!("[Supervisor] Failed to wait for local runtime: {}", e);
            return Err(e.into());
        }

        Ok(true)
    }
}

impl Drop for ProcessSupervisor {
    /// Signals the child right away. Inside a tokio runtime the grace period
    /// and reaping run on a spawned task, so dropping never parks a worker.
    /// Outside one, the grace period is waited out on the current thread.
    fn drop(&mut self) {
        let Some(mut child) = self.child.get_mut().take() else {
            return;
        };

        tracing::info!("[Supervisor] Stopping local runtime on drop (pid {:?})", child.id());
        send_terminate(&mut child);

        let grace = self.config.grace_period;
        match tokio::runtime::Handle::try_current() {
            // If the runtime shuts down first, `kill_on_drop` still kills the child
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = wait_or_kill(&mut child, grace).await {
                        tracing::error!("[Supervisor] Failed to reap local runtime: {}", e);
                    }
                });
            }
            Err(_) => reap_blocking(child, grace),
        }

        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        if *state != SupervisorState::Failed {
            *state = SupervisorState::Stopped;
        }
    }
}

/// Wait for a signalled child, killing it once the grace period runs out
async fn wait_or_kill(child: &mut Child, grace: Duration) -> std::io::Result<()> {
    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            tracing::debug!("[Supervisor] Local runtime exited: {}", status);
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            tracing::warn!(
                "[Supervisor] Local runtime ignored terminate for {:?}, killing",
                grace
            );
            child.kill().await
        }
    }
}

fn reap_blocking(mut child: Child, grace: Duration) {
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) if Instant::now() < deadline => std::thread::sleep(EXIT_POLL_INTERVAL),
            _ => {
                tracing::warn!("[Supervisor] Killing local runtime after grace period");
                let _ = child.start_kill();
                let _ = child.try_wait();
                break;
            }
        }
    }
}

/// Ask the child to exit
#[cfg(unix)]
fn send_terminate(child: &mut Child) {
    match child.id() {
        // SAFETY: plain kill(2) on a pid we spawned and have not reaped yet
        Some(pid) => unsafe {
            if libc::kill(pid as libc::pid_t, libc::SIGTERM) != 0 {
                tracing::warn!("[Supervisor] SIGTERM to {} failed", pid);
            }
        },
        None => tracing::debug!("[Supervisor] Local runtime already exited"),
    }
}

/// Ask the child to exit
#[cfg(not(unix))]
fn send_terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::warn!("[Supervisor] Failed to signal local runtime: {}", e);
    }
}

fn forward_output<R>(stream: R, name: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!("[local-runtime:{}] {}", name, line);
        }
    });
}
