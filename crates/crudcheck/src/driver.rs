//! WebDriver server management - spawning and health checking the driver process

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{CrudError, CrudResult};

/// Handle to a running WebDriver server process
pub struct DriverHandle {
    child: Child,
    stopped: bool,
    pub base_url: String,
    pub port: u16,
}

impl DriverHandle {
    /// Spawn the driver binary and wait until it reports ready
    pub async fn spawn(config: &DriverConfig) -> CrudResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning {} on port {}", config.binary_path.display(), port);

        let mut cmd = Command::new(&config.binary_path);
        cmd.arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            CrudError::DriverStartup(format!(
                "Failed to spawn {}: {}",
                config.binary_path.display(),
                e
            ))
        })?;

        let mut handle = DriverHandle {
            child,
            stopped: false,
            base_url: base_url.clone(),
            port,
        };

        if let Err(e) = handle
            .wait_for_ready(Duration::from_secs(config.startup_timeout_secs))
            .await
        {
            let _ = handle.stop();
            return Err(e);
        }

        info!("WebDriver is ready at {}", base_url);
        Ok(handle)
    }

    /// Poll `/status` until the driver accepts new sessions
    async fn wait_for_ready(&self, timeout_duration: Duration) -> CrudResult<()> {
        let status_url = format!("{}/status", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let ready = resp
                        .json::<serde_json::Value>()
                        .await
                        .ok()
                        .and_then(|v| v.pointer("/value/ready").and_then(|r| r.as_bool()))
                        .unwrap_or(true);
                    if ready {
                        return Ok(());
                    }
                }
                Ok(resp) => {
                    warn!("WebDriver status returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for WebDriver to start...");
                    }
                    // Connection refused is expected while the driver boots
                    if !e.is_connect() {
                        warn!("WebDriver status error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(CrudError::DriverHealthCheck(attempts))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the driver process without blocking the runtime
    pub async fn shutdown(&mut self) -> CrudResult<()> {
        if self.stopped {
            return Ok(());
        }
        if self.terminate() {
            sleep(SIGTERM_GRACE).await;
        }
        self.reap();
        Ok(())
    }

    /// Stop the driver process, blocking the calling thread
    pub fn stop(&mut self) -> CrudResult<()> {
        if self.stopped {
            return Ok(());
        }
        if self.terminate() {
            std::thread::sleep(SIGTERM_GRACE);
        }
        self.reap();
        Ok(())
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Send SIGTERM; returns whether the signal was delivered
    fn terminate(&self) -> bool {
        info!("Stopping WebDriver (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            kill(pid, Signal::SIGTERM).is_ok()
        }

        #[cfg(not(unix))]
        {
            false
        }
    }

    fn reap(&mut self) {
        // Force kill if still running
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        self.stopped = true;
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

const SIGTERM_GRACE: Duration = Duration::from_millis(200);

/// Configuration for spawning a WebDriver server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Path or name of the driver binary; empty picks the browser's default
    pub binary_path: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for driver startup
    pub startup_timeout_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::new(),
            port: None,
            startup_timeout_secs: 30,
        }
    }
}

/// Find a free port to use
fn find_free_port() -> CrudResult<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port = find_free_port().unwrap();
        assert!(port > 1024);
    }

    #[cfg(unix)]
    fn sleeping_handle() -> DriverHandle {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        DriverHandle {
            child,
            stopped: false,
            base_url: "http://127.0.0.1:1".to_string(),
            port: 1,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shutdown_reaps_process_once() {
        let mut handle = sleeping_handle();

        handle.shutdown().await.unwrap();
        assert!(handle.is_stopped());
        assert!(handle.child.try_wait().unwrap().is_some());

        // Second stop, and the one from Drop, must not signal the pid again
        handle.shutdown().await.unwrap();
        handle.stop().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_stop_from_sync_context() {
        let mut handle = sleeping_handle();
        handle.stop().unwrap();
        assert!(handle.is_stopped());
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_is_startup_error() {
        let config = DriverConfig {
            binary_path: PathBuf::from("/nonexistent/crudcheck-driver"),
            ..Default::default()
        };
        match DriverHandle::spawn(&config).await {
            Err(CrudError::DriverStartup(msg)) => assert!(msg.contains("crudcheck-driver")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("spawn should fail"),
        }
    }
}
