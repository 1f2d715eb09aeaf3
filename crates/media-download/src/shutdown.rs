//! Graceful child-process shutdown: SIGTERM → 5s grace → SIGKILL (§4.5).
//!
//! Applies uniformly to scheduler-driven cancellation and process shutdown.
//! Windows has no SIGTERM equivalent, so termination there is an immediate
//! kill.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;

#[cfg(unix)]
use std::time::Duration;
#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// The grace window between SIGTERM and SIGKILL (§4.5).
#[cfg(unix)]
const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Terminate a child, waiting for it to be reaped.
pub async fn shutdown_child(mut child: Child) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        shutdown_unix(&mut child).await
    }

    #[cfg(not(unix))]
    {
        shutdown_windows(&mut child).await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child) -> io::Result<ExitStatus> {
    let pid = child
        .id()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "child has no PID"))?;

    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    match timeout(GRACE_PERIOD, child.wait()).await {
        Ok(result) => return result,
        Err(_) => {}
    }

    child.kill().await?;
    child.wait().await
}

#[cfg(not(unix))]
async fn shutdown_windows(child: &mut Child) -> io::Result<ExitStatus> {
    child.kill().await?;
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;
    use tokio::time::{Duration as StdDuration, sleep};

    #[tokio::test]
    #[cfg(unix)]
    async fn responds_to_sigterm() {
        let child = Command::new("sleep").arg("30").spawn().expect("spawn sleep");
        let result = shutdown_child(child).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn handles_already_exited_child() {
        let child = Command::new("echo").arg("test").spawn().expect("spawn echo");
        sleep(StdDuration::from_millis(100)).await;
        let result = shutdown_child(child).await;
        assert!(result.is_ok());
    }
}
