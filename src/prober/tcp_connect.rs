use anyhow::{anyhow, Result};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::{ProbeJob, ProbeOutcome, ProbeResult};
use crate::timestamp::{elapsed_ms, monotonic_ns};

/// Time one TCP handshake to `host:port`, in fractional milliseconds.
pub async fn connect_latency_ms(host: &str, port: u16, limit: Duration) -> Result<f64> {
    let start = monotonic_ns();
    let conn_fut = TcpStream::connect((host, port));
    let conn = timeout(limit, conn_fut)
        .await
        .map_err(|_| anyhow!("connect timed out after {:?}", limit))??;
    let elapsed = elapsed_ms(start);
    drop(conn);
    Ok(elapsed)
}

/// Run a job to completion. Network errors become `ProbeOutcome::Failure`.
pub async fn probe_tcp(job: ProbeJob) -> ProbeResult {
    let outcome = match connect_latency_ms(&job.host, job.port, job.timeout).await {
        Ok(ms) => ProbeOutcome::Success(ms),
        Err(e) => {
            debug!("tcp connect {}:{} failed: {:#}", job.host, job.port, e);
            ProbeOutcome::Failure
        }
    };
    ProbeResult {
        host: job.host,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn job(host: &str, port: u16, timeout_ms: u64) -> ProbeJob {
        ProbeJob {
            host: host.to_string(),
            port,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test]
    async fn loopback_listener_succeeds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = probe_tcp(job("127.0.0.1", port, 1000)).await;
        assert_eq!(result.host, "127.0.0.1");
        let ms = result.outcome.latency_ms().expect("loopback connect");
        assert!(ms >= 0.0);
    }

    #[tokio::test]
    async fn refused_connection_is_failure() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = probe_tcp(job("127.0.0.1", port, 1000)).await;
        assert_eq!(result.outcome, ProbeOutcome::Failure);
    }

    #[tokio::test]
    async fn unresolvable_host_is_failure() {
        let result = probe_tcp(job("no-such-host.invalid", 80, 500)).await;
        assert_eq!(result.host, "no-such-host.invalid");
        assert_eq!(result.outcome, ProbeOutcome::Failure);
    }

    #[tokio::test]
    async fn refused_connect_is_an_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = connect_latency_ms("127.0.0.1", port, Duration::from_millis(1000))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some(), "{err:#}");
    }
}
