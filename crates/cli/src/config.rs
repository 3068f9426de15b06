//! Watcher configuration loaded from environment variables.

use std::time::Duration;

/// Connection settings for one watcher process.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// HTTP base URL of the pipeline engine, e.g. `http://host:8000`.
    pub api_url: String,
    /// WebSocket base URL, e.g. `ws://host:8000`.
    pub ws_url: String,
    /// Interval between job status polls.
    pub poll_interval: Duration,
    /// Job whose log to tail alongside the dashboard, if any.
    pub tail_job: Option<String>,
}

impl WatchConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                       | Required | Default |
    /// |-------------------------------|----------|---------|
    /// | `PIPEWATCH_API_URL`           | yes      | --      |
    /// | `PIPEWATCH_WS_URL`            | yes      | --      |
    /// | `PIPEWATCH_POLL_INTERVAL_SECS`| no       | `5`     |
    /// | `PIPEWATCH_TAIL_JOB`          | no       | --      |
    pub fn from_env() -> Self {
        let api_url = std::env::var("PIPEWATCH_API_URL").unwrap_or_else(|_| {
            tracing::error!("PIPEWATCH_API_URL environment variable is required");
            std::process::exit(1);
        });

        let ws_url = std::env::var("PIPEWATCH_WS_URL").unwrap_or_else(|_| {
            tracing::error!("PIPEWATCH_WS_URL environment variable is required");
            std::process::exit(1);
        });

        let poll_interval_secs: u64 = std::env::var("PIPEWATCH_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(pipewatch_monitor::DEFAULT_POLL_INTERVAL.as_secs());

        let tail_job = std::env::var("PIPEWATCH_TAIL_JOB").ok();

        Self {
            api_url,
            ws_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            tail_job,
        }
    }

    /// Full URL of the global notification feed endpoint.
    pub fn events_url(&self) -> String {
        format!("{}/ws/events", self.ws_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ws_url: &str) -> WatchConfig {
        WatchConfig {
            api_url: "http://host:8000".to_string(),
            ws_url: ws_url.to_string(),
            poll_interval: Duration::from_secs(5),
            tail_job: None,
        }
    }

    #[test]
    fn events_url_tolerates_trailing_slash() {
        assert_eq!(config("ws://host:8000").events_url(), "ws://host:8000/ws/events");
        assert_eq!(config("ws://host:8000/").events_url(), "ws://host:8000/ws/events");
    }
}
