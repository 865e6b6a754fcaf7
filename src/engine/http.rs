// tutorchat Engine — HTTP client factory
//
// One `reqwest::Client` per backend. The tutoring server authenticates with
// a session cookie, so the cookie store is always on. Timeouts are opt-in.

use crate::atoms::error::EngineResult;
use crate::config::ClientConfig;
use log::debug;
use reqwest::Client;
use std::time::Duration;

pub const USER_AGENT: &str = concat!("tutorchat/", env!("CARGO_PKG_VERSION"));

pub fn build_client(config: &ClientConfig) -> EngineResult<Client> {
    let mut builder = Client::builder().cookie_store(true).user_agent(USER_AGENT);
    if let Some(secs) = config.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    debug!(
        "[backend] Building HTTP client (connect timeout {:?}, request timeout {:?})",
        config.connect_timeout_secs, config.request_timeout_secs
    );
    Ok(builder.build()?)
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_and_without_timeouts() {
        build_client(&ClientConfig::default()).unwrap();
        let cfg = ClientConfig {
            connect_timeout_secs: Some(5),
            request_timeout_secs: Some(60),
            ..ClientConfig::default()
        };
        build_client(&cfg).unwrap();
        assert!(USER_AGENT.starts_with("tutorchat/"));
    }
}
