//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the REST client and the streaming transport.
///
/// Credentials are supplied already issued; the crate performs no
/// authentication handshake of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bearer token attached to every request.
    pub bearer_token: String,

    /// Base URL for REST endpoints.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL for the streaming endpoints.
    #[serde(default = "default_stream_url")]
    pub stream_url: String,

    /// Request timeout for one-shot REST calls.
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// Read timeout for the streaming connection. Longer than the REST
    /// timeout because keep-alive lines arrive on a slow cadence.
    #[serde(default = "default_stream_timeout", with = "duration_secs")]
    pub stream_timeout: Duration,
}

fn default_api_url() -> String {
    "https://api.example.com/1.1".into()
}

fn default_stream_url() -> String {
    "https://stream.example.com/1.1".into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_stream_timeout() -> Duration {
    Duration::from_secs(90)
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bearer_token: String::new(),
            api_url: default_api_url(),
            stream_url: default_stream_url(),
            timeout: default_timeout(),
            stream_timeout: default_stream_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: ApiConfig =
            serde_json::from_str(r#"{"bearer_token": "abc"}"#).unwrap();

        assert_eq!(config.bearer_token, "abc");
        assert_eq!(config.api_url, "https://api.example.com/1.1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.stream_timeout, Duration::from_secs(90));
    }

    #[test]
    fn timeout_round_trips_as_seconds() {
        let config = ApiConfig {
            bearer_token: "abc".into(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        };

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout"], 5);

        let back: ApiConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.timeout, Duration::from_secs(5));
    }
}
