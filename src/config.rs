//! Service configuration loaded from `UNISON_*` environment variables.

use serde::{Deserialize, Deserializer};

use crate::error::ServiceError;

/// Prefix shared by every configuration variable.
pub const ENV_PREFIX: &str = "UNISON_";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Orchestrator ===
    /// Orchestrator host receiving the capability report.
    #[serde(default = "default_orch_host")]
    pub orch_host: String,

    /// Orchestrator port, kept as given. A malformed value only makes the
    /// capability report fail.
    #[serde(default = "default_orch_port")]
    pub orch_port: String,

    /// Person the capability report is filed under.
    #[serde(default = "default_person_id")]
    pub default_person_id: String,

    // === Capability Flags ===
    /// Camera attached.
    #[serde(default = "default_true", deserialize_with = "deserialize_flag")]
    pub has_camera: bool,

    /// Display attached.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub has_display: bool,

    /// Sign-language adapter attached.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub has_sign_adapter: bool,

    /// Brain-computer interface adapter attached.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub has_bci_adapter: bool,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Emit logs as JSON lines.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub log_json: bool,
}

fn default_orch_host() -> String {
    "orchestrator".to_string()
}

fn default_orch_port() -> String {
    "8080".to_string()
}

fn default_person_id() -> String {
    "local-user".to_string()
}

fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    8086
}

/// Interpret an environment flag: `1`, `true`, `yes` and `on` (any case) are
/// true, everything else is false.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_flag(&raw))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orch_host: default_orch_host(),
            orch_port: default_orch_port(),
            default_person_id: default_person_id(),
            has_camera: true,
            has_display: false,
            has_sign_adapter: false,
            has_bci_adapter: false,
            port: default_port(),
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::prefixed(ENV_PREFIX).from_env()
    }

    /// Load configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }

    /// Check the orchestrator settings used by the capability report.
    ///
    /// Serving does not depend on these; a failure here only means the
    /// startup report cannot be delivered.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.orch_host.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "UNISON_ORCH_HOST must not be empty".to_string(),
            ));
        }

        match self.orch_port.trim().parse::<u16>() {
            Ok(port) if port != 0 => {}
            _ => {
                return Err(ServiceError::InvalidConfig(format!(
                    "UNISON_ORCH_PORT must be a port number in 1-65535, got {:?}",
                    self.orch_port
                )));
            }
        }

        if self.default_person_id.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "UNISON_DEFAULT_PERSON_ID must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Orchestrator event intake URL.
    pub fn orchestrator_event_url(&self) -> String {
        format!("http://{}:{}/event", self.orch_host, self.orch_port)
    }
}
