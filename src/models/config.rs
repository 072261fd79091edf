//! Shared configuration structures.

use std::fs;
use std::path::Path;

use lettre::message::Mailbox;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Process-wide settings loaded once at startup.
///
/// The three SMTP keys are required; a file missing any of them is fatal
/// for the whole run.
#[derive(Debug, Clone, Deserialize)]
pub struct SharedConfig {
    /// SMTP relay host
    #[serde(rename = "SMTP_SERVER")]
    pub smtp_server: String,

    /// SMTP relay port
    #[serde(rename = "SMTP_PORT")]
    pub smtp_port: u16,

    /// Envelope and header sender
    #[serde(rename = "FROM_ADDRESS")]
    pub from_address: String,

    /// Optional SMTP login
    #[serde(rename = "SMTP_USERNAME", default)]
    pub smtp_username: Option<String>,

    /// Optional SMTP password, used only together with `SMTP_USERNAME`
    #[serde(rename = "SMTP_PASSWORD", default)]
    pub smtp_password: Option<String>,

    /// Upgrade the connection with STARTTLS
    #[serde(rename = "SMTP_STARTTLS", default)]
    pub smtp_starttls: bool,

    /// arXiv query behavior
    #[serde(default)]
    pub arxiv: ArxivConfig,
}

impl SharedConfig {
    /// Load and validate the shared configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_yaml(&content)
            .map_err(|e| AppError::config(format!("{}: {e}", path.display())))?;
        log::debug!("Loaded shared configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate the shared configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| AppError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.smtp_server.trim().is_empty() {
            return Err(AppError::config("SMTP_SERVER is empty"));
        }
        if self.smtp_port == 0 {
            return Err(AppError::config("SMTP_PORT must be > 0"));
        }
        self.from_address
            .parse::<Mailbox>()
            .map_err(|e| AppError::config(format!("FROM_ADDRESS is invalid: {e}")))?;
        if self.arxiv.page_size == 0 {
            return Err(AppError::config("arxiv.page_size must be > 0"));
        }
        if self.arxiv.max_results == 0 {
            return Err(AppError::config("arxiv.max_results must be > 0"));
        }
        if self.arxiv.timeout_secs == 0 {
            return Err(AppError::config("arxiv.timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// SMTP login pair, present only when both halves are configured.
    pub fn smtp_credentials(&self) -> Option<(&str, &str)> {
        match (&self.smtp_username, &self.smtp_password) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

/// arXiv API client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ArxivConfig {
    /// Query endpoint
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Entries requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Hard cap on entries fetched per user and run
    #[serde(default = "defaults::max_results")]
    pub max_results: usize,

    /// Pause between consecutive page requests
    #[serde(default = "defaults::request_delay")]
    pub request_delay_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for API requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            page_size: defaults::page_size(),
            max_results: defaults::max_results(),
            request_delay_secs: defaults::request_delay(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

mod defaults {
    pub fn base_url() -> String {
        "https://export.arxiv.org/api/query".into()
    }
    pub fn page_size() -> usize {
        100
    }
    pub fn max_results() -> usize {
        500
    }
    pub fn request_delay() -> u64 {
        3
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        concat!("sonar/", env!("CARGO_PKG_VERSION")).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "\
SMTP_SERVER: localhost
SMTP_PORT: 25
FROM_ADDRESS: sonar@example.org
";

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = SharedConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.smtp_server, "localhost");
        assert_eq!(config.smtp_port, 25);
        assert!(!config.smtp_starttls);
        assert!(config.smtp_credentials().is_none());
        assert_eq!(config.arxiv.page_size, 100);
        assert_eq!(config.arxiv.max_results, 500);
        assert_eq!(config.arxiv.base_url, "https://export.arxiv.org/api/query");
    }

    #[test]
    fn test_missing_port_is_rejected() {
        let err = SharedConfig::from_yaml("SMTP_SERVER: localhost\nFROM_ADDRESS: a@b.org\n")
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("SMTP_PORT"));
    }

    #[test]
    fn test_out_of_range_port_is_rejected() {
        let yaml = MINIMAL.replace("25", "70000");
        assert!(SharedConfig::from_yaml(&yaml).is_err());
        let yaml = MINIMAL.replace("25", "0");
        assert!(SharedConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_invalid_from_address_is_rejected() {
        let yaml = MINIMAL.replace("sonar@example.org", "not an address");
        assert!(SharedConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_credentials_need_both_halves() {
        let yaml = format!("{MINIMAL}SMTP_USERNAME: bot\n");
        let config = SharedConfig::from_yaml(&yaml).unwrap();
        assert!(config.smtp_credentials().is_none());

        let yaml = format!("{MINIMAL}SMTP_USERNAME: bot\nSMTP_PASSWORD: hunter2\n");
        let config = SharedConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.smtp_credentials(), Some(("bot", "hunter2")));
    }

    #[test]
    fn test_arxiv_section_overrides() {
        let yaml = format!("{MINIMAL}arxiv:\n  page_size: 50\n  request_delay_secs: 0\n");
        let config = SharedConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.arxiv.page_size, 50);
        assert_eq!(config.arxiv.request_delay_secs, 0);
        assert_eq!(config.arxiv.max_results, 500);
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let yaml = format!("{MINIMAL}arxiv:\n  page_size: 0\n");
        assert!(SharedConfig::from_yaml(&yaml).is_err());
    }
}
