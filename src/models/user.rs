//! Per-user subscription record.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::utils::time::parse_last_run;

/// One subscriber, as read from their YAML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Name used in the greeting and in logs
    pub display_name: String,

    /// Notification recipient
    pub email_address: String,

    /// arXiv query syntax, e.g. `au:"Name" OR all:"kw"`
    pub search_query: String,

    /// End of the previous successful cycle, `None` if never run
    pub last_run: Option<DateTime<Utc>>,

    /// File the record was loaded from and is persisted back to
    pub source: PathBuf,
}

/// Raw shape of a user file. Every field is optional here so that missing
/// keys produce a message naming the key.
#[derive(Debug, Deserialize)]
struct UserFile {
    user: Option<String>,
    email_address: Option<String>,
    search_query: Option<String>,
    #[serde(default)]
    last_run: Option<String>,
}

impl UserRecord {
    /// Parse a user record from YAML text.
    pub fn from_yaml(source: &Path, content: &str) -> Result<Self> {
        let raw: UserFile = serde_yaml::from_str(content)
            .map_err(|e| AppError::config(format!("{}: {e}", source.display())))?;

        let field = |value: Option<String>, key: &str| -> Result<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    AppError::config(format!("{}: missing required field `{key}`", source.display()))
                })
        };

        let display_name = field(raw.user, "user")?;
        let email_address = field(raw.email_address, "email_address")?;
        let search_query = field(raw.search_query, "search_query")?;

        email_address.parse::<lettre::Address>().map_err(|e| {
            AppError::config(format!(
                "{}: email_address '{email_address}' is invalid: {e}",
                source.display()
            ))
        })?;

        let last_run = match raw.last_run.as_deref() {
            Some(value) => parse_last_run(value)
                .map_err(|e| AppError::config(format!("{}: {e}", source.display())))?,
            None => None,
        };

        Ok(Self {
            display_name,
            email_address,
            search_query,
            last_run,
            source: source.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(yaml: &str) -> Result<UserRecord> {
        UserRecord::from_yaml(Path::new("users/alice.yaml"), yaml)
    }

    #[test]
    fn test_full_record() {
        let record = parse(
            "user: Alice\n\
             email_address: alice@example.org\n\
             search_query: 'au:\"Turing\" OR (all:\"automata\" ANDNOT all:\"cellular\")'\n\
             last_run: '2025-05-23 14:41:43'\n",
        )
        .unwrap();

        assert_eq!(record.display_name, "Alice");
        assert_eq!(record.email_address, "alice@example.org");
        assert_eq!(
            record.search_query,
            r#"au:"Turing" OR (all:"automata" ANDNOT all:"cellular")"#
        );
        assert_eq!(
            record.last_run,
            Some(Utc.with_ymd_and_hms(2025, 5, 23, 14, 41, 43).unwrap())
        );
        assert_eq!(record.source, PathBuf::from("users/alice.yaml"));
    }

    #[test]
    fn test_unquoted_last_run() {
        let record = parse(
            "user: Alice\nemail_address: alice@example.org\nsearch_query: all:x\nlast_run: 2025-05-23 14:41:43\n",
        )
        .unwrap();
        assert!(record.last_run.is_some());
    }

    #[test]
    fn test_blank_or_null_last_run_means_never() {
        for tail in ["last_run: ''\n", "last_run:\n", ""] {
            let yaml =
                format!("user: Alice\nemail_address: alice@example.org\nsearch_query: all:x\n{tail}");
            assert_eq!(parse(&yaml).unwrap().last_run, None, "tail: {tail:?}");
        }
    }

    #[test]
    fn test_missing_required_field() {
        let err = parse("user: Alice\nsearch_query: all:x\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("email_address"));

        let err = parse("user: Alice\nemail_address: alice@example.org\nsearch_query: '  '\n")
            .unwrap_err();
        assert!(err.to_string().contains("search_query"));
    }

    #[test]
    fn test_malformed_last_run_is_config_error() {
        let err = parse(
            "user: Alice\nemail_address: alice@example.org\nsearch_query: all:x\nlast_run: last week\n",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_invalid_email_is_config_error() {
        let err = parse("user: Alice\nemail_address: alice\nsearch_query: all:x\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_unparsable_yaml() {
        assert!(parse("user: [unclosed\n").is_err());
        assert!(parse("- just\n- a list\n").is_err());
    }
}
