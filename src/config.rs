//! Runtime configuration
//!
//! Settings come from environment variables so the same binary can be tuned
//! per invocation:
//!
//! - `STOW_DEFAULT_BRANCH`: branch HEAD points at after `init` (default `master`)
//! - `STOW_LOCK_TIMEOUT_MS`: how long to wait for the repository lock (default `5000`)
//! - `STOW_COMMIT_DATE`: fixed commit timestamp, either float seconds since the
//!   epoch, RFC 3339, or `%Y-%m-%d %H:%M:%S %z`

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::commit::Timestamp;
use crate::errors::{Error, Result};
use std::time::Duration;

pub const DEFAULT_BRANCH_ENV: &str = "STOW_DEFAULT_BRANCH";
pub const LOCK_TIMEOUT_ENV: &str = "STOW_LOCK_TIMEOUT_MS";
pub const COMMIT_DATE_ENV: &str = "STOW_COMMIT_DATE";

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub default_branch: BranchName,
    pub lock_timeout: Duration,
    pub commit_date: Option<Timestamp>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_branch: BranchName::default_branch(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            commit_date: None,
        }
    }
}

impl Config {
    pub fn load_from_env() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(branch) = lookup(DEFAULT_BRANCH_ENV) {
            config.default_branch = BranchName::try_parse(branch).map_err(|err| {
                Error::InvalidConfig {
                    key: DEFAULT_BRANCH_ENV.to_string(),
                    reason: err.to_string(),
                }
            })?;
        }

        if let Some(timeout) = lookup(LOCK_TIMEOUT_ENV) {
            let millis = timeout
                .trim()
                .parse::<u64>()
                .map_err(|err| Error::InvalidConfig {
                    key: LOCK_TIMEOUT_ENV.to_string(),
                    reason: err.to_string(),
                })?;
            config.lock_timeout = Duration::from_millis(millis);
        }

        if let Some(date) = lookup(COMMIT_DATE_ENV) {
            config.commit_date = Some(Self::parse_commit_date(&date)?);
        }

        Ok(config)
    }

    /// Timestamp for a new commit: the configured date, or the clock
    pub fn timestamp(&self) -> Timestamp {
        self.commit_date.unwrap_or_else(Timestamp::now)
    }

    fn parse_commit_date(date: &str) -> Result<Timestamp> {
        let date = date.trim();

        if let Ok(seconds) = date.parse::<f64>()
            && seconds.is_finite()
        {
            return Ok(Timestamp::new(seconds));
        }

        chrono::DateTime::parse_from_rfc3339(date)
            .or_else(|_| chrono::DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z"))
            .map(|datetime| datetime.to_utc().into())
            .map_err(|err| Error::InvalidConfig {
                key: COMMIT_DATE_ENV.to_string(),
                reason: err.to_string(),
            })
    }
}
