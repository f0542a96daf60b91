use log::{info, warn};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Collection that holds the registrations.
pub const USERS_PATH: &str = "users";

/// Materialized share of the collection above which live snapshots replace
/// the local list.
pub const LIVE_REPLACE_THRESHOLD: f64 = 0.9;

/// Tuning for [`PaginatedUsers`](crate::loader::PaginatedUsers).
#[derive(Clone, Debug, PartialEq)]
pub struct LoaderOptions {
    /// Records appended by each `load_more`.
    pub page_size: usize,
    /// Records kept after the first read.
    pub initial_load_size: usize,
    /// Subscribe to live changes once the first read has completed.
    pub enable_realtime: bool,
    /// Upper bound on any single database read.
    pub read_timeout: Duration,
    /// Database path of the user collection.
    pub collection_path: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            page_size: 50,
            initial_load_size: 100,
            enable_realtime: true,
            read_timeout: Duration::from_secs(15),
            collection_path: USERS_PATH.to_string(),
        }
    }
}

/// Settings for the admin server and CLI, read from the environment.
#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub port: u16,
    /// JSON (or `.json.gz`) export of the database.
    pub data_file: PathBuf,
    pub loader: LoaderOptions,
}

impl AdminConfig {
    pub fn load() -> Self {
        let defaults = LoaderOptions::default();
        AdminConfig {
            port: try_load("TULONG_PORT", 3000),
            data_file: PathBuf::from(try_load(
                "TULONG_DATA_FILE",
                "database/users.json".to_string(),
            )),
            loader: LoaderOptions {
                page_size: try_load("TULONG_PAGE_SIZE", defaults.page_size).max(1),
                initial_load_size: try_load("TULONG_INITIAL_LOAD", defaults.initial_load_size),
                enable_realtime: try_load("TULONG_REALTIME", defaults.enable_realtime),
                read_timeout: Duration::from_secs(try_load(
                    "TULONG_READ_TIMEOUT_SECS",
                    defaults.read_timeout.as_secs(),
                )),
                collection_path: try_load("TULONG_USERS_PATH", defaults.collection_path),
            },
        }
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}; using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_defaults_match_dashboard() {
        let options = LoaderOptions::default();
        assert_eq!(options.page_size, 50);
        assert_eq!(options.initial_load_size, 100);
        assert!(options.enable_realtime);
        assert_eq!(options.read_timeout, Duration::from_secs(15));
        assert_eq!(options.collection_path, "users");
    }

    #[test]
    fn try_load_falls_back_on_missing_or_invalid() {
        assert_eq!(try_load("TULONG_TEST_SURELY_UNSET_VAR", 7u16), 7);

        // SAFETY: the variable name is private to this test.
        unsafe { env::set_var("TULONG_TEST_INVALID_PORT", "not-a-port") };
        assert_eq!(try_load("TULONG_TEST_INVALID_PORT", 3000u16), 3000);

        unsafe { env::set_var("TULONG_TEST_VALID_FLAG", " false ") };
        assert!(!try_load("TULONG_TEST_VALID_FLAG", true));
    }
}
