//! Configuration file parser for ~/.config/podpull/config.toml.
//!
//! The config file is the whole program input (which feeds to poll, where
//! to put downloads), so unlike most settings files a missing or invalid
//! file is a fatal error. Feed tables are resolved into [`FeedConfig`]
//! values one at a time by the run loop; a single bad feed (unparseable
//! URL, broken whitelist pattern, malformed auth) skips that feed with a
//! warning and leaves the rest of the run intact.
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid feed URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid auth value: expected \"user:pass\" or a table of query parameters")]
    InvalidAuth,

    #[error("Invalid whitelist pattern '{pattern}': {source}")]
    InvalidWhitelist {
        pattern: String,
        source: regex::Error,
    },
}

// ============================================================================
// Raw configuration (as deserialized)
// ============================================================================

/// Top-level application configuration.
///
/// `feeds` is required; everything else has a sensible default. Feed order
/// is deterministic (BTreeMap sorts by name), so runs are reproducible.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// History database path. Defaults to `history.db` next to the config
    /// file; `--history` on the command line wins over both.
    pub history: Option<String>,

    /// HTTP request timeout in seconds, applied to index fetches and
    /// enclosure downloads alike.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Feed name -> feed table. The name is the history key, so renaming a
    /// feed in the config makes its items look never-downloaded.
    pub feeds: BTreeMap<String, RawFeed>,

    #[serde(default)]
    pub notifiers: NotifierSettings,
}

fn default_timeout_seconds() -> u64 {
    30
}

/// One feed table as written in the config file, before resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeed {
    pub url: String,

    /// Output directory for downloaded enclosures. `~/` expands to $HOME.
    pub output: String,

    /// Either a `"user:pass"` string (HTTP basic auth) or a table of
    /// query-string parameters.
    #[serde(default)]
    pub auth: Option<RawAuth>,

    /// Regex patterns; when non-empty an entry title must match at least
    /// one of them (anchored at the start) to be eligible for download.
    #[serde(default)]
    pub whitelist: Vec<String>,
}

/// The two auth spellings the config accepts.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAuth {
    Basic(String),
    Params(BTreeMap<String, String>),
}

#[derive(Debug, Default, Deserialize)]
pub struct NotifierSettings {
    pub pushbullet: Option<PushbulletSettings>,

    /// Unrecognized notifier tables land here so the run can warn about
    /// them instead of silently ignoring a typo.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, toml::Value>,
}

#[derive(Clone, Deserialize)]
pub struct PushbulletSettings {
    pub token: String,
    pub device: Option<String>,
}

/// Mask the token in Debug output to keep it out of logs and error messages.
impl std::fmt::Debug for PushbulletSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushbulletSettings")
            .field("token", &"[REDACTED]")
            .field("device", &self.device)
            .finish()
    }
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// A feed's auth settings, resolved from the raw config value.
///
/// A closed variant rather than runtime type inspection: basic credentials
/// and query parameters are mutually exclusive by construction, and each
/// feed owns its own value.
#[derive(Debug, Clone)]
pub enum FeedAuth {
    None,
    Basic { username: String, password: String },
    QueryParams(BTreeMap<String, String>),
}

/// A fully resolved feed: validated URL, expanded output path, compiled
/// whitelist. Immutable for the run's duration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub name: String,
    pub url: Url,
    pub output_dir: PathBuf,
    pub auth: FeedAuth,
    pub whitelist: Vec<Regex>,
}

impl RawFeed {
    /// Resolve this raw table into a [`FeedConfig`].
    ///
    /// Whitelist patterns are compiled here, once per feed per run, each
    /// wrapped in `\A(?:...)` so matching is anchored at the start of the
    /// title without requiring the pattern to consume the whole string.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from this method is a per-feed condition: the
    /// run loop logs a warning and skips the feed without aborting the run.
    pub fn resolve(&self, name: &str) -> Result<FeedConfig, ConfigError> {
        let url = Url::parse(&self.url).map_err(|e| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ConfigError::InvalidUrl {
                    url: self.url.clone(),
                    reason: format!("unsupported scheme '{}'", scheme),
                });
            }
        }

        let auth = match &self.auth {
            None => FeedAuth::None,
            Some(RawAuth::Basic(value)) => {
                let (username, password) = value.split_once(':').ok_or(ConfigError::InvalidAuth)?;
                tracing::debug!(feed = %name, "Using basic auth");
                FeedAuth::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                }
            }
            Some(RawAuth::Params(params)) => {
                tracing::debug!(feed = %name, params = ?params.keys(), "Using auth params");
                FeedAuth::QueryParams(params.clone())
            }
        };

        let whitelist = self
            .whitelist
            .iter()
            .map(|pattern| {
                Regex::new(&format!(r"\A(?:{})", pattern)).map_err(|source| {
                    ConfigError::InvalidWhitelist {
                        pattern: pattern.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if !whitelist.is_empty() {
            tracing::debug!(feed = %name, patterns = whitelist.len(), "Loaded whitelist patterns");
        }

        Ok(FeedConfig {
            name: name.to_string(),
            url,
            output_dir: expand_home(&self.output),
            auth,
            whitelist,
        })
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Unlike optional settings files, a missing config is an error here:
    /// without a feed list there is nothing to do, and silently doing
    /// nothing would mask a typoed `--config` path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), feeds = config.feeds.len(), "Loaded configuration");
        Ok(config)
    }
}

/// Expand a leading `~/` to the value of $HOME. Paths without the prefix
/// (and environments without $HOME) pass through untouched.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_feed(url: &str) -> RawFeed {
        RawFeed {
            url: url.to_string(),
            output: "/tmp/podpull-test".to_string(),
            auth: None,
            whitelist: Vec::new(),
        }
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
history = "~/.podpull/history.db"
timeout_seconds = 10

[feeds.my-podcast]
url = "https://example.com/feed.xml"
output = "~/Podcasts/my-podcast"
auth = "listener:hunter2"
whitelist = ["^Episode"]

[feeds.other]
url = "https://example.org/rss"
output = "/srv/podcasts/other"

[feeds.other.auth]
key = "abc123"

[notifiers.pushbullet]
token = "tok"
device = "dev"
"#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(config.history.as_deref(), Some("~/.podpull/history.db"));
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.feeds.len(), 2);
        assert!(matches!(
            config.feeds["my-podcast"].auth,
            Some(RawAuth::Basic(_))
        ));
        assert!(matches!(config.feeds["other"].auth, Some(RawAuth::Params(_))));

        let pb = config.notifiers.pushbullet.as_ref().unwrap();
        assert_eq!(pb.token, "tok");
        assert_eq!(pb.device.as_deref(), Some("dev"));
    }

    #[test]
    fn test_timeout_defaults_to_30() {
        let content = r#"
[feeds.a]
url = "https://example.com/feed.xml"
output = "/tmp/a"
"#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.notifiers.pushbullet.is_none());
    }

    #[test]
    fn test_missing_feeds_table_is_an_error() {
        let result: Result<Config, _> = toml::from_str("history = \"/tmp/h.db\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_notifier_captured() {
        let content = r#"
[feeds.a]
url = "https://example.com/feed.xml"
output = "/tmp/a"

[notifiers.pigeon]
coop = "roof"
"#;
        let config: Config = toml::from_str(content).unwrap();
        assert!(config.notifiers.unknown.contains_key("pigeon"));
    }

    #[test]
    fn test_resolve_basic_auth() {
        let mut feed = raw_feed("https://example.com/feed.xml");
        feed.auth = Some(RawAuth::Basic("user:pa:ss".to_string()));
        let resolved = feed.resolve("a").unwrap();

        // Only the first colon splits, passwords may contain more
        match resolved.auth {
            FeedAuth::Basic { username, password } => {
                assert_eq!(username, "user");
                assert_eq!(password, "pa:ss");
            }
            other => panic!("expected basic auth, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_auth_without_colon_fails() {
        let mut feed = raw_feed("https://example.com/feed.xml");
        feed.auth = Some(RawAuth::Basic("no-colon-here".to_string()));
        assert!(matches!(feed.resolve("a"), Err(ConfigError::InvalidAuth)));
    }

    #[test]
    fn test_resolve_query_param_auth() {
        let mut feed = raw_feed("https://example.com/feed.xml");
        let mut params = BTreeMap::new();
        params.insert("key".to_string(), "abc".to_string());
        feed.auth = Some(RawAuth::Params(params));

        match feed.resolve("a").unwrap().auth {
            FeedAuth::QueryParams(p) => assert_eq!(p["key"], "abc"),
            other => panic!("expected query params, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_rejects_bad_url() {
        assert!(matches!(
            raw_feed("not a url").resolve("a"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            raw_feed("ftp://example.com/feed").resolve("a"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_bad_whitelist_pattern() {
        let mut feed = raw_feed("https://example.com/feed.xml");
        feed.whitelist = vec!["[unclosed".to_string()];
        assert!(matches!(
            feed.resolve("a"),
            Err(ConfigError::InvalidWhitelist { .. })
        ));
    }

    #[test]
    fn test_whitelist_is_prefix_anchored() {
        let mut feed = raw_feed("https://example.com/feed.xml");
        feed.whitelist = vec!["Episode".to_string()];
        let resolved = feed.resolve("a").unwrap();
        let pattern = &resolved.whitelist[0];

        // Matches at the start without consuming the whole title,
        // but never mid-string
        assert!(pattern.is_match("Episode 1"));
        assert!(!pattern.is_match("The Episode"));
    }

    #[test]
    fn test_explicit_caret_still_works() {
        let mut feed = raw_feed("https://example.com/feed.xml");
        feed.whitelist = vec!["^Episode".to_string()];
        let resolved = feed.resolve("a").unwrap();
        assert!(resolved.whitelist[0].is_match("Episode 1"));
        assert!(!resolved.whitelist[0].is_match("Trailer"));
    }

    #[test]
    fn test_expand_home() {
        std::env::set_var("HOME", "/home/tester");
        assert_eq!(
            expand_home("~/Podcasts"),
            PathBuf::from("/home/tester/Podcasts")
        );
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("relative"), PathBuf::from("relative"));
    }

    #[test]
    fn test_debug_masks_pushbullet_token() {
        let settings = PushbulletSettings {
            token: "super-secret".to_string(),
            device: None,
        };
        let debug_output = format!("{:?}", settings);
        assert!(!debug_output.contains("super-secret"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let result = Config::load(Path::new("/tmp/podpull-test-nonexistent.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
