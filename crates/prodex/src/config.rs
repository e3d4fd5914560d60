//! Process-wide settings resolved once at startup.
//!
//! Every value is optional in the environment. Absent proxy credentials make
//! the residential IP strategy degrade to a direct connection; an absent
//! browser path falls back to discovery on `PATH`.

use std::path::PathBuf;
use std::time::Duration;

/// Default residential proxy gateway.
pub const DEFAULT_PROXY_HOST: &str = "proxy.oculus-proxy.com:31114";

/// Default proxy exit country.
pub const DEFAULT_PROXY_COUNTRY: &str = "US";

/// All settings consumed by the strategies.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub proxy: ProxyConfig,
    pub browser: BrowserConfig,
    pub http: HttpConfig,
    pub pacing: PacingConfig,
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(*k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        let proxy = ProxyConfig {
            username: get(&["PRODEX_PROXY_USERNAME", "OCULUS_USERNAME"]),
            password: get(&["PRODEX_PROXY_PASSWORD", "OCULUS_PASSWORD"]),
            country: get(&["PRODEX_PROXY_COUNTRY", "OCULUS_COUNTRY"]),
            session: get(&["PRODEX_PROXY_SESSION", "OCULUS_SESSION"]),
            host: get(&["PRODEX_PROXY_HOST"]),
        };

        let browser = BrowserConfig {
            executable: get(&["PRODEX_CHROMIUM_PATH", "CHROME_BIN"]).map(PathBuf::from),
            ..BrowserConfig::default()
        };

        Self {
            proxy,
            browser,
            ..Self::default()
        }
    }
}

/// Residential proxy credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub country: Option<String>,
    pub session: Option<String>,
    pub host: Option<String>,
}

/// The subset of [`ProxyConfig`] required to actually build a proxy.
#[derive(Debug, Clone, Copy)]
pub struct ProxyCredentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub country: &'a str,
    pub session: Option<&'a str>,
    pub host: &'a str,
}

impl ProxyConfig {
    /// Credentials, or `None` when username or password is missing.
    pub fn credentials(&self) -> Option<ProxyCredentials<'_>> {
        Some(ProxyCredentials {
            username: self.username.as_deref()?,
            password: self.password.as_deref()?,
            country: self.country.as_deref().unwrap_or(DEFAULT_PROXY_COUNTRY),
            session: self.session.as_deref(),
            host: self.host.as_deref().unwrap_or(DEFAULT_PROXY_HOST),
        })
    }
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("country", &self.country)
            .field("session", &self.session)
            .field("host", &self.host)
            .finish()
    }
}

/// Full-browser strategy settings.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Explicit Chromium binary; discovered on `PATH` when unset.
    pub executable: Option<PathBuf>,
    /// Fatal: exceeding it fails the strategy attempt.
    pub navigation_timeout: Duration,
    /// Soft: on expiry extraction proceeds with whatever has loaded.
    pub quiescence_timeout: Duration,
    /// Pause after scrolling so lazy content can arrive.
    pub settle_delay: Duration,
    /// Interval between readiness polls.
    pub poll_interval: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            navigation_timeout: Duration::from_secs(30),
            quiescence_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(2),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Plain HTTP settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// A jittered delay range, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPacing {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl RequestPacing {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// No delay at all.
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// Pick a delay uniformly from the range.
    pub fn sample(&self) -> Duration {
        use rand::Rng;
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }

    /// Sleep for a sampled delay.
    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Pre-request delays per HTTP strategy.
#[derive(Debug, Clone, Copy)]
pub struct PacingConfig {
    pub plain: RequestPacing,
    pub spoofed: RequestPacing,
}

impl PacingConfig {
    /// Disable every delay.
    pub const fn none() -> Self {
        Self {
            plain: RequestPacing::none(),
            spoofed: RequestPacing::none(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            plain: RequestPacing::new(200, 700),
            spoofed: RequestPacing::new(500, 1500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_has_no_credentials() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert!(settings.proxy.credentials().is_none());
        assert!(settings.browser.executable.is_none());
    }

    #[test]
    fn test_username_without_password_is_not_enough() {
        let settings = Settings::from_lookup(lookup(&[("PRODEX_PROXY_USERNAME", "alice")]));
        assert!(settings.proxy.credentials().is_none());
    }

    #[test]
    fn test_legacy_names_and_defaults() {
        let settings = Settings::from_lookup(lookup(&[
            ("OCULUS_USERNAME", "alice"),
            ("OCULUS_PASSWORD", "s3cret"),
        ]));
        let creds = settings.proxy.credentials().expect("credentials");
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.country, DEFAULT_PROXY_COUNTRY);
        assert_eq!(creds.host, DEFAULT_PROXY_HOST);
        assert!(creds.session.is_none());
    }

    #[test]
    fn test_primary_names_win_and_blank_values_are_ignored() {
        let settings = Settings::from_lookup(lookup(&[
            ("PRODEX_PROXY_USERNAME", "  "),
            ("OCULUS_USERNAME", "legacy"),
            ("PRODEX_PROXY_PASSWORD", "pw"),
            ("PRODEX_PROXY_COUNTRY", "DE"),
            ("CHROME_BIN", "/opt/chrome"),
        ]));
        let creds = settings.proxy.credentials().expect("credentials");
        assert_eq!(creds.username, "legacy");
        assert_eq!(creds.country, "DE");
        assert_eq!(
            settings.browser.executable,
            Some(PathBuf::from("/opt/chrome"))
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let cfg = ProxyConfig {
            username: Some("alice".into()),
            password: Some("hunter2".into()),
            ..ProxyConfig::default()
        };
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn test_pacing_sample_stays_in_range() {
        let pacing = RequestPacing::new(10, 20);
        for _ in 0..50 {
            let d = pacing.sample().as_millis() as u64;
            assert!((10..=20).contains(&d));
        }
        assert!(RequestPacing::none().sample().is_zero());
    }
}
