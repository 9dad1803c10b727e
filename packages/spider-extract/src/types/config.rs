//! Configuration types for crawling and extraction.
//!
//! `CrawlConfig` enumerates every option the external crawler understands.
//! It is built once before a run and handed to the page source through
//! [`PageSource::start`](crate::traits::source::PageSource::start); this crate
//! never reads the environment after construction.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Environment variable holding the default proxy.
pub const PROXY_ENV: &str = "SPIDER_HTTP_PROXY";

/// Environment variable holding the default `User-Agent`.
pub const USER_AGENT_ENV: &str = "SPIDER_HTTP_USER_AGENT";

/// A host, link or extension pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches the exact string
    Exact(String),
    /// Matches anywhere the regex matches
    Regex(Regex),
}

impl Pattern {
    /// Create an exact-match pattern.
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    /// Compile a regex pattern.
    pub fn regex(pattern: &str) -> ConfigResult<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Check a value against the pattern.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == value,
            Self::Regex(re) => re.is_match(value),
        }
    }
}

impl From<&str> for Pattern {
    fn from(value: &str) -> Self {
        Self::exact(value)
    }
}

/// An HTTP proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Proxy {
    /// Default port when the proxy string omits one.
    pub const DEFAULT_PORT: u16 = 8080;
}

impl FromStr for Proxy {
    type Err = ConfigError;

    /// Parse `http://[user:pass@]host[:port]`; a bare `host[:port]` is
    /// accepted as well.
    fn from_str(value: &str) -> ConfigResult<Self> {
        let value = value.trim();
        let with_scheme = if value.contains("://") {
            value.to_string()
        } else {
            format!("http://{}", value)
        };

        let url = Url::parse(&with_scheme).map_err(|_| ConfigError::InvalidProxy(value.to_string()))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConfigError::InvalidProxy(value.to_string()))?;

        Ok(Self {
            host: host.to_string(),
            port: url.port().unwrap_or(Self::DEFAULT_PORT),
            user: Some(url.username())
                .filter(|u| !u.is_empty())
                .map(String::from),
            password: url.password().map(String::from),
        })
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}:{}", self.host, self.port)
    }
}

/// Where a crawl starts and what it is allowed to wander into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlScope {
    /// Start at a URL and follow every accepted link
    StartAt(Url),
    /// Stay on a single host name
    Host(String),
    /// Stay on the host of the given URL, starting at that URL
    Site(Url),
    /// Stay on a domain and its subdomains
    Domain(String),
}

impl CrawlScope {
    /// URL the crawler should fetch first.
    pub fn entry_url(&self) -> ConfigResult<Url> {
        match self {
            Self::StartAt(url) | Self::Site(url) => Ok(url.clone()),
            Self::Host(name) | Self::Domain(name) => Url::parse(&format!("http://{}/", name))
                .map_err(|_| ConfigError::InvalidScope(name.clone())),
        }
    }
}

/// Options consumed by the external crawler.
///
/// Each field documents its effect on the crawl; the pipeline itself only
/// forwards the struct to the page source.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Entry point and boundary of the crawl
    pub scope: Option<CrawlScope>,

    /// Proxy to route requests through
    pub proxy: Option<Proxy>,

    /// `User-Agent` header sent with each request
    pub user_agent: Option<String>,

    /// `Referer` header sent with each request
    pub referer: Option<String>,

    /// Pause between fetching each link
    pub delay: Duration,

    /// URL schemes the crawler may visit
    pub schemes: Vec<String>,

    /// Single host name to visit
    pub host: Option<String>,

    /// Host names to visit
    pub hosts: Vec<Pattern>,

    /// Host names never to visit
    pub ignore_hosts: Vec<Pattern>,

    /// Ports to visit
    pub ports: Vec<u16>,

    /// Ports never to visit
    pub ignore_ports: Vec<u16>,

    /// Links to visit
    pub links: Vec<Pattern>,

    /// Links never to visit
    pub ignore_links: Vec<Pattern>,

    /// URL path extensions to visit
    pub exts: Vec<Pattern>,

    /// URL path extensions never to visit
    pub ignore_exts: Vec<Pattern>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            scope: None,
            proxy: None,
            user_agent: None,
            referer: None,
            delay: Duration::ZERO,
            schemes: vec!["http".to_string(), "https".to_string()],
            host: None,
            hosts: Vec::new(),
            ignore_hosts: Vec::new(),
            ports: Vec::new(),
            ignore_ports: Vec::new(),
            links: Vec::new(),
            ignore_links: Vec::new(),
            exts: Vec::new(),
            ignore_exts: Vec::new(),
        }
    }
}

impl CrawlConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with proxy and `User-Agent` defaults resolved from
    /// `SPIDER_HTTP_PROXY` and `SPIDER_HTTP_USER_AGENT`.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let proxy = lookup(PROXY_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.parse::<Proxy>())
            .transpose()?;

        let user_agent = lookup(USER_AGENT_ENV).filter(|v| !v.trim().is_empty());

        Ok(Self {
            proxy,
            user_agent,
            ..Self::default()
        })
    }

    /// Set the crawl scope.
    pub fn with_scope(mut self, scope: CrawlScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Set the proxy.
    pub fn with_proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set the `User-Agent`.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the `Referer`.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Set the delay between requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the allowed schemes.
    pub fn with_schemes(mut self, schemes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.schemes = schemes.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Restrict the crawl to a single host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Add a host pattern to visit.
    pub fn visit_host(mut self, pattern: impl Into<Pattern>) -> Self {
        self.hosts.push(pattern.into());
        self
    }

    /// Add a host pattern to skip.
    pub fn ignore_host(mut self, pattern: impl Into<Pattern>) -> Self {
        self.ignore_hosts.push(pattern.into());
        self
    }

    /// Add a port to visit.
    pub fn visit_port(mut self, port: u16) -> Self {
        self.ports.push(port);
        self
    }

    /// Add a port to skip.
    pub fn ignore_port(mut self, port: u16) -> Self {
        self.ignore_ports.push(port);
        self
    }

    /// Add a link pattern to visit.
    pub fn visit_link(mut self, pattern: impl Into<Pattern>) -> Self {
        self.links.push(pattern.into());
        self
    }

    /// Add a link pattern to skip.
    pub fn ignore_link(mut self, pattern: impl Into<Pattern>) -> Self {
        self.ignore_links.push(pattern.into());
        self
    }

    /// Add a path extension pattern to visit.
    pub fn visit_ext(mut self, pattern: impl Into<Pattern>) -> Self {
        self.exts.push(pattern.into());
        self
    }

    /// Add a path extension pattern to skip.
    pub fn ignore_ext(mut self, pattern: impl Into<Pattern>) -> Self {
        self.ignore_exts.push(pattern.into());
        self
    }

    /// Check the config for values the crawler cannot honor.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.schemes.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::NoSchemes);
        }

        if let Some(port) = self
            .ports
            .iter()
            .chain(self.ignore_ports.iter())
            .find(|p| **p == 0)
        {
            return Err(ConfigError::InvalidPort(port.to_string()));
        }

        if let Some(scope) = &self.scope {
            scope.entry_url()?;
        }

        Ok(())
    }
}

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// `<script type=...>` values treated as JavaScript.
    ///
    /// Default: `["text/javascript"]`.
    pub script_types: Vec<String>,

    /// Also scan `<script>` elements with no `type` attribute.
    ///
    /// Default: false.
    pub include_untyped_scripts: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            script_types: vec!["text/javascript".to_string()],
            include_untyped_scripts: false,
        }
    }
}

impl ExtractionConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the accepted script types.
    pub fn with_script_types(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.script_types = types.into_iter().map(|t| t.into()).collect();
        self
    }

    /// Scan untyped `<script>` elements too.
    pub fn with_untyped_scripts(mut self, include: bool) -> Self {
        self.include_untyped_scripts = include;
        self
    }

    /// Check whether a `<script>` element's `type` attribute is scanned.
    pub fn accepts_script_type(&self, script_type: Option<&str>) -> bool {
        match script_type {
            None => self.include_untyped_scripts,
            Some(t) => {
                let t = t.trim();
                self.script_types.iter().any(|s| s.eq_ignore_ascii_case(t))
            }
        }
    }
}
