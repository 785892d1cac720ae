use crate::{
    report_file_name, ConfigError, DEFAULT_HOST, DEFAULT_HTTP_TIMEOUT, DEFAULT_METHOD, DEFAULT_PATH, DEFAULT_PORT,
    DEFAULT_TEST_DURATION, DEFAULT_VIRTUAL_USERS, MAX_DURATION,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use url::Url;

/// Per-run parameters shared by every test group.
///
/// Durations are expressed in (possibly fractional) seconds when deserialized.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub virtual_users: usize,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub test_duration: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub http_timeout: Duration,
    pub endpoint: Endpoint,
    /// How long requests still pending at the deadline may settle before being canceled.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub cancel_grace: Duration,
    /// Log a countdown line at this interval while a group runs.
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    pub progress_interval: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            virtual_users: DEFAULT_VIRTUAL_USERS,
            test_duration: DEFAULT_TEST_DURATION,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            endpoint: Endpoint::default(),
            cancel_grace: Duration::ZERO,
            progress_interval: None,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn virtual_users(mut self, virtual_users: usize) -> Self {
        self.virtual_users = virtual_users;
        self
    }

    pub fn test_duration(mut self, test_duration: Duration) -> Self {
        self.test_duration = test_duration;
        self
    }

    pub fn http_timeout(mut self, http_timeout: Duration) -> Self {
        self.http_timeout = http_timeout;
        self
    }

    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn cancel_grace(mut self, cancel_grace: Duration) -> Self {
        self.cancel_grace = cancel_grace;
        self
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.virtual_users < 1 {
            return Err(ConfigError::InvalidVirtualUsers(self.virtual_users));
        }

        // Bounded so a group's deadline is always representable as an `Instant`.
        let window = self.test_duration.checked_add(self.cancel_grace);
        if self.test_duration.is_zero() || !matches!(window, Some(w) if w <= MAX_DURATION) {
            return Err(ConfigError::InvalidTestDuration);
        }

        if !in_range(self.http_timeout) {
            return Err(ConfigError::InvalidHttpTimeout);
        }

        if matches!(self.progress_interval, Some(interval) if !in_range(interval)) {
            return Err(ConfigError::InvalidProgressInterval);
        }

        self.endpoint.validate()
    }
}

fn in_range(dur: Duration) -> bool {
    !dur.is_zero() && dur <= MAX_DURATION
}

/// Target of the load: where the request templates are sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    /// Host name or IP. May carry an explicit `http://` or `https://` scheme.
    pub host: String,
    pub port: u16,
    pub path: String,
    pub method: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            method: DEFAULT_METHOD.to_string(),
        }
    }
}

impl Endpoint {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            ..Self::default()
        }
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    /// `scheme://host:port/`, the address used for the reachability probe.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}/", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}/", self.host, self.port)
        };

        Url::parse(&raw).map_err(|err| ConfigError::InvalidEndpoint {
            url: raw,
            reason: err.to_string(),
        })
    }

    /// Full URL the request templates are sent to.
    pub fn url(&self) -> Result<Url, ConfigError> {
        let base = self.base_url()?;
        base.join(&self.path)
            .map_err(|err| ConfigError::InvalidEndpoint {
                url: format!("{base}{}", self.path.trim_start_matches('/')),
                reason: err.to_string(),
            })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.method.is_empty() || !self.method.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ConfigError::InvalidMethod(self.method.clone()));
        }

        self.url().map(|_| ())
    }
}

/// One model under test and the payloads cycled through while loading it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestGroup {
    pub name: String,
    pub templates: Vec<Value>,
}

impl TestGroup {
    pub fn new(name: &str, templates: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            templates,
        }
    }

    /// Template used for the `n`th request of an actor, wrapping around.
    ///
    /// Returns `None` only for a group without templates, which validation rejects.
    pub fn template(&self, n: usize) -> Option<&Value> {
        if self.templates.is_empty() {
            None
        } else {
            self.templates.get(n % self.templates.len())
        }
    }
}

/// Full description of a run: shared parameters plus the ordered groups.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    #[serde(default)]
    pub config: RunConfig,
    pub groups: Vec<TestGroup>,
}

impl TestPlan {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            groups: vec![],
        }
    }

    pub fn group(mut self, group: TestGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Parse and validate a plan from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let plan: TestPlan = serde_json::from_str(json)?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;

        if self.groups.is_empty() {
            return Err(ConfigError::NoGroups);
        }

        let mut seen = HashSet::new();
        let mut files: HashMap<String, &str> = HashMap::new();
        for group in &self.groups {
            if group.name.is_empty() {
                return Err(ConfigError::EmptyGroupName);
            }
            if group.templates.is_empty() {
                return Err(ConfigError::EmptyTemplates(group.name.clone()));
            }
            if !seen.insert(group.name.as_str()) {
                return Err(ConfigError::DuplicateGroup(group.name.clone()));
            }
            if let Some(first) = files.insert(report_file_name(&group.name), &group.name) {
                return Err(ConfigError::ReportNameCollision {
                    first: first.to_string(),
                    second: group.name.clone(),
                });
            }
        }

        Ok(())
    }
}
