//! Suite configuration.
//!
//! Resolved once when the harness starts and shared by reference with every
//! page. Sources, lowest precedence first: defaults, a YAML file,
//! environment variables, then command-line flags (applied by the CLI).

use crate::driver::WindowSize;
use crate::result::{SitewalkError, SitewalkResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default domain the products are served under
pub const DEFAULT_DOMAIN: &str = "example.org";

/// Default timeout for a page to become ready after navigation
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 60_000;

/// Deployment the suite runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instance {
    /// Services running on localhost
    Local,
    /// Development deployment
    Dev,
    /// QA deployment
    #[default]
    Qa,
    /// Staging deployment
    Staging,
    /// Production
    Prod,
}

impl Instance {
    /// All instances
    pub const ALL: [Self; 5] = [Self::Local, Self::Dev, Self::Qa, Self::Staging, Self::Prod];

    /// Name used in hostnames and on the command line
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Qa => "qa",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instance {
    type Err = SitewalkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "dev" => Ok(Self::Dev),
            "qa" => Ok(Self::Qa),
            "staging" => Ok(Self::Staging),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(SitewalkError::config(format!("unknown instance '{other}'"))),
        }
    }
}

/// A site product under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    /// Marketing site and book catalog
    Web,
    /// Accounts and login
    Accounts,
    /// Tutor learning application
    Tutor,
    /// Payments admin console
    Payments,
}

impl Product {
    /// All products
    pub const ALL: [Self; 4] = [Self::Web, Self::Accounts, Self::Tutor, Self::Payments];

    /// Name used in markers, hostnames, and on the command line
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Accounts => "accounts",
            Self::Tutor => "tutor",
            Self::Payments => "payments",
        }
    }

    const fn local_port(self) -> u16 {
        match self {
            Self::Web => 3000,
            Self::Accounts => 2999,
            Self::Tutor => 3001,
            Self::Payments => 8001,
        }
    }

    /// Conventional base URL of this product on an instance.
    ///
    /// Production serves the marketing site at the bare domain and the
    /// others at `<product>.<domain>`; other instances prefix the instance
    /// name (`qa.<domain>`, `tutor-qa.<domain>`).
    #[must_use]
    pub fn default_base_url(self, instance: Instance, domain: &str) -> String {
        match (instance, self) {
            (Instance::Local, product) => format!("http://localhost:{}", product.local_port()),
            (Instance::Prod, Self::Web) => format!("https://{domain}"),
            (Instance::Prod, product) => format!("https://{}.{domain}", product.as_str()),
            (instance, Self::Web) => format!("https://{}.{domain}", instance.as_str()),
            (instance, product) => {
                format!("https://{}-{}.{domain}", product.as_str(), instance.as_str())
            }
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Product {
    type Err = SitewalkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "accounts" => Ok(Self::Accounts),
            "tutor" => Ok(Self::Tutor),
            "payments" => Ok(Self::Payments),
            other => Err(SitewalkError::config(format!("unknown system '{other}'"))),
        }
    }
}

/// Account role whose credentials a scenario needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Student account
    Student,
    /// Instructor account
    Teacher,
    /// Administrator account
    Admin,
    /// Account that signs in through Facebook
    Facebook,
    /// Account that signs in through Google
    Google,
}

impl Role {
    /// All roles
    pub const ALL: [Self; 5] = [
        Self::Student,
        Self::Teacher,
        Self::Admin,
        Self::Facebook,
        Self::Google,
    ];

    /// Prefix of the `<ROLE>_USER` / `<ROLE>_PASSWORD` environment variables
    #[must_use]
    pub const fn env_prefix(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Teacher => "TEACHER",
            Self::Admin => "ADMIN",
            Self::Facebook => "FACEBOOK",
            Self::Google => "GOOGLE",
        }
    }
}

/// Username and password for one role
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login name or email
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for a suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Target deployment
    pub instance: Instance,
    /// Domain the products are served under
    pub domain: String,
    /// Explicit base URLs that replace the conventional ones
    pub base_urls: BTreeMap<Product, String>,
    /// Run the browser without a visible window
    pub headless: bool,
    /// Initial window size
    pub window: WindowSize,
    /// Products to test; empty means all
    pub systems: Vec<Product>,
    /// Credentials by role
    pub credentials: BTreeMap<Role, Credentials>,
    /// Polling options for element and condition waits
    pub wait: WaitOptions,
    /// Timeout for a page to become ready after navigation
    pub navigation_timeout_ms: u64,
    /// Where failure screenshots are written
    pub artifacts_dir: Option<PathBuf>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            instance: Instance::default(),
            domain: DEFAULT_DOMAIN.to_string(),
            base_urls: BTreeMap::new(),
            headless: true,
            window: WindowSize::default(),
            systems: Vec::new(),
            credentials: BTreeMap::new(),
            wait: WaitOptions::new().with_timeout(10_000),
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            artifacts_dir: None,
        }
    }
}

impl SuiteConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> SitewalkResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> SitewalkResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded suite configuration");
        Ok(config)
    }

    /// Apply the process environment
    pub fn with_process_env(self) -> SitewalkResult<Self> {
        self.with_env_vars(std::env::vars())
    }

    /// Apply environment variables.
    ///
    /// Recognised: `SITEWALK_INSTANCE`, `SITEWALK_DOMAIN`, `SITEWALK_HEADLESS`,
    /// `SITEWALK_SYSTEMS` (comma separated), `<PRODUCT>_BASE_URL`, and
    /// `<ROLE>_USER` / `<ROLE>_PASSWORD` pairs. Unrelated variables are
    /// ignored.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> SitewalkResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.into()))
            .collect();

        if let Some(instance) = vars.get("SITEWALK_INSTANCE") {
            self.instance = instance.parse()?;
        }
        if let Some(domain) = vars.get("SITEWALK_DOMAIN") {
            self.domain.clone_from(domain);
        }
        if let Some(headless) = vars.get("SITEWALK_HEADLESS") {
            self.headless = parse_bool(headless)?;
        }
        if let Some(systems) = vars.get("SITEWALK_SYSTEMS") {
            self.systems = parse_systems(systems)?;
        }
        for product in Product::ALL {
            let key = format!("{}_BASE_URL", product.as_str().to_ascii_uppercase());
            if let Some(url) = vars.get(&key) {
                self.base_urls.insert(product, url.clone());
            }
        }
        for role in Role::ALL {
            let user = vars.get(&format!("{}_USER", role.env_prefix()));
            let password = vars.get(&format!("{}_PASSWORD", role.env_prefix()));
            match (user, password) {
                (Some(user), Some(password)) => {
                    self.credentials
                        .insert(role, Credentials::new(user.clone(), password.clone()));
                }
                (None, None) => {}
                _ => {
                    return Err(SitewalkError::config(format!(
                        "{0}_USER and {0}_PASSWORD must be set together",
                        role.env_prefix()
                    )))
                }
            }
        }
        Ok(self)
    }

    /// Base URL for a product, validated and without a trailing slash
    pub fn base_url(&self, product: Product) -> SitewalkResult<String> {
        let raw = self
            .base_urls
            .get(&product)
            .cloned()
            .unwrap_or_else(|| product.default_base_url(self.instance, &self.domain));
        let parsed = url::Url::parse(&raw)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SitewalkError::config(format!(
                "base URL for {product} must be http(s): {raw}"
            )));
        }
        Ok(raw.trim_end_matches('/').to_string())
    }

    /// Credentials for a role
    pub fn credentials(&self, role: Role) -> SitewalkResult<&Credentials> {
        self.credentials.get(&role).ok_or_else(|| {
            SitewalkError::config(format!(
                "no credentials for role {role:?}; set {0}_USER and {0}_PASSWORD",
                role.env_prefix()
            ))
        })
    }

    /// Whether scenarios for a product should run
    #[must_use]
    pub fn is_enabled(&self, product: Product) -> bool {
        self.systems.is_empty() || self.systems.contains(&product)
    }

    /// Options for waits that follow a navigation
    #[must_use]
    pub fn navigation_wait(&self) -> WaitOptions {
        self.wait.with_timeout(self.navigation_timeout_ms)
    }
}

/// Parse a comma separated list of products
pub fn parse_systems(list: &str) -> SitewalkResult<Vec<Product>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

fn parse_bool(value: &str) -> SitewalkResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SitewalkError::config(format!("expected a boolean, got '{other}'"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod base_url_tests {
        use super::*;

        #[test]
        fn test_prod_urls() {
            let config = SuiteConfig {
                instance: Instance::Prod,
                ..SuiteConfig::default()
            };
            assert_eq!(config.base_url(Product::Web).unwrap(), "https://example.org");
            assert_eq!(
                config.base_url(Product::Accounts).unwrap(),
                "https://accounts.example.org"
            );
        }

        #[test]
        fn test_qa_urls() {
            let config = SuiteConfig::default();
            assert_eq!(config.base_url(Product::Web).unwrap(), "https://qa.example.org");
            assert_eq!(
                config.base_url(Product::Tutor).unwrap(),
                "https://tutor-qa.example.org"
            );
            assert_eq!(
                config.base_url(Product::Payments).unwrap(),
                "https://payments-qa.example.org"
            );
        }

        #[test]
        fn test_local_urls() {
            let config = SuiteConfig {
                instance: Instance::Local,
                ..SuiteConfig::default()
            };
            assert_eq!(config.base_url(Product::Web).unwrap(), "http://localhost:3000");
        }

        #[test]
        fn test_override_trims_trailing_slash() {
            let mut config = SuiteConfig::default();
            config
                .base_urls
                .insert(Product::Web, "https://web.test/".into());
            assert_eq!(config.base_url(Product::Web).unwrap(), "https://web.test");
        }

        #[test]
        fn test_invalid_override() {
            let mut config = SuiteConfig::default();
            config.base_urls.insert(Product::Web, "not a url".into());
            assert!(matches!(
                config.base_url(Product::Web),
                Err(SitewalkError::Url(_))
            ));

            config.base_urls.insert(Product::Web, "ftp://web.test".into());
            assert!(matches!(
                config.base_url(Product::Web),
                Err(SitewalkError::Config { .. })
            ));
        }
    }

    mod env_tests {
        use super::*;

        #[test]
        fn test_env_overrides() {
            let config = SuiteConfig::default()
                .with_env_vars([
                    ("SITEWALK_INSTANCE", "staging"),
                    ("SITEWALK_HEADLESS", "false"),
                    ("SITEWALK_SYSTEMS", "web, tutor"),
                    ("STUDENT_USER", "student01"),
                    ("STUDENT_PASSWORD", "secret"),
                    ("UNRELATED", "ignored"),
                ])
                .unwrap();
            assert_eq!(config.instance, Instance::Staging);
            assert!(!config.headless);
            assert_eq!(config.systems, vec![Product::Web, Product::Tutor]);
            assert_eq!(
                config.credentials(Role::Student).unwrap(),
                &Credentials::new("student01", "secret")
            );
            assert!(config.is_enabled(Product::Web));
            assert!(!config.is_enabled(Product::Payments));
        }

        #[test]
        fn test_half_credentials_rejected() {
            let result = SuiteConfig::default().with_env_vars([("ADMIN_USER", "admin")]);
            assert!(matches!(result, Err(SitewalkError::Config { .. })));
        }

        #[test]
        fn test_bad_instance_rejected() {
            let result = SuiteConfig::default().with_env_vars([("SITEWALK_INSTANCE", "moon")]);
            assert!(result.is_err());
        }

        #[test]
        fn test_base_url_env() {
            let config = SuiteConfig::default()
                .with_env_vars([("PAYMENTS_BASE_URL", "http://127.0.0.1:9000")])
                .unwrap();
            assert_eq!(
                config.base_url(Product::Payments).unwrap(),
                "http://127.0.0.1:9000"
            );
        }

        #[test]
        fn test_env_replaces_file_values() {
            let mut config = SuiteConfig::default();
            config.base_urls.insert(Product::Web, "https://web.test".into());
            config
                .credentials
                .insert(Role::Admin, Credentials::new("old", "old"));
            let config = config
                .with_env_vars([
                    ("WEB_BASE_URL", "http://localhost:3000"),
                    ("ADMIN_USER", "admin"),
                    ("ADMIN_PASSWORD", "new"),
                ])
                .unwrap();
            assert_eq!(config.base_url(Product::Web).unwrap(), "http://localhost:3000");
            assert_eq!(
                config.credentials(Role::Admin).unwrap(),
                &Credentials::new("admin", "new")
            );
        }
    }

    mod file_tests {
        use super::*;
        use std::io::Write;

        #[test]
        fn test_from_yaml_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(
                file,
                "instance: dev\ndomain: courses.test\nsystems: [accounts]\n\
                 wait:\n  timeout_ms: 2500\n\
                 credentials:\n  teacher:\n    username: prof\n    password: pw"
            )
            .unwrap();

            let config = SuiteConfig::from_file(file.path()).unwrap();
            assert_eq!(config.instance, Instance::Dev);
            assert_eq!(
                config.base_url(Product::Accounts).unwrap(),
                "https://accounts-dev.courses.test"
            );
            assert_eq!(config.wait.timeout_ms, 2500);
            assert_eq!(config.systems, vec![Product::Accounts]);
            assert_eq!(config.credentials(Role::Teacher).unwrap().username, "prof");
            assert!(config.headless);
        }

        #[test]
        fn test_missing_file() {
            assert!(matches!(
                SuiteConfig::from_file("/nonexistent/sitewalk.yaml"),
                Err(SitewalkError::Io(_))
            ));
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_instance_parse() {
            assert_eq!("PROD".parse::<Instance>().unwrap(), Instance::Prod);
            assert_eq!("production".parse::<Instance>().unwrap(), Instance::Prod);
            for instance in Instance::ALL {
                assert_eq!(instance.as_str().parse::<Instance>().unwrap(), instance);
            }
        }

        #[test]
        fn test_parse_systems() {
            assert_eq!(
                parse_systems("payments,,web").unwrap(),
                vec![Product::Payments, Product::Web]
            );
            assert!(parse_systems("web,cms").is_err());
        }

        #[test]
        fn test_credentials_debug_redacts() {
            let creds = Credentials::new("user", "hunter2");
            let debug = format!("{creds:?}");
            assert!(debug.contains("user"));
            assert!(!debug.contains("hunter2"));
        }

        #[test]
        fn test_missing_credentials() {
            let err = SuiteConfig::default().credentials(Role::Admin).unwrap_err();
            assert!(err.to_string().contains("ADMIN_USER"));
        }
    }
}
