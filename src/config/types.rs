use serde::Deserialize;

/// Default number of simultaneous fetches
pub const DEFAULT_WORKERS: usize = 30;

/// Default user agent, also the robots.txt group the crawler answers to
pub const DEFAULT_USER_AGENT: &str = "*";

/// Main configuration structure for Sumi-Sitemap
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Seed URL the crawl starts from
    #[serde(default)]
    pub seed: Option<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent page fetches
    pub workers: usize,

    /// Maximum number of URLs claimed for crawling
    pub max_urls: u64,

    /// Whether robots.txt rules filter discovered links
    pub parse_robots: bool,

    /// TCP connect timeout (seconds)
    pub connect_timeout: u64,

    /// Whole-request timeout (seconds)
    pub request_timeout: u64,

    /// Substrings that exclude a URL from the crawl
    pub exclude: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_urls: u64::MAX,
            parse_robots: false,
            connect_timeout: 5,
            request_timeout: 10,
            exclude: Vec::new(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserAgentConfig {
    /// Value of the User-Agent header and the robots.txt agent name
    pub name: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory sitemap files are written into
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}
