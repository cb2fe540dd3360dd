//! Harvest configuration.
//!
//! All tunables live in [`HarvestConfig`], which can be loaded from a YAML
//! file. Every field has a default, so an empty file (or no file at all)
//! yields the stock configuration.
//!
//! ```yaml
//! sites:
//!   - https://example.com/news
//! max_links_per_site: 15
//! concurrent_articles: 5
//! selectors:
//!   heading: ["h1", ".entry-title"]
//! ```

use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Seed listing pages harvested when no configuration overrides them.
pub const DEFAULT_SITES: &[&str] = &[
    "https://impact.indiaai.gov.in/media-resources?tab=press",
    "https://indiaai.gov.in/articles/all",
    "https://negd.gov.in/press-release/",
    "https://cio.economictimes.indiatimes.com/news/artificial-intelligence?utm_source=main_menu2&utm_medium=homepage",
    "https://www.newsonair.gov.in/category/national/",
    "https://cmogujarat.gov.in/en/news",
    "https://timesofindia.indiatimes.com/technology/artificial-intelligence",
    "https://www.hindustantimes.com/technology",
    "https://ai.economictimes.com/",
    "https://www.rswebsols.com/category/technology/",
    "https://globalvoices.org/-/topics/technology/",
    "http://analyticsindiamag.com/ai-news",
    "https://tele.net.in/category/artificial-intelligence/",
    "https://hubnetwork.in/?s=artificial+intelligence",
    "https://rajbhavan.mizoram.gov.in/?s=artificial+intelligence",
    "https://www.newindianexpress.com/search?q=artificial%20intelligence",
    "https://www.visive.ai/_/search?query=Artificial%20Intelligence",
    "https://nbbgc.org/?s=artificial+intelligence",
    "https://www.thehindu.com/sci-tech/technology/",
    "https://www.communicationstoday.co.in/?s=artificial+intelligence",
    "https://www.eletimes.ai/?s=artificial+intelligence",
    "https://www.databreachtoday.com/latest-news",
    "https://indianexpress.com/section/technology/artificial-intelligence/?ref=technology_pg",
    "https://www.news18.com/tech/",
    "https://theprint.in/?s=artificial+intelligence",
    "https://www.aninews.in/search/?query=artificial+intelligence",
    "https://egov.eletsonline.com/?s=artificial%20intelligence",
];

/// Substrings that disqualify a URL from being an article.
pub const DEFAULT_BLACKLIST: &[&str] = &[
    "login", "signup", "subscribe", "register", "forgot-password",
    "category", "tag", "author", "archive", "page=", "#",
    "javascript:", "mailto:", "contact", "about-us", "privacy",
    "terms-of-use", "terms-and-conditions", "cookie", "sitemap",
    "disclaimer", "help", "faq", "feedback", "advertisement",
    "ads", "sponsored", "careers", "jobs", "partner", "advertise",
    "media-kit", "benefits", "pricing", "plan", "subscription",
    "account", "profile", "settings", "dashboard", "newsletter",
    "download", ".pdf", ".zip", ".doc", ".mp4", ".jpg", ".png",
    "rss", "feed", "xml", "json", ".css", ".js", "api/", "admin",
    "search?", "q=", "s=", "gallery", "video", "image", "photo",
];

/// Substrings of which an article URL must contain at least one.
pub const DEFAULT_WHITELIST: &[&str] = &[
    "article", "news", "press", "release", "post", "blog", "story",
    "breaking", "report", "analysis", "update", "alert", "headline",
    "coverage", "dispatch", "bulletin", "feature", "interview",
];

/// Anchor selectors tried on listing pages, biased toward article containers.
pub const DEFAULT_LISTING_SELECTORS: &[&str] = &[
    "article a",
    "a[href*='article']",
    "a[href*='news']",
    "a[href*='press']",
    "a[href*='post']",
    ".article-link",
    ".news-link",
    ".post-link",
    ".story-link",
    "[class*='article'] a",
    "[class*='news'] a",
    "[class*='post'] a",
];

pub const DEFAULT_HEADING_SELECTORS: &[&str] = &["h1", "[class*='title']", "[class*='headline']"];
pub const DEFAULT_SUBHEADING_SELECTORS: &[&str] =
    &["h2", "[class*='subtitle']", "[class*='excerpt']", "article p"];
pub const DEFAULT_DATE_SELECTORS: &[&str] = &["time", "[class*='date']", "[class*='publish']"];

/// Declared structured-data types accepted as an article.
pub const DEFAULT_ARTICLE_TYPES: &[&str] = &["NewsArticle", "Article", "BlogPosting"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Keyword lists driving the URL classifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub blacklist: Vec<String>,
    pub whitelist: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            blacklist: owned(DEFAULT_BLACKLIST),
            whitelist: owned(DEFAULT_WHITELIST),
        }
    }
}

/// Ordered CSS selector lists for link discovery and DOM fallbacks.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub listing: Vec<String>,
    pub heading: Vec<String>,
    pub subheading: Vec<String>,
    pub date: Vec<String>,
    pub article_types: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing: owned(DEFAULT_LISTING_SELECTORS),
            heading: owned(DEFAULT_HEADING_SELECTORS),
            subheading: owned(DEFAULT_SUBHEADING_SELECTORS),
            date: owned(DEFAULT_DATE_SELECTORS),
            article_types: owned(DEFAULT_ARTICLE_TYPES),
        }
    }
}

/// Top-level harvest configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Seed listing pages, processed in order.
    pub sites: Vec<String>,
    /// Upper bound on candidate links kept per site.
    pub max_links_per_site: usize,
    /// Maximum article extractions in flight for one site.
    pub concurrent_articles: usize,
    /// Hrefs read from each listing selector's matches.
    pub links_per_selector: usize,
    pub navigation_timeout_secs: u64,
    pub listing_idle_timeout_secs: u64,
    pub article_idle_timeout_secs: u64,
    pub classifier: ClassifierConfig,
    pub selectors: SelectorConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            sites: owned(DEFAULT_SITES),
            max_links_per_site: 15,
            concurrent_articles: 5,
            links_per_selector: 50,
            navigation_timeout_secs: 60,
            listing_idle_timeout_secs: 10,
            article_idle_timeout_secs: 8,
            classifier: ClassifierConfig::default(),
            selectors: SelectorConfig::default(),
        }
    }
}

impl HarvestConfig {
    /// Load from a YAML file, or return defaults when `path` is `None`.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let config = match path {
            Some(p) => {
                let raw = tokio::fs::read_to_string(Path::new(p)).await?;
                let config = Self::from_yaml(&raw)?;
                info!(path = %p, sites = config.sites.len(), "Loaded harvest config");
                config
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.sites.is_empty() {
            return Err("config lists no seed sites".into());
        }
        if self.max_links_per_site == 0 {
            return Err("max_links_per_site must be at least 1".into());
        }
        if self.concurrent_articles == 0 {
            return Err("concurrent_articles must be at least 1".into());
        }
        Ok(())
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn listing_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_idle_timeout_secs)
    }

    pub fn article_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.article_idle_timeout_secs)
    }
}
