//! Maps hostnames to a productivity [Category].

use std::fmt::Display;

use anyhow::{anyhow, Result};
use url::Url;

pub const PRODUCTIVE_SITES: &[&str] = &[
    "github.com",
    "stackoverflow.com",
    "leetcode.com",
    "docs.google.com/document",
    "docs.google.com/spreadsheets",
    "codecademy.com",
    "udemy.com",
    "coursera.org",
    "developer.mozilla.org",
    "w3schools.com",
    "freecodecamp.org",
    "gitlab.com",
    "bitbucket.org",
    "notion.so",
    "trello.com",
    "atlassian.com",
    "medium.com/tech",
];

pub const UNPRODUCTIVE_SITES: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "youtube.com",
    "reddit.com",
    "netflix.com",
    "tiktok.com",
    "pinterest.com",
    "9gag.com",
    "twitch.tv",
    "dailymotion.com",
    "vimeo.com",
    "ebay.com",
    "amazon.com/shopping",
];

/// Stored as the nullable `productive` flag, see [Category::as_flag].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Productive,
    Unproductive,
    Neutral,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Productive,
        Category::Unproductive,
        Category::Neutral,
    ];

    /// The nullable `productive` flag used by the persisted format.
    pub fn as_flag(self) -> Option<bool> {
        match self {
            Category::Productive => Some(true),
            Category::Unproductive => Some(false),
            Category::Neutral => None,
        }
    }

    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Category::Productive,
            Some(false) => Category::Unproductive,
            None => Category::Neutral,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Productive => write!(f, "Productive"),
            Category::Unproductive => write!(f, "Unproductive"),
            Category::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Substring classifier over two site lists. The productive list always wins.
#[derive(Debug, Clone)]
pub struct Classifier {
    productive: Vec<String>,
    unproductive: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(PRODUCTIVE_SITES, UNPRODUCTIVE_SITES)
    }
}

impl Classifier {
    pub fn new(
        productive: impl IntoIterator<Item = impl AsRef<str>>,
        unproductive: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        fn lowered(sites: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
            sites
                .into_iter()
                .map(|site| site.as_ref().to_lowercase())
                .collect()
        }
        Self {
            productive: lowered(productive),
            unproductive: lowered(unproductive),
        }
    }

    pub fn classify(&self, hostname: &str) -> Category {
        let hostname = hostname.to_lowercase();
        let hostname = strip_www(&hostname);

        if self.productive.iter().any(|site| hostname.contains(site.as_str())) {
            Category::Productive
        } else if self
            .unproductive
            .iter()
            .any(|site| hostname.contains(site.as_str()))
        {
            Category::Unproductive
        } else {
            Category::Neutral
        }
    }
}

fn strip_www(hostname: &str) -> &str {
    hostname.strip_prefix("www.").unwrap_or(hostname)
}

/// Extracts the aggregation key out of a tab url: the hostname without a leading `www.`.
pub fn domain_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(strip_www(host).to_string()),
        _ => Err(anyhow!("Url {url} has no hostname")),
    }
}
