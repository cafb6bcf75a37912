//! Listing collection from airdrops.io.
//!
//! Hot and latest come from the admin-ajax endpoint as pages of HTML
//! fragments; the "updated" section comes from a widget on the homepage.
//! Parsing is synchronous per fragment so no DOM value lives across an
//! await point.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::model::{Airdrop, Snapshot};

const BASE_URL: &str = "https://airdrops.io";
const API_URL: &str = "https://airdrops.io/wp-admin/admin-ajax.php";
const HOT_PID: &str = "329";
const LATEST_PID: &str = "529";
const PAGES_TO_FETCH: u32 = 16;
const PAGE_DELAY: Duration = Duration::from_millis(500);

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Requirement flags exposed as data attributes on each article.
const REQUIREMENT_ATTRS: [(&str, &str); 12] = [
    ("telegram", "data-telegram-required"),
    ("twitter", "data-twitter-required"),
    ("bitcointalk", "data-bitcointalk-required"),
    ("facebook", "data-facebook-required"),
    ("email", "data-email-address-required"),
    ("linkedin", "data-linkedin-required"),
    ("medium", "data-medium-required"),
    ("reddit", "data-reddit-required"),
    ("kyc", "data-kyc-required"),
    ("phone", "data-phone-required"),
    ("instagram", "data-instagram-required"),
    ("youtube", "data-youtube-required"),
];

/// admin-ajax envelope: an array of article HTML fragments per page.
#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    airdrops: Vec<String>,
}

struct Selectors {
    article: Selector,
    updated_widget: Selector,
    title: Selector,
    title_link: Selector,
    thumbnail: Selector,
    actions: Selector,
    claim: Selector,
}

fn sel(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector `{}`: {}", css, e))
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            article: sel("article")?,
            updated_widget: sel(r#"[class*="homepage-widget"][class*="updated"] article.project"#)?,
            title: sel(".air-content-front a h3")?,
            title_link: sel(".air-content-front a")?,
            thumbnail: sel(".air-thumbnail img")?,
            actions: sel(".est-value span")?,
            claim: sel(".air-buttons a")?,
        })
    }
}

pub struct Collector {
    client: reqwest::Client,
    selectors: Selectors,
}

impl Collector {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            selectors: Selectors::new()?,
        })
    }

    /// Scrape all three sections into a fresh snapshot. Hot and latest
    /// are fetched concurrently; pages within a section stay sequential
    /// to keep the fixed inter-page delay.
    pub async fn collect(&self) -> Result<Snapshot> {
        let (hottest, latest) = futures::future::try_join(
            self.fetch_listing(HOT_PID, "hot"),
            self.fetch_listing(LATEST_PID, "latest"),
        )
        .await?;

        let homepage = self.fetch_homepage().await?;
        let updated = self.parse_updated(&homepage);
        info!(count = updated.len(), "updated airdrops parsed from homepage");

        Ok(Snapshot::new(hottest, latest, updated))
    }

    /// Page through one admin-ajax listing. A failed or empty page is
    /// logged and skipped rather than aborting the whole section.
    async fn fetch_listing(&self, pid: &str, referer_slug: &str) -> Result<Vec<Airdrop>> {
        let mut airdrops = Vec::new();

        for page in 1..=PAGES_TO_FETCH {
            match self.fetch_api_page(pid, referer_slug, page).await {
                Ok(fragments) => {
                    let before = airdrops.len();
                    for fragment in &fragments {
                        if let Some(airdrop) = parse_fragment(&self.selectors, fragment, airdrops.len()) {
                            airdrops.push(airdrop);
                        }
                    }
                    debug!(pid, page, count = airdrops.len() - before, "listing page parsed");
                }
                Err(e) => {
                    warn!(pid, page, error = %e, "listing page fetch failed, skipping");
                }
            }

            if page < PAGES_TO_FETCH {
                tokio::time::sleep(PAGE_DELAY).await;
            }
        }

        info!(pid, total = airdrops.len(), "listing section fetched");
        Ok(airdrops)
    }

    async fn fetch_api_page(&self, pid: &str, referer_slug: &str, page: u32) -> Result<Vec<String>> {
        let url = format!(
            "{}?loadairdrops&action=loaddrops&pid={}&filter_type=platforms&paged={}",
            API_URL, pid, page
        );

        let resp = self
            .client
            .get(&url)
            .header("accept", "application/json, text/javascript, */*; q=0.01")
            .header("referer", format!("{}/{}/", BASE_URL, referer_slug))
            .header("x-requested-with", "XMLHttpRequest")
            .send()
            .await
            .context("API request failed")?
            .error_for_status()
            .context("API returned error status")?;

        let body: ApiPage = resp.json().await.context("Failed to parse API JSON")?;
        Ok(body.airdrops)
    }

    async fn fetch_homepage(&self) -> Result<String> {
        info!("fetching homepage for updated airdrops");
        let resp = self
            .client
            .get(BASE_URL)
            .header(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .context("Failed to fetch homepage")?
            .error_for_status()
            .context("Homepage returned error status")?;
        resp.text().await.context("Failed to read homepage body")
    }

    /// Extract the "updated" widget's articles from the homepage HTML.
    fn parse_updated(&self, html: &str) -> Vec<Airdrop> {
        let document = Html::parse_document(html);
        document
            .select(&self.selectors.updated_widget)
            .enumerate()
            .filter_map(|(index, element)| parse_article(&self.selectors, element, index))
            .collect()
    }
}

/// Parse one API fragment, which wraps a single `<article>` element.
fn parse_fragment(selectors: &Selectors, fragment: &str, index: usize) -> Option<Airdrop> {
    let html = Html::parse_fragment(fragment);
    let article = html.select(&selectors.article).next()?;
    parse_article(selectors, article, index)
}

/// Extract one airdrop from its `<article>` element. Articles without a
/// title are placeholders and yield `None`.
fn parse_article(selectors: &Selectors, article: ElementRef<'_>, index: usize) -> Option<Airdrop> {
    let title = article
        .select(&selectors.title)
        .next()
        .map(|h| h.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    if title.is_empty() {
        return None;
    }

    let el = article.value();

    let id = el
        .attr("id")
        .map(str::to_string)
        .unwrap_or_else(|| format!("airdrop-{}", index));
    let temperature = el
        .attr("data-temperature")
        .and_then(|t| t.parse::<i64>().ok())
        .unwrap_or(0);
    let published = el.attr("data-published").unwrap_or_default().to_string();

    let requirements: BTreeMap<String, bool> = REQUIREMENT_ATTRS
        .iter()
        .map(|(name, attr)| (name.to_string(), el.attr(attr) == Some("1")))
        .collect();

    let url = article
        .select(&selectors.title_link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .unwrap_or_default();

    let thumbnail = article
        .select(&selectors.thumbnail)
        .next()
        .and_then(|img| img.value().attr("data-src").or_else(|| img.value().attr("src")))
        .unwrap_or_default()
        .to_string();

    let actions = article
        .select(&selectors.actions)
        .next()
        .map(|s| s.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let categories: Vec<String> = el
        .classes()
        .filter_map(|class| class.strip_prefix("categories-"))
        .map(str::to_string)
        .collect();

    let is_confirmed = el.classes().any(|class| class == "confirmed");

    let claim_url = article
        .select(&selectors.claim)
        .next()
        .and_then(|a| a.value().attr("href"))
        .unwrap_or_default();

    Some(Airdrop {
        id,
        title,
        url: absolutize(url),
        thumbnail,
        temperature,
        published,
        actions,
        categories,
        is_confirmed,
        claim_url: absolutize(claim_url),
        requirements,
    })
}

/// Resolve site-relative hrefs against the base URL.
fn absolutize(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", BASE_URL, href)
    }
}
