use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One airdrop listing as extracted from the site.
///
/// Field names serialize in camelCase to stay compatible with the
/// `airdrops.json` snapshot layout already on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airdrop {
    /// Stable element id from the listing page, unique within a section.
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail: String,
    /// Popularity score from the `data-temperature` attribute.
    pub temperature: i64,
    #[serde(default)]
    pub published: String,
    /// Estimated value / effort text (e.g. "$50 + referral").
    #[serde(default)]
    pub actions: String,
    /// Tag slugs from the `categories-*` article classes. Absent means empty.
    #[serde(default)]
    pub categories: Vec<String>,
    pub is_confirmed: bool,
    #[serde(default)]
    pub claim_url: String,
    /// Requirement name -> required flag (twitter, telegram, kyc, ...).
    /// Absent means empty.
    #[serde(default)]
    pub requirements: BTreeMap<String, bool>,
}

/// How a section's re-observed records are treated by change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPolicy {
    /// Forward only records whose tracked fields actually changed.
    Standard,
    /// Forward every previously seen record again on each run. The
    /// "updated" widget is curated by the site to hold recent changes, so
    /// re-observation there is itself the signal.
    AlwaysForward,
}

/// The three listing sections scraped per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Hottest,
    Latest,
    Updated,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Hottest, Section::Latest, Section::Updated];

    /// Key used for this section in the persisted snapshot.
    pub fn key(self) -> &'static str {
        match self {
            Section::Hottest => "hottest",
            Section::Latest => "latest",
            Section::Updated => "updated",
        }
    }

    /// Human label used in reports and Telegram summaries.
    pub fn label(self) -> &'static str {
        match self {
            Section::Hottest => "Hot",
            Section::Latest => "Latest",
            Section::Updated => "Updated",
        }
    }

    pub fn policy(self) -> SectionPolicy {
        match self {
            Section::Hottest | Section::Latest => SectionPolicy::Standard,
            Section::Updated => SectionPolicy::AlwaysForward,
        }
    }
}

/// One section's records within a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionBlock {
    pub count: usize,
    pub airdrops: Vec<Airdrop>,
}

impl SectionBlock {
    pub fn new(airdrops: Vec<Airdrop>) -> Self {
        Self {
            count: airdrops.len(),
            airdrops,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sections {
    pub latest: SectionBlock,
    pub hottest: SectionBlock,
    pub updated: SectionBlock,
}

/// Full capture of all three sections at one point in time. The scrape
/// timestamp is carried for persistence only; change detection ignores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub scraped_at: DateTime<Utc>,
    pub total_count: usize,
    pub sections: Sections,
}

impl Snapshot {
    pub fn new(hottest: Vec<Airdrop>, latest: Vec<Airdrop>, updated: Vec<Airdrop>) -> Self {
        let total_count = hottest.len() + latest.len() + updated.len();
        Self {
            scraped_at: Utc::now(),
            total_count,
            sections: Sections {
                latest: SectionBlock::new(latest),
                hottest: SectionBlock::new(hottest),
                updated: SectionBlock::new(updated),
            },
        }
    }

    pub fn section(&self, section: Section) -> &SectionBlock {
        match section {
            Section::Hottest => &self.sections.hottest,
            Section::Latest => &self.sections.latest,
            Section::Updated => &self.sections.updated,
        }
    }

    /// All records across sections, in section order.
    pub fn all_airdrops(&self) -> impl Iterator<Item = &Airdrop> {
        Section::ALL
            .iter()
            .flat_map(|s| self.section(*s).airdrops.iter())
    }
}
