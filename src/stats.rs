//! Aggregate statistics over a persisted snapshot, for the `summary` CLI.

use std::collections::HashMap;
use std::fmt;

use crate::model::{Section, Snapshot};

#[derive(Debug, Clone)]
pub struct SummaryStats {
    pub scraped_at: chrono::DateTime<chrono::Utc>,
    pub total: usize,
    pub per_section: Vec<(Section, usize)>,
    pub confirmed: usize,
    pub avg_temperature: f64,
    pub max_temperature: i64,
    pub min_temperature: i64,
    /// Tag -> occurrence count, most common first, capped at five.
    pub top_categories: Vec<(String, usize)>,
    /// Requirement name -> how many listings demand it.
    pub requirement_counts: Vec<(String, usize)>,
    /// Five hottest records per section: (title, temperature, url).
    pub top_per_section: Vec<(Section, Vec<(String, i64, String)>)>,
}

impl SummaryStats {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let all: Vec<_> = snapshot.all_airdrops().collect();
        let total = all.len();

        let confirmed = all.iter().filter(|a| a.is_confirmed).count();
        let temps: Vec<i64> = all.iter().map(|a| a.temperature).collect();
        let avg_temperature = if temps.is_empty() {
            0.0
        } else {
            temps.iter().sum::<i64>() as f64 / temps.len() as f64
        };
        let max_temperature = temps.iter().copied().max().unwrap_or(0);
        let min_temperature = temps.iter().copied().min().unwrap_or(0);

        let mut category_counts: HashMap<&str, usize> = HashMap::new();
        for airdrop in &all {
            for category in &airdrop.categories {
                *category_counts.entry(category.as_str()).or_default() += 1;
            }
        }
        let mut top_categories: Vec<(String, usize)> = category_counts
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        top_categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_categories.truncate(5);

        let mut requirement_totals: HashMap<&str, usize> = HashMap::new();
        for airdrop in &all {
            for (name, required) in &airdrop.requirements {
                if *required {
                    *requirement_totals.entry(name.as_str()).or_default() += 1;
                }
            }
        }
        let mut requirement_counts: Vec<(String, usize)> = requirement_totals
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        requirement_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let top_per_section = Section::ALL
            .iter()
            .map(|&section| {
                let mut records: Vec<_> = snapshot.section(section).airdrops.iter().collect();
                records.sort_by(|a, b| b.temperature.cmp(&a.temperature));
                let top = records
                    .into_iter()
                    .take(5)
                    .map(|a| (a.title.clone(), a.temperature, a.url.clone()))
                    .collect();
                (section, top)
            })
            .collect();

        Self {
            scraped_at: snapshot.scraped_at,
            total,
            per_section: Section::ALL
                .iter()
                .map(|&s| (s, snapshot.section(s).count))
                .collect(),
            confirmed,
            avg_temperature,
            max_temperature,
            min_temperature,
            top_categories,
            requirement_counts,
            top_per_section,
        }
    }
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "Airdrop Scraping Summary")?;
        writeln!(f, "Scraped at: {}", self.scraped_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "Total airdrops: {}", self.total)?;
        writeln!(f, "{}", "=".repeat(50))?;

        writeln!(f, "\nSections:")?;
        for (section, count) in &self.per_section {
            writeln!(f, "   {}: {}", section.label(), count)?;
        }

        writeln!(f, "\nConfirmed: {}", self.confirmed)?;
        writeln!(f, "Unconfirmed: {}", self.total - self.confirmed)?;

        writeln!(f, "\nTemperature:")?;
        writeln!(f, "   Average: {:.1}°", self.avg_temperature)?;
        writeln!(f, "   Highest: {}°", self.max_temperature)?;
        writeln!(f, "   Lowest: {}°", self.min_temperature)?;

        if !self.top_categories.is_empty() {
            writeln!(f, "\nTop Categories:")?;
            for (category, count) in &self.top_categories {
                writeln!(f, "   {}: {}", category, count)?;
            }
        }

        if !self.requirement_counts.is_empty() {
            writeln!(f, "\nCommon Requirements:")?;
            for (name, count) in &self.requirement_counts {
                writeln!(f, "   {}: {}", name, count)?;
            }
        }

        for (section, top) in &self.top_per_section {
            if top.is_empty() {
                continue;
            }
            writeln!(f, "\nTop {} from {} Airdrops:", top.len(), section.label())?;
            for (i, (title, temperature, url)) in top.iter().enumerate() {
                writeln!(f, "{}. {} ({}°)", i + 1, title, temperature)?;
                writeln!(f, "   {}", url)?;
            }
        }

        Ok(())
    }
}
