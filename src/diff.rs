//! Change detection between the previous and current snapshot.
//!
//! Pure functions over borrowed snapshots: no I/O, no state across runs.
//! Hottest and Latest follow the standard new/changed policy; the Updated
//! section re-forwards every previously seen record (see
//! [`SectionPolicy`](crate::model::SectionPolicy)).

use std::collections::HashMap;

use crate::model::{Airdrop, Section, SectionPolicy, Snapshot};

/// New and updated records for one section, in the current snapshot's order.
#[derive(Debug, Clone, Default)]
pub struct SectionChanges {
    pub new: Vec<Airdrop>,
    pub updated: Vec<Airdrop>,
}

impl SectionChanges {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.updated.is_empty()
    }
}

/// Output of a detection run: per-section deltas plus the first-run flag.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub hottest: SectionChanges,
    pub latest: SectionChanges,
    pub updated: SectionChanges,
    pub is_first_run: bool,
}

impl ChangeSet {
    pub fn section(&self, section: Section) -> &SectionChanges {
        match section {
            Section::Hottest => &self.hottest,
            Section::Latest => &self.latest,
            Section::Updated => &self.updated,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut SectionChanges {
        match section {
            Section::Hottest => &mut self.hottest,
            Section::Latest => &mut self.latest,
            Section::Updated => &mut self.updated,
        }
    }
}

/// Whether two records with the same id differ in a way worth announcing.
///
/// Only fields that carry listing state are compared; cosmetic fields
/// (title, url, thumbnail, published) never trigger an update.
pub fn record_changed(old: &Airdrop, new: &Airdrop) -> bool {
    if old.temperature != new.temperature
        || old.actions != new.actions
        || old.is_confirmed != new.is_confirmed
        || old.claim_url != new.claim_url
    {
        return true;
    }

    if old.requirements != new.requirements {
        return true;
    }

    // Categories compare as an unordered multiset: the site reorders tag
    // classes between renders without the listing actually changing.
    let mut old_cats = old.categories.clone();
    let mut new_cats = new.categories.clone();
    old_cats.sort_unstable();
    new_cats.sort_unstable();
    old_cats != new_cats
}

/// Diff `current` against `previous`.
///
/// With no previous snapshot every current record is new and
/// `is_first_run` is set. Otherwise each section is matched by record id
/// against the same section of the previous snapshot; ids are scoped per
/// section, so the same id in two sections is never cross-matched.
/// Records that disappeared since the previous run are not reported.
pub fn detect_changes(previous: Option<&Snapshot>, current: &Snapshot) -> ChangeSet {
    let mut changes = ChangeSet::default();

    let Some(previous) = previous else {
        changes.is_first_run = true;
        for section in Section::ALL {
            changes.section_mut(section).new = current.section(section).airdrops.clone();
        }
        return changes;
    };

    for section in Section::ALL {
        let old_by_id: HashMap<&str, &Airdrop> = previous
            .section(section)
            .airdrops
            .iter()
            .map(|a| (a.id.as_str(), a))
            .collect();

        let out = changes.section_mut(section);
        for airdrop in &current.section(section).airdrops {
            match (old_by_id.get(airdrop.id.as_str()), section.policy()) {
                (None, _) => out.new.push(airdrop.clone()),
                (Some(old), SectionPolicy::Standard) => {
                    if record_changed(old, airdrop) {
                        out.updated.push(airdrop.clone());
                    }
                }
                (Some(_), SectionPolicy::AlwaysForward) => out.updated.push(airdrop.clone()),
            }
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn airdrop(id: &str) -> Airdrop {
        Airdrop {
            id: id.to_string(),
            title: format!("Drop {}", id),
            url: format!("https://example.com/{}", id),
            thumbnail: String::new(),
            temperature: 50,
            published: "2026-01-01".to_string(),
            actions: "$50".to_string(),
            categories: vec!["DeFi".to_string()],
            is_confirmed: false,
            claim_url: format!("https://example.com/{}/claim", id),
            requirements: BTreeMap::from([("kyc".to_string(), false)]),
        }
    }

    fn snapshot(hottest: Vec<Airdrop>, latest: Vec<Airdrop>, updated: Vec<Airdrop>) -> Snapshot {
        Snapshot::new(hottest, latest, updated)
    }

    #[test]
    fn test_first_run_marks_everything_new() {
        let current = snapshot(
            vec![airdrop("h1"), airdrop("h2")],
            vec![airdrop("l1")],
            vec![airdrop("u1"), airdrop("u2"), airdrop("u3")],
        );
        let changes = detect_changes(None, &current);

        assert!(changes.is_first_run);
        for section in Section::ALL {
            let got = changes.section(section);
            assert!(got.updated.is_empty());
            let want: Vec<&str> = current
                .section(section)
                .airdrops
                .iter()
                .map(|a| a.id.as_str())
                .collect();
            let ids: Vec<&str> = got.new.iter().map(|a| a.id.as_str()).collect();
            assert_eq!(ids, want);
        }
    }

    #[test]
    fn test_identical_snapshots_standard_sections_quiet() {
        let snap = snapshot(
            vec![airdrop("h1"), airdrop("h2")],
            vec![airdrop("l1")],
            vec![airdrop("u1"), airdrop("u2")],
        );
        let changes = detect_changes(Some(&snap), &snap);

        assert!(!changes.is_first_run);
        assert!(changes.hottest.is_empty());
        assert!(changes.latest.is_empty());
        // Updated re-forwards every previously seen record.
        assert!(changes.updated.new.is_empty());
        assert_eq!(changes.updated.updated.len(), 2);
        let ids: Vec<&str> = changes.updated.updated.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
    }

    #[test]
    fn test_new_record_detected() {
        let prev = snapshot(vec![airdrop("x1")], vec![], vec![]);
        let curr = snapshot(vec![airdrop("x1"), airdrop("x2")], vec![], vec![]);
        let changes = detect_changes(Some(&prev), &curr);

        assert_eq!(changes.hottest.new.len(), 1);
        assert_eq!(changes.hottest.new[0].id, "x2");
        assert!(changes.hottest.updated.is_empty());
    }

    #[test]
    fn test_temperature_change_detected() {
        let old = airdrop("a");
        let mut new = airdrop("a");
        new.temperature = 95;
        assert!(record_changed(&old, &new));

        let prev = snapshot(vec![old], vec![], vec![]);
        let curr = snapshot(vec![new], vec![], vec![]);
        let changes = detect_changes(Some(&prev), &curr);
        assert!(changes.hottest.new.is_empty());
        assert_eq!(changes.hottest.updated.len(), 1);
        assert_eq!(changes.hottest.updated[0].id, "a");
    }

    #[test]
    fn test_each_tracked_field_triggers_change() {
        let old = airdrop("a");

        let mut by_actions = airdrop("a");
        by_actions.actions = "$100".to_string();
        assert!(record_changed(&old, &by_actions));

        let mut by_confirmed = airdrop("a");
        by_confirmed.is_confirmed = true;
        assert!(record_changed(&old, &by_confirmed));

        let mut by_claim = airdrop("a");
        by_claim.claim_url = "https://example.com/other".to_string();
        assert!(record_changed(&old, &by_claim));

        let mut by_reqs = airdrop("a");
        by_reqs.requirements.insert("kyc".to_string(), true);
        assert!(record_changed(&old, &by_reqs));

        let mut by_req_key = airdrop("a");
        by_req_key.requirements.insert("twitter".to_string(), false);
        assert!(record_changed(&old, &by_req_key));

        let mut by_cats = airdrop("a");
        by_cats.categories.push("NFT".to_string());
        assert!(record_changed(&old, &by_cats));
    }

    #[test]
    fn test_cosmetic_fields_ignored() {
        let old = airdrop("a");
        let mut new = airdrop("a");
        new.title = "Renamed".to_string();
        new.url = "https://example.com/moved".to_string();
        new.thumbnail = "https://cdn.example.com/a.png".to_string();
        new.published = "2026-02-02".to_string();
        assert!(!record_changed(&old, &new));
    }

    #[test]
    fn test_category_order_ignored() {
        let mut old = airdrop("a");
        old.categories = vec!["NFT".to_string(), "DeFi".to_string()];
        let mut new = airdrop("a");
        new.categories = vec!["DeFi".to_string(), "NFT".to_string()];
        assert!(!record_changed(&old, &new));

        // Duplicate tags are significant: {DeFi, DeFi} != {DeFi}.
        let mut dup = airdrop("a");
        dup.categories = vec!["DeFi".to_string(), "DeFi".to_string()];
        let mut single = airdrop("a");
        single.categories = vec!["DeFi".to_string()];
        assert!(record_changed(&dup, &single));
    }

    #[test]
    fn test_always_forward_asymmetry() {
        let snap = snapshot(vec![airdrop("h1")], vec![airdrop("l1")], vec![airdrop("u1")]);
        let changes = detect_changes(Some(&snap), &snap);

        assert_eq!(changes.hottest.updated.len(), 0);
        assert_eq!(changes.latest.updated.len(), 0);
        assert_eq!(changes.updated.updated.len(), 1);
    }

    #[test]
    fn test_ids_scoped_per_section() {
        // Same id in hottest and latest: the latest record is new even
        // though hottest saw the id before.
        let prev = snapshot(vec![airdrop("shared")], vec![], vec![]);
        let curr = snapshot(vec![airdrop("shared")], vec![airdrop("shared")], vec![]);
        let changes = detect_changes(Some(&prev), &curr);

        assert!(changes.hottest.is_empty());
        assert_eq!(changes.latest.new.len(), 1);
        assert_eq!(changes.latest.new[0].id, "shared");
    }

    #[test]
    fn test_removed_records_not_reported() {
        let prev = snapshot(vec![airdrop("gone"), airdrop("stays")], vec![], vec![]);
        let curr = snapshot(vec![airdrop("stays")], vec![], vec![]);
        let changes = detect_changes(Some(&prev), &curr);

        assert!(changes.hottest.is_empty());
        assert!(changes.latest.is_empty());
        assert!(changes.updated.is_empty());
    }

    #[test]
    fn test_output_preserves_current_order() {
        let prev = snapshot(vec![airdrop("b")], vec![], vec![]);
        let mut changed_b = airdrop("b");
        changed_b.temperature = 99;
        let curr = snapshot(vec![airdrop("c"), changed_b, airdrop("a")], vec![], vec![]);
        let changes = detect_changes(Some(&prev), &curr);

        let new_ids: Vec<&str> = changes.hottest.new.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(new_ids, vec!["c", "a"]);
        assert_eq!(changes.hottest.updated[0].id, "b");
    }
}
