//! Normalization and cross-plugin correlation of raw findings.
//!
//! Different backends report the same misconfiguration with different rule
//! ids and severity vocabularies. The aggregator maps every raw finding onto
//! the canonical schema, then merges findings that share a `CorrelationKey`
//! so one underlying issue appears once, with every detecting plugin recorded
//! in its provenance.
//!
//! The merge is commutative and associative: representatives are chosen by
//! (severity, plugin name, rule id) ordering, never by arrival order, so
//! re-ordering the outcome list produces an identical report.

use crate::core::{
    Finding, PluginDescriptor, PluginOutcome, RawFinding, Report, Severity,
};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Derived key identifying "the same underlying issue" across plugins.
///
/// Findings without a resource identifier never correlate across plugins;
/// merging everything a backend could not attribute to a resource would
/// collapse unrelated issues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationKey {
    pub resource: String,
    pub category: String,
}

impl CorrelationKey {
    pub fn of(finding: &Finding) -> Option<Self> {
        let resource = normalize_resource(&finding.resource);
        if resource.is_empty() {
            return None;
        }
        Some(Self {
            resource,
            category: rule_category(&finding.rule_id, &finding.title),
        })
    }
}

pub fn normalize_resource(resource: &str) -> String {
    resource.trim().to_lowercase()
}

/// Coarse rule categorization used for correlation. Plugin-native rule ids
/// rarely match across tools, but their subject matter does.
pub fn rule_category(rule_id: &str, title: &str) -> String {
    let haystack = format!("{} {}", rule_id, title).to_lowercase();

    const CATEGORIES: &[(&str, &[&str])] = &[
        ("encryption", &["encrypt", "kms", "tls", "ssl", "https"]),
        ("public-exposure", &["public", "0.0.0.0", "exposed", "open to the world", "internet"]),
        ("access-control", &["iam", "access", "permission", "privilege", "role", "policy"]),
        ("secrets", &["secret", "password", "credential", "api key", "token"]),
        ("logging", &["logging", "log", "audit", "trail"]),
        ("network", &["security group", "ingress", "egress", "port", "firewall", "network"]),
        ("backup", &["backup", "versioning", "retention", "snapshot"]),
    ];

    for (category, keywords) in CATEGORIES {
        if keywords.iter().any(|kw| haystack.contains(kw)) {
            return (*category).to_string();
        }
    }

    // No keyword match: fall back to the rule id itself so only identical
    // rules correlate.
    rule_id.to_lowercase()
}

/// Turns the collected plugin outcomes into the canonical report.
pub struct Aggregator {
    severity_maps: HashMap<String, PluginDescriptor>,
}

impl Aggregator {
    pub fn new(descriptors: impl IntoIterator<Item = PluginDescriptor>) -> Self {
        Self {
            severity_maps: descriptors
                .into_iter()
                .map(|d| (d.name.to_string(), d))
                .collect(),
        }
    }

    pub fn aggregate(&self, target: &Path, outcomes: Vec<PluginOutcome>) -> Report {
        let mut normalized = Vec::new();
        for outcome in &outcomes {
            if let Some(raw_findings) = &outcome.findings {
                for raw in raw_findings {
                    normalized.push(self.normalize(&outcome.plugin, raw));
                }
            }
        }

        let findings = Self::deduplicate(normalized);
        Report::new(target.display().to_string(), outcomes, findings)
    }

    /// Map one raw finding through the plugin's severity table into the
    /// canonical shape. Unmapped native severities default to `Medium` with
    /// a note recorded in the description.
    fn normalize(&self, plugin: &str, raw: &RawFinding) -> Finding {
        let mapped = self
            .severity_maps
            .get(plugin)
            .and_then(|d| d.map_severity(&raw.native_severity));

        let (severity, description) = match mapped {
            Some(severity) => (severity, raw.description.clone()),
            None => {
                let note = format!(
                    "[unmapped native severity '{}', defaulted to Medium]",
                    raw.native_severity
                );
                let description = if raw.description.is_empty() {
                    note
                } else {
                    format!("{} {}", raw.description, note)
                };
                (Severity::Medium, description)
            }
        };

        Finding {
            plugin: plugin.to_string(),
            rule_id: raw.rule_id.clone(),
            severity,
            resource: raw.resource.clone(),
            title: raw.title.clone(),
            description,
            remediation: raw.remediation.clone(),
            location: raw.location.clone(),
            provenance: vec![plugin.to_string()],
        }
    }

    /// Two-stage merge. Stage one collapses same-plugin duplicates by rule
    /// id and resource. Stage two groups the survivors by `CorrelationKey`
    /// and keeps one representative per group: highest severity, ties broken
    /// by lexicographically first plugin name, then rule id.
    fn deduplicate(findings: Vec<Finding>) -> Vec<Finding> {
        let mut per_plugin: BTreeMap<(String, String, String), Finding> = BTreeMap::new();
        for finding in findings {
            let key = (
                finding.plugin.clone(),
                finding.rule_id.clone(),
                normalize_resource(&finding.resource),
            );
            match per_plugin.get_mut(&key) {
                Some(existing) => {
                    if Self::outranks(&finding, existing) {
                        *existing = finding;
                    }
                }
                None => {
                    per_plugin.insert(key, finding);
                }
            }
        }

        let mut groups: BTreeMap<CorrelationKey, Vec<Finding>> = BTreeMap::new();
        let mut uncorrelated = Vec::new();
        for finding in per_plugin.into_values() {
            match CorrelationKey::of(&finding) {
                Some(key) => groups.entry(key).or_default().push(finding),
                None => uncorrelated.push(finding),
            }
        }

        let mut merged: Vec<Finding> = groups
            .into_values()
            .map(Self::merge_group)
            .chain(uncorrelated)
            .collect();

        merged.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.resource.cmp(&b.resource))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        merged
    }

    fn merge_group(mut group: Vec<Finding>) -> Finding {
        group.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.plugin.cmp(&b.plugin))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });

        let mut provenance: Vec<String> = group.iter().map(|f| f.plugin.clone()).collect();
        provenance.sort();
        provenance.dedup();

        let mut representative = group.swap_remove(0);
        representative.provenance = provenance;
        representative
    }

    /// Deterministic preference between same-plugin duplicates.
    fn outranks(candidate: &Finding, existing: &Finding) -> bool {
        candidate.severity > existing.severity
            || (candidate.severity == existing.severity
                && (&candidate.title, &candidate.description)
                    < (&existing.title, &existing.description))
    }
}
