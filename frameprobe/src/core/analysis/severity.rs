//! Severity Classification
//!
//! Groups findings into High/Medium/Low buckets by case-insensitive substring
//! match on the free-text severity. Buckets are selected independently, so a
//! severity containing two keywords lands in both buckets and a severity
//! containing none lands in no bucket.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::finding::Finding;

/// Severity bucket used for grouping and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityBucket {
    High,
    Medium,
    Low,
}

impl SeverityBucket {
    /// All buckets in display order
    pub const ALL: [SeverityBucket; 3] = [
        SeverityBucket::High,
        SeverityBucket::Medium,
        SeverityBucket::Low,
    ];

    /// Lowercase keyword searched for in the severity text
    pub fn keyword(&self) -> &'static str {
        match self {
            SeverityBucket::High => "high",
            SeverityBucket::Medium => "medium",
            SeverityBucket::Low => "low",
        }
    }

    /// Whether a severity string falls in this bucket
    pub fn matches(&self, severity: &str) -> bool {
        severity.to_lowercase().contains(self.keyword())
    }

    /// Single bucket for a severity using High > Medium > Low precedence.
    ///
    /// Unmatched severities fall to Low. Only the timeline tone uses this;
    /// grouping and counting go through [`classify`].
    pub fn dominant(severity: &str) -> SeverityBucket {
        if SeverityBucket::High.matches(severity) {
            SeverityBucket::High
        } else if SeverityBucket::Medium.matches(severity) {
            SeverityBucket::Medium
        } else {
            SeverityBucket::Low
        }
    }

    /// Parse a bucket name, case-insensitively
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(SeverityBucket::High),
            "medium" => Ok(SeverityBucket::Medium),
            "low" => Ok(SeverityBucket::Low),
            _ => Err(format!(
                "Invalid severity: '{}'. Valid: high, medium, low",
                value
            )),
        }
    }
}

impl std::fmt::Display for SeverityBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeverityBucket::High => write!(f, "High"),
            SeverityBucket::Medium => write!(f, "Medium"),
            SeverityBucket::Low => write!(f, "Low"),
        }
    }
}

/// Per-bucket finding counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn get(&self, bucket: SeverityBucket) -> usize {
        match bucket {
            SeverityBucket::High => self.high,
            SeverityBucket::Medium => self.medium,
            SeverityBucket::Low => self.low,
        }
    }
}

/// Findings grouped by bucket, borrowing from the result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeverityBuckets<'a> {
    pub high: Vec<&'a Finding>,
    pub medium: Vec<&'a Finding>,
    pub low: Vec<&'a Finding>,
}

impl<'a> SeverityBuckets<'a> {
    pub fn get(&self, bucket: SeverityBucket) -> &[&'a Finding] {
        match bucket {
            SeverityBucket::High => &self.high,
            SeverityBucket::Medium => &self.medium,
            SeverityBucket::Low => &self.low,
        }
    }

    pub fn counts(&self) -> SeverityCounts {
        SeverityCounts {
            high: self.high.len(),
            medium: self.medium.len(),
            low: self.low.len(),
        }
    }

    /// Non-empty bucket groups selected by the filter, in High→Low order
    pub fn visible(&self, filter: &SeverityFilter) -> Vec<(SeverityBucket, &[&'a Finding])> {
        SeverityBucket::ALL
            .into_iter()
            .filter(|bucket| filter.includes(*bucket))
            .map(|bucket| (bucket, self.get(bucket)))
            .filter(|(_, findings)| !findings.is_empty())
            .collect()
    }
}

/// Groups findings into severity buckets, keeping server order within each.
pub fn classify(findings: &[Finding]) -> SeverityBuckets<'_> {
    SeverityBuckets {
        high: select(findings, SeverityBucket::High),
        medium: select(findings, SeverityBucket::Medium),
        low: select(findings, SeverityBucket::Low),
    }
}

fn select(findings: &[Finding], bucket: SeverityBucket) -> Vec<&Finding> {
    findings
        .iter()
        .filter(|f| bucket.matches(&f.severity))
        .collect()
}

/// Findings whose severity matches no bucket
pub fn unclassified(findings: &[Finding]) -> Vec<&Finding> {
    findings
        .iter()
        .filter(|f| !SeverityBucket::ALL.iter().any(|b| b.matches(&f.severity)))
        .collect()
}

/// User-selected subset of buckets to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityFilter {
    buckets: BTreeSet<SeverityBucket>,
}

impl Default for SeverityFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl SeverityFilter {
    pub fn all() -> Self {
        Self {
            buckets: SeverityBucket::ALL.into_iter().collect(),
        }
    }

    pub fn none() -> Self {
        Self {
            buckets: BTreeSet::new(),
        }
    }

    pub fn only(buckets: impl IntoIterator<Item = SeverityBucket>) -> Self {
        Self {
            buckets: buckets.into_iter().collect(),
        }
    }

    /// Parse a comma-separated list such as `high,low`
    pub fn parse(value: &str) -> Result<Self, String> {
        let buckets = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(SeverityBucket::parse)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { buckets })
    }

    pub fn includes(&self, bucket: SeverityBucket) -> bool {
        self.buckets.contains(&bucket)
    }

    pub fn insert(&mut self, bucket: SeverityBucket) {
        self.buckets.insert(bucket);
    }

    pub fn remove(&mut self, bucket: SeverityBucket) {
        self.buckets.remove(&bucket);
    }
}
