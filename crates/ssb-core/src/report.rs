//! Audit report artifact.
//!
//! An [`AuditReport`] wraps the ordered records of one run with provenance
//! and a SHA-256 digest over the records alone, so two runs against the
//! same account state produce the same digest even though their ids and
//! timestamps differ.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::model::{CheckReport, Severity};

/// SHA-256 hex digest of the canonical JSON encoding of `results`.
pub fn results_digest(results: &[CheckReport]) -> Result<String> {
    let bytes = serde_json::to_vec(results)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Alert counts per base severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub info: usize,
    pub success: usize,
    pub warning: usize,
    pub danger: usize,
    pub error: usize,
}

impl SeveritySummary {
    fn count(&mut self, level: Severity) {
        match level {
            Severity::Info => self.info += 1,
            Severity::Success => self.success += 1,
            Severity::Warning => self.warning += 1,
            Severity::Danger => self.danger += 1,
            Severity::Error => self.error += 1,
        }
    }

    pub fn get(&self, level: Severity) -> usize {
        match level {
            Severity::Info => self.info,
            Severity::Success => self.success,
            Severity::Warning => self.warning,
            Severity::Danger => self.danger,
            Severity::Error => self.error,
        }
    }

    pub fn total(&self) -> usize {
        Severity::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub run_id: Uuid,
    pub account_id: String,
    pub generated_at: DateTime<Utc>,
    pub results: Vec<CheckReport>,
    pub digest: String,
}

impl AuditReport {
    pub fn new(
        run_id: Uuid,
        account_id: impl Into<String>,
        generated_at: DateTime<Utc>,
        results: Vec<CheckReport>,
    ) -> Result<Self> {
        let digest = results_digest(&results)?;
        Ok(Self {
            run_id,
            account_id: account_id.into(),
            generated_at,
            results,
            digest,
        })
    }

    pub fn summary(&self) -> SeveritySummary {
        let mut summary = SeveritySummary::default();
        for alert in self.results.iter().flat_map(|r| r.alerts()) {
            summary.count(alert.level);
        }
        summary
    }

    /// Render a human-readable markdown summary.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Security Baseline Report\n\n");
        out.push_str(&format!(
            "- account: `{}`\n- run: `{}`\n- generated: {}\n- digest: `{}`\n\n",
            self.account_id,
            self.run_id,
            self.generated_at.to_rfc3339(),
            self.digest
        ));

        let summary = self.summary();
        out.push_str("| Severity | Alerts |\n|---|---|\n");
        for level in Severity::ALL {
            out.push_str(&format!("| {} | {} |\n", level, summary.get(level)));
        }
        out.push('\n');

        for record in &self.results {
            out.push_str(&format!("## {}\n\n", record.title()));
            for alert in record.alerts() {
                let text: Vec<String> = alert
                    .message
                    .iter()
                    .map(|part| {
                        if part.link.is_empty() {
                            part.text.clone()
                        } else {
                            format!("[{}]({})", part.text, part.link)
                        }
                    })
                    .collect();
                out.push_str(&format!(
                    "- **{}** {}: {}\n",
                    alert.level,
                    alert.title,
                    text.join(" ")
                ));
            }

            for table in record.tables().iter().filter(|t| !t.is_empty()) {
                out.push('\n');
                if !table.cols.is_empty() {
                    out.push_str(&format!("| {} |\n", table.cols.join(" | ")));
                    out.push_str(&format!("|{}\n", "---|".repeat(table.cols.len())));
                }
                for row in &table.rows {
                    let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
                    out.push_str(&format!("| {} |\n", cells.join(" | ")));
                }
            }
            out.push('\n');
        }
        out
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    /// Read a report and verify its digest against its records.
    pub fn read_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)?;
        let report: AuditReport = serde_json::from_slice(&raw)?;
        let actual = results_digest(&report.results)?;
        if actual != report.digest {
            return Err(CoreError::DigestMismatch {
                expected: report.digest,
                actual,
            });
        }
        Ok(report)
    }
}
