//! Batch results and the statistics derived from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::conversion::worker::JobOutcome;
use crate::error::JobError;

/// Everything a finished batch produced
#[derive(Debug)]
pub struct BatchReport {
    /// Number of eligible source files, skipped ones included
    pub total: usize,
    /// Successful jobs, in completion order
    pub converted: Vec<JobOutcome>,
    /// Failed jobs, in completion order (only under continue-on-error)
    pub failures: Vec<JobError>,
    /// Eligible files that never became a job (lossy names)
    pub skipped: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl BatchReport {
    /// True when every eligible file converted
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty() && self.converted.len() == self.total
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_report(self)
    }
}

/// A failed job, flattened for display and serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureSummary {
    pub file: String,
    pub stage: String,
    pub error: String,
}

/// Statistics for one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of eligible source files
    pub total: usize,
    /// Number of documents converted
    pub converted: usize,
    /// Number of jobs that failed
    pub failed: usize,
    /// Eligible files left alone because their name is not valid UTF-8
    pub skipped: Vec<String>,
    /// Wall clock time of the whole batch in milliseconds
    pub elapsed_ms: u64,
    /// Average converter time per successful job in milliseconds
    pub avg_job_ms: f64,
    /// Converted documents per second of wall clock time
    pub files_per_sec: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub failures: Vec<FailureSummary>,
}

impl BatchSummary {
    pub fn from_report(report: &BatchReport) -> Self {
        let converted = report.converted.len();
        let job_time: Duration = report.converted.iter().map(|o| o.elapsed).sum();

        let avg_job_ms = if converted > 0 {
            job_time.as_secs_f64() * 1000.0 / converted as f64
        } else {
            0.0
        };

        let files_per_sec = if report.elapsed.as_secs_f64() > 0.0 {
            converted as f64 / report.elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total: report.total,
            converted,
            failed: report.failures.len(),
            skipped: report.skipped.clone(),
            elapsed_ms: report.elapsed.as_millis() as u64,
            avg_job_ms,
            files_per_sec,
            started_at: report.started_at,
            finished_at: report.finished_at,
            failures: report
                .failures
                .iter()
                .map(|f| FailureSummary {
                    file: f.file_name.clone(),
                    stage: f.stage.to_string(),
                    error: f.cause.to_string(),
                })
                .collect(),
        }
    }

    /// Multi-line human readable rendering
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Conversion Statistics:\n");
        out.push_str(&format!("Files found: {}\n", self.total));
        out.push_str(&format!("Converted: {}\n", self.converted));
        out.push_str(&format!("Failed: {}\n", self.failed));
        if !self.skipped.is_empty() {
            out.push_str(&format!("Skipped: {}\n", self.skipped.len()));
        }
        out.push_str(&format!("Elapsed: {}ms\n", self.elapsed_ms));
        out.push_str(&format!("Average per file: {:.1}ms\n", self.avg_job_ms));
        out.push_str(&format!("Throughput: {:.2} files/s\n", self.files_per_sec));
        for failure in &self.failures {
            out.push_str(&format!(
                "  ✗ {} ({}): {}\n",
                failure.file, failure.stage, failure.error
            ));
        }
        for name in &self.skipped {
            out.push_str(&format!("  ✗ {} (skipped): file name is not valid UTF-8\n", name));
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
