//! Fetch reports and destination summaries.

use std::path::{Path, PathBuf};

/// Outcome of fetching one model.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Downloader exited zero. Counts summarize the destination afterwards.
    Fetched { files: u64, bytes: u64 },
    /// Downloader failed or could not be spawned. The destination is left
    /// as-is for the next run to resume.
    Failed { reason: String },
}

impl FetchOutcome {
    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched { .. })
    }
}

/// Per-model record in a fetch report.
#[derive(Debug)]
pub struct ModelFetch {
    pub repo_id: String,
    pub dest: PathBuf,
    pub outcome: FetchOutcome,
}

/// Result of one fetch-models run.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub models: Vec<ModelFetch>,
}

impl FetchReport {
    pub fn fetched(&self) -> usize {
        self.models.iter().filter(|m| m.outcome.is_fetched()).count()
    }

    pub fn failed(&self) -> usize {
        self.models.len() - self.fetched()
    }

    pub fn all_fetched(&self) -> bool {
        self.failed() == 0
    }
}

/// Human-readable fetch report for the CLI.
pub fn format_report(report: &FetchReport) -> String {
    let mut out = String::new();

    out.push_str("\n╔══════════════════════════════════════════╗\n");
    out.push_str("║  MELT Model Fetch                        ║\n");
    out.push_str("╚══════════════════════════════════════════╝\n\n");

    out.push_str(&format!(
        "Models ({} total): {} fetched, {} failed\n\n",
        report.models.len(),
        report.fetched(),
        report.failed()
    ));

    for m in &report.models {
        match &m.outcome {
            FetchOutcome::Fetched { files, bytes } => {
                out.push_str(&format!(
                    "  ✅ {} → {} ({files} files, {bytes} bytes)\n",
                    m.repo_id,
                    m.dest.display()
                ));
            }
            FetchOutcome::Failed { reason } => {
                out.push_str(&format!("  ❌ {}\n     Reason: {reason}\n", m.repo_id));
            }
        }
    }

    out
}

/// Count regular files and their total size under `dir`.
pub fn dir_summary(dir: &Path) -> (u64, u64) {
    let mut files = 0u64;
    let mut bytes = 0u64;
    for entry in walkdir::WalkDir::new(dir).into_iter().flatten() {
        if entry.file_type().is_file() {
            files += 1;
            bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }
    (files, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn dir_summary_counts_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.bin"), [0u8; 10]).unwrap();
        fs::create_dir_all(dir.path().join("sub/deep")).unwrap();
        fs::write(dir.path().join("sub/deep/b.bin"), [0u8; 32]).unwrap();

        let (files, bytes) = dir_summary(dir.path());
        assert_eq!(files, 2);
        assert_eq!(bytes, 42);
    }

    #[test]
    fn dir_summary_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (files, bytes) = dir_summary(&dir.path().join("nope"));
        assert_eq!((files, bytes), (0, 0));
    }

    #[test]
    fn report_counts() {
        let mut report = FetchReport::default();
        assert!(report.all_fetched());

        report.models.push(ModelFetch {
            repo_id: "a/b".to_string(),
            dest: PathBuf::from("/tmp/a_b"),
            outcome: FetchOutcome::Fetched { files: 3, bytes: 100 },
        });
        report.models.push(ModelFetch {
            repo_id: "c/d".to_string(),
            dest: PathBuf::from("/tmp/c_d"),
            outcome: FetchOutcome::Failed { reason: "exit 1".to_string() },
        });

        assert_eq!(report.fetched(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_fetched());
    }

    #[test]
    fn formatted_report_shows_outcomes_and_reasons() {
        let report = FetchReport {
            models: vec![
                ModelFetch {
                    repo_id: "ACE-Step/Ace-Step1.5".to_string(),
                    dest: PathBuf::from("/vol/ACE-Step_Ace-Step1.5"),
                    outcome: FetchOutcome::Fetched { files: 12, bytes: 4096 },
                },
                ModelFetch {
                    repo_id: "ACE-Step/acestep-5Hz-lm-4B".to_string(),
                    dest: PathBuf::from("/vol/ACE-Step_acestep-5Hz-lm-4B"),
                    outcome: FetchOutcome::Failed { reason: "repo gated".to_string() },
                },
            ],
        };

        let text = format_report(&report);
        assert!(text.contains("1 fetched, 1 failed"));
        assert!(text.contains("✅ ACE-Step/Ace-Step1.5"));
        assert!(text.contains("12 files"));
        assert!(text.contains("❌ ACE-Step/acestep-5Hz-lm-4B"));
        assert!(text.contains("Reason: repo gated"));
    }
}
