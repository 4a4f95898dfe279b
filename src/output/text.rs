//! Human-readable run report.
//!
//! One block per duplicate group, one line per file, followed by any walk
//! and fingerprint errors and a summary:
//!
//! ```text
//! Group 1/1  sha256 9f86d081884c7d65…  2.0 KiB × 2
//!   kept     /data/cache/a.txt
//!   deleted  /data/cache/b.txt
//!
//! Summary
//!   Files seen        3
//!   ...
//! ```

use std::fmt::Display;
use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::{Condition, Paint, Painted};

use super::RunReport;

/// Text formatter for a [`RunReport`].
pub struct TextOutput<'a> {
    report: &'a RunReport,
    color: Condition,
}

impl<'a> TextOutput<'a> {
    /// Create a formatter. Colors are only emitted when `color` is true.
    #[must_use]
    pub fn new(report: &'a RunReport, color: bool) -> Self {
        Self {
            report,
            color: if color {
                Condition::ALWAYS
            } else {
                Condition::NEVER
            },
        }
    }

    fn paint<T: Display>(&self, painted: Painted<T>) -> Painted<T> {
        painted.whenever(self.color)
    }

    /// Write the full report.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.write_groups(writer)?;
        self.write_errors(writer)?;
        self.write_summary(writer)
    }

    /// Render into a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn write_groups<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let report = self.report;
        let groups = &report.reconciliation.groups;
        let deleted_label = if report.is_dry_run() {
            "would delete"
        } else {
            "deleted"
        };

        for (i, group) in groups.iter().enumerate() {
            let short_digest: String = group.digest.chars().take(16).collect();
            writeln!(
                w,
                "{}  {} {}…  {} × {}",
                self.paint(format!("Group {}/{}", i + 1, groups.len()).bold()),
                report.hash,
                self.paint(short_digest.dim()),
                ByteSize::b(group.size),
                group.paths.len()
            )?;

            if let Some(ref kept) = group.kept {
                writeln!(w, "  {:<13}{}", self.paint("kept".green()), kept.display())?;
            }
            for deletion in &group.deletions {
                if deletion.success {
                    writeln!(
                        w,
                        "  {:<13}{}",
                        self.paint(deleted_label.yellow()),
                        deletion.path.display()
                    )?;
                } else {
                    writeln!(
                        w,
                        "  {:<13}{}: {}",
                        self.paint("FAILED".red().bold()),
                        deletion.path.display(),
                        deletion.error.as_deref().unwrap_or("unknown error")
                    )?;
                }
            }
            writeln!(w)?;
        }
        Ok(())
    }

    fn write_errors<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let report = self.report;
        if !report.summary.walk_errors.is_empty() {
            writeln!(w, "{}", self.paint("Walk errors".red().bold()))?;
            for e in &report.summary.walk_errors {
                writeln!(w, "  {e}")?;
            }
            writeln!(w)?;
        }
        if !report.fingerprint_errors.is_empty() {
            writeln!(w, "{}", self.paint("Fingerprint errors".red().bold()))?;
            for e in &report.fingerprint_errors {
                writeln!(w, "  {e}")?;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    fn write_summary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let report = self.report;
        let summary = &report.summary;
        let reclaimed_label = if report.is_dry_run() {
            "Would reclaim"
        } else {
            "Reclaimed"
        };

        writeln!(w, "{}", self.paint("Summary".bold()))?;
        let rows: [(&str, String); 11] = [
            ("Root", report.root.display().to_string()),
            ("Files seen", summary.files_seen.to_string()),
            ("Eligible", summary.eligible_files.to_string()),
            (
                "Hashed",
                format!("{} ({})", summary.hashed_files, summary.hashed_display()),
            ),
            ("Walk errors", summary.walk_errors.len().to_string()),
            ("Hash errors", report.fingerprint_errors.len().to_string()),
            ("Dup groups", summary.duplicate_groups.to_string()),
            (
                "Deleted",
                format!("{} (keep {}, {})", report.deleted_count(), report.keep, report.delete_mode),
            ),
            ("Failed", report.failed_count().to_string()),
            (reclaimed_label, ByteSize::b(report.bytes_reclaimed()).to_string()),
            ("Elapsed", format!("{:.2?}", report.elapsed)),
        ];
        for (label, value) in rows {
            writeln!(w, "  {label:<16}{value}")?;
        }
        if report.reconciliation.interrupted {
            writeln!(
                w,
                "  {}",
                self.paint("Interrupted before all deletions were attempted".red())
            )?;
        }
        Ok(())
    }
}
