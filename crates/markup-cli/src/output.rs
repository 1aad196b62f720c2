//! Diagnostic reporting for the `parse` and `check` commands

use anyhow::Result;
use colored::*;
use markup_core::{Diagnostic, ErrorCode, LinePosition, Severity};
use serde::Serialize;

use crate::OutputFormat;

/// Diagnostics of one file, with line positions resolved
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: String,
    pub diagnostics: Vec<(Diagnostic, LinePosition)>,
}

impl FileReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|(diagnostic, _)| diagnostic.severity == severity)
            .count()
    }
}

/// Summary statistics over every processed file
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub files_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl Summary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = Self {
            files_checked: reports.len(),
            ..Self::default()
        };
        for report in reports {
            summary.errors += report.count(Severity::Error);
            summary.warnings += report.count(Severity::Warning);
            summary.info += report.count(Severity::Info);
        }
        summary
    }

    pub fn total_issues(&self) -> usize {
        self.errors + self.warnings + self.info
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    code: ErrorCode,
    severity: Severity,
    message: &'a str,
    start: u32,
    end: u32,
    line: u32,
    column: u32,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: &'a str,
    diagnostics: Vec<JsonDiagnostic<'a>>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    files: Vec<JsonFile<'a>>,
    summary: &'a Summary,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn print_results(&self, reports: &[FileReport], summary: &Summary) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                print!("{}", render_human(reports, summary));
                Ok(())
            }
            OutputFormat::Json => {
                println!("{}", render_json(reports, summary)?);
                Ok(())
            }
        }
    }
}

/// `path:line:column: severity[code]: message`, one line per diagnostic,
/// then a summary
pub fn render_human(reports: &[FileReport], summary: &Summary) -> String {
    let mut out = String::new();
    for report in reports {
        for (diagnostic, start) in &report.diagnostics {
            let severity = match diagnostic.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
                Severity::Info => "info".blue().bold(),
            };
            out.push_str(&format!(
                "{}:{}:{}: {}[{}]: {}\n",
                report.path.bold(),
                start.line + 1,
                start.character + 1,
                severity,
                diagnostic.code,
                diagnostic.message
            ));
        }
    }

    out.push_str(&format!("\n{}\n", "Summary:".bold()));
    out.push_str(&format!("  Files checked: {}\n", summary.files_checked));
    if summary.total_issues() == 0 {
        out.push_str(&format!("  {}\n", "No issues found".green()));
        return out;
    }
    if summary.errors > 0 {
        out.push_str(&format!("  Errors: {}\n", summary.errors.to_string().red()));
    }
    if summary.warnings > 0 {
        out.push_str(&format!("  Warnings: {}\n", summary.warnings.to_string().yellow()));
    }
    if summary.info > 0 {
        out.push_str(&format!("  Info: {}\n", summary.info.to_string().blue()));
    }
    out
}

pub fn render_json(reports: &[FileReport], summary: &Summary) -> Result<String> {
    let files = reports
        .iter()
        .map(|report| JsonFile {
            path: &report.path,
            diagnostics: report
                .diagnostics
                .iter()
                .map(|(diagnostic, start)| JsonDiagnostic {
                    code: diagnostic.code,
                    severity: diagnostic.severity,
                    message: &diagnostic.message,
                    start: diagnostic.range.start().into(),
                    end: diagnostic.range.end().into(),
                    line: start.line + 1,
                    column: start.character + 1,
                })
                .collect(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&JsonOutput { files, summary })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use markup_core::{ParseOptions, SyntaxTree};

    fn report(path: &str, text: &str) -> FileReport {
        let tree = SyntaxTree::parse_text(text, ParseOptions::default());
        let diagnostics = tree
            .diagnostics()
            .into_iter()
            .map(|diagnostic| {
                let start = tree.get_line_span(diagnostic.range).unwrap().start;
                (diagnostic, start)
            })
            .collect();
        FileReport {
            path: path.to_string(),
            diagnostics,
        }
    }

    #[test]
    fn test_summary_counts() {
        let reports = vec![report("a.xml", "<a><b></a>"), report("b.xml", "<b/>")];
        let summary = Summary::from_reports(&reports);
        assert_eq!(summary.files_checked, 2);
        assert_eq!(summary.errors, 1);
        assert!(summary.has_errors());
    }

    #[test]
    fn test_human_output() {
        colored::control::set_override(false);
        let reports = vec![report("a.xml", "<a>\n<b></a>")];
        let rendered = render_human(&reports, &Summary::from_reports(&reports));
        assert!(rendered.starts_with("a.xml:2:4: error[ML2006]: End tag '</a>' does not match start tag '<b>'\n"));
        assert!(rendered.contains("Errors: 1"));
    }

    #[test]
    fn test_json_output() {
        let reports = vec![report("a.xml", "<a x=\"1\" x=\"2\"/>")];
        let rendered = render_json(&reports, &Summary::from_reports(&reports)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        let diagnostic = &value["files"][0]["diagnostics"][0];
        assert_eq!(diagnostic["code"], "ML2009");
        assert_eq!(diagnostic["severity"], "error");
        assert_eq!(diagnostic["start"], 9);
        assert_eq!(value["summary"]["errors"], 1);
    }
}
