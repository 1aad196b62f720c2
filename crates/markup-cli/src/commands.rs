//! CLI command implementations

use anyhow::{Context, Result, bail};
use colored::*;
use markup_core::{
    DumpOptions, LinePosition, SharedNodeCache, SyntaxTree, TreeParser, dump, lex_lines, tokenize,
};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::OutputFormat;
use crate::config::MarkupConfig;
use crate::output::{FileReport, OutputFormatter, Summary};

/// Expands directories into the markup files below them
///
/// Files named explicitly are kept whatever their extension.
pub fn collect_files(paths: &[PathBuf], config: &MarkupConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            bail!("No such file or directory: {}", path.display());
        }
        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !config.is_excluded(entry.path()));
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            if entry.file_type().is_file() && config.matches_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    debug!("Collected {} files", files.len());
    Ok(files)
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn tree_parser(config: &MarkupConfig) -> TreeParser {
    TreeParser::new()
        .options(config.parse_options())
        .max_depth(config.parser.max_depth)
}

fn report_for(tree: &SyntaxTree) -> Result<FileReport> {
    let diagnostics = tree
        .diagnostics()
        .into_iter()
        .map(|diagnostic| {
            let start = tree.get_line_span(diagnostic.range)?.start;
            Ok((diagnostic, start))
        })
        .collect::<markup_core::Result<Vec<(_, LinePosition)>>>()?;
    Ok(FileReport {
        path: tree.file_path().to_string(),
        diagnostics,
    })
}

/// Parses every file in parallel and reports diagnostics
///
/// Returns whether any error diagnostic was reported.
pub fn parse_command(paths: &[PathBuf], format: OutputFormat, config: &MarkupConfig) -> Result<bool> {
    let files = collect_files(paths, config)?;
    let start_time = Instant::now();
    let cache = SharedNodeCache::new();
    let parser = tree_parser(config).shared_cache(cache.clone());

    let reports = files
        .par_iter()
        .map(|path| {
            let text = read_source(path)?;
            let tree = parser
                .clone()
                .file_path(path.display().to_string())
                .parse(text)?;
            report_for(&tree)
        })
        .collect::<Result<Vec<_>>>()?;

    let stats = cache.stats();
    info!(
        files = reports.len(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        cache_hit_ratio = stats.hit_ratio(),
        "parsed files"
    );

    let summary = Summary::from_reports(&reports);
    OutputFormatter::new(format).print_results(&reports, &summary)?;
    Ok(summary.has_errors())
}

/// Prints the syntax tree of one file
pub fn tree_command(path: &Path, trivia: bool, diagnostics: bool, config: &MarkupConfig) -> Result<bool> {
    let text = read_source(path)?;
    let tree = tree_parser(config)
        .file_path(path.display().to_string())
        .parse(text)?;
    let mut options = DumpOptions::default();
    if trivia {
        options = options.with_trivia();
    }
    if diagnostics {
        options = options.with_diagnostics();
    }
    print!("{}", dump(&tree.get_root(), options));
    Ok(tree.has_errors())
}

/// Prints the token stream of one file
///
/// With `lines`, each line is lexed on its own and printed with the scanner
/// state it starts and ends in.
pub fn lex_command(path: &Path, lines: bool, config: &MarkupConfig) -> Result<bool> {
    let text = read_source(path)?;
    if lines {
        for line in lex_lines(&text) {
            println!(
                "{} {:?} -> {:?}",
                format!("line {}", line.line + 1).bold(),
                line.start_state,
                line.end_state
            );
            for token in &line.tokens {
                println!("  {:?} {:?}", token.kind, token.text);
            }
        }
        return Ok(false);
    }

    let mut has_errors = false;
    for token in tokenize(&text, config.parser.documentation_mode) {
        let missing = if token.is_missing { " (missing)" } else { "" };
        println!(
            "{:?}@{}..{} {:?}{}",
            token.kind,
            token.start(),
            token.start() + token.text.len(),
            token.text,
            missing
        );
        for diagnostic in &token.diagnostics {
            has_errors |= diagnostic.code().default_severity() == markup_core::Severity::Error;
            println!("  {}", diagnostic.code().to_string().red());
        }
    }
    Ok(has_errors)
}

/// Outcome of the self check for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    RoundTrip,
    Incremental { offset: usize },
}

/// Round trip, then reparse after deleting and reinserting each line break
/// and compare against a fresh parse
pub fn check_file(text: &str, config: &MarkupConfig) -> Result<Option<CheckFailure>> {
    let parser = tree_parser(config);
    let tree = parser.parse(text)?;
    if tree.get_root().to_full_string() != text {
        return Ok(Some(CheckFailure::RoundTrip));
    }

    let options = DumpOptions::default().with_trivia().with_diagnostics();
    for (offset, _) in text.match_indices('\n') {
        let mut edited = String::with_capacity(text.len());
        edited.push_str(&text[..offset]);
        edited.push_str(&text[offset + 1..]);

        let incremental = parser.reparse(&tree, edited.as_str())?;
        let fresh = parser.parse(edited.as_str())?;
        if dump(&incremental.get_root(), options) != dump(&fresh.get_root(), options) {
            return Ok(Some(CheckFailure::Incremental { offset }));
        }
        let restored = parser.reparse(&incremental, text)?;
        if dump(&restored.get_root(), options) != dump(&tree.get_root(), options) {
            return Ok(Some(CheckFailure::Incremental { offset }));
        }
    }
    Ok(None)
}

pub fn check_command(paths: &[PathBuf], config: &MarkupConfig) -> Result<bool> {
    let files = collect_files(paths, config)?;
    let failures = files
        .par_iter()
        .map(|path| {
            let text = read_source(path)?;
            Ok(check_file(&text, config)?.map(|failure| (path, failure)))
        })
        .collect::<Result<Vec<_>>>()?;

    let failures: Vec<_> = failures.into_iter().flatten().collect();
    for (path, failure) in &failures {
        warn!(path = %path.display(), ?failure, "self check failed");
        match failure {
            CheckFailure::RoundTrip => {
                println!("{} {}: tree text differs from source", "FAIL".red().bold(), path.display());
            }
            CheckFailure::Incremental { offset } => {
                println!(
                    "{} {}: incremental reparse differs after edit at {offset}",
                    "FAIL".red().bold(),
                    path.display()
                );
            }
        }
    }
    println!("{} of {} files passed", files.len() - failures.len(), files.len());
    Ok(!failures.is_empty())
}
