// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Adds unknown component names reported by `cspell` to the
//! `cSpell:ignore:` front-matter line of the generated pages.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
    process::Command,
    sync::LazyLock,
};

use regex::Regex;
use tracing::{info, warn};

use crate::error::{Error, io_error};

/// Component pages relative to the documentation repository root.
pub const COMPONENT_DOCS_PATH: &str = "content/en/docs/collector/components";

const IGNORE_PREFIX: &str = "cSpell:ignore:";

static CSPELL_LINE: LazyLock<Option<Regex,>,> =
    LazyLock::new(|| Regex::new(r"^(.+?):(\d+):(\d+)\s+-\s+Unknown word \((.+?)\)",).ok(),);
static FRONT_MATTER: LazyLock<Option<Regex,>,> = LazyLock::new(|| Regex::new(r"(?s)\A---\n(.*?)\n---\n",).ok(),);

/// Misspelled words grouped by the file `cspell` reported them in.
pub type Misspellings = BTreeMap<String, Vec<String,>,>;

/// Outcome of a spelling fix run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq,)]
pub struct SpellingReport
{
    /// Pages whose ignore list changed.
    pub files_updated: usize,
    /// Distinct words added across all pages.
    pub words_added:   usize,
}

/// Source of spelling errors for a documentation checkout.
pub trait SpellChecker
{
    /// Checks the component pages under `docs_repo`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when the checker cannot run.
    fn check(&self, docs_repo: &Path,) -> Result<Misspellings, Error,>;
}

/// Runs `npx cspell` with the repository's `.cspell.yml`.
#[derive(Debug, Clone, Copy, Default,)]
pub struct Cspell;

impl SpellChecker for Cspell
{
    fn check(&self, docs_repo: &Path,) -> Result<Misspellings, Error,>
    {
        let config = docs_repo.join(".cspell.yml",);
        let pages = docs_repo.join(COMPONENT_DOCS_PATH,).join("*.md",);
        let output = Command::new("npx",)
            .args(["cspell", "--no-progress", "-c",],)
            .arg(&config,)
            .arg(&pages,)
            .current_dir(docs_repo,)
            .output()
            .map_err(|e| {
                Error::command("npx cspell", format!("npx not found, make sure Node.js is installed: {e}"),)
            },)?;

        // cspell exits non-zero when it reports words, so the status is ignored.
        Ok(parse_cspell_output(&String::from_utf8_lossy(&output.stdout,),),)
    }
}

/// Parses `file:line:col - Unknown word (word)` lines.
pub fn parse_cspell_output(output: &str,) -> Misspellings
{
    let mut misspellings = Misspellings::new();
    let Some(pattern,) = CSPELL_LINE.as_ref() else {
        return misspellings;
    };

    for line in output.lines() {
        if let Some(captures,) = pattern.captures(line,) {
            misspellings.entry(captures[1].to_string(),).or_default().push(captures[4].to_string(),);
        }
    }
    misspellings
}

/// Merges `words` into the `cSpell:ignore:` line of the page front matter.
///
/// The line is appended to the front matter when absent. Pages without
/// front matter are left alone and `false` is returned.
///
/// # Errors
///
/// Returns [`Error::Io`] when the page cannot be read or written.
pub fn update_cspell_list(path: &Path, words: &BTreeSet<String,>,) -> Result<bool, Error,>
{
    let content = fs::read_to_string(path,).map_err(|e| io_error(path, e,),)?;
    let Some(updated,) = merge_ignore_words(&content, words,) else {
        warn!("No front matter found in {}", path.display());
        return Ok(false,);
    };

    fs::write(path, updated,).map_err(|e| io_error(path, e,),)?;
    Ok(true,)
}

fn merge_ignore_words(content: &str, words: &BTreeSet<String,>,) -> Option<String,>
{
    let captures = FRONT_MATTER.as_ref()?.captures(content,)?;
    let section = captures.get(1,)?.as_str();
    let rest = &content[captures.get(0,)?.end()..];

    let existing_line = section.lines().find_map(|line| {
        line.find(IGNORE_PREFIX,)
            .map(|start| &line[start..],)
            .filter(|ignore| !ignore[IGNORE_PREFIX.len()..].trim().is_empty(),)
    },);

    let new_section = match existing_line {
        Some(line,) => {
            let mut all: BTreeSet<String,> =
                line[IGNORE_PREFIX.len()..].split_whitespace().map(str::to_string,).collect();
            all.extend(words.iter().cloned(),);
            section.replacen(line, &ignore_line(all,), 1,)
        }
        None => format!("{section}\n{}", ignore_line(words.clone(),)),
    };

    Some(format!("---\n{new_section}\n---\n{rest}"),)
}

fn ignore_line(words: BTreeSet<String,>,) -> String
{
    let mut sorted: Vec<String,> = words.into_iter().collect();
    sorted.sort_by_cached_key(|word| (word.to_lowercase(), word.clone(),),);
    format!("{IGNORE_PREFIX} {}", sorted.join(" ",))
}

/// Runs `checker` and records every reported word in its page.
///
/// A checker failure is logged and yields an empty report. After updates
/// the checker runs once more to log what remains.
pub fn fix_component_spelling(docs_repo: &Path, checker: &impl SpellChecker,) -> SpellingReport
{
    info!("Running cspell to detect spelling errors");
    let misspellings = match checker.check(docs_repo,) {
        Ok(found,) => found,
        Err(e,) => {
            warn!("Skipping spelling fixes: {e}");
            return SpellingReport::default();
        }
    };

    if misspellings.is_empty() {
        info!("No spelling errors found");
        return SpellingReport::default();
    }
    info!("Found spelling errors in {} file(s)", misspellings.len());

    let mut report = SpellingReport::default();
    for (reported, words) in misspellings {
        let Some(path,) = resolve_page(docs_repo, &reported,) else {
            warn!("File not found: {reported}");
            continue;
        };

        let words: BTreeSet<String,> = words.into_iter().collect();
        info!("Adding {} word(s) to {}", words.len(), path.display());
        match update_cspell_list(&path, &words,) {
            Ok(true,) => {
                report.files_updated += 1;
                report.words_added += words.len();
            }
            Ok(false,) => {}
            Err(e,) => warn!("Failed to update {}: {e}", path.display()),
        }
    }

    if report.files_updated == 0 {
        warn!("No files were updated");
        return report;
    }
    info!("Updated {} file(s), added {} word(s)", report.files_updated, report.words_added);

    match checker.check(docs_repo,) {
        Ok(remaining,) if remaining.is_empty() => info!("All component name spelling errors fixed"),
        Ok(remaining,) => warn!(
            "{} spelling error(s) remain in {} file(s)",
            remaining.values().map(Vec::len,).sum::<usize>(),
            remaining.len()
        ),
        Err(e,) => warn!("Could not verify fixes: {e}"),
    }
    report
}

fn resolve_page(docs_repo: &Path, reported: &str,) -> Option<PathBuf,>
{
    [PathBuf::from(reported,), docs_repo.join(reported,),].into_iter().find(|path| path.is_file(),)
}
