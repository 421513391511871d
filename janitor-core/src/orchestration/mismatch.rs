//! Heuristic check that a movie file plausibly belongs to its catalog title.

use std::collections::HashSet;

use serde::Serialize;

use janitor_model::MediaRecord;

/// Title words too common to count as evidence either way.
const FILLER_WORDS: &[&str] = &["the", "a", "an", "and", "of"];

/// Evidence that a file is not the title its catalog claims.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathMismatch {
    pub title: String,
    pub file_path: String,
    pub expected_folder: String,
    pub actual_filename: String,
    pub overlap: f64,
    pub instance: String,
}

impl PathMismatch {
    /// Error appended to a validation result that passed technically.
    pub fn error_message(&self) -> String {
        format!(
            "Wrong file: expected '{}' but found '{}'",
            self.expected_folder, self.actual_filename
        )
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= 4 => stem,
        _ => file_name,
    }
}

/// Compares a movie's title with its file name. Episodes are never flagged;
/// their titles are synthesised from series names.
///
/// A file matches when at least `threshold` of the significant title words
/// appear in the file name, or when the normalised title is contained in the
/// normalised file name.
pub fn detect_path_mismatch(
    record: &MediaRecord,
    threshold: f64,
) -> Option<PathMismatch> {
    if !record.is_movie() {
        return None;
    }
    let actual_filename = record.file_name().to_string();
    let file_norm = normalize(stem(&actual_filename));

    let year = record.year.map(|y| y.to_string());
    let title_norm = normalize(&record.title);
    let title_words: Vec<&str> = title_norm
        .split(' ')
        .filter(|w| !w.is_empty() && Some(*w) != year.as_deref())
        .collect();
    let significant: Vec<&str> = {
        let kept: Vec<&str> = title_words
            .iter()
            .copied()
            .filter(|w| !FILLER_WORDS.contains(w))
            .collect();
        if kept.is_empty() { title_words.clone() } else { kept }
    };
    if significant.is_empty() {
        return None;
    }

    let title_core = title_words.join(" ");
    let compact = |s: &str| s.replace(' ', "");
    if file_norm.contains(&title_core)
        || compact(&file_norm).contains(&compact(&title_core))
    {
        return None;
    }

    let file_words: HashSet<&str> = file_norm.split(' ').collect();
    let hits = significant.iter().filter(|w| file_words.contains(*w)).count();
    let overlap = hits as f64 / significant.len() as f64;
    if overlap >= threshold {
        return None;
    }

    let expected_folder = record
        .folder_path
        .as_deref()
        .and_then(|p| p.trim_end_matches(['/', '\\']).rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| record.title.clone());

    Some(PathMismatch {
        title: record.title.clone(),
        file_path: record.path.clone(),
        expected_folder,
        actual_filename,
        overlap,
        instance: record.instance.clone(),
    })
}
