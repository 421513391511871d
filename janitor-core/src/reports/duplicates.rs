use std::collections::BTreeMap;

use serde::Serialize;

use janitor_model::MediaRecord;

use super::{bytes_to_human, FileStats};

/// One title held in more than one file.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub title: String,
    pub year: Option<i32>,
    pub copies: usize,
    pub total_size_bytes: u64,
    pub total_size_human: String,
    /// Size of every copy except the largest.
    pub potential_savings_bytes: u64,
    pub potential_savings_human: String,
    pub files: Vec<FileStats>,
}

/// Titles with more than one file, and what removing the extras would save.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReport {
    pub count: usize,
    pub total_potential_savings_bytes: u64,
    pub total_potential_savings_human: String,
    pub duplicates: Vec<DuplicateGroup>,
}

/// Groups records by case-insensitive title and year, keeping groups with
/// more than one distinct path. Largest savings first.
pub fn find_duplicates(records: &[MediaRecord]) -> DuplicateReport {
    let mut groups: BTreeMap<(String, Option<i32>), Vec<&MediaRecord>> = BTreeMap::new();
    for record in records {
        let key = (record.title.trim().to_lowercase(), record.year);
        let entry = groups.entry(key).or_default();
        if !entry.iter().any(|r| r.path == record.path) {
            entry.push(record);
        }
    }

    let mut duplicates: Vec<DuplicateGroup> = groups
        .into_values()
        .filter(|members| members.len() > 1)
        .map(|members| {
            let mut files: Vec<FileStats> = members.iter().map(|r| FileStats::from(*r)).collect();
            files.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
            let total: u64 = files.iter().map(|f| f.size_bytes).sum();
            let largest = files.first().map(|f| f.size_bytes).unwrap_or(0);
            let savings = total - largest;
            DuplicateGroup {
                title: members[0].title.clone(),
                year: members[0].year,
                copies: files.len(),
                total_size_bytes: total,
                total_size_human: bytes_to_human(total),
                potential_savings_bytes: savings,
                potential_savings_human: bytes_to_human(savings),
                files,
            }
        })
        .collect();
    duplicates.sort_by(|a, b| {
        b.potential_savings_bytes
            .cmp(&a.potential_savings_bytes)
            .then_with(|| a.title.cmp(&b.title))
    });

    let total_savings = duplicates.iter().map(|d| d.potential_savings_bytes).sum();
    DuplicateReport {
        count: duplicates.len(),
        total_potential_savings_bytes: total_savings,
        total_potential_savings_human: bytes_to_human(total_savings),
        duplicates,
    }
}
