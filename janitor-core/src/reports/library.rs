use std::collections::BTreeMap;

use serde::Serialize;

use janitor_model::MediaRecord;

use super::bytes_to_human;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileStats {
    pub title: String,
    pub file_path: String,
    pub size_bytes: u64,
    pub size_human: String,
    pub quality: String,
    pub instance: String,
}

impl From<&MediaRecord> for FileStats {
    fn from(record: &MediaRecord) -> Self {
        Self {
            title: record.title.clone(),
            file_path: record.path.clone(),
            size_bytes: record.size_bytes,
            size_human: bytes_to_human(record.size_bytes),
            quality: if record.quality.is_empty() {
                "Unknown".to_string()
            } else {
                record.quality.clone()
            },
            instance: record.instance.clone(),
        }
    }
}

/// Size and quality breakdown of the cached library.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryReport {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub total_size_human: String,
    pub largest_files: Vec<FileStats>,
    pub smallest_files: Vec<FileStats>,
    pub files_by_quality: BTreeMap<String, usize>,
    pub files_by_instance: BTreeMap<String, usize>,
}

/// Size statistics for the given records. Records with an empty path or a
/// zero size are left out.
pub fn library_report(records: &[MediaRecord], top_n: usize) -> LibraryReport {
    let mut files: Vec<FileStats> = records
        .iter()
        .filter(|r| !r.path.is_empty() && r.size_bytes > 0)
        .map(FileStats::from)
        .collect();
    files.sort_by(|a, b| {
        b.size_bytes
            .cmp(&a.size_bytes)
            .then_with(|| a.file_path.cmp(&b.file_path))
    });

    let total_size_bytes = files.iter().map(|f| f.size_bytes).sum();
    let mut files_by_quality = BTreeMap::new();
    let mut files_by_instance = BTreeMap::new();
    for file in &files {
        *files_by_quality.entry(file.quality.clone()).or_insert(0) += 1;
        *files_by_instance.entry(file.instance.clone()).or_insert(0) += 1;
    }

    let largest_files = files.iter().take(top_n).cloned().collect();
    let smallest_files = files.iter().rev().take(top_n).cloned().collect();

    LibraryReport {
        total_files: files.len(),
        total_size_bytes,
        total_size_human: bytes_to_human(total_size_bytes),
        largest_files,
        smallest_files,
        files_by_quality,
        files_by_instance,
    }
}
