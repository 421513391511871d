use std::collections::{HashMap, HashSet};

use janitor_model::{MediaRecord, MediaType, SourceFilter};

/// Path index over every source instance.
///
/// `flat` is last-write-wins and only answers "is this path known at all".
/// Routing decisions go through the per-instance maps, consulted in
/// `instance_order`, so a path reported by several instances resolves to the
/// earliest one.
#[derive(Debug, Default)]
pub(crate) struct CatalogIndex {
    flat: HashMap<String, MediaRecord>,
    by_instance: HashMap<String, HashMap<String, MediaRecord>>,
    instance_order: Vec<String>,
}

impl CatalogIndex {
    pub fn with_instances<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for name in names {
            index.ensure_instance(name);
        }
        index
    }

    fn ensure_instance(&mut self, name: &str) {
        if !self.instance_order.iter().any(|n| n == name) {
            self.instance_order.push(name.to_string());
        }
    }

    /// Swaps in a fresh snapshot for one instance.
    pub fn replace_instance(&mut self, name: &str, records: Vec<MediaRecord>) {
        self.ensure_instance(name);
        let map = records
            .into_iter()
            .map(|record| (record.path.clone(), record))
            .collect();
        self.by_instance.insert(name.to_string(), map);
        self.rebuild_flat();
    }

    fn rebuild_flat(&mut self) {
        self.flat.clear();
        for name in &self.instance_order {
            if let Some(map) = self.by_instance.get(name) {
                for (path, record) in map {
                    self.flat.insert(path.clone(), record.clone());
                }
            }
        }
    }

    pub fn upsert(&mut self, record: MediaRecord) {
        self.ensure_instance(&record.instance);
        self.flat.insert(record.path.clone(), record.clone());
        self.by_instance
            .entry(record.instance.clone())
            .or_default()
            .insert(record.path.clone(), record);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.flat.contains_key(path)
    }

    /// Instances holding `path`, in resolution order.
    pub fn owners(&self, path: &str) -> Vec<&str> {
        self.instance_order
            .iter()
            .filter(|name| {
                self.by_instance
                    .get(name.as_str())
                    .is_some_and(|map| map.contains_key(path))
            })
            .map(String::as_str)
            .collect()
    }

    pub fn find(&self, path: &str) -> Option<&MediaRecord> {
        self.instance_order.iter().find_map(|name| {
            self.by_instance.get(name).and_then(|map| map.get(path))
        })
    }

    /// Paths reported by more than one instance, sorted.
    pub fn collisions(&self) -> Vec<(String, Vec<String>)> {
        let mut seen: HashMap<&str, Vec<String>> = HashMap::new();
        for name in &self.instance_order {
            if let Some(map) = self.by_instance.get(name) {
                for path in map.keys() {
                    seen.entry(path.as_str()).or_default().push(name.clone());
                }
            }
        }
        let mut collisions: Vec<(String, Vec<String>)> = seen
            .into_iter()
            .filter(|(_, owners)| owners.len() > 1)
            .map(|(path, owners)| (path.to_string(), owners))
            .collect();
        collisions.sort();
        collisions
    }

    /// Every record of every instance matching `filter`, instance order
    /// first, then path.
    pub fn records(&self, filter: SourceFilter) -> Vec<MediaRecord> {
        let mut out = Vec::new();
        for name in &self.instance_order {
            let Some(map) = self.by_instance.get(name) else {
                continue;
            };
            let mut records: Vec<&MediaRecord> = map
                .values()
                .filter(|r| filter.includes(r.media_type()))
                .collect();
            records.sort_by(|a, b| a.path.cmp(&b.path));
            out.extend(records.into_iter().cloned());
        }
        out
    }

    /// One record per path (the resolving one) for a media type.
    pub fn unique_records(&self, media_type: MediaType) -> Vec<MediaRecord> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for record in self.records(SourceFilter::All) {
            if record.media_type() == media_type && seen.insert(record.path.clone())
            {
                out.push(record);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }
}

#[cfg(test)]
mod tests {
    use janitor_model::{DeletionKey, SearchKey, SourceKind};

    use super::*;

    fn record(instance: &str, path: &str, file: i64) -> MediaRecord {
        MediaRecord {
            title: "T".into(),
            path: path.into(),
            search_key: SearchKey::new(1),
            deletion_key: DeletionKey::new(file),
            quality: String::new(),
            size_bytes: 1,
            source: SourceKind::Sonarr,
            instance: instance.into(),
            year: None,
            folder_path: None,
            series_id: None,
            episode_id: None,
            coordinates: None,
        }
    }

    #[test]
    fn resolution_follows_instance_order_not_insert_order() {
        let mut index = CatalogIndex::with_instances(["sonarr", "sonarr-anime"]);
        index.replace_instance("sonarr-anime", vec![record("sonarr-anime", "/tv/a.mkv", 2)]);
        index.replace_instance("sonarr", vec![record("sonarr", "/tv/a.mkv", 1)]);

        assert_eq!(index.find("/tv/a.mkv").unwrap().instance, "sonarr");
        assert_eq!(index.owners("/tv/a.mkv"), ["sonarr", "sonarr-anime"]);
        assert_eq!(index.collisions().len(), 1);
        assert_eq!(index.unique_records(MediaType::Tv).len(), 1);
        assert_eq!(index.records(SourceFilter::Tv).len(), 2);
    }

    #[test]
    fn upserted_instances_resolve_after_configured_ones() {
        let mut index = CatalogIndex::with_instances(["sonarr"]);
        index.upsert(record("webhook-only", "/tv/b.mkv", 3));
        index.replace_instance("sonarr", vec![record("sonarr", "/tv/b.mkv", 4)]);

        assert_eq!(index.find("/tv/b.mkv").unwrap().deletion_key.get(), 4);
        assert!(index.contains("/tv/b.mkv"));
        assert_eq!(index.len(), 1);
    }
}
