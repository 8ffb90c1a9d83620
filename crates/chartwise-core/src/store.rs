//! JSON snapshot store.
//!
//! A [`SnapshotStore`] is an in-memory map from store key to record that is
//! loaded from, and flushed back to, a single JSON object on disk. Entries
//! are write-once: inserting under a key that is already present leaves
//! the stored value untouched. Flushing writes the complete map to a
//! temporary file next to the snapshot and renames it into place, so an
//! interrupted flush leaves the previous snapshot readable.
//!
//! Only one process may own a snapshot file at a time; the store does not
//! lock it.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::model::{CatalogSongInfo, ChartRecord, ResolvedMatch, SongFeatures};

/// Store of resolved matches, keyed by dedup key (or catalog id for
/// album-expanded entries).
pub type MatchStore = SnapshotStore<ResolvedMatch>;

/// Store of songs with audio features, keyed by catalog id.
pub type FeatureStore = SnapshotStore<SongFeatures>;

/// Write-once key-value store persisted as a JSON snapshot.
#[derive(Debug)]
pub struct SnapshotStore<V> {
    path: PathBuf,
    entries: HashMap<String, V>,
}

impl<V> SnapshotStore<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Open the store at `path`, loading the snapshot if one exists.
    ///
    /// # Errors
    /// Returns [`Error::UnreadableSnapshot`] or [`Error::CorruptSnapshot`]
    /// when a file exists at `path` but cannot be loaded. A damaged snapshot
    /// is never treated as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<HashMap<String, V>>(&bytes).map_err(
                |source| Error::CorruptSnapshot {
                    path: path.clone(),
                    source,
                },
            )?,
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(source) => {
                return Err(Error::UnreadableSnapshot {
                    path: path.clone(),
                    source,
                })
            }
        };

        log::info!(
            "Opened store {} with {} entries",
            path.display(),
            entries.len()
        );

        Ok(Self { path, entries })
    }

    /// Insert `value` under `key` unless the key is already present.
    ///
    /// Returns `true` when the value was stored. An existing entry always
    /// wins; the rejected value is dropped and the collision logged.
    pub fn insert_if_absent(&mut self, key: String, value: V) -> bool {
        if self.entries.contains_key(&key) {
            log::info!("Key {:?} already stored, keeping existing entry", key);
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    /// Write the whole store to its snapshot path.
    ///
    /// # Errors
    /// Returns an error if the temporary file cannot be written or renamed
    /// over the snapshot.
    pub fn flush(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Sorted keys keep successive snapshots diffable.
        let ordered: BTreeMap<&String, &V> = self.entries.iter().collect();

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &ordered)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        log::info!(
            "Flushed {} entries to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl<V> SnapshotStore<V> {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter()
    }
}

impl SnapshotStore<ResolvedMatch> {
    /// Record `candidate` as the match found by `query`.
    ///
    /// The key is the source chart record's dedup key, or the candidate's
    /// catalog id when there is no chart record. Returns `true` when the
    /// match was stored.
    pub fn store_song(
        &mut self,
        query: &str,
        candidate: CatalogSongInfo,
        threshold: Option<u8>,
        source: Option<ChartRecord>,
    ) -> bool {
        let resolved = ResolvedMatch {
            song: candidate,
            search_query: query.to_string(),
            min_ratio: threshold,
            chart: source,
        };
        self.insert_if_absent(resolved.key(), resolved)
    }
}

impl SnapshotStore<SongFeatures> {
    /// Record the audio features of a song under its catalog id.
    pub fn store_features(&mut self, key: String, record: SongFeatures) -> bool {
        self.insert_if_absent(key, record)
    }
}

/// Chart records whose key is not in `store` yet.
///
/// Passing only these to the resolver makes repeated runs over a growing
/// chart dataset query the catalog for new entries only.
pub fn pending_records<'a>(
    records: &'a [ChartRecord],
    store: &MatchStore,
) -> Vec<&'a ChartRecord> {
    records
        .iter()
        .filter(|record| !store.contains_key(&record.key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CatalogArtist, FeatureVector};
    use tempfile::TempDir;

    fn hello() -> CatalogSongInfo {
        CatalogSongInfo::new("X", "Hello").with_artist(CatalogArtist::new("Adele", "adele"))
    }

    fn sample_features() -> FeatureVector {
        FeatureVector {
            time_signature: 4,
            duration_ms: 295_493,
            key: 5,
            mode: 0,
            acousticness: 0.33,
            danceability: 0.481,
            energy: 0.451,
            instrumentalness: 0.0,
            liveness: 0.0872,
            loudness: -6.134,
            speechiness: 0.0347,
            valence: 0.289,
            tempo: 157.966,
        }
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = MatchStore::open(dir.path().join("matches.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_song_uses_chart_key() {
        let dir = TempDir::new().unwrap();
        let mut store = MatchStore::open(dir.path().join("matches.json")).unwrap();

        let stored = store.store_song(
            "Hello",
            hello(),
            Some(100),
            Some(ChartRecord::new("Hello", "Adele")),
        );

        assert!(stored);
        let entry = store.get("HelloAdele").unwrap();
        assert_eq!(entry.song.id, "X");
        assert_eq!(entry.min_ratio, Some(100));
        assert_eq!(entry.search_query, "Hello");
    }

    #[test]
    fn test_store_song_without_chart_uses_catalog_id() {
        let dir = TempDir::new().unwrap();
        let mut store = MatchStore::open(dir.path().join("matches.json")).unwrap();

        store.store_song("Shares album with Hello", hello(), None, None);

        assert!(store.contains_key("X"));
    }

    #[test]
    fn test_existing_key_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let mut store = MatchStore::open(dir.path().join("matches.json")).unwrap();
        let chart = ChartRecord::new("Hello", "Adele");

        assert!(store.store_song("Hello", hello(), Some(100), Some(chart.clone())));
        let other = CatalogSongInfo::new("Y", "Hello (Live)");
        assert!(!store.store_song("Hello Adele", other, Some(90), Some(chart)));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("HelloAdele").unwrap().song.id, "X");
    }

    #[test]
    fn test_store_features_is_write_once() {
        let dir = TempDir::new().unwrap();
        let mut store = FeatureStore::open(dir.path().join("features.json")).unwrap();
        let info = ResolvedMatch::new(hello(), "Hello");

        assert!(store.store_features(
            "X".to_string(),
            SongFeatures::new(info.clone(), Some(sample_features()))
        ));
        assert!(!store.store_features("X".to_string(), SongFeatures::new(info, None)));

        assert!(store.get("X").unwrap().has_features());
    }

    #[test]
    fn test_flush_and_reopen_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("features.json");

        let mut store = FeatureStore::open(&path).unwrap();
        let hello_info = ResolvedMatch::new(hello(), "Hello")
            .with_min_ratio(100)
            .with_chart(ChartRecord::new("Hello", "Adele").with_date("2015-11-14"));
        store.store_features(
            "X".to_string(),
            SongFeatures::new(hello_info, Some(sample_features())),
        );
        store.store_features(
            "Z".to_string(),
            SongFeatures::new(
                ResolvedMatch::new(CatalogSongInfo::new("Z", "Remedy"), "Shares album with Hello"),
                None,
            ),
        );
        store.flush().unwrap();

        let reopened = FeatureStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        for (key, value) in store.iter() {
            assert_eq!(reopened.get(key), Some(value));
        }
    }

    #[test]
    fn test_flush_overwrites_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");

        let mut store = MatchStore::open(&path).unwrap();
        store.store_song("Hello", hello(), Some(100), None);
        store.flush().unwrap();
        store.store_song("Hello Adele", CatalogSongInfo::new("Y", "Hello"), Some(90), None);
        store.flush().unwrap();

        let reopened = MatchStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_corrupt_snapshot_fails_fast() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        fs::write(&path, "{\"HelloAdele\": {\"song\": ").unwrap();

        let err = MatchStore::open(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptSnapshot { .. }));
        assert!(err.to_string().contains("matches.json"));
    }

    #[test]
    fn test_snapshot_with_wrong_shape_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(
            MatchStore::open(&path),
            Err(Error::CorruptSnapshot { .. })
        ));
    }

    #[test]
    fn test_pending_records_skips_stored_keys() {
        let dir = TempDir::new().unwrap();
        let mut store = MatchStore::open(dir.path().join("matches.json")).unwrap();
        store.store_song(
            "Hello",
            hello(),
            Some(100),
            Some(ChartRecord::new("Hello", "Adele")),
        );

        let records = vec![
            ChartRecord::new("Hello", "Adele"),
            ChartRecord::new("Shake It Off", "Taylor Swift"),
        ];
        let pending = pending_records(&records, &store);

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].song, "Shake It Off");
    }
}
