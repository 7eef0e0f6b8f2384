//! In-memory region directory
//!
//! An explicitly owned cache of region metadata with its own lifecycle:
//! `load()` once at startup, `resolve()` thereafter. Loads are additive and
//! all-or-nothing at the top level: a malformed response leaves the mapping
//! untouched, while individual nameless entries are skipped.

use crate::error::TenkiError;
use crate::jma::MetadataSource;
use crate::models::Region;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub struct RegionDirectory {
    source: Arc<dyn MetadataSource>,
    regions: RwLock<HashMap<String, Region>>,
}

impl RegionDirectory {
    #[must_use]
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            regions: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the region directory and merge it into the mapping.
    ///
    /// Returns the number of regions applied. Repeated loads overwrite
    /// existing entries but never shrink the set.
    pub async fn load(&self) -> Result<usize> {
        let directory = self.source.fetch_directory().await?;

        let offices = directory.offices.ok_or_else(|| {
            TenkiError::malformed_metadata("response is missing the region collection")
        })?;

        let mut regions = self.regions.write().await;
        let mut applied = 0;
        for (code, entry) in offices {
            match entry.name {
                Some(name) if !name.is_empty() => {
                    regions.insert(code.clone(), Region::new(code, name));
                    applied += 1;
                }
                _ => warn!(code = %code, "skipping region entry without a name"),
            }
        }

        info!(applied, total = regions.len(), "region directory loaded");
        Ok(applied)
    }

    /// Look up a region by code
    pub async fn resolve(&self, code: &str) -> Result<Region> {
        self.regions
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| TenkiError::unknown_region(code))
    }

    /// All loaded regions, sorted by code for deterministic display
    pub async fn regions(&self) -> Vec<Region> {
        let mut regions: Vec<Region> = self.regions.read().await.values().cloned().collect();
        regions.sort_by(|a, b| a.code.cmp(&b.code));
        regions
    }

    pub async fn len(&self) -> usize {
        self.regions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.regions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jma::{AreaDirectory, AreaEntry};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Mock metadata source returning a queue of canned responses
    struct FakeMetadata {
        responses: Mutex<Vec<Result<AreaDirectory>>>,
    }

    impl FakeMetadata {
        fn new(responses: Vec<Result<AreaDirectory>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl MetadataSource for FakeMetadata {
        async fn fetch_directory(&self) -> Result<AreaDirectory> {
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn directory_of(entries: &[(&str, Option<&str>)]) -> AreaDirectory {
        AreaDirectory {
            offices: Some(
                entries
                    .iter()
                    .map(|(code, name)| {
                        (
                            code.to_string(),
                            AreaEntry {
                                name: name.map(|n| n.to_string()),
                            },
                        )
                    })
                    .collect(),
            ),
        }
    }

    #[tokio::test]
    async fn test_load_and_resolve() {
        let source = FakeMetadata::new(vec![Ok(directory_of(&[
            ("130000", Some("東京都")),
            ("270000", Some("大阪府")),
        ]))]);
        let directory = RegionDirectory::new(source);

        assert_eq!(directory.load().await.unwrap(), 2);

        let tokyo = directory.resolve("130000").await.unwrap();
        assert_eq!(tokyo.name, "東京都");
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let source = FakeMetadata::new(vec![Ok(directory_of(&[("130000", Some("東京都"))]))]);
        let directory = RegionDirectory::new(source);
        directory.load().await.unwrap();

        let err = directory.resolve("999999").await.unwrap_err();
        assert!(matches!(err, TenkiError::UnknownRegion { .. }));
    }

    #[tokio::test]
    async fn test_malformed_load_leaves_directory_unchanged() {
        let source = FakeMetadata::new(vec![
            Ok(directory_of(&[("130000", Some("東京都"))])),
            Ok(AreaDirectory { offices: None }),
        ]);
        let directory = RegionDirectory::new(source);
        directory.load().await.unwrap();

        let err = directory.load().await.unwrap_err();
        assert!(matches!(err, TenkiError::MalformedMetadata { .. }));

        // Earlier load survives untouched
        assert_eq!(directory.len().await, 1);
        assert!(directory.resolve("130000").await.is_ok());
    }

    #[tokio::test]
    async fn test_nameless_entries_skipped_not_fatal() {
        let source = FakeMetadata::new(vec![Ok(directory_of(&[
            ("130000", Some("東京都")),
            ("999000", None),
            ("998000", Some("")),
        ]))]);
        let directory = RegionDirectory::new(source);

        assert_eq!(directory.load().await.unwrap(), 1);
        assert!(directory.resolve("999000").await.is_err());
        assert!(directory.resolve("998000").await.is_err());
    }

    #[tokio::test]
    async fn test_reload_is_additive_and_overwrites_names() {
        let source = FakeMetadata::new(vec![
            Ok(directory_of(&[("130000", Some("東京都"))])),
            Ok(directory_of(&[
                ("130000", Some("東京")),
                ("270000", Some("大阪府")),
            ])),
        ]);
        let directory = RegionDirectory::new(source);

        directory.load().await.unwrap();
        directory.load().await.unwrap();

        assert_eq!(directory.len().await, 2);
        assert_eq!(directory.resolve("130000").await.unwrap().name, "東京");
    }

    #[tokio::test]
    async fn test_regions_sorted_by_code() {
        let source = FakeMetadata::new(vec![Ok(directory_of(&[
            ("270000", Some("大阪府")),
            ("130000", Some("東京都")),
            ("016000", Some("石狩・空知・後志地方")),
        ]))]);
        let directory = RegionDirectory::new(source);
        directory.load().await.unwrap();

        let regions = directory.regions().await;
        let codes: Vec<&str> = regions.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["016000", "130000", "270000"]);
    }
}
