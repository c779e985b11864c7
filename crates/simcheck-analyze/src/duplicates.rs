//! Duplicate detection across registered projects.
//!
//! Three read-only passes over the registry:
//! 1. Group projects by project hash (whole-project copies)
//! 2. Compare unique file-hash sets pairwise (partial copies)
//! 3. Invert file hash -> submitters (files copied by many)
//!
//! Nothing here touches the filesystem; everything comes from the
//! fingerprints already stored in the registry.

use std::collections::{HashMap, HashSet};

use derive_builder::Builder;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use simcheck_core::{ContentHash, ProjectRecord, ProjectRegistry};

use crate::similarity::similarity_percent;

/// Thresholds for the duplication passes.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct AnalyzerConfig {
    /// Fewest shared file hashes for a pair to count as a partial copy.
    #[builder(default = "3")]
    pub min_common_files: usize,

    /// Fewest distinct submitters sharing a file for it to be listed.
    #[builder(default = "3")]
    pub min_shared_submitters: usize,
}

impl AnalyzerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.min_common_files == Some(0) {
            return Err("min_common_files must be at least 1".to_string());
        }
        if let Some(n) = self.min_shared_submitters
            && n < 2
        {
            return Err("min_shared_submitters must be at least 2".to_string());
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_common_files: 3,
            min_shared_submitters: 3,
        }
    }
}

impl AnalyzerConfig {
    /// Create a new config builder.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder::default()
    }
}

/// Submitters whose projects hash identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdenticalGroup {
    /// Members in identity order.
    pub members: Vec<String>,
    /// Shared project hash.
    pub project_hash: ContentHash,
    /// File count of the shared project.
    pub file_count: u64,
    /// Line count of the shared project.
    pub line_count: u64,
}

impl IdenticalGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// One shared file, named by where it lives in the first project of a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedFile {
    pub path: String,
    pub hash: ContentHash,
}

/// Two projects sharing a significant set of identical files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialOverlap {
    /// Lower identity of the pair.
    pub first: String,
    /// Higher identity of the pair.
    pub second: String,
    /// Shared percentage of the smaller project, in `[0, 100]`.
    pub similarity: f64,
    /// Number of shared distinct file hashes.
    pub common: usize,
    /// One entry per shared hash, ordered by path.
    pub shared: Vec<SharedFile>,
}

/// A file whose content appears in many submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MostDuplicated {
    /// Most common path among all occurrences.
    pub path: String,
    pub hash: ContentHash,
    /// Submitters containing the file, in identity order.
    pub submitters: Vec<String>,
}

impl MostDuplicated {
    /// Number of distinct submitters containing the file.
    pub fn count(&self) -> usize {
        self.submitters.len()
    }
}

/// Results of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicationResult {
    /// Projects in the registry at analysis time.
    pub projects_analyzed: usize,
    /// Identical groups, largest first.
    pub identical: Vec<IdenticalGroup>,
    /// Partial overlaps, most similar first.
    pub partial: Vec<PartialOverlap>,
    /// Widely shared files, most shared first.
    pub most_duplicated: Vec<MostDuplicated>,
}

impl DuplicationResult {
    /// Whether any copy was detected.
    pub fn has_findings(&self) -> bool {
        !self.identical.is_empty() || !self.partial.is_empty()
    }
}

/// Runs the duplication passes over a registry.
#[derive(Debug, Default)]
pub struct DuplicationAnalyzer {
    config: AnalyzerConfig,
}

impl DuplicationAnalyzer {
    /// Create a new analyzer with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new analyzer with custom thresholds.
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// The thresholds in use.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run all passes.
    pub fn analyze(&self, registry: &ProjectRegistry) -> DuplicationResult {
        let projects: Vec<(&str, &ProjectRecord)> = registry.projects().collect();

        let identical = self.identical_groups(&projects);
        let partial = self.partial_overlaps(&projects);
        let most_duplicated = self.most_duplicated(&projects);

        tracing::info!(
            projects = projects.len(),
            identical = identical.len(),
            partial = partial.len(),
            shared_files = most_duplicated.len(),
            "analysis complete"
        );

        DuplicationResult {
            projects_analyzed: projects.len(),
            identical,
            partial,
            most_duplicated,
        }
    }

    /// Projects with equal project hashes, in groups of two or more.
    pub fn identical_groups(&self, projects: &[(&str, &ProjectRecord)]) -> Vec<IdenticalGroup> {
        let by_hash = projects
            .iter()
            .copied()
            .into_group_map_by(|(_, record)| record.project_hash);

        let mut groups: Vec<IdenticalGroup> = by_hash
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(project_hash, members)| {
                let (_, sample) = members[0];
                IdenticalGroup {
                    members: members
                        .iter()
                        .map(|(id, _)| id.to_string())
                        .sorted()
                        .collect(),
                    project_hash,
                    file_count: sample.file_count,
                    line_count: sample.line_count,
                }
            })
            .collect();

        groups.sort_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then_with(|| a.members.first().cmp(&b.members.first()))
        });
        groups
    }

    /// Pairs of distinct projects sharing at least `min_common_files` hashes.
    ///
    /// Pairs with the same project hash are already covered by
    /// [`Self::identical_groups`] and are left out.
    pub fn partial_overlaps(&self, projects: &[(&str, &ProjectRecord)]) -> Vec<PartialOverlap> {
        let unique: Vec<HashSet<ContentHash>> =
            projects.iter().map(|(_, r)| r.unique_hashes()).collect();

        let mut overlaps = Vec::new();
        for (i, j) in (0..projects.len()).tuple_combinations() {
            let (id_a, rec_a) = projects[i];
            let (id_b, rec_b) = projects[j];
            if rec_a.project_hash == rec_b.project_hash {
                continue;
            }

            let common: Vec<&ContentHash> = unique[i].intersection(&unique[j]).collect();
            if common.len() < self.config.min_common_files {
                continue;
            }

            let similarity = similarity_percent(common.len(), unique[i].len(), unique[j].len());
            let shared = common
                .iter()
                .filter_map(|hash| {
                    rec_a.first_path_with(hash).map(|path| SharedFile {
                        path: path.to_string(),
                        hash: **hash,
                    })
                })
                .sorted_by(|a, b| a.path.cmp(&b.path))
                .collect();

            tracing::debug!(a = id_a, b = id_b, common = common.len(), similarity, "partial overlap");
            overlaps.push(PartialOverlap {
                first: id_a.to_string(),
                second: id_b.to_string(),
                similarity,
                common: common.len(),
                shared,
            });
        }

        overlaps.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| b.common.cmp(&a.common))
                .then_with(|| a.first.cmp(&b.first))
                .then_with(|| a.second.cmp(&b.second))
        });
        overlaps
    }

    /// Files present in at least `min_shared_submitters` projects.
    pub fn most_duplicated(&self, projects: &[(&str, &ProjectRecord)]) -> Vec<MostDuplicated> {
        #[derive(Default)]
        struct Occurrences<'a> {
            submitters: Vec<&'a str>,
            paths: IndexMap<&'a str, usize>,
        }

        let mut by_hash: HashMap<ContentHash, Occurrences<'_>> = HashMap::new();
        for &(identity, record) in projects {
            for (path, hash) in &record.files {
                let occ = by_hash.entry(*hash).or_default();
                if occ.submitters.last() != Some(&identity) {
                    occ.submitters.push(identity);
                }
                *occ.paths.entry(path.as_str()).or_insert(0) += 1;
            }
        }

        let mut files: Vec<MostDuplicated> = by_hash
            .into_iter()
            .filter(|(_, occ)| occ.submitters.len() >= self.config.min_shared_submitters)
            .filter_map(|(hash, occ)| {
                // Reversed so ties go to the first path seen.
                let (path, _) = occ.paths.iter().rev().max_by_key(|(_, n)| **n)?;
                Some(MostDuplicated {
                    path: path.to_string(),
                    hash,
                    submitters: occ.submitters.iter().map(|s| s.to_string()).collect(),
                })
            })
            .collect();

        files.sort_by(|a, b| {
            b.count()
                .cmp(&a.count())
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.hash.cmp(&b.hash))
        });
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simcheck_core::ProjectFingerprint;
    use std::collections::BTreeMap;

    fn h(n: u8) -> ContentHash {
        ContentHash::new([n; 32])
    }

    fn record(project: u8, files: &[(&str, u8)]) -> ProjectRecord {
        let file_hashes: BTreeMap<String, ContentHash> =
            files.iter().map(|(p, n)| (p.to_string(), h(*n))).collect();
        ProjectRecord::new(
            ProjectFingerprint {
                project_hash: h(project),
                file_count: file_hashes.len() as u64,
                line_count: 10,
                file_hashes,
            },
            chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .unwrap(),
        )
    }

    #[test]
    fn test_config_builder() {
        let config = AnalyzerConfig::builder()
            .min_common_files(5usize)
            .build()
            .unwrap();
        assert_eq!(config.min_common_files, 5);
        assert_eq!(config.min_shared_submitters, 3);

        assert!(AnalyzerConfig::builder().min_common_files(0usize).build().is_err());
        assert!(AnalyzerConfig::builder().min_shared_submitters(1usize).build().is_err());
    }

    #[test]
    fn test_identical_group_ordering() {
        let a = record(1, &[("A.java", 10)]);
        let b = record(2, &[("B.java", 11)]);
        let projects = vec![
            ("ana", &a),
            ("bruno", &b),
            ("carla", &a),
            ("diego", &b),
            ("elena", &b),
        ];

        let groups = DuplicationAnalyzer::new().identical_groups(&projects);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec!["bruno", "diego", "elena"]);
        assert_eq!(groups[1].members, vec!["ana", "carla"]);
        assert_eq!(groups[1].project_hash, h(1));
    }

    #[test]
    fn test_shared_examples_use_first_path_of_first_project() {
        let a = record(1, &[("a/Copy.java", 5), ("b/Copy.java", 5), ("X.java", 6), ("Y.java", 7)]);
        let b = record(2, &[("Other.java", 5), ("X.java", 6), ("Y.java", 7)]);
        let projects = vec![("ana", &a), ("bruno", &b)];

        let overlaps = DuplicationAnalyzer::new().partial_overlaps(&projects);
        assert_eq!(overlaps.len(), 1);
        let paths: Vec<_> = overlaps[0].shared.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["X.java", "Y.java", "a/Copy.java"]);
        assert_eq!(overlaps[0].similarity, 100.0);
    }

    #[test]
    fn test_most_duplicated_representative_path() {
        let a = record(1, &[("Util.java", 9)]);
        let b = record(2, &[("Helper.java", 9)]);
        let c = record(3, &[("Helper.java", 9)]);
        let d = record(4, &[("Util.java", 9), ("lib/Util.java", 9)]);
        let projects = vec![("ana", &a), ("bruno", &b), ("carla", &c), ("diego", &d)];

        let files = DuplicationAnalyzer::new().most_duplicated(&projects);
        assert_eq!(files.len(), 1);
        // Util.java and Helper.java both appear twice; Util.java was seen first.
        assert_eq!(files[0].path, "Util.java");
        assert_eq!(files[0].count(), 4);
        assert_eq!(files[0].submitters, vec!["ana", "bruno", "carla", "diego"]);
    }
}
