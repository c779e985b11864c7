use std::collections::BTreeMap;
use std::fs;

use simcheck_analyze::{AnalyzerConfig, DuplicationAnalyzer, SimilarityReport};
use simcheck_core::{ProjectRegistry, RegistryStore, fingerprint_project};
use tempfile::TempDir;

const X: &str = "public class Main {\n    public static void main(String[] a) {}\n}\n";
const Y: &str = "class Util {\n    static int twice(int n) { return 2 * n; }\n}\n";
const Z: &str = "class Helper {\n    void help() {}\n}\n";
const W: &str = "class Other {\n    int value;\n}\n";

fn registry(projects: &[(&str, &[(&str, &str)])]) -> ProjectRegistry {
    let mut registry = ProjectRegistry::new();
    for (identity, files) in projects {
        let files: BTreeMap<String, String> = files
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect();
        registry.upsert(*identity, fingerprint_project(&files));
    }
    registry
}

#[test]
fn test_analyzer_config_defaults() {
    let config = AnalyzerConfig::default();
    assert_eq!(config.min_common_files, 3);
    assert_eq!(config.min_shared_submitters, 3);

    let built = AnalyzerConfig::builder().build().unwrap();
    assert_eq!(built.min_common_files, config.min_common_files);
}

#[test]
fn test_two_common_files_are_not_reported() {
    let registry = registry(&[
        ("ana", &[("Main.java", X), ("Util.java", Y), ("Helper.java", Z)]),
        ("bruno", &[("Main.java", X), ("Util.java", Y), ("Other.java", W)]),
    ]);

    let result = DuplicationAnalyzer::new().analyze(&registry);
    assert!(result.partial.is_empty());
    assert!(result.identical.is_empty());
    assert!(!result.has_findings());
}

#[test]
fn test_third_common_file_reaches_full_similarity() {
    let registry = registry(&[
        ("ana", &[("Main.java", X), ("Util.java", Y), ("Helper.java", Z)]),
        (
            "bruno",
            &[
                ("Main.java", X),
                ("Util.java", Y),
                ("Other.java", W),
                ("Helper2.java", Z),
            ],
        ),
    ]);

    let result = DuplicationAnalyzer::new().analyze(&registry);
    assert_eq!(result.partial.len(), 1);

    let overlap = &result.partial[0];
    assert_eq!((overlap.first.as_str(), overlap.second.as_str()), ("ana", "bruno"));
    assert_eq!(overlap.common, 3);
    assert_eq!(overlap.similarity, 100.0);

    let names: Vec<_> = overlap.shared.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(names, vec!["Helper.java", "Main.java", "Util.java"]);
}

#[test]
fn test_reformatted_copy_is_partial_not_identical() {
    let reformatted_x = "public class Main {\r\n\tpublic static void main(String[] a) {}\r\n}";
    let registry = registry(&[
        ("ana", &[("Main.java", X), ("Util.java", Y), ("Helper.java", Z)]),
        (
            "bruno",
            &[("Main.java", reformatted_x), ("Util.java", Y), ("Helper.java", Z)],
        ),
    ]);

    let result = DuplicationAnalyzer::new().analyze(&registry);
    assert!(result.identical.is_empty());
    assert_eq!(result.partial.len(), 1);
    assert_eq!(result.partial[0].similarity, 100.0);
}

#[test]
fn test_identical_projects_are_grouped_and_not_paired() {
    let project: &[(&str, &str)] = &[("Main.java", X), ("Util.java", Y), ("Helper.java", Z)];
    let registry = registry(&[
        ("ana", project),
        ("bruno", &[("Main.java", X)]),
        ("carla", project),
        ("diego", project),
    ]);

    let result = DuplicationAnalyzer::new().analyze(&registry);
    assert_eq!(result.identical.len(), 1);

    let group = &result.identical[0];
    assert_eq!(group.members, vec!["ana", "carla", "diego"]);
    assert_eq!(group.file_count, 3);
    assert_eq!(group.project_hash, registry.get("ana").unwrap().project_hash);
    assert!(result.partial.is_empty());
}

#[test]
fn test_similarity_is_bounded() {
    let registry = registry(&[
        ("ana", &[("A.java", X), ("B.java", Y), ("C.java", Z), ("D.java", W)]),
        ("bruno", &[("A.java", X), ("B.java", Y), ("C.java", Z), ("E.java", "class E {}")]),
        ("carla", &[("A.java", X), ("B.java", Y), ("C.java", Z)]),
        ("diego", &[("A.java", X), ("A2.java", X), ("B.java", Y), ("C.java", Z)]),
    ]);

    let result = DuplicationAnalyzer::new().analyze(&registry);
    assert!(!result.partial.is_empty());
    for overlap in &result.partial {
        assert!((0.0..=100.0).contains(&overlap.similarity));
    }

    // ana/bruno share 3 of 4 unique hashes each.
    let ana_bruno = result
        .partial
        .iter()
        .find(|o| o.first == "ana" && o.second == "bruno")
        .unwrap();
    assert_eq!(ana_bruno.similarity, 75.0);

    // Sorted by similarity, highest first.
    assert!(
        result
            .partial
            .windows(2)
            .all(|w| w[0].similarity >= w[1].similarity)
    );
}

#[test]
fn test_most_duplicated_files() {
    let registry = registry(&[
        ("ana", &[("Main.java", X), ("Util.java", Y)]),
        ("bruno", &[("Main.java", X), ("Tools.java", Y)]),
        ("carla", &[("src/Main.java", X), ("Util.java", Y)]),
        ("diego", &[("Main.java", X), ("Other.java", W)]),
    ]);

    let result = DuplicationAnalyzer::new().analyze(&registry);
    let files: Vec<_> = result
        .most_duplicated
        .iter()
        .map(|f| (f.path.as_str(), f.count()))
        .collect();
    assert_eq!(files, vec![("Main.java", 4), ("Util.java", 3)]);
    assert_eq!(
        result.most_duplicated[1].submitters,
        vec!["ana", "bruno", "carla"]
    );

    let relaxed = DuplicationAnalyzer::with_config(
        AnalyzerConfig::builder()
            .min_shared_submitters(5usize)
            .build()
            .unwrap(),
    );
    assert!(relaxed.analyze(&registry).most_duplicated.is_empty());
}

#[test]
fn test_empty_registry() {
    let result = DuplicationAnalyzer::new().analyze(&ProjectRegistry::new());
    assert_eq!(result.projects_analyzed, 0);
    assert!(!result.has_findings());
    assert!(result.most_duplicated.is_empty());
}

#[test]
fn test_report_from_saved_registry() {
    let temp = TempDir::new().unwrap();
    let store = RegistryStore::in_dir(temp.path());
    let project: &[(&str, &str)] = &[("Main.java", X), ("Util.java", Y), ("Helper.java", Z)];
    let mut original = registry(&[("ana", project), ("bruno", project), ("carla", &[("W.java", W)])]);
    store.save(&mut original).unwrap();

    let (loaded, _) = store.load();
    let result = DuplicationAnalyzer::new().analyze(&loaded);
    let report = SimilarityReport::assemble(&loaded, &result);

    assert_eq!(report.projects_analyzed, 3);
    assert_eq!(report.identical_count, 1);
    assert!(report.needs_attention());

    let path = temp.path().join(simcheck_analyze::REPORT_FILE_NAME);
    report.write_json(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["proyectos_identicos"][0]["alumnos"][0], "ana");
    assert_eq!(value["proyectos_identicos"][0]["archivos_identicos"], 3);
    assert!(
        value["proyectos_identicos"][0]["hash_proyecto"]
            .as_str()
            .unwrap()
            .ends_with("...")
    );
}
