use lsif_correlate::config::{CorrelationConfig, GroupingConfig};
use lsif_correlate::storage::BundleMetadata;
use lsif_correlate::{BundlePersistence, WorkingTree, correlate};
use std::fs;
use tempfile::TempDir;

const DUMP: &str = r#"{"id":1,"type":"vertex","label":"metaData","version":"0.4.3","projectRoot":"file:///work"}
{"id":2,"type":"vertex","label":"document","uri":"file:///work/src/main.rs"}
{"id":3,"type":"vertex","label":"document","uri":"file:///work/src/deleted.rs"}
{"id":4,"type":"vertex","label":"range","start":{"line":0,"character":3},"end":{"line":0,"character":7}}
{"id":5,"type":"vertex","label":"range","start":{"line":2,"character":4},"end":{"line":2,"character":8}}
{"id":6,"type":"edge","label":"contains","outV":2,"inVs":[4,5]}
{"id":7,"type":"vertex","label":"definitionResult"}
{"id":8,"type":"edge","label":"textDocument/definition","outV":5,"inV":7}
{"id":9,"type":"edge","label":"item","outV":7,"inVs":[4],"document":2}
"#;

#[test]
fn test_correlate_working_tree_and_persist() {
    let repo = TempDir::new().unwrap();
    fs::create_dir_all(repo.path().join("src")).unwrap();
    fs::write(repo.path().join("src/main.rs"), "fn main() {}\n").unwrap();

    let config = CorrelationConfig {
        dump_id: 11,
        ..Default::default()
    };
    let tree = WorkingTree::new(repo.path(), false);
    let (bundle, stats) = correlate(DUMP.as_bytes(), &config, &GroupingConfig::default(), &tree)
        .unwrap();

    assert_eq!(stats.pruned_documents, 1);
    let paths: Vec<_> = bundle.documents.keys().cloned().collect();
    assert_eq!(paths, vec!["src/main.rs"]);
    assert_eq!(
        bundle.documents["src/main.rs"].ranges["5"].definition_result_id,
        "7"
    );

    let output = TempDir::new().unwrap();
    let persistence = BundlePersistence::new(output.path().join("11"));
    let metadata = persistence.save(11, &bundle, &stats).unwrap();

    assert_eq!(metadata.dump_id, 11);
    assert_eq!(metadata.document_count, 1);
    assert_eq!(metadata.pruned_documents, 1);
    assert_eq!(persistence.load().unwrap(), bundle);
    assert_eq!(
        BundleMetadata::load(persistence.base_path()).unwrap(),
        metadata
    );
}
