//! Join tree construction, search and serialization.

use insta::assert_snapshot;
use reportwright::join::JoinTree;

fn tree() -> JoinTree {
    let mut tree = JoinTree::new();
    tree.insert(&["hardware"], "cpu_speed");
    tree.insert(&["hardware", "disks"], "size");
    tree.insert(&["host"], "name");
    tree.insert(&["storages"], "name");
    tree
}

#[test]
fn test_serializes_in_insertion_order() {
    let json = serde_json::to_string(&tree()).unwrap();
    assert_snapshot!(json, @r#"{"hardware":{"columns":["cpu_speed"],"include":{"disks":{"columns":["size"]}}},"host":{"columns":["name"]},"storages":{"columns":["name"]}}"#);
}

#[test]
fn test_deserialize_keeps_document_order() {
    let tree: JoinTree =
        serde_json::from_str(r#"{"zeta": {"columns": ["a"]}, "alpha": {"columns": ["b"]}}"#)
            .unwrap();
    let names: Vec<&str> = tree.tables().map(|(name, _)| name).collect();
    assert_eq!(names, ["zeta", "alpha"]);
    assert_eq!(serde_json::to_string(&tree).unwrap(), r#"{"zeta":{"columns":["a"]},"alpha":{"columns":["b"]}}"#);
}

#[test]
fn test_insert_is_idempotent() {
    let mut tree = tree();
    let before = tree.clone();
    tree.insert(&["hardware", "disks"], "size");
    tree.insert(&[] as &[&str], "name");
    assert_eq!(tree, before);
}

#[test]
fn test_intermediate_table_without_columns() {
    let mut tree = JoinTree::new();
    tree.insert(&["hardware", "disks"], "size");
    let hardware = tree.table("hardware").unwrap();
    assert!(hardware.columns.is_empty());
    assert_eq!(
        serde_json::to_string(&tree).unwrap(),
        r#"{"hardware":{"include":{"disks":{"columns":["size"]}}}}"#
    );
}

#[test]
fn test_node_lookup() {
    let tree = tree();
    let path = vec!["hardware".to_string(), "disks".to_string()];
    assert_eq!(tree.node(&path).unwrap().columns, ["size"]);
    assert!(tree.node(&["disks".to_string()]).is_none());
    assert!(tree.node(&[]).is_none());
}

#[test]
fn test_resolve_nested_column() {
    assert_eq!(
        tree().resolve_join_path("size"),
        Some(vec!["hardware".to_string(), "disks".to_string()])
    );
}

#[test]
fn test_first_joined_table_wins_for_shared_column_names() {
    // host and storages both pull `name`; without a hint host was joined first.
    assert_eq!(tree().resolve_join_path("name"), Some(vec!["host".to_string()]));
    assert_eq!(
        tree().resolve_join_path("storages.name"),
        Some(vec!["storages".to_string()])
    );
}

#[test]
fn test_hint_must_match_path_suffix() {
    let tree = tree();
    assert_eq!(
        tree.resolve_join_path("hardware.disks.size"),
        Some(vec!["hardware".to_string(), "disks".to_string()])
    );
    assert_eq!(tree.resolve_join_path("host.size"), None);
    assert_eq!(tree.resolve_join_path("missing"), None);
}
