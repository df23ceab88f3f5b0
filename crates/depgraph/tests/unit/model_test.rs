//! Unit tests for coordinates, versions and relationships.

use crate::common::{dep, gav};
use depgraph::{
    ArtifactInfo, DependencyScope, GraphError, ProjectRef, ProjectVersionRef, Relationship,
    RelationshipType, VersionSpec,
};

#[test]
fn test_coordinate_parsing() {
    let project = gav("org.acme:app:1.0");
    assert_eq!(project.group_id(), "org.acme");
    assert_eq!(project.artifact_id(), "app");
    assert_eq!(project.version(), "1.0");
    assert_eq!(project.to_string(), "org.acme:app:1.0");
    assert_eq!(project.project_ref(), ProjectRef::parse("org.acme:app").unwrap());

    assert!(matches!(
        ProjectVersionRef::parse("org.acme:app"),
        Err(GraphError::InvalidCoordinate { .. })
    ));
    assert!(ProjectVersionRef::parse(":app:1.0").is_err());
}

#[test]
fn test_version_kinds() {
    assert_eq!(
        VersionSpec::parse("1.2.3").unwrap(),
        VersionSpec::Single("1.2.3".to_string())
    );
    assert!(matches!(VersionSpec::parse("[1.0,2.0)").unwrap(), VersionSpec::Range(_)));
    assert!(matches!(
        VersionSpec::parse("${project.version}").unwrap(),
        VersionSpec::Expression(_)
    ));
    assert!(matches!(VersionSpec::parse("LATEST").unwrap(), VersionSpec::Meta(_)));

    assert!(VersionSpec::parse("").is_err());
    assert!(VersionSpec::parse("[1.0,2.0").is_err());
    assert!(VersionSpec::parse("${oops").is_err());
}

#[test]
fn test_variable_versions() {
    assert!(!gav("g:a:1.0").is_variable());
    assert!(!gav("g:a:1.0-SNAPSHOT").is_variable());
    assert!(gav("g:a:[1.0,2.0)").is_variable());
    assert!(gav("g:a:${v}").is_variable());
    assert!(gav("g:a:RELEASE").is_variable());
}

#[test]
fn test_logical_identity() {
    let first = Relationship::dependency(gav("g:a:1"), gav("g:b:1"))
        .index(0)
        .source("s1")
        .build();
    let second = Relationship::dependency(gav("g:a:1"), gav("g:b:1"))
        .index(3)
        .source("s2")
        .build();
    let managed = Relationship::dependency(gav("g:a:1"), gav("g:b:1"))
        .managed(true)
        .build();
    let plugin = Relationship::plugin(gav("g:a:1"), gav("g:b:1")).build();

    assert_eq!(first, second);
    assert_eq!(first.id(), second.id());
    assert_ne!(first, managed);
    assert_ne!(first, plugin);
}

#[test]
fn test_select_target_creates_new_identity() {
    let rel = dep("g:a:1", "g:b:[1,2)");
    let selected = rel.select_target(gav("g:b:1.2"));
    assert_eq!(selected.target(), &gav("g:b:1.2"));
    assert_eq!(selected.declaring(), rel.declaring());
    assert_ne!(selected.id(), rel.id());
    // the original is untouched
    assert_eq!(rel.target(), &gav("g:b:[1,2)"));
}

#[test]
fn test_terminus_and_artifacts() {
    let terminus = Relationship::terminus(gav("g:a:1")).build();
    assert!(terminus.is_terminus());
    assert!(terminus.is_self_referential());
    assert_eq!(terminus.kind(), RelationshipType::Parent);
    assert!(terminus.artifact().is_none());

    let test_dep = Relationship::dependency(gav("g:a:1"), gav("g:junit:4.13"))
        .artifact(ArtifactInfo::default().with_scope(DependencyScope::Test))
        .build();
    assert_eq!(test_dep.artifact().unwrap().scope, DependencyScope::Test);
    assert_eq!(dep("g:a:1", "g:b:1").artifact().unwrap().artifact_type, "jar");
}

#[test]
fn test_relationship_serde() {
    let rel = Relationship::bom(gav("g:a:1"), gav("g:bom:2"))
        .source("repo:central")
        .index(1)
        .build();
    let json = serde_json::to_string(&rel).unwrap();
    let back: Relationship = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rel);
    assert_eq!(back.sources(), rel.sources());
    assert_eq!(back.index(), 1);
}
