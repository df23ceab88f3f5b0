//! Behavioral scenarios, run against every store implementation.

use crate::common::{dep, gav, graphs};
use depgraph::traversal::CollectingVisitor;
use depgraph::view::{ManagedDependencyMutator, RelationshipTypeFilter};
use depgraph::{
    CyclePolicy, GraphConfig, GraphPath, ProjectRef, Relationship, RelationshipGraph,
    RelationshipType, RelationshipView, TraversalType,
};

#[test]
fn test_idempotent_merge() {
    for t in graphs(GraphConfig::default()) {
        let first = Relationship::dependency(gav("g:a:1"), gav("g:b:1"))
            .source("s1")
            .build();
        let second = Relationship::dependency(gav("g:a:1"), gav("g:b:1"))
            .source("s2")
            .build();
        t.graph.add_relationships([first]).unwrap();
        t.graph.add_relationships([second]).unwrap();

        let all = t.graph.all_relationships(&RelationshipView::global()).unwrap();
        assert_eq!(all.len(), 1, "{}", t.name);
        let sources: Vec<&str> = all[0].sources().iter().map(String::as_str).collect();
        assert_eq!(sources, vec!["s1", "s2"], "{}", t.name);
    }
}

#[test]
fn test_end_to_end_chain_rejects_closing_edge() {
    for t in graphs(GraphConfig::default()) {
        let chain = [
            dep("g:a:1", "g:b:1"),
            dep("g:b:1", "g:c:1"),
            dep("g:c:1", "g:d:1"),
        ];
        let rejected = t.graph.add_relationships(chain.clone()).unwrap();
        assert!(rejected.is_empty(), "{}", t.name);

        let view = RelationshipView::rooted([gav("g:a:1")]);
        let paths = t.graph.all_paths_to(&view, &[gav("g:d:1")]).unwrap().unwrap();
        assert_eq!(paths.len(), 1, "{}", t.name);
        let expected = RelationshipGraph::create_path(chain.to_vec()).unwrap();
        assert!(paths.contains(&expected), "{}", t.name);

        let closing = dep("g:d:1", "g:a:1");
        assert!(t.graph.introduces_cycle(&closing).unwrap(), "{}", t.name);
        let rejected = t.graph.add_relationships([closing.clone()]).unwrap();
        assert!(rejected.contains(&closing), "{}", t.name);

        let all = t.graph.all_relationships(&RelationshipView::global()).unwrap();
        assert_eq!(all.len(), 3, "{}", t.name);
        assert!(!all.contains(&closing), "{}", t.name);
        assert!(!t.graph.contains_relationship(&view, &closing).unwrap());

        let cycles = t.graph.cycles_in(&view).unwrap();
        assert_eq!(cycles.len(), 1, "{}", t.name);
        let cycle = cycles.iter().next().unwrap();
        let rels = cycle.relationships();
        assert_eq!(rels[0].declaring(), rels[rels.len() - 1].target());
    }
}

#[test]
fn test_lazy_policy_stores_and_flags() {
    let config = GraphConfig::default().with_cycle_policy(CyclePolicy::StoreAndFlag);
    for t in graphs(config) {
        let rejected = t
            .graph
            .add_relationships([dep("g:a:1", "g:b:1"), dep("g:b:1", "g:a:1")])
            .unwrap();
        assert!(rejected.is_empty(), "{}", t.name);
        assert_eq!(
            t.graph.all_relationships(&RelationshipView::global()).unwrap().len(),
            2,
            "{}",
            t.name
        );

        let rooted = RelationshipView::rooted([gav("g:a:1")]);
        assert_eq!(t.graph.cycles_in(&rooted).unwrap().len(), 1, "{}", t.name);
        assert_eq!(
            t.graph.cycles_in(&RelationshipView::global()).unwrap().len(),
            1,
            "{}",
            t.name
        );

        // traversal terminates on the stored cycle
        let mut visitor = CollectingVisitor::default();
        t.graph
            .traverse(&rooted, &gav("g:a:1"), &mut visitor, TraversalType::DepthFirst)
            .unwrap();
        assert_eq!(visitor.relationships.len(), 2, "{}", t.name);
    }
}

#[test]
fn test_filter_scoping_across_queries() {
    for t in graphs(GraphConfig::default()) {
        t.graph
            .add_relationships([
                dep("g:a:1", "g:b:1"),
                Relationship::plugin(gav("g:a:1"), gav("g:p:1")).build(),
                dep("g:b:1", "g:c:1"),
                Relationship::plugin(gav("g:b:1"), gav("g:q:1")).build(),
                Relationship::plugin(gav("g:c:1"), gav("g:r:1")).build(),
            ])
            .unwrap();

        let view = RelationshipView::builder()
            .root(gav("g:a:1"))
            .filter(RelationshipTypeFilter::new([RelationshipType::Dependency]))
            .build();
        let is_dependency = |rel: &Relationship| rel.kind() == RelationshipType::Dependency;

        let all = t.graph.all_relationships(&view).unwrap();
        assert_eq!(all.len(), 2, "{}", t.name);
        assert!(all.iter().all(is_dependency));
        assert!(t
            .graph
            .relationships_declared_by(&view, &gav("g:b:1"))
            .unwrap()
            .iter()
            .all(is_dependency));
        assert!(!t.graph.contains_project(&view, &gav("g:q:1")).unwrap());
        assert!(t
            .graph
            .all_paths_to(&view, &[gav("g:r:1")])
            .unwrap()
            .unwrap()
            .is_empty());
    }
}

#[test]
fn test_mutator_stability_across_traversals() {
    for t in graphs(GraphConfig::default()) {
        t.graph
            .add_relationships([dep("g:a:1", "g:b:[1,2)"), dep("g:b:1.2", "g:c:1")])
            .unwrap();
        let view = RelationshipView::builder()
            .root(gav("g:a:1"))
            .select(gav("g:b:1.2"))
            .build();

        let run = || {
            let mut visitor = CollectingVisitor::default();
            t.graph
                .traverse(&view, &gav("g:a:1"), &mut visitor, TraversalType::BreadthFirst)
                .unwrap();
            visitor.relationships
        };
        let first = run();
        assert_eq!(first, run(), "{}", t.name);
        assert_eq!(first[0].target(), &gav("g:b:1.2"), "{}", t.name);
        // the selected version is expanded
        assert_eq!(first.len(), 2, "{}", t.name);
        assert!(t.graph.variable_projects(&view).unwrap().is_empty());
    }
}

#[test]
fn test_unselected_variable_target_is_a_leaf() {
    for t in graphs(GraphConfig::default()) {
        t.graph
            .add_relationships([dep("g:a:1", "g:b:[1,2)"), dep("g:b:[1,2)", "g:c:1")])
            .unwrap();
        let view = RelationshipView::rooted([gav("g:a:1")]);

        let variable = t.graph.variable_projects(&view).unwrap();
        assert!(variable.contains(&gav("g:b:[1,2)")), "{}", t.name);
        assert!(!t.graph.contains_project(&view, &gav("g:c:1")).unwrap());
        assert!(t
            .graph
            .all_paths_to(&view, &[gav("g:b:[1,2)")])
            .unwrap()
            .unwrap()
            .is_empty());
    }
}

#[test]
fn test_monotonic_membership_growth() {
    for t in graphs(GraphConfig::default()) {
        let view = RelationshipView::rooted([gav("g:a:1")]);
        t.graph.add_relationships([dep("g:a:1", "g:b:1")]).unwrap();
        let before = t.graph.all_projects(&view).unwrap();

        t.graph
            .add_relationships([dep("g:b:1", "g:c:1"), dep("g:x:1", "g:y:1")])
            .unwrap();
        let after = t.graph.all_projects(&view).unwrap();
        assert!(before.is_subset(&after), "{}", t.name);
        assert!(after.contains(&gav("g:c:1")), "{}", t.name);
        assert!(!after.contains(&gav("g:x:1")), "{}", t.name);

        // an edge that joins a previously unreachable subgraph
        t.graph.add_relationships([dep("g:c:1", "g:x:1")]).unwrap();
        let joined = t.graph.all_projects(&view).unwrap();
        assert!(after.is_subset(&joined), "{}", t.name);
        assert!(joined.contains(&gav("g:y:1")), "{}", t.name);
    }
}

#[test]
fn test_managed_override_on_transitive_edge() {
    for t in graphs(GraphConfig::default()) {
        t.graph
            .add_relationships([
                dep("g:a:1", "g:b:1"),
                dep("g:b:1", "g:c:1"),
                Relationship::dependency(gav("g:a:1"), gav("g:c:2"))
                    .managed(true)
                    .build(),
            ])
            .unwrap();
        let view = RelationshipView::builder()
            .root(gav("g:a:1"))
            .filter(RelationshipTypeFilter::new([RelationshipType::Dependency]).include_managed(false))
            .mutator(ManagedDependencyMutator)
            .build();

        let targeting = t.graph.relationships_targeting(&view, &gav("g:c:2")).unwrap();
        assert_eq!(targeting.len(), 1, "{}", t.name);
        assert_eq!(targeting[0].declaring(), &gav("g:b:1"));
        assert!(!t.graph.contains_project(&view, &gav("g:c:1")).unwrap());
    }
}

#[test]
fn test_path_values_and_refs() {
    for t in graphs(GraphConfig::default()) {
        let ab = dep("g:a:1", "g:b:1");
        let bc = dep("g:b:1", "g:c:1");
        t.graph.add_relationships([ab.clone(), bc.clone()]).unwrap();
        let view = RelationshipView::rooted([gav("g:a:1")]);

        let parent = RelationshipGraph::create_path(vec![ab.clone()]).unwrap();
        let child = RelationshipGraph::create_child_path(&parent, bc.clone()).unwrap();
        assert!(RelationshipGraph::create_path(vec![bc.clone(), ab.clone()]).is_none());

        let refs = t.graph.path_refs(&view, &child).unwrap().unwrap();
        assert_eq!(refs, vec![gav("g:a:1"), gav("g:b:1"), gav("g:c:1")]);

        let foreign = GraphPath::new(vec![dep("g:c:1", "g:z:1")]).unwrap();
        assert!(t.graph.path_refs(&view, &foreign).unwrap().is_none());

        let map = t.graph.path_map_targeting(&view, &[gav("g:c:1")]).unwrap().unwrap();
        assert_eq!(map.len(), 1, "{}", t.name);
        assert!(map.contains_key(&child));
    }
}

#[test]
fn test_rootless_path_queries_are_unsupported() {
    for t in graphs(GraphConfig::default().with_full_scan_warning(false)) {
        t.graph.add_relationships([dep("g:a:1", "g:b:1")]).unwrap();
        let global = RelationshipView::global();
        assert!(t.graph.all_paths_to(&global, &[gav("g:b:1")]).unwrap().is_none());
        assert!(t
            .graph
            .path_map_targeting(&global, &[gav("g:b:1")])
            .unwrap()
            .is_none());
        // node queries still answer by scanning
        assert!(t.graph.contains_project(&global, &gav("g:b:1")).unwrap());
    }
}

#[test]
fn test_node_queries() {
    for t in graphs(GraphConfig::default()) {
        t.graph
            .add_relationships([
                dep("g:a:1", "g:b:1"),
                dep("g:a:1", "g:b:2"),
                dep("g:b:1", "g:c:1"),
            ])
            .unwrap();
        let view = RelationshipView::rooted([gav("g:a:1")]);

        let matching = t
            .graph
            .projects_matching(&view, &ProjectRef::parse("g:b").unwrap())
            .unwrap();
        assert_eq!(matching.len(), 2, "{}", t.name);

        let missing = t.graph.missing_projects(&view).unwrap();
        let expected: Vec<_> = vec![gav("g:b:2"), gav("g:c:1")];
        assert_eq!(missing.into_iter().collect::<Vec<_>>(), expected, "{}", t.name);

        let direct = t
            .graph
            .direct_relationships_from(&view, &gav("g:a:1"))
            .unwrap();
        assert_eq!(direct.len(), 2, "{}", t.name);
    }
}

#[test]
fn test_delete_drops_caches() {
    for t in graphs(GraphConfig::default()) {
        let view = RelationshipView::rooted([gav("g:a:1")]);
        t.graph
            .add_relationships([dep("g:a:1", "g:b:1"), dep("g:b:1", "g:c:1")])
            .unwrap();
        assert!(t.graph.contains_project(&view, &gav("g:c:1")).unwrap());

        let removed = t
            .graph
            .delete_relationships([dep("g:b:1", "g:c:1"), dep("g:x:1", "g:y:1")])
            .unwrap();
        assert_eq!(removed, 1, "{}", t.name);
        assert!(!t.graph.contains_project(&view, &gav("g:c:1")).unwrap());

        // once the edge is gone, the closing edge is accepted
        let rejected = t.graph.add_relationships([dep("g:c:1", "g:a:1")]).unwrap();
        assert!(rejected.is_empty(), "{}", t.name);
    }
}

#[test]
fn test_explicit_invalidation() {
    for t in graphs(GraphConfig::default()) {
        let view = RelationshipView::rooted([gav("g:a:1")]);
        t.graph.add_relationships([dep("g:a:1", "g:b:1")]).unwrap();
        assert!(!t.graph.invalidate_view(&view).unwrap());
        t.graph.all_projects(&view).unwrap();
        assert!(t.graph.invalidate_view(&view).unwrap());
        t.graph.invalidate_all().unwrap();
        assert_eq!(t.graph.all_projects(&view).unwrap().len(), 2, "{}", t.name);
    }
}

/// Everything a rooted view answers, in a comparable form.
#[derive(Debug, PartialEq)]
struct ViewAnswers {
    paths: Vec<Vec<(String, Vec<String>)>>,
    projects: Vec<String>,
    relationships: Vec<(String, Vec<String>)>,
}

fn describe(rel: &Relationship) -> (String, Vec<String>) {
    (rel.identity_key(), rel.sources().iter().cloned().collect())
}

fn answers(graph: &RelationshipGraph, view: &RelationshipView, targets: &[&str]) -> ViewAnswers {
    let targets: Vec<_> = targets.iter().map(|t| gav(t)).collect();
    let mut paths: Vec<Vec<(String, Vec<String>)>> = graph
        .all_paths_to(view, &targets)
        .unwrap()
        .unwrap()
        .iter()
        .map(|path| path.relationships().iter().map(describe).collect())
        .collect();
    paths.sort();
    let projects = graph
        .all_projects(view)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    let mut relationships: Vec<_> = graph
        .all_relationships(view)
        .unwrap()
        .iter()
        .map(describe)
        .collect();
    relationships.sort();
    ViewAnswers {
        paths,
        projects,
        relationships,
    }
}

/// Cache `view`, apply `later`, then check the incrementally maintained
/// answers against a fresh recomputation.
fn assert_extension_matches_recompute(
    policy: CyclePolicy,
    earlier: &[Relationship],
    later: &[Relationship],
    targets: &[&str],
) -> Vec<ViewAnswers> {
    let mut results = Vec::new();
    for mode in [TraversalType::DepthFirst, TraversalType::BreadthFirst] {
        let config = GraphConfig::default()
            .with_cycle_policy(policy)
            .with_default_traversal(mode);
        for t in graphs(config) {
            let view = RelationshipView::rooted([gav("g:a:1")]);
            t.graph.add_relationships(earlier.to_vec()).unwrap();
            answers(&t.graph, &view, targets);

            t.graph.add_relationships(later.to_vec()).unwrap();
            let extended = answers(&t.graph, &view, targets);
            t.graph.invalidate_view(&view).unwrap();
            let recomputed = answers(&t.graph, &view, targets);
            assert_eq!(extended, recomputed, "{} {:?}", t.name, mode);
            results.push(recomputed);
        }
    }
    results
}

#[test]
fn test_extension_past_terminus() {
    let results = assert_extension_matches_recompute(
        CyclePolicy::RejectOnInsert,
        &[
            Relationship::terminus(gav("g:a:1")).build(),
            dep("g:a:1", "g:b:1"),
        ],
        &[dep("g:a:1", "g:c:1")],
        &["g:c:1"],
    );
    for answers in results {
        assert_eq!(answers.paths.len(), 1);
    }
}

#[test]
fn test_extension_below_variable_leaf() {
    let results = assert_extension_matches_recompute(
        CyclePolicy::RejectOnInsert,
        &[dep("g:a:1", "g:b:[1,2)")],
        &[dep("g:b:[1,2)", "g:c:1")],
        &["g:c:1"],
    );
    for answers in results {
        assert!(answers.paths.is_empty());
        assert!(!answers.projects.contains(&"g:c:1".to_string()));
    }
}

#[test]
fn test_extension_past_flagged_back_edge() {
    let results = assert_extension_matches_recompute(
        CyclePolicy::StoreAndFlag,
        &[dep("g:a:1", "g:b:1"), dep("g:b:1", "g:a:1")],
        &[dep("g:a:1", "g:x:1")],
        &["g:x:1"],
    );
    for answers in results {
        assert_eq!(answers.paths.len(), 1);
    }
}

#[test]
fn test_extension_with_widened_sources() {
    let first = Relationship::dependency(gav("g:a:1"), gav("g:b:1"))
        .source("s1")
        .build();
    let second = Relationship::dependency(gav("g:a:1"), gav("g:b:1"))
        .source("s2")
        .build();
    let results = assert_extension_matches_recompute(
        CyclePolicy::RejectOnInsert,
        &[first],
        &[second, dep("g:b:1", "g:c:1")],
        &["g:b:1", "g:c:1"],
    );
    let both = vec!["s1".to_string(), "s2".to_string()];
    for answers in results {
        assert_eq!(answers.relationships.len(), 2);
        assert!(answers
            .relationships
            .iter()
            .any(|(_, sources)| sources == &both));
        assert!(answers.paths.iter().all(|path| path[0].1 == both));
    }
}
