// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end substitution passes against the in-memory scene graph.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use approx::assert_relative_eq;
use instancer_core::{
    AttributeEvaluator, ExpressionEvaluator, Feature, GeoExtent, Geometry, InstanceResource,
    InstanceSymbol, LineSymbol, NumericExpression, ResourceKind, ResourceLibrary,
    SpatialReference, StringExpression, Style, StyleSheet, Symbol, Uri,
};
use instancer_engine::{
    Capabilities, EngineConfig, Error, FilterContext, FilterUsage, InstanceLoader, InstructionList,
    MeshRegistry, PlaceholderModel, ResourceCache, Session, SubstituteEngine,
};
use instancer_geometry::{Matrix4, Mesh, Point3, Vector3};
use instancer_scene::{DefaultOcclusionQueryFactory, Node, NodeKey, NodeKind, SceneGraph};

fn local_srs() -> SpatialReference {
    SpatialReference::projected("local")
}

fn registry() -> MeshRegistry {
    MeshRegistry::new()
        .with_mesh("tree.osg", Mesh::block(1.0, 1.0, 4.0))
        .with_mesh("pin.png", Mesh::quad(1.0, 1.0))
}

fn flat_context(loader: impl InstanceLoader + 'static) -> FilterContext {
    let session = Session::new(local_srs(), false, Arc::new(ResourceCache::new(loader)));
    FilterContext::new(Arc::new(session), local_srs())
}

fn direct() -> EngineConfig {
    EngineConfig {
        use_draw_instanced: false,
        ..EngineConfig::default()
    }
}

fn model_style(symbol: InstanceSymbol) -> Style {
    Style::new("test").with_symbol(Symbol::Instance(symbol))
}

fn engine_for(symbol: InstanceSymbol, config: EngineConfig) -> SubstituteEngine {
    SubstituteEngine::new(model_style(symbol), config)
}

fn styled_context(sheet: StyleSheet) -> FilterContext {
    let cache = Arc::new(ResourceCache::new(registry()));
    let session = Session::new(local_srs(), false, cache).with_styles(sheet);
    FilterContext::new(Arc::new(session), local_srs())
}

fn points(coords: &[(f64, f64, f64)]) -> Vec<Feature> {
    coords
        .iter()
        .enumerate()
        .map(|(i, &(x, y, z))| Feature::new(i as u64 + 1, Geometry::point(x, y, z)))
        .collect()
}

fn attach_point(graph: &SceneGraph, root: NodeKey) -> NodeKey {
    graph.children(root)[0]
}

fn transforms(graph: &SceneGraph, attach: NodeKey) -> Vec<NodeKey> {
    graph
        .children(attach)
        .iter()
        .copied()
        .filter(|&k| graph.node(k).map(|n| n.kind.is_transform()).unwrap_or(false))
        .collect()
}

#[test]
fn three_trees_share_one_clone() {
    let mut context = flat_context(registry());
    let mut engine = engine_for(
        InstanceSymbol::model().with_url("tree.osg").with_scale("1.5"),
        direct(),
    );
    let coords = [(10.0, 20.0, 0.0), (30.0, 40.0, 0.0), (50.0, 60.0, 5.0)];
    let mut graph = SceneGraph::new();

    let root = engine.push(&points(&coords), &mut context, &mut graph).unwrap();

    assert_eq!(graph.name(root), Some("Delocalizer"));
    let attach = attach_point(&graph, root);
    let xforms = transforms(&graph, attach);
    assert_eq!(xforms.len(), 3);

    let shared = graph.children(xforms[0])[0];
    for (xf, &(x, y, z)) in xforms.iter().zip(coords.iter()) {
        assert_eq!(graph.children(*xf), &[shared]);
        let expected = Matrix4::new_translation(&Vector3::new(x, y, z)) * Matrix4::new_scaling(1.5);
        assert_relative_eq!(*graph.node(*xf).unwrap().matrix().unwrap(), expected);
    }

    let stats = engine.last_pass_stats();
    assert_eq!(stats.unique_nodes_created, 1);
    assert_eq!(stats.instances_placed, 3);
    assert_eq!(stats.features_processed, 3);
    assert_eq!(engine.resolver().insertions(), 1);
    // root, attach, three transforms, tree group and geode
    assert_eq!(graph.len(), 7);
}

#[test]
fn icon_scales_make_distinct_clones() {
    let mut context = flat_context(registry());
    let mut engine = engine_for(
        InstanceSymbol::icon().with_url("pin.png").with_scale("[size]"),
        direct(),
    );
    let features: Vec<Feature> = [1.0, 2.0, 1.0]
        .iter()
        .enumerate()
        .map(|(i, &size)| {
            Feature::new(i as u64, Geometry::point(i as f64, 0.0, 0.0)).with_attr("size", size)
        })
        .collect();
    let mut graph = SceneGraph::new();

    let root = engine.push(&features, &mut context, &mut graph).unwrap();
    let attach = attach_point(&graph, root);
    let xforms = transforms(&graph, attach);

    assert_eq!(engine.last_pass_stats().unique_nodes_created, 2);
    assert_eq!(graph.children(xforms[0]), graph.children(xforms[2]));
    assert_ne!(graph.children(xforms[0]), graph.children(xforms[1]));

    // icons face the camera
    let icon = graph.children(xforms[0])[0];
    assert!(graph.node(icon).unwrap().kind.is_auto_transform());
}

#[test]
fn decluttered_icons_are_not_wrapped() {
    let mut context = flat_context(registry());
    let mut engine = engine_for(
        InstanceSymbol::icon().with_url("pin.png").with_declutter(true),
        direct(),
    );
    let mut graph = SceneGraph::new();

    let root = engine.push(&points(&[(0.0, 0.0, 0.0)]), &mut context, &mut graph).unwrap();
    let attach = attach_point(&graph, root);
    let icon = graph.children(transforms(&graph, attach)[0])[0];

    assert!(!graph.node(icon).unwrap().kind.is_auto_transform());
    assert!(graph.state(icon).unwrap().declutter);
    assert!(graph.state(attach).unwrap().declutter);
    assert!(!graph.state(attach).unwrap().clip_distance0);
}

#[test]
fn deferred_mode_records_instructions() {
    let extent = GeoExtent::new(local_srs(), 0.0, 0.0, 200.0, 200.0);
    let mut context = flat_context(registry()).with_extent(extent);
    let config = EngineConfig {
        usage: FilterUsage::ZeroWorkCallbackBased,
        cluster: true,
        use_draw_instanced: false,
        ..EngineConfig::default()
    };
    let mut engine = engine_for(InstanceSymbol::model().with_url("tree.osg"), config);
    let mut graph = SceneGraph::new();

    let root = engine
        .push(&points(&[(10.0, 20.0, 0.0), (30.0, 40.0, 0.0)]), &mut context, &mut graph)
        .unwrap();
    let attach = attach_point(&graph, root);

    assert!(graph.children(attach).is_empty());
    let list = graph.user_data::<InstructionList>(attach).unwrap();
    assert!(list.clustered());
    assert_eq!(list.len(), 2);
    assert_eq!(list.records()[0].uri.full(), "tree.osg");

    // recorded in world space; the delocalizer still carries the tile origin
    let origin = list.records()[1].matrix.transform_point(&Point3::origin());
    assert_relative_eq!(origin, Point3::new(30.0, 40.0, 0.0));
    let delocalize = graph.node(root).unwrap().matrix().unwrap();
    assert_relative_eq!(
        delocalize.transform_point(&Point3::origin()),
        Point3::new(100.0, 100.0, 0.0)
    );

    assert_eq!(engine.last_pass_stats().unique_nodes_created, 0);
    assert_eq!(engine.last_pass_stats().instances_placed, 2);
}

#[test]
fn direct_placements_are_localized() {
    let extent = GeoExtent::new(local_srs(), 0.0, 0.0, 200.0, 200.0);
    let mut context = flat_context(registry()).with_extent(extent);
    let mut engine = engine_for(InstanceSymbol::model().with_url("tree.osg"), direct());
    let mut graph = SceneGraph::new();

    let root = engine.push(&points(&[(110.0, 120.0, 0.0)]), &mut context, &mut graph).unwrap();
    let attach = attach_point(&graph, root);
    let local = *graph.node(transforms(&graph, attach)[0]).unwrap().matrix().unwrap();
    let delocalize = *graph.node(root).unwrap().matrix().unwrap();

    assert_relative_eq!(local.transform_point(&Point3::origin()), Point3::new(10.0, 20.0, 0.0));
    assert_relative_eq!(
        (delocalize * local).transform_point(&Point3::origin()),
        Point3::new(110.0, 120.0, 0.0)
    );
}

#[test]
fn draw_instanced_collapses_transforms() {
    let mut context = flat_context(registry());
    let mut engine = engine_for(
        InstanceSymbol::model().with_url("tree.osg"),
        EngineConfig::default(),
    );
    let mut graph = SceneGraph::new();

    let features = points(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (2.0, 0.0, 0.0)]);
    let root = engine.push(&features, &mut context, &mut graph).unwrap();
    let attach = attach_point(&graph, root);

    assert!(graph.state(attach).unwrap().draw_instanced);
    assert!(transforms(&graph, attach).is_empty());
    let kids = graph.children(attach);
    assert_eq!(kids.len(), 1);
    match &graph.node(kids[0]).unwrap().kind {
        NodeKind::Instanced(matrices) => assert_eq!(matrices.len(), 3),
        other => panic!("expected an instanced node, got {:?}", other),
    }
}

#[test]
fn draw_instanced_respects_capabilities() {
    let session = Session::new(local_srs(), false, Arc::new(ResourceCache::new(registry())))
        .with_capabilities(Capabilities {
            substitution: true,
            draw_instanced: false,
        });
    let mut context = FilterContext::new(Arc::new(session), local_srs());
    let mut engine = engine_for(
        InstanceSymbol::model().with_url("tree.osg"),
        EngineConfig::default(),
    );
    let mut graph = SceneGraph::new();

    let root = engine.push(&points(&[(0.0, 0.0, 0.0)]), &mut context, &mut graph).unwrap();
    let attach = attach_point(&graph, root);
    assert!(!graph.state(attach).unwrap().draw_instanced);
    assert_eq!(transforms(&graph, attach).len(), 1);
}

/// Builds a model made of a mesh and a camera-facing label.
struct LabeledModel;

impl InstanceLoader for LabeledModel {
    fn load(&self, _resource: &InstanceResource, graph: &mut SceneGraph) -> Option<NodeKey> {
        let root = graph.add_node(Node::group());
        let body = graph.add_node(Node::geode(vec![Arc::new(Mesh::block(1.0, 1.0, 1.0))]));
        let label = graph.add_node(Node::billboard(vec![Arc::new(Mesh::quad(2.0, 1.0))]));
        graph.add_child(root, body).ok()?;
        graph.add_child(root, label).ok()?;
        Some(root)
    }
}

#[test]
fn clustering_merges_meshes_and_keeps_billboards() {
    let mut context = flat_context(LabeledModel).with_feature_index();
    let config = EngineConfig {
        cluster: true,
        use_draw_instanced: false,
        ..EngineConfig::default()
    };
    let mut engine = engine_for(InstanceSymbol::model().with_url("house.osg"), config);
    let mut graph = SceneGraph::new();

    let features = points(&[(0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (20.0, 0.0, 0.0)]);
    let root = engine.push(&features, &mut context, &mut graph).unwrap();
    let attach = attach_point(&graph, root);
    let kids = graph.children(attach).to_vec();
    assert_eq!(kids.len(), 2);

    let NodeKind::Geode(meshes) = &graph.node(kids[0]).unwrap().kind else {
        panic!("expected the merged geode first");
    };
    assert_eq!(meshes.len(), 1);
    assert_eq!(meshes[0].vertex_count(), 3 * 24);

    let labels = graph.collect_meshes(kids[1]);
    assert_eq!(labels.len(), 3);
    assert!(labels.iter().all(|p| p.billboard));

    // clustered placements are not tagged
    assert!(context.feature_index().unwrap().is_empty());
}

#[test]
fn missing_resources_warn_once_per_uri() {
    let mut sheet = StyleSheet::new();
    sheet.add_resource_library(ResourceLibrary::new("props"));
    let mut context = styled_context(sheet);
    let mut engine = engine_for(
        InstanceSymbol::model().with_url("[kind].osg").with_library("props"),
        direct(),
    );
    let features: Vec<Feature> = ["a", "a", "b", "a"]
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            Feature::new(i as u64, Geometry::point(0.0, 0.0, 0.0)).with_attr("kind", *kind)
        })
        .collect();
    let mut graph = SceneGraph::new();

    let root = engine.push(&features, &mut context, &mut graph).unwrap();

    let stats = engine.last_pass_stats();
    assert_eq!(stats.missing_uris, 2);
    assert_eq!(stats.warnings, 2);
    assert_eq!(stats.features_skipped, 4);
    assert_eq!(engine.resolver().warnings(), 2);
    assert!(graph.children(attach_point(&graph, root)).is_empty());

    // a new pass reports its missing URIs again
    engine.push(&features, &mut context, &mut graph).unwrap();
    assert_eq!(engine.last_pass_stats().warnings, 2);
    assert_eq!(engine.resolver().warnings(), 4);
}

#[test]
fn library_instances_are_used() {
    let mut library = ResourceLibrary::new("props");
    library.add_instance(
        "oak",
        InstanceResource::new(ResourceKind::Model, Uri::from("tree.osg")).with_name("oak"),
    );
    let mut sheet = StyleSheet::new();
    sheet.add_resource_library(library);

    let mut context = styled_context(sheet);
    let mut engine = engine_for(
        InstanceSymbol::model().with_url("oak").with_library("props"),
        direct(),
    );
    let mut graph = SceneGraph::new();

    let root = engine.push(&points(&[(0.0, 0.0, 0.0)]), &mut context, &mut graph).unwrap();
    let attach = attach_point(&graph, root);
    let model = graph.children(transforms(&graph, attach)[0])[0];
    assert_eq!(graph.name(model), Some("tree.osg"));
    // library descriptors are not cached by the resolver
    assert_eq!(engine.resolver().insertions(), 0);
    assert_eq!(engine.last_pass_stats().warnings, 0);
}

#[test]
fn unknown_library_falls_back_to_symbol() {
    let session = Session::new(local_srs(), false, Arc::new(ResourceCache::new(registry())))
        .with_styles(StyleSheet::new());
    let mut context = FilterContext::new(Arc::new(session), local_srs());
    let mut engine = engine_for(
        InstanceSymbol::model().with_url("tree.osg").with_library("nowhere"),
        direct(),
    );
    let mut graph = SceneGraph::new();

    engine.push(&points(&[(0.0, 0.0, 0.0)]), &mut context, &mut graph).unwrap();
    let stats = engine.last_pass_stats();
    assert_eq!(stats.instances_placed, 1);
    assert_eq!(stats.warnings, 1);
}

#[test]
fn default_model_fills_in_for_unloadable_resources() {
    let symbol = InstanceSymbol::model().with_url("unknown.osg");
    let points = points(&[(0.0, 0.0, 0.0)]);

    let mut without = engine_for(symbol.clone(), direct());
    let mut graph = SceneGraph::new();
    without.push(&points, &mut flat_context(registry()), &mut graph).unwrap();
    assert_eq!(without.last_pass_stats().features_skipped, 1);
    assert_eq!(without.last_pass_stats().instances_placed, 0);

    let mut with = engine_for(symbol, direct()).with_default_model(PlaceholderModel);
    let mut graph = SceneGraph::new();
    with.push(&points, &mut flat_context(registry()), &mut graph).unwrap();
    assert_eq!(with.last_pass_stats().instances_placed, 1);
}

#[test]
fn configuration_failures_leave_graph_untouched() {
    let mut graph = SceneGraph::new();

    let mut empty = SubstituteEngine::new(Style::new("empty"), direct());
    let err = empty.push(&[], &mut flat_context(registry()), &mut graph).unwrap_err();
    assert!(matches!(err, Error::EmptyStyle(_)));

    let lines = Style::new("roads").with_symbol(Symbol::Line(LineSymbol {
        color: [1.0; 4],
        width: 1.0,
    }));
    let err = SubstituteEngine::new(lines, direct())
        .push(&[], &mut flat_context(registry()), &mut graph)
        .unwrap_err();
    assert!(matches!(err, Error::NoInstanceSymbol(_)));

    let session = Session::new(local_srs(), false, Arc::new(ResourceCache::new(registry())))
        .with_capabilities(Capabilities {
            substitution: false,
            draw_instanced: true,
        });
    let mut context = FilterContext::new(Arc::new(session), local_srs());
    let err = engine_for(InstanceSymbol::model().with_url("tree.osg"), direct())
        .push(&points(&[(0.0, 0.0, 0.0)]), &mut context, &mut graph)
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));

    assert!(graph.is_empty());
}

#[test]
fn placements_are_tagged_and_named() {
    let mut context = flat_context(registry()).with_feature_index();
    let config = EngineConfig {
        feature_name_expr: Some("[name]".into()),
        ..direct()
    };
    let mut engine = engine_for(InstanceSymbol::model().with_url("tree.osg"), config);
    let features = vec![
        Feature::new(7, Geometry::point(0.0, 0.0, 0.0)).with_attr("name", "oak"),
        Feature::new(8, Geometry::point(1.0, 0.0, 0.0)),
    ];
    let mut graph = SceneGraph::new();

    let root = engine.push(&features, &mut context, &mut graph).unwrap();
    let xforms = transforms(&graph, attach_point(&graph, root));

    assert_eq!(graph.name(xforms[0]), Some("oak"));
    assert_eq!(graph.name(xforms[1]), None);
    let index = context.feature_index().unwrap();
    assert_eq!(index.feature_for(xforms[0]), Some(7));
    assert_eq!(index.feature_for(xforms[1]), Some(8));
}

#[test]
fn occlusion_query_wraps_attach_point() {
    let mut context = flat_context(registry());
    let mut engine = engine_for(InstanceSymbol::model().with_url("tree.osg"), direct())
        .with_occlusion_factory(DefaultOcclusionQueryFactory);
    let mut graph = SceneGraph::new();

    let root = engine.push(&points(&[(0.0, 0.0, 0.0)]), &mut context, &mut graph).unwrap();
    let query = graph.children(root)[0];
    assert!(matches!(graph.node(query).unwrap().kind, NodeKind::OcclusionQuery));
    let attach = graph.children(query)[0];
    assert_eq!(graph.name(attach), Some("AttachPoint"));
    assert_eq!(transforms(&graph, attach).len(), 1);
}

#[test]
fn line_vertices_each_get_an_instance() {
    let mut context = flat_context(registry());
    let mut engine = engine_for(
        InstanceSymbol::model().with_url("tree.osg").with_heading("[dir]"),
        direct(),
    );
    let road = Feature::new(
        1,
        Geometry::LineString(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
        ]),
    )
    .with_attr("dir", 90.0);
    let mut graph = SceneGraph::new();

    let root = engine.push(&[road], &mut context, &mut graph).unwrap();
    let xforms = transforms(&graph, attach_point(&graph, root));
    assert_eq!(xforms.len(), 3);

    let m = graph.node(xforms[1]).unwrap().matrix().unwrap();
    assert_relative_eq!(m.transform_vector(&Vector3::x()), Vector3::y(), epsilon = 1e-12);
    assert_relative_eq!(
        m.transform_point(&Point3::origin()),
        Point3::new(5.0, 0.0, 0.0),
        epsilon = 1e-12
    );
}

#[test]
fn zero_scale_axes_are_coerced() {
    let mut context = flat_context(registry());
    let mut engine = SubstituteEngine::new(
        model_style(
            InstanceSymbol::model()
                .with_url("tree.osg")
                .with_axis_scale(Some("0"), Some("2"), Some("[missing]")),
        ),
        direct(),
    );
    let mut graph = SceneGraph::new();

    let root = engine.push(&points(&[(0.0, 0.0, 0.0)]), &mut context, &mut graph).unwrap();
    let m = *graph
        .node(transforms(&graph, attach_point(&graph, root))[0])
        .unwrap()
        .matrix()
        .unwrap();
    assert_relative_eq!(m, Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 2.0, 1.0)));
}

#[test]
fn shared_nodes_persist_across_passes() {
    let mut context = flat_context(registry());
    let mut engine = engine_for(InstanceSymbol::model().with_url("tree.osg"), direct());
    let mut graph = SceneGraph::new();

    let first = engine.push(&points(&[(0.0, 0.0, 0.0)]), &mut context, &mut graph).unwrap();
    let second = engine.push(&points(&[(1.0, 0.0, 0.0)]), &mut context, &mut graph).unwrap();

    assert_eq!(engine.last_pass_stats().unique_nodes_created, 0);
    assert_eq!(engine.resolver().insertions(), 1);
    let a = graph.children(transforms(&graph, attach_point(&graph, first))[0])[0];
    let b = graph.children(transforms(&graph, attach_point(&graph, second))[0])[0];
    assert_eq!(a, b);

    let mut other = SceneGraph::new();
    engine.push(&points(&[(0.0, 0.0, 0.0)]), &mut context, &mut other).unwrap();
    assert_eq!(engine.last_pass_stats().unique_nodes_created, 1);
}

#[test]
fn geocentric_instances_stand_on_the_ellipsoid() {
    let map = SpatialReference::wgs84();
    let session = Session::new(map.clone(), true, Arc::new(ResourceCache::new(registry())));
    let extent = GeoExtent::new(map.clone(), 9.0, 39.0, 11.0, 51.0);
    let mut context = FilterContext::new(Arc::new(session), map.clone()).with_extent(extent);
    let mut engine = engine_for(InstanceSymbol::model().with_url("tree.osg"), direct());
    let mut graph = SceneGraph::new();

    let root = engine
        .push(&points(&[(10.0, 40.0, 0.0), (10.0, 50.0, 0.0)]), &mut context, &mut graph)
        .unwrap();
    let delocalize = *graph.node(root).unwrap().matrix().unwrap();
    let xforms = transforms(&graph, attach_point(&graph, root));
    let world: Vec<Matrix4<f64>> = xforms
        .iter()
        .map(|&k| delocalize * graph.node(k).unwrap().matrix().unwrap())
        .collect();

    let ellipsoid = map.ellipsoid();
    let expected = ellipsoid.geodetic_to_ecef(10.0, 40.0, 0.0);
    assert_relative_eq!(world[0].transform_point(&Point3::origin()), expected, epsilon = 1e-3);

    let up_a = world[0].transform_vector(&Vector3::z());
    let up_b = world[1].transform_vector(&Vector3::z());
    assert_relative_eq!(up_a, ellipsoid.up_vector(10.0, 40.0), epsilon = 1e-9);
    assert_relative_eq!(up_a.angle(&up_b).to_degrees(), 10.0, epsilon = 1e-6);
}

#[test]
fn geocentric_icons_enable_horizon_clipping() {
    let map = SpatialReference::wgs84();
    let session = Session::new(map.clone(), true, Arc::new(ResourceCache::new(registry())));
    let mut context = FilterContext::new(Arc::new(session), map);
    let mut engine = engine_for(InstanceSymbol::icon().with_url("pin.png"), direct());
    let mut graph = SceneGraph::new();

    let root = engine.push(&points(&[(10.0, 40.0, 0.0)]), &mut context, &mut graph).unwrap();
    let attach = attach_point(&graph, root);
    assert!(graph.state(attach).unwrap().clip_distance0);
    assert!(!graph.state(attach).unwrap().declutter);
}

#[test]
fn unconvertible_parts_are_skipped() {
    let session = Session::new(
        SpatialReference::spherical_mercator(),
        false,
        Arc::new(ResourceCache::new(registry())),
    );
    let mut context = FilterContext::new(Arc::new(session), SpatialReference::wgs84());
    let mut engine = engine_for(InstanceSymbol::model().with_url("tree.osg"), direct());
    let features = vec![Feature::new(
        1,
        Geometry::Multi(vec![
            Geometry::point(0.0, 89.9, 0.0),
            Geometry::point(10.0, 10.0, 0.0),
        ]),
    )];
    let mut graph = SceneGraph::new();

    engine.push(&features, &mut context, &mut graph).unwrap();
    let stats = engine.last_pass_stats();
    assert_eq!(stats.instances_placed, 1);
    assert_eq!(stats.warnings, 1);
    assert_eq!(stats.features_processed, 1);
}

/// Evaluator that logs every script run and string evaluation.
struct RecordingEvaluator {
    log: Rc<RefCell<Vec<String>>>,
}

impl ExpressionEvaluator for RecordingEvaluator {
    fn eval_string(&self, expr: &StringExpression, feature: &Feature) -> String {
        self.log.borrow_mut().push(format!("url{}", feature.id));
        AttributeEvaluator.eval_string(expr, feature)
    }

    fn eval_numeric(&self, expr: &NumericExpression, feature: &Feature) -> f64 {
        AttributeEvaluator.eval_numeric(expr, feature)
    }

    fn run_script(&self, script: &str, feature: &Feature) {
        self.log.borrow_mut().push(format!("{}{}", script, feature.id));
    }
}

#[test]
fn scripts_run_once_per_feature_before_url() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut context = flat_context(registry());
    let symbol = InstanceSymbol::model().with_url("tree.osg").with_script("pre");
    let mut engine = engine_for(symbol, direct()).with_evaluator(RecordingEvaluator {
        log: Rc::clone(&log),
    });
    let mut graph = SceneGraph::new();

    let features = points(&[(0.0, 0.0, 0.0), (5.0, 0.0, 0.0)]);
    engine.push(&features, &mut context, &mut graph).unwrap();

    assert_eq!(*log.borrow(), ["pre1", "url1", "pre2", "url2"]);
    assert_eq!(engine.last_pass_stats().instances_placed, 2);
}

#[test]
fn features_without_script_skip_the_script_stage() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut context = flat_context(registry());
    let mut engine = engine_for(InstanceSymbol::model().with_url("tree.osg"), direct())
        .with_evaluator(RecordingEvaluator {
            log: Rc::clone(&log),
        });
    let mut graph = SceneGraph::new();

    engine.push(&points(&[(0.0, 0.0, 0.0)]), &mut context, &mut graph).unwrap();

    assert_eq!(*log.borrow(), ["url1"]);
}
