// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The substitution pass.
//!
//! [`SubstituteEngine::push`] turns a batch of features into a delocalized
//! sub-graph:
//!
//! ```text
//! Delocalizer (local to world)
//!   [OcclusionQuery]
//!     AttachPoint
//!       Transform (placement) -> shared instance sub-graph
//!       ...
//! ```
//!
//! In deferred mode the attach point stays empty and carries an
//! [`InstructionList`] as user data instead.

use std::sync::Arc;

use instancer_core::{
    AttributeEvaluator, ExpressionEvaluator, Feature, InstanceResource, InstanceSymbol,
    ResourceLibrary, StringExpression, Style, Uri, Vector3,
};
use instancer_geometry::{Localizer, Matrix4, PlacementCalculator};
use instancer_scene::{
    DefaultPostProcessor, Node, NodeKey, OcclusionQueryFactory, SceneGraph, ScenePostProcessor,
};
use rustc_hash::FxHashMap;

use crate::cluster;
use crate::config::EngineConfig;
use crate::context::FilterContext;
use crate::dispatch::{select_batch_mode, InstructionList};
use crate::error::{Error, Result};
use crate::resolver::{MissingSet, ResourceResolver};
use crate::resource_cache::{DefaultModelProvider, InstanceNodeFactory};
use crate::stats::PassStats;
use crate::unique::{UniqueNodeCache, UniqueNodeKey};

/// Scale and heading evaluated for one feature or point.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    /// Uniform scale, before per-axis factors.
    scale: f64,
    /// Per-axis scale, before zero coercion.
    scale_vec: Vector3<f64>,
    heading: Option<f64>,
}

/// Substitutes instances at feature vertices according to a style.
///
/// The resolver cache and the shared-node cache live as long as the
/// engine. Engines are single-threaded; give each worker its own.
pub struct SubstituteEngine {
    style: Style,
    config: EngineConfig,
    evaluator: Box<dyn ExpressionEvaluator>,
    post: Box<dyn ScenePostProcessor>,
    default_model: Option<Box<dyn DefaultModelProvider>>,
    occlusion: Option<Box<dyn OcclusionQueryFactory>>,
    resolver: ResourceResolver,
    unique: UniqueNodeCache,
    last_stats: PassStats,
}

impl SubstituteEngine {
    pub fn new(style: Style, config: EngineConfig) -> Self {
        let resolver = ResourceResolver::new(config.instance_cache_size);
        Self {
            style,
            config,
            evaluator: Box::new(AttributeEvaluator::new()),
            post: Box::new(DefaultPostProcessor),
            default_model: None,
            occlusion: None,
            resolver,
            unique: UniqueNodeCache::new(),
            last_stats: PassStats::default(),
        }
    }

    pub fn with_evaluator(mut self, evaluator: impl ExpressionEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    pub fn with_post_processor(mut self, post: impl ScenePostProcessor + 'static) -> Self {
        self.post = Box::new(post);
        self
    }

    /// Model used when the resource cache cannot build a resolved resource.
    pub fn with_default_model(mut self, provider: impl DefaultModelProvider + 'static) -> Self {
        self.default_model = Some(Box::new(provider));
        self
    }

    /// Wrap the attach point of every pass in an occlusion-query node.
    pub fn with_occlusion_factory(mut self, factory: impl OcclusionQueryFactory + 'static) -> Self {
        self.occlusion = Some(Box::new(factory));
        self
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ResourceResolver {
        &self.resolver
    }

    pub fn unique_nodes(&self) -> &UniqueNodeCache {
        &self.unique
    }

    /// Counters from the most recent successful pass.
    pub fn last_pass_stats(&self) -> &PassStats {
        &self.last_stats
    }

    /// Substitute instances for `features` and return the new root node.
    ///
    /// The root is added to `graph` detached; attaching it is up to the
    /// caller. Fails without touching `graph` when substitution is not
    /// supported or the style has no instance symbol.
    pub fn push(
        &mut self,
        features: &[Feature],
        context: &mut FilterContext,
        graph: &mut SceneGraph,
    ) -> Result<NodeKey> {
        let session = Arc::clone(context.session());

        if !session.capabilities().substitution {
            tracing::warn!("instance substitution is not supported by this backend");
            return Err(Error::Unsupported("instance substitution is not available".into()));
        }
        if self.style.is_empty() {
            tracing::warn!(style = %self.style.name, "empty style; cannot process features");
            return Err(Error::EmptyStyle(self.style.name.clone()));
        }
        let Some(symbol) = self.style.instance_symbol().cloned() else {
            tracing::warn!(style = %self.style.name, "no instance symbol found in style");
            return Err(Error::NoInstanceSymbol(self.style.name.clone()));
        };

        let mut stats = PassStats::default();

        let library = match (&symbol.library, session.styles()) {
            (Some(name), Some(sheet)) => {
                let library = sheet.resource_library(name.expr());
                if library.is_none() {
                    tracing::warn!(
                        library = name.expr(),
                        "unable to load resource library; may not find instance models"
                    );
                    stats.warnings += 1;
                }
                library
            }
            _ => None,
        };

        let localizer =
            Localizer::compute(context.extent(), session.map_srs(), session.is_geocentric())?;

        let root =
            graph.add_node(Node::transform(localizer.local_to_world).with_name("Delocalizer"));
        let attach = graph.add_node(Node::group().with_name("AttachPoint"));
        match &self.occlusion {
            Some(factory) => {
                let query = factory.create_query_node(graph);
                graph.set_name(query, "OcclusionQuery")?;
                graph.add_child(root, query)?;
                graph.add_child(query, attach)?;
            }
            None => graph.add_child(root, attach)?,
        }

        self.process(
            features,
            &symbol,
            library.as_deref(),
            context,
            &localizer,
            graph,
            attach,
            &mut stats,
        )?;

        if !self.config.is_deferred() && self.config.cluster {
            if self.config.merge {
                cluster::cluster(graph, attach, self.post.as_ref())?;
            } else {
                tracing::debug!(
                    "clustering requested with merging disabled; leaving instances unmerged"
                );
            }
        }

        tracing::debug!(
            features = stats.features_processed,
            skipped = stats.features_skipped,
            instances = stats.instances_placed,
            unique = stats.unique_nodes_created,
            "substitution pass complete"
        );
        self.last_stats = stats;
        Ok(root)
    }

    #[allow(clippy::too_many_arguments)]
    fn process(
        &mut self,
        features: &[Feature],
        symbol: &InstanceSymbol,
        library: Option<&ResourceLibrary>,
        context: &mut FilterContext,
        localizer: &Localizer,
        graph: &mut SceneGraph,
        attach: NodeKey,
        stats: &mut PassStats,
    ) -> Result<()> {
        let session = Arc::clone(context.session());
        let geocentric = session.is_geocentric();
        let deferred = self.config.is_deferred();

        let calc = PlacementCalculator::new(
            context.profile_srs().clone(),
            session.map_srs().clone(),
            geocentric,
            localizer.world_to_local,
        );

        let mut instructions = deferred.then(|| {
            InstructionList::new(select_batch_mode(
                self.config.use_draw_instanced,
                self.config.cluster,
            ))
        });

        let mut uri_cache: FxHashMap<String, Uri> = FxHashMap::default();
        let mut missing = MissingSet::new();
        let warnings_before = self.resolver.warnings();

        let url_expr = symbol.url.clone().unwrap_or_default();
        let name_expr = self
            .config
            .feature_name_expr
            .as_deref()
            .filter(|e| !e.is_empty())
            .map(StringExpression::new);

        for feature in features {
            if let Some(script) = &symbol.script {
                self.evaluator.run_script(script, feature);
            }

            let location = self.evaluator.eval_string(&url_expr, feature);
            let uri = uri_cache
                .entry(location)
                .or_insert_with_key(|location| Uri::new(location, url_expr.uri_context()))
                .clone();

            let Some(resource) = self.resolver.resolve(&uri, symbol, library, &mut missing) else {
                stats.features_skipped += 1;
                continue;
            };

            let placement = self.evaluate(symbol, feature);

            let model = if deferred {
                None
            } else {
                let key = if symbol.is_icon() {
                    UniqueNodeKey::icon(uri.clone(), placement.scale as f32)
                } else {
                    UniqueNodeKey::model(uri.clone())
                };
                let factory = session.resource_cache();
                let fallback = self.default_model.as_deref();
                let post = self.post.as_ref();
                let found = self.unique.get_or_insert(graph, key, |g| {
                    create_instance_node(factory, fallback, post, symbol, &resource, g)
                })?;
                match found {
                    Some((node, inserted)) => {
                        if inserted {
                            stats.unique_nodes_created += 1;
                        }
                        Some(node)
                    }
                    None => {
                        tracing::debug!(
                            uri = %uri,
                            feature = feature.id,
                            "no instance node; skipping feature"
                        );
                        stats.features_skipped += 1;
                        continue;
                    }
                }
            };

            let Some(geometry) = &feature.geometry else {
                stats.features_processed += 1;
                continue;
            };

            for part in geometry.parts() {
                let matrices = match self.part_matrices(&calc, symbol, feature, part, deferred) {
                    Ok(matrices) => matrices,
                    Err(e) => {
                        tracing::warn!(feature = feature.id, error = %e, "skipping geometry part");
                        stats.warnings += 1;
                        continue;
                    }
                };

                for matrix in matrices {
                    if let Some(list) = instructions.as_mut() {
                        list.push(uri.clone(), matrix);
                    } else if let Some(model) = model {
                        let xform = graph.add_node(Node::transform(matrix));
                        graph.add_child(xform, model)?;
                        graph.add_child(attach, xform)?;

                        if !self.config.cluster {
                            if let Some(index) = context.feature_index_mut() {
                                index.tag_node(xform, feature.id);
                            }
                        }
                        if let Some(expr) = &name_expr {
                            let name = self.evaluator.eval_string(expr, feature);
                            if !name.is_empty() {
                                graph.set_name(xform, &name)?;
                            }
                        }
                    }
                    stats.instances_placed += 1;
                }
            }
            stats.features_processed += 1;
        }

        if symbol.is_icon() {
            if symbol.declutter() {
                self.post.activate_declutter(graph, attach, true)?;
            }
            if geocentric {
                graph.state_mut(attach)?.clip_distance0 = true;
            }
        }

        if let Some(list) = instructions {
            tracing::debug!(
                records = list.len(),
                mode = ?list.mode(),
                "recorded deferred placements"
            );
            graph.set_user_data(attach, Arc::new(list))?;
        } else if self.config.use_draw_instanced {
            if session.capabilities().draw_instanced {
                self.post.convert_to_draw_instanced(graph, attach)?;
            } else {
                tracing::debug!("draw-instancing not supported; keeping per-instance transforms");
            }
        }

        stats.missing_uris = missing.len();
        stats.warnings += self.resolver.warnings() - warnings_before;
        Ok(())
    }

    /// Evaluate scale and heading for a feature.
    fn evaluate(&self, symbol: &InstanceSymbol, feature: &Feature) -> Placement {
        let scale = symbol
            .scale
            .as_ref()
            .map(|e| self.evaluator.eval_numeric(e, feature))
            .unwrap_or(1.0);
        let mut scale_vec = Vector3::repeat(scale);
        let mut heading = None;

        if let Some(options) = symbol.model_options() {
            if let Some(e) = &options.scale_x {
                scale_vec.x *= self.evaluator.eval_numeric(e, feature);
            }
            if let Some(e) = &options.scale_y {
                scale_vec.y *= self.evaluator.eval_numeric(e, feature);
            }
            if let Some(e) = &options.scale_z {
                scale_vec.z *= self.evaluator.eval_numeric(e, feature);
            }
            heading = options
                .heading
                .as_ref()
                .map(|e| self.evaluator.eval_numeric(e, feature));
        }

        Placement {
            scale,
            scale_vec,
            heading,
        }
    }

    /// Placement matrices for every vertex of one geometry part.
    ///
    /// Expressions are evaluated again for each vertex. Deferred placements
    /// are not localized.
    fn part_matrices(
        &self,
        calc: &PlacementCalculator,
        symbol: &InstanceSymbol,
        feature: &Feature,
        part: &[instancer_geometry::Point3<f64>],
        deferred: bool,
    ) -> instancer_geometry::Result<Vec<Matrix4<f64>>> {
        let points = calc.prepare_points(part)?;
        points
            .iter()
            .map(|point| {
                let placement = self.evaluate(symbol, feature);
                if deferred {
                    calc.compute_world(point, placement.scale_vec, placement.heading)
                } else {
                    calc.compute(point, placement.scale_vec, placement.heading)
                }
            })
            .collect()
    }
}

/// Build a fresh instance sub-graph for `resource`.
///
/// Icons get screen-space decluttering when the symbol asks for it, and are
/// otherwise wrapped in a camera-facing auto transform.
fn create_instance_node(
    factory: &dyn InstanceNodeFactory,
    fallback: Option<&dyn DefaultModelProvider>,
    post: &dyn ScenePostProcessor,
    symbol: &InstanceSymbol,
    resource: &InstanceResource,
    graph: &mut SceneGraph,
) -> Result<Option<NodeKey>> {
    let node = factory
        .clone_or_create_instance_node(resource, graph)
        .or_else(|| {
            let provider = fallback?;
            tracing::debug!(uri = %resource.uri(), "using default model");
            provider.create_default_model(resource, graph)
        });
    let Some(node) = node else {
        return Ok(None);
    };

    let Some(icon) = symbol.icon_options() else {
        return Ok(Some(node));
    };
    if icon.declutter {
        post.activate_declutter(graph, node, true)?;
        return Ok(Some(node));
    }
    let already_facing = graph
        .node(node)
        .map(|n| n.kind.is_auto_transform())
        .unwrap_or(false);
    if already_facing {
        return Ok(Some(node));
    }
    let wrapper = graph.add_node(Node::auto_transform());
    graph.add_child(wrapper, node)?;
    Ok(Some(wrapper))
}
