/// Frame-scoped arbiter for instanced draws.
///
/// Primitives that stand for many copies of one shape queue draw requests
/// during update instead of drawing. Once every primitive has been updated
/// the walker calls `process_draw_requests`, which culls, sums the cost of
/// everything visible and, when the GL-primitive budget is exceeded,
/// degrades requests to points in a deterministic order. During render each
/// primitive reads its decision back with the id it received.
///
/// ```text
/// begin_pass -> add_view_frustum* -> queue_*  -> process_draw_requests
///            -> draw_request_result* / draw_bbox_batches -> end_pass
/// ```

use std::sync::Arc;
use glam::Mat4;
use rdst::RadixSort;
use crate::config::{InstancingConfig, DegradePolicy, DegradeOrder};
use crate::culling::{BoundingBox, Frustum};
use crate::engine::Engine;
use crate::error::{DrawRequestError, Result};
use crate::primitive::InstanceAttributes;
use crate::render::{RenderMode, RenderFlags};
use crate::renderer::{Renderer, DrawCall, BufferHandle};
use crate::{render_debug, render_trace, render_warn, render_bail};
use super::bbox_batch::{BboxBatch, BboxCategory, QueuedBbox, BBOX_CATEGORY_COUNT};
use super::draw_request::{
    DrawRequest, DrawRequestId, DrawOutcome, ResolvedDraw, BboxStyle,
};
use super::frame_stats::FrameStats;

const SOURCE: &str = "viewport::InstanceManager";

/// Low bits of a sort key holding the request index
const INDEX_BITS: u32 = 31;
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;

/// Where the manager is in its pass cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassState {
    /// Between `end_pass` and `begin_pass`
    Idle,
    /// Accepting `queue_*` calls
    Queueing,
    /// Resolved; results can be read until `end_pass`
    Resolved,
}

struct QueuedDraw {
    request: DrawRequest,
    instances: Option<InstanceAttributes>,
    subset: Option<Arc<[u32]>>,
    uncullable: bool,
}

impl QueuedDraw {
    fn total_count(&self) -> usize {
        self.instances.as_ref().map_or(1, |i| i.len())
    }

    fn instance_transform(&self, index: u32) -> Mat4 {
        match &self.instances {
            Some(instances) => self.request.transform * instances.transforms[index as usize],
            None => self.request.transform,
        }
    }
}

/// Intermediate per-request numbers of one resolution
struct Candidate {
    /// Distinct instances considered before culling
    considered: usize,
    visible: Vec<u32>,
    cost: u64,
    selected: bool,
}

pub struct InstanceManager {
    config: InstancingConfig,
    state: PassState,
    /// Incremented by every `begin_pass`; stamps the ids of that pass
    pass: u64,
    frustums: Vec<Frustum>,
    queued: Vec<QueuedDraw>,
    resolved: Vec<ResolvedDraw>,
    bboxes: Vec<QueuedBbox>,
    batches: [BboxBatch; BBOX_CATEGORY_COUNT],
    stats: FrameStats,
}

impl Default for InstanceManager {
    /// Manager using the process-wide default config
    fn default() -> Self {
        Self::new(Engine::instancing_config())
    }
}

impl InstanceManager {
    pub fn new(config: InstancingConfig) -> Self {
        Self {
            config,
            state: PassState::Idle,
            pass: 0,
            frustums: Vec::new(),
            queued: Vec::new(),
            resolved: Vec::new(),
            bboxes: Vec::new(),
            batches: std::array::from_fn(|i| BboxBatch::new(BboxCategory::from_index(i))),
            stats: FrameStats::default(),
        }
    }

    pub fn config(&self) -> &InstancingConfig {
        &self.config
    }

    /// Replace the config. Takes effect at the next resolution.
    pub fn set_config(&mut self, config: InstancingConfig) {
        self.config = config;
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    /// Serial of the current (or last) pass
    pub fn pass_serial(&self) -> u64 {
        self.pass
    }

    /// Statistics of the last resolution
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn queued_count(&self) -> usize {
        self.queued.len()
    }

    // ===== PASS LIFECYCLE =====

    /// Open a new pass, discarding everything left from the previous one.
    pub fn begin_pass(&mut self) {
        if self.state != PassState::Idle {
            render_warn!(SOURCE, "begin_pass while pass {} is still open, discarding it", self.pass);
        }
        self.clear();
        self.pass += 1;
        self.state = PassState::Queueing;
        render_trace!(SOURCE, "begin pass {}", self.pass);
    }

    /// Close the pass. Ids issued during it become invalid.
    pub fn end_pass(&mut self) {
        if self.state == PassState::Queueing && !self.queued.is_empty() {
            render_debug!(
                SOURCE,
                "pass {} ended with {} unresolved requests",
                self.pass, self.queued.len()
            );
        }
        self.clear();
        self.state = PassState::Idle;
        render_trace!(SOURCE, "end pass {}", self.pass);
    }

    fn clear(&mut self) {
        self.frustums.clear();
        self.queued.clear();
        self.resolved.clear();
        self.bboxes.clear();
        for batch in &mut self.batches {
            batch.clear();
        }
        self.stats = FrameStats::default();
    }

    fn check_queueing(&self, call: &str) -> std::result::Result<(), DrawRequestError> {
        let error = match self.state {
            PassState::Queueing => return Ok(()),
            PassState::Idle => DrawRequestError::NotInPass,
            PassState::Resolved => DrawRequestError::AlreadyProcessed,
        };
        render_warn!(SOURCE, "{} rejected: {}", call, error);
        Err(error)
    }

    /// Record the frustum of a viewport drawn in this pass.
    ///
    /// Instances outside every recorded frustum are culled. With no frustum
    /// recorded nothing is culled.
    pub fn add_view_frustum(&mut self, frustum: Frustum) -> std::result::Result<(), DrawRequestError> {
        self.check_queueing("add_view_frustum")?;
        self.frustums.push(frustum);
        Ok(())
    }

    // ===== QUEUEING =====

    fn push(&mut self, queued: QueuedDraw) -> DrawRequestId {
        let index = self.queued.len() as u32;
        self.queued.push(queued);
        DrawRequestId { pass: self.pass, index }
    }

    /// Queue a single-transform draw
    pub fn queue_draw_request(
        &mut self,
        request: DrawRequest,
    ) -> std::result::Result<DrawRequestId, DrawRequestError> {
        self.check_queueing("queue_draw_request")?;
        Ok(self.push(QueuedDraw { request, instances: None, subset: None, uncullable: false }))
    }

    /// Queue one draw per instance transform
    pub fn queue_instance_draw_request(
        &mut self,
        request: DrawRequest,
        instances: InstanceAttributes,
    ) -> std::result::Result<DrawRequestId, DrawRequestError> {
        self.check_queueing("queue_instance_draw_request")?;
        if !instances.is_consistent() {
            return Err(DrawRequestError::MismatchedInstanceData);
        }
        Ok(self.push(QueuedDraw {
            request,
            instances: Some(instances),
            subset: None,
            uncullable: false,
        }))
    }

    /// Queue a draw of the instances listed in `indices` only
    pub fn queue_partial_instance_draw_request(
        &mut self,
        request: DrawRequest,
        instances: InstanceAttributes,
        indices: Arc<[u32]>,
    ) -> std::result::Result<DrawRequestId, DrawRequestError> {
        self.check_queueing("queue_partial_instance_draw_request")?;
        let count = instances.len();
        if !instances.is_consistent() || indices.iter().any(|&i| i as usize >= count) {
            return Err(DrawRequestError::MismatchedInstanceData);
        }
        Ok(self.push(QueuedDraw {
            request,
            instances: Some(instances),
            subset: Some(indices),
            uncullable: false,
        }))
    }

    /// Queue a draw that is never culled nor degraded.
    ///
    /// Its cost is charged before any other request is considered.
    pub fn queue_uncullable_draw(
        &mut self,
        request: DrawRequest,
    ) -> std::result::Result<DrawRequestId, DrawRequestError> {
        self.check_queueing("queue_uncullable_draw")?;
        Ok(self.push(QueuedDraw { request, instances: None, subset: None, uncullable: true }))
    }

    /// Queue one bounding box, batched by style
    pub fn queue_bbox_draw(
        &mut self,
        bounds: &BoundingBox,
        transform: &Mat4,
        style: BboxStyle,
    ) -> std::result::Result<(), DrawRequestError> {
        self.check_queueing("queue_bbox_draw")?;
        self.bboxes.push(QueuedBbox { world: bounds.transformed(transform), style });
        Ok(())
    }

    /// Queue one bounding box per instance transform
    pub fn queue_bbox_instance_draw(
        &mut self,
        bounds: &BoundingBox,
        transform: &Mat4,
        instances: &[Mat4],
        style: BboxStyle,
    ) -> std::result::Result<(), DrawRequestError> {
        self.check_queueing("queue_bbox_instance_draw")?;
        self.bboxes.extend(instances.iter().map(|instance| QueuedBbox {
            world: bounds.transformed(&(*transform * *instance)),
            style,
        }));
        Ok(())
    }

    // ===== RESOLUTION =====

    fn is_visible(&self, world: &BoundingBox) -> bool {
        self.frustums.is_empty() || self.frustums.iter().any(|f| f.intersects_box(world))
    }

    fn evaluate(&self, queued: &QueuedDraw) -> Candidate {
        let mut visible: Vec<u32> = match &queued.subset {
            Some(subset) => {
                let mut indices = subset.to_vec();
                indices.sort_unstable();
                indices.dedup();
                indices
            }
            None => (0..queued.total_count() as u32).collect(),
        };
        let considered = visible.len();

        if !queued.uncullable && !self.frustums.is_empty() {
            visible.retain(|&i| {
                let world = queued.request.bounds.transformed(&queued.instance_transform(i));
                self.is_visible(&world)
            });
        }

        let cost = queued.request.gl_primitives.saturating_mul(visible.len() as u64);
        let selected = queued.request.flags.contains(RenderFlags::SELECTED)
            || queued.instances.as_ref().map_or(false, |instances| {
                visible.iter().any(|&i| instances.is_selected(i as usize))
            });

        Candidate { considered, visible, cost, selected }
    }

    /// Sort key: selection priority, then size (largest first) when
    /// configured, then submission index. Smaller keys are granted first.
    fn priority_key(&self, index: usize, queued: &QueuedDraw, candidate: &Candidate) -> u64 {
        let mut key = index as u64 & INDEX_MASK;

        if self.config.prioritize_selected && !candidate.selected {
            key |= 1 << 63;
        }

        if self.config.degrade_order == DegradeOrder::LargestFirst {
            let diagonal = queued.request.bounds.transformed(&queued.request.transform).diagonal();
            let diagonal = if diagonal.is_finite() { diagonal.max(0.0) } else { 0.0 };
            // Non-negative floats order like their bit patterns
            let inverted = u32::MAX - diagonal.to_bits();
            key |= (inverted as u64) << INDEX_BITS;
        }

        key
    }

    /// Resolve every queued request against the budget.
    ///
    /// Must be called once per pass, after the last `queue_*` call and
    /// before any `draw_request_result`.
    pub fn process_draw_requests(&mut self) -> std::result::Result<FrameStats, DrawRequestError> {
        self.check_queueing("process_draw_requests")?;

        let candidates: Vec<Candidate> = self.queued.iter().map(|q| self.evaluate(q)).collect();

        let mut stats = FrameStats {
            requests: self.queued.len() as u32,
            ..FrameStats::default()
        };

        // Bounding boxes
        let bbox_cost = self.config.bbox_gl_primitives;
        let mut visible_bboxes = 0u64;
        for index in 0..self.bboxes.len() {
            let bbox = self.bboxes[index];
            if self.is_visible(&bbox.world) {
                let category = BboxCategory::from_style(&bbox.style);
                self.batches[category.index()].push(&bbox);
                visible_bboxes += 1;
            }
        }
        stats.bbox_count = visible_bboxes as u32;
        stats.bbox_batches = self.batches.iter().filter(|b| !b.is_empty()).count() as u32;
        let bbox_total = bbox_cost.saturating_mul(visible_bboxes);

        // Budget
        let mut uncullable_total = 0u64;
        let mut degradable_total = 0u64;
        for (queued, candidate) in self.queued.iter().zip(&candidates) {
            stats.culled_instances += (candidate.considered - candidate.visible.len()) as u64;
            if queued.uncullable {
                uncullable_total = uncullable_total.saturating_add(candidate.cost);
            } else {
                degradable_total = degradable_total.saturating_add(candidate.cost);
            }
        }
        let requested = uncullable_total
            .saturating_add(bbox_total)
            .saturating_add(degradable_total);
        let budget = self.config.gl_primitive_budget;
        stats.requested_gl_primitives = requested;
        stats.over_budget = requested > budget;

        let mut degraded = vec![false; self.queued.len()];
        if stats.over_budget {
            let mut keys: Vec<u64> = self.queued.iter()
                .zip(&candidates)
                .enumerate()
                .filter(|(_, (q, c))| !q.uncullable && !c.visible.is_empty())
                .map(|(i, (q, c))| self.priority_key(i, q, c))
                .collect();
            keys.radix_sort_unstable();

            let mut remaining = budget.saturating_sub(uncullable_total.saturating_add(bbox_total));
            let mut overflowed = self.config.degrade_policy == DegradePolicy::All;
            for key in keys {
                let index = (key & INDEX_MASK) as usize;
                let cost = candidates[index].cost;
                if !overflowed && cost <= remaining {
                    remaining -= cost;
                } else {
                    overflowed = true;
                    degraded[index] = true;
                }
            }
        }

        // Results
        let mut resolved = Vec::with_capacity(self.queued.len());
        for ((queued, candidate), degraded) in self.queued.iter().zip(candidates).zip(degraded) {
            let visible_count = candidate.visible.len();
            let (outcome, mode, gl_primitives) = if visible_count == 0 {
                (DrawOutcome::NoDraw, queued.request.mode, 0)
            } else if degraded {
                (DrawOutcome::PointsOnlyDraw, RenderMode::Points, visible_count as u64)
            } else if visible_count == queued.total_count() || queued.uncullable {
                (DrawOutcome::FullDraw, queued.request.mode, candidate.cost)
            } else {
                (DrawOutcome::PartialDraw, queued.request.mode, candidate.cost)
            };

            match outcome {
                DrawOutcome::NoDraw => stats.no_draws += 1,
                DrawOutcome::PartialDraw => stats.partial_draws += 1,
                DrawOutcome::PointsOnlyDraw => stats.points_only_draws += 1,
                DrawOutcome::FullDraw => stats.full_draws += 1,
            }
            stats.drawn_gl_primitives = stats.drawn_gl_primitives.saturating_add(gl_primitives);

            resolved.push(ResolvedDraw {
                outcome,
                mode,
                flags: queued.request.flags,
                params: queued.request.params,
                transform: queued.request.transform,
                instances: queued.instances.clone(),
                visible_indices: candidate.visible.into(),
                gl_primitives,
            });
        }
        stats.drawn_gl_primitives = stats.drawn_gl_primitives.saturating_add(bbox_total);

        if stats.over_budget {
            render_warn!(
                SOURCE,
                "GL primitive budget exceeded ({} requested, {} allowed): {} of {} requests drawn as points",
                requested, budget, stats.points_only_draws, stats.requests
            );
        }
        render_debug!(
            SOURCE,
            "pass {} resolved: {} full, {} partial, {} points, {} hidden, {} boxes in {} batches, {} GL primitives",
            self.pass, stats.full_draws, stats.partial_draws, stats.points_only_draws,
            stats.no_draws, stats.bbox_count, stats.bbox_batches, stats.drawn_gl_primitives
        );

        self.resolved = resolved;
        self.stats = stats;
        self.state = PassState::Resolved;
        Ok(stats)
    }

    // ===== RETRIEVAL =====

    /// Decision for a request queued in this pass.
    ///
    /// Returns the same result on every call until `end_pass`. Callers treat
    /// any error as "do not draw".
    pub fn draw_request_result(
        &self,
        id: DrawRequestId,
    ) -> std::result::Result<&ResolvedDraw, DrawRequestError> {
        let index = id.index as usize;
        if self.state == PassState::Idle || id.pass != self.pass || index >= self.queued.len() {
            render_warn!(
                SOURCE,
                "unknown draw request {}:{} (current pass {})",
                id.pass, id.index, self.pass
            );
            return Err(DrawRequestError::NoSuchId);
        }
        if self.state == PassState::Queueing {
            return Err(DrawRequestError::NotProcessed);
        }
        self.resolved.get(index).ok_or(DrawRequestError::NoSuchId)
    }

    /// Non-empty bbox batches of the resolved pass, in category order
    pub fn bbox_batches(&self) -> impl Iterator<Item = &BboxBatch> + '_ {
        self.batches.iter().filter(|b| !b.is_empty())
    }

    /// Submit one unit-cube draw per non-empty bbox category.
    ///
    /// Returns the number of draw calls issued.
    pub fn draw_bbox_batches(&self, renderer: &mut dyn Renderer) -> Result<u32> {
        if self.state != PassState::Resolved {
            render_bail!(SOURCE, "draw_bbox_batches before process_draw_requests");
        }

        let mut calls = 0;
        for batch in self.bbox_batches() {
            let category = batch.category();
            let mode = if category.is_wireframe() { RenderMode::Wireframe } else { RenderMode::Shaded };
            let mut flags = RenderFlags::empty();
            if category.is_selected() {
                flags |= RenderFlags::SELECTED;
            }
            if category.is_colored() {
                flags |= RenderFlags::INSTANCE_COLORS;
            }

            let call = DrawCall {
                instances: batch.matrices(),
                colors: batch.colors(),
                ..DrawCall::single(
                    BufferHandle::UNIT_CUBE,
                    Mat4::IDENTITY,
                    mode,
                    flags,
                    Default::default(),
                    self.config.bbox_gl_primitives.saturating_mul(batch.len() as u64),
                )
            };
            renderer.submit(&call)?;
            calls += 1;
        }
        Ok(calls)
    }
}

#[cfg(test)]
#[path = "instance_manager_tests.rs"]
mod tests;
