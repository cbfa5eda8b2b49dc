/// Counters produced by one budget resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Requests queued with an id (bbox draws excluded)
    pub requests: u32,
    pub full_draws: u32,
    pub partial_draws: u32,
    pub points_only_draws: u32,
    pub no_draws: u32,
    /// Cost of everything visible, before any degradation
    pub requested_gl_primitives: u64,
    /// Cost of what is actually drawn after degradation
    pub drawn_gl_primitives: u64,
    pub culled_instances: u64,
    pub bbox_count: u32,
    /// Non-empty bbox categories
    pub bbox_batches: u32,
    pub over_budget: bool,
}

impl FrameStats {
    /// True when budget pressure degraded at least one request
    pub fn degraded(&self) -> bool {
        self.points_only_draws > 0
    }
}
