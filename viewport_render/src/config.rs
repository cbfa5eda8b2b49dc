//! Instancing configuration: GL-primitive budget and degrade policy.

use crate::error::{Error, Result};

/// Environment variable overriding the GL-primitive budget
pub const BUDGET_ENV_VAR: &str = "VIEWPORT_GL_PRIMITIVE_BUDGET";

/// Default GL-primitive budget for one pass
pub const DEFAULT_GL_PRIMITIVE_BUDGET: u64 = 10_000_000;

/// GL primitives charged for one bounding box (12 edges)
pub const BBOX_GL_PRIMITIVES: u64 = 12;

/// What happens to degradable requests once the budget is exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegradePolicy {
    /// Requests are granted full draws in priority order until the first one
    /// that does not fit; that one and every later one draw as points.
    #[default]
    Overflowing,
    /// Every degradable request draws as points.
    All,
}

/// Order in which requests compete for the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegradeOrder {
    /// Submission order (frame-stable as long as the walker order is stable)
    #[default]
    Submission,
    /// Largest world-space bounds first, submission order on ties
    LargestFirst,
}

/// Budget and policy used by `InstanceManager` when resolving a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstancingConfig {
    /// Maximum GL primitives drawn as full geometry in one pass
    pub gl_primitive_budget: u64,
    /// Degrade behavior once the budget is exceeded
    pub degrade_policy: DegradePolicy,
    /// Competition order under budget pressure
    pub degrade_order: DegradeOrder,
    /// Selected requests compete before unselected ones
    pub prioritize_selected: bool,
    /// Cost charged per queued bounding box
    pub bbox_gl_primitives: u64,
}

impl Default for InstancingConfig {
    fn default() -> Self {
        Self {
            gl_primitive_budget: DEFAULT_GL_PRIMITIVE_BUDGET,
            degrade_policy: DegradePolicy::default(),
            degrade_order: DegradeOrder::default(),
            prioritize_selected: true,
            bbox_gl_primitives: BBOX_GL_PRIMITIVES,
        }
    }
}

impl InstancingConfig {
    pub fn with_budget(mut self, gl_primitive_budget: u64) -> Self {
        self.gl_primitive_budget = gl_primitive_budget;
        self
    }

    pub fn with_degrade_policy(mut self, policy: DegradePolicy) -> Self {
        self.degrade_policy = policy;
        self
    }

    pub fn with_degrade_order(mut self, order: DegradeOrder) -> Self {
        self.degrade_order = order;
        self
    }

    pub fn with_selection_priority(mut self, prioritize_selected: bool) -> Self {
        self.prioritize_selected = prioritize_selected;
        self
    }

    pub fn with_bbox_gl_primitives(mut self, cost: u64) -> Self {
        self.bbox_gl_primitives = cost;
        self
    }

    /// Default config with the budget taken from `VIEWPORT_GL_PRIMITIVE_BUDGET`
    /// when set.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if the variable is set but is not a
    /// positive integer.
    pub fn from_env() -> Result<Self> {
        match std::env::var(BUDGET_ENV_VAR) {
            Ok(value) => Ok(Self::default().with_budget(parse_budget(&value)?)),
            Err(_) => Ok(Self::default()),
        }
    }
}

/// Parse a GL-primitive budget ("250000", "250_000")
pub fn parse_budget(value: &str) -> Result<u64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != '_').collect();
    match cleaned.parse::<u64>() {
        Ok(budget) if budget > 0 => Ok(budget),
        _ => Err(Error::InvalidResource(format!(
            "{} must be a positive integer, got '{}'",
            BUDGET_ENV_VAR, value
        ))),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
