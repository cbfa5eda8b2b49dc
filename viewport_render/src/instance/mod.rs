//! Instanced-draw arbitration.
//!
//! `InstanceManager` collects draw requests for one pass, resolves them
//! against the GL-primitive budget and hands each caller its decision.

mod draw_request;
mod bbox_batch;
mod frame_stats;
mod instance_manager;

pub use draw_request::{
    DrawRequest, DrawRequestId, DrawOutcome, ResolvedDraw, BboxStyle,
};
pub use bbox_batch::{BboxBatch, BboxCategory, BBOX_CATEGORY_COUNT};
pub use frame_stats::FrameStats;
pub use instance_manager::{InstanceManager, PassState};
