//! Pick buffer records.

mod pick_record;

pub use pick_record::{PickRecord, PickType, UNSET_COMPONENT};
