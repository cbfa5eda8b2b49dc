/// Pick records: fixed-size encodings of "what was picked".
///
/// A record is six `i32` slots:
///
/// | slot | geometry / object / UV tile | handle       | floor       |
/// |------|-----------------------------|--------------|-------------|
/// | 0    | `PickType` bits             | `PickType`   | `PickType`  |
/// | 1    | look id                     | handle id    | floor id    |
/// | 2    | detail index                | handle part  | floor part  |
/// | 3-5  | component indices (+1)      | components   | components  |
///
/// Component indices are stored 1-based so that 0 means "unset" and a real
/// index 0 stays distinguishable. Slot 0 alone decides how slots 1-5 are read.

use std::cmp::Ordering;
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

/// Component value meaning "no index" when building records
pub const UNSET_COMPONENT: i32 = -1;

bitflags! {
    /// Pick category bits stored in slot 0.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PickType: u32 {
        const POINT           = 1 << 0;
        const EDGE            = 1 << 1;
        const PRIMITIVE       = 1 << 2;
        const VERTEX          = 1 << 3;
        const BREAKPOINT      = 1 << 4;
        const GUIDE_POINT     = 1 << 5;
        const GUIDE_EDGE      = 1 << 6;
        const GUIDE_PRIMITIVE = 1 << 7;
        const HANDLE          = 1 << 8;
        const OBJECT          = 1 << 9;
        const FLOOR           = 1 << 10;
        const UV_TILE         = 1 << 11;

        /// Any component of displayed geometry
        const GEOMETRY = Self::POINT.bits() | Self::EDGE.bits()
            | Self::PRIMITIVE.bits() | Self::VERTEX.bits() | Self::BREAKPOINT.bits()
            | Self::GUIDE_POINT.bits() | Self::GUIDE_EDGE.bits()
            | Self::GUIDE_PRIMITIVE.bits();

        /// Edge kinds compared order-independently by `are_equivalent_edges`
        const ANY_EDGE = Self::EDGE.bits() | Self::GUIDE_EDGE.bits();
    }
}

/// One picked element. POD, 24 bytes, hashable by raw bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PickRecord {
    data: [i32; 6],
}

const SLOT_TYPE: usize = 0;
const SLOT_ID: usize = 1;
const SLOT_SUB_ID: usize = 2;
const SLOT_COMPONENT: usize = 3;

#[inline]
fn bias(component: i32) -> i32 {
    if component < 0 { 0 } else { component + 1 }
}

impl PickRecord {
    /// Zeroed (unset) record
    pub fn new() -> Self {
        Self::default()
    }

    /// Record from raw slot values, no bias applied
    pub fn from_raw(base: [i32; 3], components: [i32; 3]) -> Self {
        Self {
            data: [base[0], base[1], base[2], components[0], components[1], components[2]],
        }
    }

    /// Geometry or object base record (no components yet)
    pub fn geometry(pick_type: PickType, look_id: i32, detail_index: i32) -> Self {
        Self::from_raw([pick_type.bits() as i32, look_id, detail_index], [0; 3])
    }

    /// Object-level record
    pub fn object(look_id: i32, detail_index: i32) -> Self {
        Self::geometry(PickType::OBJECT, look_id, detail_index)
    }

    /// Handle record with an optional component
    pub fn handle(handle_id: i32, handle_part: i32, component: i32) -> Self {
        Self::from_raw(
            [PickType::HANDLE.bits() as i32, handle_id, handle_part],
            [bias(component), 0, 0],
        )
    }

    /// Floor grid record; components are the grid cell coordinates
    pub fn floor(floor_id: i32, floor_part: i32, cell_x: i32, cell_y: i32) -> Self {
        Self::from_raw(
            [PickType::FLOOR.bits() as i32, floor_id, floor_part],
            [bias(cell_x), bias(cell_y), 0],
        )
    }

    /// UV tile record on a displayed detail
    pub fn uv_tile(look_id: i32, detail_index: i32, tile_u: i32, tile_v: i32) -> Self {
        Self::from_raw(
            [PickType::UV_TILE.bits() as i32, look_id, detail_index],
            [bias(tile_u), bias(tile_v), 0],
        )
    }

    /// Extend `base` with a new type and 0-based component indices.
    ///
    /// Slots 1-2 are copied from `base`. Pass `UNSET_COMPONENT` for unused
    /// components.
    pub fn extended(base: &PickRecord, pick_type: PickType, c1: i32, c2: i32, c3: i32) -> Self {
        let mut record = *base;
        record.change_component(pick_type, c1, c2, c3);
        record
    }

    /// Overwrite the type and components in place (e.g. re-tag a vertex
    /// pick as a point pick)
    pub fn change_component(&mut self, pick_type: PickType, c1: i32, c2: i32, c3: i32) {
        self.data[SLOT_TYPE] = pick_type.bits() as i32;
        self.data[SLOT_COMPONENT] = bias(c1);
        self.data[SLOT_COMPONENT + 1] = bias(c2);
        self.data[SLOT_COMPONENT + 2] = bias(c3);
    }

    // ===== CATEGORY PREDICATES =====

    pub fn pick_type(&self) -> PickType {
        PickType::from_bits_retain(self.data[SLOT_TYPE] as u32)
    }

    pub fn is_set(&self) -> bool {
        self.data[SLOT_TYPE] != 0
    }

    pub fn is_geometry(&self) -> bool {
        self.pick_type().intersects(PickType::GEOMETRY)
    }

    pub fn is_handle(&self) -> bool {
        self.pick_type().intersects(PickType::HANDLE)
    }

    pub fn is_object(&self) -> bool {
        self.pick_type().intersects(PickType::OBJECT)
    }

    pub fn is_floor(&self) -> bool {
        self.pick_type().intersects(PickType::FLOOR)
    }

    pub fn is_uv_tile(&self) -> bool {
        self.pick_type().intersects(PickType::UV_TILE)
    }

    fn has_look(&self) -> bool {
        self.is_geometry() || self.is_object() || self.is_uv_tile()
    }

    // ===== TYPED GETTERS =====

    /// Look id of the displayed object (geometry, object and UV tile picks)
    pub fn look_id(&self) -> i32 {
        debug_assert!(self.has_look(), "look_id() on {:?}", self.pick_type());
        self.data[SLOT_ID]
    }

    /// Detail index within the look (geometry, object and UV tile picks)
    pub fn detail_index(&self) -> i32 {
        debug_assert!(self.has_look(), "detail_index() on {:?}", self.pick_type());
        self.data[SLOT_SUB_ID]
    }

    pub fn handle_id(&self) -> i32 {
        debug_assert!(self.is_handle(), "handle_id() on {:?}", self.pick_type());
        self.data[SLOT_ID]
    }

    pub fn handle_part(&self) -> i32 {
        debug_assert!(self.is_handle(), "handle_part() on {:?}", self.pick_type());
        self.data[SLOT_SUB_ID]
    }

    pub fn floor_id(&self) -> i32 {
        debug_assert!(self.is_floor(), "floor_id() on {:?}", self.pick_type());
        self.data[SLOT_ID]
    }

    pub fn floor_part(&self) -> i32 {
        debug_assert!(self.is_floor(), "floor_part() on {:?}", self.pick_type());
        self.data[SLOT_SUB_ID]
    }

    /// 0-based component index `n` (0..3), `UNSET_COMPONENT` when unset or
    /// when `n` is out of range
    pub fn component_id(&self, n: usize) -> i32 {
        self.data[SLOT_COMPONENT..].get(n).map_or(UNSET_COMPONENT, |&c| c - 1)
    }

    pub fn component_id1(&self) -> i32 {
        self.component_id(0)
    }

    pub fn component_id2(&self) -> i32 {
        self.component_id(1)
    }

    pub fn component_id3(&self) -> i32 {
        self.component_id(2)
    }

    pub fn has_component(&self, n: usize) -> bool {
        self.data[SLOT_COMPONENT..].get(n).map_or(false, |&c| c != 0)
    }

    pub fn tile_u(&self) -> i32 {
        debug_assert!(self.is_uv_tile(), "tile_u() on {:?}", self.pick_type());
        self.component_id1()
    }

    pub fn tile_v(&self) -> i32 {
        debug_assert!(self.is_uv_tile(), "tile_v() on {:?}", self.pick_type());
        self.component_id2()
    }

    // ===== RAW ACCESS =====

    pub fn raw(&self) -> &[i32; 6] {
        &self.data
    }

    /// The 24 bytes handed to the pick buffer sink
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    // ===== COMPARATORS =====

    /// Coarse ordering on slots 0-2 only (type, id, sub id)
    pub fn comparator_fast(a: &PickRecord, b: &PickRecord) -> Ordering {
        a.data[..3].cmp(&b.data[..3])
    }

    /// Exact ordering on all six slots
    pub fn comparator_for_dups(a: &PickRecord, b: &PickRecord) -> Ordering {
        a.data.cmp(&b.data)
    }

    /// True when both records name the same edge, in either direction.
    ///
    /// Non-edge records fall back to exact equality.
    pub fn are_equivalent_edges(a: &PickRecord, b: &PickRecord) -> bool {
        if a.data[..3] != b.data[..3] || a.data[5] != b.data[5] {
            return false;
        }
        let (a1, a2) = (a.data[3], a.data[4]);
        let (b1, b2) = (b.data[3], b.data[4]);
        if a.pick_type().intersects(PickType::ANY_EDGE) {
            (a1 == b1 && a2 == b2) || (a1 == b2 && a2 == b1)
        } else {
            a1 == b1 && a2 == b2
        }
    }

    /// Sort exactly and drop exact duplicates
    pub fn sort_and_dedup(records: &mut Vec<PickRecord>) {
        records.sort_unstable_by(Self::comparator_for_dups);
        records.dedup();
    }

    /// Canonicalize edge direction, then sort and dedup, so (p1,p2) and
    /// (p2,p1) collapse into one record
    pub fn dedup_edges(records: &mut Vec<PickRecord>) {
        for record in records.iter_mut() {
            if record.pick_type().intersects(PickType::ANY_EDGE)
                && record.data[3] > record.data[4]
            {
                record.data.swap(3, 4);
            }
        }
        Self::sort_and_dedup(records);
    }
}

#[cfg(test)]
#[path = "pick_record_tests.rs"]
mod tests;
