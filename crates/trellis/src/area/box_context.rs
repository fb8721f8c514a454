//! Context of [`CellAreaBox`](super::CellAreaBox): per-group sizes that
//! line aligned cells up across rows.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use trellis_core::logging::targets;

use super::context::{CellAreaContext, CellAreaContextBase, CellAreaContextExt};
use super::CellAreaRef;
use crate::state::Orientation;

/// Structure of a box's cell groups, as far as its contexts care.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct GroupLayout {
    pub(crate) orientation: Orientation,
    pub(crate) spacing: i32,
    /// Whether each group expands.
    pub(crate) expand: Vec<bool>,
}

#[derive(Debug, Clone)]
struct GroupAllocation {
    length: i32,
    /// `(position, size)` of each group; `None` for groups never requested.
    groups: Vec<Option<(i32, i32)>>,
}

#[derive(Debug, Clone, Default)]
struct BoxContextState {
    layout: GroupLayout,
    /// Largest `(minimum, natural)` request of each group along the box.
    requests: Vec<Option<(i32, i32)>>,
    /// Row request across the box, keyed by the size along it.
    for_size: HashMap<i32, (i32, i32)>,
    allocation: Option<GroupAllocation>,
}

impl BoxContextState {
    fn total_request(&self) -> (i32, i32) {
        let seen: Vec<(i32, i32)> = self.requests.iter().flatten().copied().collect();
        let gaps = self.layout.spacing * (seen.len() as i32 - 1).max(0);
        seen.iter()
            .fold((gaps, gaps), |(min, nat), group| (min + group.0, nat + group.1))
    }
}

/// Accumulates a [`CellAreaBox`](super::CellAreaBox)'s group sizes.
///
/// Each group's request is the largest seen over all rows, so after
/// allocation every row places its groups at the same offsets.
pub struct CellAreaBoxContext {
    base: CellAreaContextBase,
    state: Mutex<BoxContextState>,
}

impl CellAreaBoxContext {
    pub(crate) fn new(area: CellAreaRef, layout: GroupLayout) -> Arc<Self> {
        let requests = vec![None; layout.expand.len()];
        Arc::new(Self {
            base: CellAreaContextBase::new(area),
            state: Mutex::new(BoxContextState {
                layout,
                requests,
                ..Default::default()
            }),
        })
    }

    /// Adopt a new group structure. Group sizes are dropped when it changed.
    pub(crate) fn set_layout(&self, layout: &GroupLayout) {
        let mut state = self.state.lock();
        if state.layout == *layout {
            return;
        }
        state.layout = layout.clone();
        state.requests = vec![None; layout.expand.len()];
        state.for_size.clear();
        state.allocation = None;
        tracing::trace!(target: targets::CONTEXT, groups = layout.expand.len(), "box context regrouped");
    }

    /// Merge one row's group requests and push the resulting row size into
    /// the base context. `None` marks a group with no visible cell in the row.
    pub(crate) fn push_group_requests(&self, requests: &[Option<(i32, i32)>]) {
        let (orientation, total) = {
            let mut state = self.state.lock();
            if requests.len() != state.requests.len() {
                tracing::warn!(
                    target: targets::CONTEXT,
                    expected = state.requests.len(),
                    got = requests.len(),
                    "group count mismatch, request ignored"
                );
                return;
            }
            for (slot, request) in state.requests.iter_mut().zip(requests) {
                if let Some((min, nat)) = *request {
                    let merged = slot.map_or((min, nat), |(m, n)| (m.max(min), n.max(nat)));
                    *slot = Some(merged);
                }
            }
            (state.layout.orientation, state.total_request())
        };
        match orientation {
            Orientation::Horizontal => self.push_preferred_width(total.0, total.1),
            Orientation::Vertical => self.push_preferred_height(total.0, total.1),
        }
    }

    /// Record a row's request across the box for a given size along it.
    pub(crate) fn push_for_size(&self, for_size: i32, minimum: i32, natural: i32) {
        let mut state = self.state.lock();
        let entry = state.for_size.entry(for_size).or_insert((minimum, natural));
        entry.0 = entry.0.max(minimum);
        entry.1 = entry.1.max(natural);
    }

    /// Number of cell groups.
    pub fn n_groups(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Accumulated `(minimum, natural)` request of group `index`.
    pub fn group_request(&self, index: usize) -> Option<(i32, i32)> {
        self.state.lock().requests.get(index).copied().flatten()
    }

    /// `(position, size)` of group `index` after allocation.
    pub fn group_allocation(&self, index: usize) -> Option<(i32, i32)> {
        let state = self.state.lock();
        state.allocation.as_ref()?.groups.get(index).copied().flatten()
    }

    /// Group allocations, if the context was allocated for `length`.
    pub(crate) fn allocation_for(&self, length: i32) -> Option<Vec<Option<(i32, i32)>>> {
        let state = self.state.lock();
        let allocation = state.allocation.as_ref()?;
        (allocation.length == length).then(|| allocation.groups.clone())
    }

    /// A fresh context for `area` holding the same state.
    pub(crate) fn duplicate(&self, area: CellAreaRef) -> Arc<Self> {
        let state = self.state.lock().clone();
        let copy = Arc::new(Self {
            base: CellAreaContextBase::new(area),
            state: Mutex::new(state),
        });
        let (min_width, nat_width) = self.base.preferred_width();
        let (min_height, nat_height) = self.base.preferred_height();
        copy.base.push_preferred_width(min_width, nat_width);
        copy.base.push_preferred_height(min_height, nat_height);
        let (width, height) = self.base.allocation();
        copy.allocate(width.unwrap_or(-1), height.unwrap_or(-1));
        copy
    }
}

impl fmt::Debug for CellAreaBoxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CellAreaBoxContext")
            .field("base", &self.base)
            .field("layout", &state.layout)
            .field("requests", &state.requests)
            .field("allocation", &state.allocation)
            .finish()
    }
}

impl CellAreaContext for CellAreaBoxContext {
    fn context_base(&self) -> &CellAreaContextBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn on_reset(&self) {
        let mut state = self.state.lock();
        state.requests.iter_mut().for_each(|request| *request = None);
        state.for_size.clear();
        state.allocation = None;
    }

    fn on_allocate(&self, width: Option<i32>, height: Option<i32>) {
        let mut state = self.state.lock();
        let length = match state.layout.orientation {
            Orientation::Horizontal => width,
            Orientation::Vertical => height,
        };
        let Some(length) = length else {
            state.allocation = None;
            return;
        };

        let seen: Vec<usize> = (0..state.requests.len())
            .filter(|&index| state.requests[index].is_some())
            .collect();
        let requests: Vec<(i32, i32)> = seen.iter().filter_map(|&i| state.requests[i]).collect();
        let expand: Vec<bool> = seen.iter().map(|&i| state.layout.expand[i]).collect();
        let sizes = distribute(&requests, &expand, length, state.layout.spacing);

        let mut groups = vec![None; state.requests.len()];
        let mut position = 0;
        for (&index, &size) in seen.iter().zip(&sizes) {
            groups[index] = Some((position, size));
            position += size + state.layout.spacing;
        }
        state.allocation = Some(GroupAllocation { length, groups });
    }

    fn group_height_for_width(&self, width: i32) -> Option<(i32, i32)> {
        let state = self.state.lock();
        match state.layout.orientation {
            Orientation::Horizontal => state.for_size.get(&width).copied(),
            Orientation::Vertical => None,
        }
    }

    fn group_width_for_height(&self, height: i32) -> Option<(i32, i32)> {
        let state = self.state.lock();
        match state.layout.orientation {
            Orientation::Vertical => state.for_size.get(&height).copied(),
            Orientation::Horizontal => None,
        }
    }
}

static_assertions::assert_impl_all!(CellAreaBoxContext: Send, Sync);

/// Share `available` out among items requesting `(minimum, natural)`,
/// separated by `spacing`.
///
/// Everyone gets their minimum. What is left goes toward natural sizes,
/// smallest gap first, and the remainder is split evenly among expanding
/// items, the first ones receiving the odd pixels.
pub(crate) fn distribute(requests: &[(i32, i32)], expand: &[bool], available: i32, spacing: i32) -> Vec<i32> {
    if requests.is_empty() {
        return Vec::new();
    }
    let mut sizes: Vec<i32> = requests.iter().map(|&(min, _)| min).collect();
    let mut extra =
        available - spacing * (requests.len() as i32 - 1) - sizes.iter().sum::<i32>();
    if extra <= 0 {
        return sizes;
    }

    let mut by_gap: Vec<usize> = (0..requests.len()).collect();
    by_gap.sort_by_key(|&i| requests[i].1 - requests[i].0);
    for (done, &index) in by_gap.iter().enumerate() {
        let remaining = (by_gap.len() - done) as i32;
        let share = (extra + remaining - 1) / remaining;
        let gap = (requests[index].1 - requests[index].0).max(0);
        let grant = share.min(gap);
        sizes[index] += grant;
        extra -= grant;
    }

    let expanding: Vec<usize> = (0..requests.len())
        .filter(|&i| expand.get(i).copied().unwrap_or(false))
        .collect();
    if extra > 0 && !expanding.is_empty() {
        let count = expanding.len() as i32;
        let each = extra / count;
        let odd = extra % count;
        for (n, &index) in expanding.iter().enumerate() {
            sizes[index] += each + i32::from((n as i32) < odd);
        }
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::{CellAreaBox, CellAreaContextExt};

    fn layout(expand: &[bool]) -> GroupLayout {
        GroupLayout {
            orientation: Orientation::Horizontal,
            spacing: 2,
            expand: expand.to_vec(),
        }
    }

    // =========================================================================
    // Distribution
    // =========================================================================

    #[test]
    fn test_distribute_minimums_when_short() {
        assert_eq!(distribute(&[(10, 20), (5, 30)], &[false, false], 10, 0), vec![10, 5]);
    }

    #[test]
    fn test_distribute_smallest_gap_first() {
        // 10 spare pixels: the 4px gap is filled, the rest goes to the other.
        assert_eq!(distribute(&[(10, 14), (10, 40)], &[false, false], 30, 0), vec![14, 16]);
    }

    #[test]
    fn test_distribute_expands_leftover() {
        let sizes = distribute(&[(10, 10), (10, 10), (10, 10)], &[true, false, true], 43, 1);
        assert_eq!(sizes, vec![16, 10, 15]);
    }

    #[test]
    fn test_distribute_empty() {
        assert!(distribute(&[], &[], 100, 4).is_empty());
    }

    // =========================================================================
    // Context
    // =========================================================================

    #[test]
    fn test_group_requests_merge_and_push_total() {
        let ctx = CellAreaBoxContext::new(CellAreaBox::new(), layout(&[false, false]));
        ctx.push_group_requests(&[Some((10, 20)), Some((5, 5))]);
        ctx.push_group_requests(&[Some((12, 15)), None]);
        assert_eq!(ctx.group_request(0), Some((12, 20)));
        assert_eq!(ctx.group_request(1), Some((5, 5)));
        assert_eq!(ctx.preferred_width(), (19, 27));
    }

    #[test]
    fn test_allocate_places_groups() {
        let ctx = CellAreaBoxContext::new(CellAreaBox::new(), layout(&[true, false, false]));
        ctx.push_group_requests(&[Some((10, 10)), None, Some((20, 20))]);
        ctx.allocate(40, -1);
        assert_eq!(ctx.group_allocation(0), Some((0, 18)));
        assert_eq!(ctx.group_allocation(1), None);
        assert_eq!(ctx.group_allocation(2), Some((20, 20)));
        assert!(ctx.allocation_for(40).is_some());
        assert!(ctx.allocation_for(41).is_none());
    }

    #[test]
    fn test_reset_clears_groups_and_cache() {
        let ctx = CellAreaBoxContext::new(CellAreaBox::new(), layout(&[false]));
        ctx.push_group_requests(&[Some((10, 10))]);
        ctx.push_for_size(10, 16, 20);
        ctx.allocate(10, -1);
        assert_eq!(ctx.preferred_height_for_width(10), Some((16, 20)));

        ctx.reset();
        assert_eq!(ctx.group_request(0), None);
        assert_eq!(ctx.group_allocation(0), None);
        assert_eq!(ctx.preferred_height_for_width(10), None);
        assert_eq!(ctx.preferred_width(), (0, 0));
    }

    #[test]
    fn test_duplicate_carries_state() {
        let area = CellAreaBox::new();
        let ctx = CellAreaBoxContext::new(area.clone(), layout(&[false]));
        ctx.push_group_requests(&[Some((7, 9))]);
        ctx.allocate(9, -1);

        let copy = ctx.duplicate(area);
        assert_eq!(copy.preferred_width(), (7, 9));
        assert_eq!(copy.group_allocation(0), Some((0, 9)));
        assert_eq!(copy.allocation(), (Some(9), None));
    }
}
