//! Basin growth builder.
//!
//! A `Lake` starts at a pit and annexes the lowest cell on its frontier until
//! it commits a boundary pit. The highest committed cell up to that point is
//! the outlet: everything committed after it belongs to the next basin and is
//! dropped, everything before it is flooded to the outlet's level.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use ordered_float::OrderedFloat;

use crate::error::HydrologyError;

use super::node::FlowNode;

/// Frontier entry ordered by elevation, then by insertion so equal
/// elevations are annexed first-come first-served.
type FrontierEntry = Reverse<(OrderedFloat<f64>, u64, usize)>;

#[derive(Debug, Clone)]
pub struct Lake {
    /// Committed cells in annexation order, seed first.
    members: Vec<usize>,
    member_set: HashSet<usize>,
    frontier: BinaryHeap<FrontierEntry>,
    frontier_set: HashSet<usize>,
    next_seq: u64,
    outlet: Option<usize>,
    surface: Option<f64>,
}

impl Lake {
    /// Start a lake at `seed`, which must be a pit.
    pub fn new(seed: usize, nodes: &[FlowNode]) -> Result<Self, HydrologyError> {
        let node = &nodes[seed];
        if !node.is_pit() {
            return Err(HydrologyError::NotAPit {
                row: node.row(),
                col: node.col(),
            });
        }
        let mut lake = Self {
            members: Vec::new(),
            member_set: HashSet::new(),
            frontier: BinaryHeap::new(),
            frontier_set: HashSet::new(),
            next_seq: 0,
            outlet: None,
            surface: None,
        };
        lake.push_member(seed);
        Ok(lake)
    }

    /// Queue every candidate that is neither committed nor already queued.
    pub fn add_neighbours(&mut self, candidates: &[usize], nodes: &[FlowNode]) {
        for &c in candidates {
            if self.member_set.contains(&c) || !self.frontier_set.insert(c) {
                continue;
            }
            let elevation = OrderedFloat(nodes[c].elevation());
            self.frontier.push(Reverse((elevation, self.next_seq, c)));
            self.next_seq += 1;
        }
    }

    /// Lowest frontier cell; ties go to the one queued first.
    pub fn lowest_frontier_member(&self) -> Option<usize> {
        self.frontier.peek().map(|Reverse((_, _, idx))| *idx)
    }

    /// Move the lowest frontier cell into the lake and return it.
    pub fn commit_lowest(&mut self) -> Option<usize> {
        let Reverse((_, _, idx)) = self.frontier.pop()?;
        self.frontier_set.remove(&idx);
        self.push_member(idx);
        Some(idx)
    }

    fn push_member(&mut self, idx: usize) {
        debug_assert!(!self.frontier_set.contains(&idx));
        let inserted = self.member_set.insert(idx);
        debug_assert!(inserted, "cell {idx} committed twice");
        self.members.push(idx);
    }

    /// Drop every member committed after position `last`.
    pub(super) fn truncate_after(&mut self, last: usize) {
        for idx in self.members.drain(last + 1..) {
            self.member_set.remove(&idx);
        }
    }

    /// Position of the highest member; later members win ties.
    fn highest_position(&self, nodes: &[FlowNode]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (pos, &idx) in self.members.iter().enumerate() {
            let elevation = nodes[idx].elevation();
            if best.map_or(true, |(_, e)| elevation >= e) {
                best = Some((pos, elevation));
            }
        }
        best.map(|(pos, _)| pos)
    }

    /// Pick the outlet, cut the members after it and flood the rest to its level.
    ///
    /// The last committed member is the terminus where growth stopped.
    pub fn finalise(&mut self, nodes: &mut [FlowNode]) -> Result<(), HydrologyError> {
        let Some(highest) = self.highest_position(nodes) else {
            return Ok(());
        };
        self.truncate_after(highest);
        let outlet = self.members[highest];
        let level = nodes[outlet].elevation();
        for &idx in &self.members {
            nodes[idx].fill(level)?;
        }
        self.outlet = Some(outlet);
        self.surface = Some(level);
        self.frontier.clear();
        self.frontier_set.clear();
        Ok(())
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.member_set.contains(&idx)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier_set.len()
    }

    /// The cell the lake spills through, once finalised.
    pub fn outlet(&self) -> Option<usize> {
        self.outlet
    }

    /// Water level every member was filled to.
    pub fn surface_elevation(&self) -> Option<f64> {
        self.surface
    }

    pub fn is_finalised(&self) -> bool {
        self.outlet.is_some()
    }
}
