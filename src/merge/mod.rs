//! Merging road segments at shared end points.
//!
//! Roads arrive as many short segments. Both label placement and tile
//! transmission are better off with long polylines, so segments that
//! belong together are joined into chains. What belongs together is
//! decided by a predicate. What happens where more than one segment
//! qualifies is decided by a [`CrossingPolicy`].
//!
//! The two users live in the submodules: [`street`] joins street names
//! for label placement, [`tile`] joins whole road features for tiles.

use std::collections::HashMap;
use smallvec::SmallVec;
use tracing::trace;
use crate::feature::Feature;
use crate::world::Coord;

pub mod simplify;
pub mod street;
pub mod tile;


//------------ Segment -------------------------------------------------------

/// Something with two end points that can be merged.
pub trait Segment {
    /// The coordinate the segment starts at.
    fn first(&self) -> Option<Coord>;

    /// The coordinate the segment ends at.
    fn last(&self) -> Option<Coord>;

    /// The length of the segment. Used to pick among candidates.
    fn length(&self) -> f64;
}


//------------ CrossingPolicy ------------------------------------------------

/// What to do at an end point with several candidates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CrossingPolicy {
    /// End the chain.
    ///
    /// All segments meeting the predicate count, including those already
    /// part of some chain. The chain only continues if there is exactly
    /// one and it is still free.
    Stop,

    /// Continue with the longest free candidate in a new sub-path.
    Split,
}


//------------ MergedChain ---------------------------------------------------

/// A chain of merged segments.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MergedChain {
    pub pieces: Vec<ChainPiece>,
}

/// One segment in a chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChainPiece {
    /// The index of the segment in the input.
    pub index: usize,

    /// Whether the segment runs backwards in the chain.
    pub reversed: bool,

    /// Whether the segment starts a new sub-path at a crossing.
    pub new_path: bool,
}

impl ChainPiece {
    fn new(index: usize, reversed: bool) -> Self {
        ChainPiece { index, reversed, new_path: false }
    }
}

impl MergedChain {
    /// The index of the segment the chain was started with.
    pub fn seed(&self) -> Option<usize> {
        self.pieces.iter().map(|piece| piece.index).min()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn indexes(&self) -> impl Iterator<Item = usize> + '_ {
        self.pieces.iter().map(|piece| piece.index)
    }

    /// Returns the chain’s geometry as a list of sub-paths.
    ///
    /// The coordinates of each segment are provided by the closure. The
    /// shared coordinate between two joined segments appears only once
    /// unless a new sub-path starts there.
    pub fn paths<F>(&self, mut coords: F) -> Vec<Vec<Coord>>
    where F: FnMut(usize) -> Vec<Coord> {
        let mut res = Vec::new();
        let mut path: Vec<Coord> = Vec::new();
        for piece in &self.pieces {
            let mut piece_coords = coords(piece.index);
            if piece.reversed {
                piece_coords.reverse();
            }
            if piece.new_path && !path.is_empty() {
                res.push(std::mem::take(&mut path));
            }
            append_coords(&mut path, piece_coords);
        }
        if !path.is_empty() {
            res.push(path);
        }
        res
    }

    /// Returns the chain’s geometry as a single polyline.
    pub fn coords<F>(&self, coords: F) -> Vec<Coord>
    where F: FnMut(usize) -> Vec<Coord> {
        let mut res = Vec::new();
        for path in self.paths(coords) {
            append_coords(&mut res, path);
        }
        res
    }
}

/// Returns the polygons of a feature joined into one polyline.
pub fn joined_coords(feature: &Feature) -> Vec<Coord> {
    let mut res = Vec::new();
    for poly in &feature.polygons {
        append_coords(&mut res, poly.to_coords());
    }
    res
}

/// Appends coordinates to a path dropping consecutive duplicates.
pub fn append_coords(path: &mut Vec<Coord>, coords: Vec<Coord>) {
    for coord in coords {
        if path.last() != Some(&coord) {
            path.push(coord)
        }
    }
}


//------------ merge_roads ---------------------------------------------------

/// The state of a segment during a merge run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Unvisited,

    /// Part of the chain currently being built.
    Queued,

    /// Part of a finished chain.
    Merged,
}

/// Which end of a segment touches a coordinate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum End {
    First,
    Last,
}

/// The segment ends touching each coordinate.
///
/// Most coordinates are shared by no more than two segments.
type EndIndex = HashMap<Coord, SmallVec<[(usize, End); 2]>>;

/// Merges segments into chains.
///
/// Chains are started from segments in input order and are extended
/// forward from the last coordinate, then backward from the first. Two
/// segments are joined if they touch at an end point and `mergeable`
/// returns true for them. Every segment ends up in exactly one chain.
pub fn merge_roads<T, F>(
    items: &[T], mut mergeable: F, policy: CrossingPolicy
) -> Vec<MergedChain>
where T: Segment, F: FnMut(&T, &T) -> bool {
    let mut ends = EndIndex::new();
    for (index, item) in items.iter().enumerate() {
        if let Some(first) = item.first() {
            ends.entry(first).or_default().push((index, End::First));
        }
        if let Some(last) = item.last() {
            ends.entry(last).or_default().push((index, End::Last));
        }
    }

    let mut state = vec![State::Unvisited; items.len()];
    let mut res = Vec::new();
    for seed in 0..items.len() {
        if state[seed] != State::Unvisited {
            continue
        }
        state[seed] = State::Queued;
        let mut pieces = vec![ChainPiece::new(seed, false)];

        // Forward.
        let mut current = seed;
        let mut open = items[seed].last();
        while let Some(coord) = open {
            let (next, crossing) = match next_piece(
                items, &ends, &state, &mut mergeable, policy, current, coord
            ) {
                Some(next) => next,
                None => break,
            };
            let reversed = items[next].first() != Some(coord);
            open = if reversed { items[next].first() } else { items[next].last() };
            state[next] = State::Queued;
            pieces.push(ChainPiece { index: next, reversed, new_path: crossing });
            current = next;
        }

        // Backward.
        let mut current = seed;
        let mut open = items[seed].first();
        while let Some(coord) = open {
            let (next, crossing) = match next_piece(
                items, &ends, &state, &mut mergeable, policy, current, coord
            ) {
                Some(next) => next,
                None => break,
            };
            let reversed = items[next].last() != Some(coord);
            open = if reversed { items[next].last() } else { items[next].first() };
            state[next] = State::Queued;
            if crossing {
                if let Some(front) = pieces.first_mut() {
                    front.new_path = true;
                }
            }
            pieces.insert(0, ChainPiece::new(next, reversed));
            current = next;
        }

        for piece in &pieces {
            state[piece.index] = State::Merged;
        }
        if pieces.len() > 1 {
            trace!("merged {} segments starting at {}", pieces.len(), seed);
        }
        res.push(MergedChain { pieces });
    }
    res
}

/// Finds the segment to continue a chain with at `coord`.
///
/// Returns the index of the segment and whether the end point is a
/// crossing.
fn next_piece<T, F>(
    items: &[T],
    ends: &EndIndex,
    state: &[State],
    mergeable: &mut F,
    policy: CrossingPolicy,
    current: usize,
    coord: Coord,
) -> Option<(usize, bool)>
where T: Segment, F: FnMut(&T, &T) -> bool {
    let mut candidates: Vec<usize> = Vec::new();
    for &(index, _) in ends.get(&coord)? {
        if index == current || candidates.contains(&index) {
            continue
        }
        if !mergeable(&items[current], &items[index]) {
            continue
        }
        candidates.push(index);
    }
    match policy {
        CrossingPolicy::Stop => {
            match candidates.as_slice() {
                [index] if state[*index] == State::Unvisited => {
                    Some((*index, false))
                }
                _ => None
            }
        }
        CrossingPolicy::Split => {
            candidates.retain(|index| state[*index] == State::Unvisited);
            let crossing = candidates.len() > 1;
            let mut best: Option<usize> = None;
            for index in candidates {
                let better = match best {
                    Some(best) => items[index].length() > items[best].length(),
                    None => true,
                };
                if better {
                    best = Some(index)
                }
            }
            best.map(|index| (index, crossing))
        }
    }
}


//============ Testing =======================================================
