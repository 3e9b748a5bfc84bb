//! Connection points and proximity-based resource routing.
//!
//! Buildings expose input and output points at fixed local offsets from
//! their centroid. There is no persistent edge graph: every routing attempt
//! re-scans candidate buildings within a search radius, compares squared
//! distances, and breaks ties deterministically by placement sequence and
//! point index. Candidates are supplied in placement order, so two runs
//! with the same placements route identically.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::building::Building;
use crate::fixed::Fixed64;
use crate::id::BuildingId;
use crate::math::WorldPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    Input,
    Output,
}

/// A connection point template: direction plus an offset local to the
/// owning building's centroid (rotated at query time).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    pub kind: ConnectionKind,
    pub offset: crate::math::Vec2Fixed,
}

/// An input point found by a routing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacentInput {
    pub building: BuildingId,
    pub point_index: usize,
    pub distance_sq_raw: i64,
    pub owner_seq: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("building definition '{name}' has no {missing} connection point")]
    MissingPoint { name: String, missing: &'static str },
}

/// A routing-capable point set needs at least one input and one output.
pub fn validate_routing_points(name: &str, points: &[ConnectionPoint]) -> Result<(), ConnectionError> {
    if !points.iter().any(|p| p.kind == ConnectionKind::Input) {
        return Err(ConnectionError::MissingPoint {
            name: name.to_string(),
            missing: "input",
        });
    }
    if !points.iter().any(|p| p.kind == ConnectionKind::Output) {
        return Err(ConnectionError::MissingPoint {
            name: name.to_string(),
            missing: "output",
        });
    }
    Ok(())
}

/// Find the closest input point within `radius` of `from`, excluding
/// points owned by `exclude`.
///
/// Ties break by (squared distance, owner placement sequence, point
/// index); `candidates` must be supplied in a stable order for the result
/// to be reproducible.
pub fn closest_adjacent_input<'a, I>(
    from: WorldPos,
    exclude: BuildingId,
    radius: Fixed64,
    candidates: I,
) -> Option<AdjacentInput>
where
    I: IntoIterator<Item = (BuildingId, &'a Building)>,
{
    let radius_sq = radius * radius;
    let mut best: Option<AdjacentInput> = None;
    for (id, building) in candidates {
        if id == exclude {
            continue;
        }
        for (index, point) in building.points.iter().enumerate() {
            if point.kind != ConnectionKind::Input {
                continue;
            }
            let pos = building.center.add(building.rotation.apply(point.offset));
            let dist_sq = from.distance_sq(pos);
            if dist_sq >= radius_sq {
                continue;
            }
            let candidate = AdjacentInput {
                building: id,
                point_index: index,
                distance_sq_raw: dist_sq.to_bits(),
                owner_seq: building.seq,
            };
            let better = match &best {
                None => true,
                Some(b) => {
                    (candidate.distance_sq_raw, candidate.owner_seq, candidate.point_index)
                        < (b.distance_sq_raw, b.owner_seq, b.point_index)
                }
            };
            if better {
                best = Some(candidate);
            }
        }
    }
    best
}
