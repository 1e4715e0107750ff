#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks the next known cell the agent should travel to.

use std::cmp::Ordering;

use grid_explorer_core::{CellCoord, Classification, GridPoint, Target};
use grid_explorer_world::{query, Cell, Grid};
use tracing::{debug, debug_span};

/// Target selection system.
#[derive(Debug, Default)]
pub struct TargetSelector;

impl TargetSelector {
    /// Creates a new target selector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validates the current target and picks a new one when needed.
    ///
    /// A target whose cell is no longer known is dropped. Without a target,
    /// every known cell competes: the nearest navigable point wins, then the
    /// lower [`TravelScore`], then the smaller column and row. Returns the
    /// target held after the call, which is `None` only when no known cell
    /// exists.
    pub fn handle(
        &self,
        grid: &Grid,
        agent_position: GridPoint,
        target: &mut Option<Target>,
    ) -> Option<Target> {
        if let Some(current) = *target {
            if query::classification(grid, current.cell) != Some(Classification::Known) {
                debug!(cell = ?current.cell, "target cell is no longer known; clearing target");
                *target = None;
            }
        }

        if target.is_none() {
            let _span = debug_span!("grid_explorer.select").entered();
            *target = query::cells_with(grid, Classification::Known)
                .map(|cell| BestCandidate::evaluate(grid, cell, agent_position))
                .reduce(|best, candidate| {
                    if candidate.precedes(&best) {
                        candidate
                    } else {
                        best
                    }
                })
                .map(|best| Target {
                    cell: best.cell,
                    point: best.point,
                });

            if let Some(acquired) = *target {
                debug!(cell = ?acquired.cell, point = %acquired.point, "acquired exploration target");
            }
        }

        *target
    }
}

/// Local coverage density around a cell; lower values are preferred.
///
/// Counts the cell and its in-bounds neighbors in the surrounding 3×3 block.
/// The score is `1 - seen / classified`, where `classified` counts cells not
/// classified unknown. A block with nothing classified scores zero. Scores
/// compare by value, so `1/2` and `2/4` are equal.
#[derive(Clone, Copy, Debug)]
pub struct TravelScore {
    seen: u32,
    classified: u32,
}

impl TravelScore {
    /// Measures the block centred on the provided cell.
    #[must_use]
    pub fn of(grid: &Grid, coord: CellCoord) -> Self {
        let mut score = Self {
            seen: 0,
            classified: 0,
        };
        for neighbor in query::neighborhood(grid, coord) {
            match neighbor.classification() {
                Classification::Unknown => {}
                Classification::Seen => {
                    score.seen += 1;
                    score.classified += 1;
                }
                _ => score.classified += 1,
            }
        }
        score
    }

    /// Score as a fraction in `[0, 1]`.
    #[must_use]
    pub fn value(&self) -> f32 {
        if self.classified == 0 {
            return 0.0;
        }
        1.0 - self.seen as f32 / self.classified as f32
    }

    /// Numerator and denominator of the score, exact.
    fn ratio(&self) -> (u64, u64) {
        if self.classified == 0 {
            (0, 1)
        } else {
            (
                u64::from(self.classified - self.seen),
                u64::from(self.classified),
            )
        }
    }
}

impl PartialEq for TravelScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TravelScore {}

impl PartialOrd for TravelScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TravelScore {
    fn cmp(&self, other: &Self) -> Ordering {
        let (left_numerator, left_denominator) = self.ratio();
        let (right_numerator, right_denominator) = other.ratio();
        (left_numerator * right_denominator).cmp(&(right_numerator * left_denominator))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    distance_sq: i64,
    score: TravelScore,
    cell: CellCoord,
    point: GridPoint,
}

impl BestCandidate {
    fn evaluate(grid: &Grid, cell: &Cell, agent_position: GridPoint) -> Self {
        let point = cell.navigable_point();
        Self {
            distance_sq: point.distance_squared(agent_position),
            score: TravelScore::of(grid, cell.index()),
            cell: cell.index(),
            point,
        }
    }

    fn precedes(&self, other: &Self) -> bool {
        if self.distance_sq != other.distance_sq {
            return self.distance_sq < other.distance_sq;
        }

        match self.score.cmp(&other.score) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }

        if self.cell.column() != other.cell.column() {
            return self.cell.column() < other.cell.column();
        }

        self.cell.row() < other.cell.row()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_ordering_is_exact() {
        let half = TravelScore {
            seen: 1,
            classified: 2,
        };
        let also_half = TravelScore {
            seen: 2,
            classified: 4,
        };
        let isolated = TravelScore {
            seen: 0,
            classified: 0,
        };
        let untouched = TravelScore {
            seen: 0,
            classified: 3,
        };

        assert_eq!(half.cmp(&also_half), Ordering::Equal);
        assert_eq!(half, also_half);
        assert!(isolated < half);
        assert!(half < untouched);
        assert_eq!(isolated.value(), 0.0);
        assert_eq!(untouched.value(), 1.0);
    }

    #[test]
    fn column_then_row_breaks_remaining_ties() {
        let score = TravelScore {
            seen: 0,
            classified: 1,
        };
        let candidate = |column, row| BestCandidate {
            distance_sq: 4,
            score,
            cell: CellCoord::new(column, row),
            point: GridPoint::ZERO,
        };

        assert!(candidate(1, 5).precedes(&candidate(2, 0)));
        assert!(candidate(2, 0).precedes(&candidate(2, 1)));
        assert!(!candidate(2, 1).precedes(&candidate(2, 1)));
    }

    #[test]
    fn equal_ratios_fall_through_to_column() {
        let candidate = |column, seen, classified| BestCandidate {
            distance_sq: 4,
            score: TravelScore { seen, classified },
            cell: CellCoord::new(column, 0),
            point: GridPoint::ZERO,
        };

        assert!(candidate(2, 2, 4).precedes(&candidate(6, 1, 2)));
        assert!(!candidate(6, 1, 2).precedes(&candidate(2, 2, 4)));
    }
}
