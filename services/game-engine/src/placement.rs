//! Randomized fleet placement
//!
//! Places the five ship classes on an empty grid, one class at a time in
//! fixed size order. Each attempt draws an unbiased orientation and a start
//! cell uniform over the valid range for that orientation; the first
//! placement whose cells are all unoccupied is committed. If a class
//! exhausts its attempts the whole fleet-in-progress is discarded and
//! generation restarts, up to a bounded number of restarts.
//!
//! The bounds keep worst-case latency and stack depth fixed; the generator
//! never returns an overlapping or out-of-bounds fleet.

use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;
use types::board::{Orientation, Ship, ShipCell, ShipClass, BOARD_SIZE};

/// Random placements tried per ship before the fleet is discarded
pub const MAX_SHIP_ATTEMPTS: u32 = 100;

/// Fleet restarts before giving up entirely
pub const MAX_FLEET_RESTARTS: u32 = 50;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// Every restart exhausted its attempts; statistically near-impossible
    /// on a 10×10 grid, but bounded rather than looping forever.
    #[error("fleet placement exhausted after {restarts} restarts")]
    Exhausted { restarts: u32 },
}

/// Generate a complete valid fleet: one ship of each class, no two ships
/// sharing a cell, every cell on the grid.
pub fn generate_fleet<R: Rng + ?Sized>(rng: &mut R) -> Result<Vec<Ship>, PlacementError> {
    for _ in 0..MAX_FLEET_RESTARTS {
        if let Some(fleet) = try_generate_fleet(rng) {
            return Ok(fleet);
        }
    }
    Err(PlacementError::Exhausted { restarts: MAX_FLEET_RESTARTS })
}

/// One full fleet attempt; None if any class ran out of attempts
fn try_generate_fleet<R: Rng + ?Sized>(rng: &mut R) -> Option<Vec<Ship>> {
    let mut fleet = Vec::with_capacity(ShipClass::ALL.len());
    let mut occupied: HashSet<(u8, u8)> = HashSet::new();

    for class in ShipClass::ALL {
        let ship = place_ship(rng, class, &occupied)?;
        for cell in &ship.positions {
            occupied.insert((cell.row, cell.col));
        }
        fleet.push(ship);
    }
    Some(fleet)
}

/// Try up to `MAX_SHIP_ATTEMPTS` random placements for one class
fn place_ship<R: Rng + ?Sized>(
    rng: &mut R,
    class: ShipClass,
    occupied: &HashSet<(u8, u8)>,
) -> Option<Ship> {
    let size = class.size();

    for _ in 0..MAX_SHIP_ATTEMPTS {
        let orientation = if rng.gen_bool(0.5) {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };

        // Start cell uniform over the range that keeps the ship on the grid
        let (max_row, max_col) = match orientation {
            Orientation::Horizontal => (BOARD_SIZE - 1, BOARD_SIZE - size),
            Orientation::Vertical => (BOARD_SIZE - size, BOARD_SIZE - 1),
        };
        let start_row = rng.gen_range(0..=max_row);
        let start_col = rng.gen_range(0..=max_col);

        let cells: Vec<(u8, u8)> = (0..size)
            .map(|i| match orientation {
                Orientation::Horizontal => (start_row, start_col + i),
                Orientation::Vertical => (start_row + i, start_col),
            })
            .collect();

        if cells.iter().any(|cell| occupied.contains(cell)) {
            continue;
        }

        return Some(Ship {
            id: class.id().to_string(),
            size,
            positions: cells
                .into_iter()
                .map(|(row, col)| ShipCell { row, col, hit: false })
                .collect(),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use types::board::{in_bounds, FLEET_CELLS};

    fn assert_valid_fleet(fleet: &[Ship]) {
        assert_eq!(fleet.len(), 5);

        let mut sizes: Vec<u8> = fleet.iter().map(|s| s.size).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![2, 3, 3, 4, 5]);

        let mut all_cells = HashSet::new();
        for ship in fleet {
            assert_eq!(ship.positions.len(), ship.size as usize);
            for cell in &ship.positions {
                assert!(in_bounds(cell.row, cell.col), "cell out of bounds");
                assert!(!cell.hit, "fresh fleet must be unhit");
                assert!(all_cells.insert((cell.row, cell.col)), "overlapping ships");
            }

            // Colinear and contiguous: one axis constant, the other a run
            let rows: HashSet<u8> = ship.positions.iter().map(|c| c.row).collect();
            let cols: HashSet<u8> = ship.positions.iter().map(|c| c.col).collect();
            let (varying, fixed) = if rows.len() == 1 { (&cols, &rows) } else { (&rows, &cols) };
            assert_eq!(fixed.len(), 1, "ship is not colinear");
            let min = *varying.iter().min().unwrap();
            let max = *varying.iter().max().unwrap();
            assert_eq!((max - min + 1) as usize, ship.positions.len(), "ship is not contiguous");
        }
        assert_eq!(all_cells.len(), FLEET_CELLS);
    }

    #[test]
    fn test_generated_fleets_are_valid_across_seeds() {
        for seed in 0..10_000u64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let fleet = generate_fleet(&mut rng).expect("placement should succeed");
            assert_valid_fleet(&fleet);
        }
    }

    #[test]
    fn test_generation_is_deterministic_per_seed() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(generate_fleet(&mut a).unwrap(), generate_fleet(&mut b).unwrap());
    }

    #[test]
    fn test_fleet_order_matches_canonical_classes() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let fleet = generate_fleet(&mut rng).unwrap();
        let ids: Vec<&str> = fleet.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["carrier", "battleship", "cruiser", "submarine", "destroyer"]);
    }
}
