//! Board geometry: the 10×10 grid, the five ship classes, shots, and the
//! invariant helpers the engine relies on.
//!
//! A board belongs to one player and holds that player's fleet layout plus
//! the shots that player has fired at the opponent.

use serde::{Deserialize, Serialize};

/// Side length of the square grid
pub const BOARD_SIZE: u8 = 10;

/// Total ship cells in a complete fleet (5 + 4 + 3 + 3 + 2)
pub const FLEET_CELLS: usize = 17;

/// The five canonical ship classes, one of each per fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipClass {
    Carrier,
    Battleship,
    Cruiser,
    Submarine,
    Destroyer,
}

impl ShipClass {
    /// All classes in fixed placement order (largest first)
    pub const ALL: [ShipClass; 5] = [
        ShipClass::Carrier,
        ShipClass::Battleship,
        ShipClass::Cruiser,
        ShipClass::Submarine,
        ShipClass::Destroyer,
    ];

    /// Number of cells this class occupies
    pub fn size(&self) -> u8 {
        match self {
            ShipClass::Carrier => 5,
            ShipClass::Battleship => 4,
            ShipClass::Cruiser => 3,
            ShipClass::Submarine => 3,
            ShipClass::Destroyer => 2,
        }
    }

    /// Wire identifier for this class
    pub fn id(&self) -> &'static str {
        match self {
            ShipClass::Carrier => "carrier",
            ShipClass::Battleship => "battleship",
            ShipClass::Cruiser => "cruiser",
            ShipClass::Submarine => "submarine",
            ShipClass::Destroyer => "destroyer",
        }
    }
}

/// Ship orientation on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One cell occupied by a ship, with its hit flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipCell {
    pub row: u8,
    pub col: u8,
    pub hit: bool,
}

/// One shot fired by a player, recorded in that player's own board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    pub row: u8,
    pub col: u8,
    pub hit: bool,
}

/// A placed ship: its class identifier, size, and occupied cells
///
/// Cells are colinear and contiguous, either entirely horizontal or
/// entirely vertical, all within the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub id: String,
    pub size: u8,
    pub positions: Vec<ShipCell>,
}

impl Ship {
    /// A ship is sunk once every cell is hit
    pub fn is_sunk(&self) -> bool {
        self.positions.iter().all(|c| c.hit)
    }

    /// Mutable access to the cell at (row, col), if this ship occupies it
    pub fn cell_at_mut(&mut self, row: u8, col: u8) -> Option<&mut ShipCell> {
        self.positions.iter_mut().find(|c| c.row == row && c.col == col)
    }

    /// Whether this ship occupies (row, col)
    pub fn occupies(&self, row: u8, col: u8) -> bool {
        self.positions.iter().any(|c| c.row == row && c.col == col)
    }
}

/// One player's fleet layout plus that player's shot history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub ships: Vec<Ship>,
    pub shots: Vec<Shot>,
}

impl Board {
    /// Create a board from a generated fleet with an empty shot history
    pub fn with_fleet(ships: Vec<Ship>) -> Self {
        Self { ships, shots: Vec::new() }
    }

    /// Whether this player has already fired at (row, col)
    pub fn has_shot_at(&self, row: u8, col: u8) -> bool {
        self.shots.iter().any(|s| s.row == row && s.col == col)
    }

    /// Whether every cell of every ship has been hit
    pub fn all_ships_sunk(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(|s| s.is_sunk())
    }

    /// Total cells occupied by the fleet
    pub fn ship_cell_count(&self) -> usize {
        self.ships.iter().map(|s| s.positions.len()).sum()
    }
}

/// Whether (row, col) lies on the grid
pub fn in_bounds(row: u8, col: u8) -> bool {
    row < BOARD_SIZE && col < BOARD_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship(id: &str, cells: &[(u8, u8)]) -> Ship {
        Ship {
            id: id.to_string(),
            size: cells.len() as u8,
            positions: cells
                .iter()
                .map(|&(row, col)| ShipCell { row, col, hit: false })
                .collect(),
        }
    }

    #[test]
    fn test_ship_class_sizes() {
        let sizes: Vec<u8> = ShipClass::ALL.iter().map(|c| c.size()).collect();
        assert_eq!(sizes, vec![5, 4, 3, 3, 2]);
        assert_eq!(sizes.iter().map(|&s| s as usize).sum::<usize>(), FLEET_CELLS);
    }

    #[test]
    fn test_ship_sunk_detection() {
        let mut s = ship("destroyer", &[(0, 0), (0, 1)]);
        assert!(!s.is_sunk());
        s.positions[0].hit = true;
        assert!(!s.is_sunk());
        s.positions[1].hit = true;
        assert!(s.is_sunk());
    }

    #[test]
    fn test_board_shot_lookup() {
        let mut board = Board::with_fleet(vec![ship("destroyer", &[(5, 5), (5, 6)])]);
        assert!(!board.has_shot_at(3, 3));
        board.shots.push(Shot { row: 3, col: 3, hit: false });
        assert!(board.has_shot_at(3, 3));
    }

    #[test]
    fn test_all_ships_sunk_requires_fleet() {
        // An empty fleet never counts as sunk
        let board = Board::default();
        assert!(!board.all_ships_sunk());
    }

    #[test]
    fn test_in_bounds() {
        assert!(in_bounds(0, 0));
        assert!(in_bounds(9, 9));
        assert!(!in_bounds(10, 0));
        assert!(!in_bounds(0, 10));
    }
}
