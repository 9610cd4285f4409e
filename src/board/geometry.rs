//! Spatial helpers for rectangular boards.

use super::Loc;

/// Rectilinear (Manhattan) distance between two locations.
pub fn net_distance(a: Loc, b: Loc) -> usize {
    a.row.abs_diff(b.row) + a.col.abs_diff(b.col)
}

/// Checks whether two cells share a side or a corner.
pub fn are_adjacent(a: Loc, b: Loc) -> bool {
    match net_distance(a, b) {
        1 => true,
        2 => a.row != b.row && a.col != b.col,
        _ => false,
    }
}

/// Checks whether a cell lies on the outer ring of a `height x width` board.
pub fn is_edge_cell(loc: Loc, height: usize, width: usize) -> bool {
    loc.row == 0 || loc.col == 0 || loc.row + 1 == height || loc.col + 1 == width
}

/// Checks whether a cell is one of the four corners.
pub fn is_corner_cell(loc: Loc, height: usize, width: usize) -> bool {
    on_row_border(loc, height) && on_col_border(loc, width)
}

/// Checks whether a cell is on an edge but not in a corner.
pub fn is_edge_not_corner(loc: Loc, height: usize, width: usize) -> bool {
    on_row_border(loc, height) ^ on_col_border(loc, width)
}

fn on_row_border(loc: Loc, height: usize) -> bool {
    loc.row == 0 || loc.row + 1 == height
}

fn on_col_border(loc: Loc, width: usize) -> bool {
    loc.col == 0 || loc.col + 1 == width
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_distance() {
        assert_eq!(net_distance(Loc::new(0, 0), Loc::new(2, 3)), 5);
        assert_eq!(net_distance(Loc::new(4, 1), Loc::new(1, 4)), 6);
    }

    #[test]
    fn test_adjacency_includes_diagonals() {
        let center = Loc::new(1, 1);
        assert!(are_adjacent(center, Loc::new(0, 1)));
        assert!(are_adjacent(center, Loc::new(2, 2)));
        assert!(!are_adjacent(center, Loc::new(1, 3)));
        assert!(!are_adjacent(center, center));
    }

    #[test]
    fn test_edges_and_corners() {
        assert!(is_corner_cell(Loc::new(0, 0), 3, 3));
        assert!(is_corner_cell(Loc::new(2, 2), 3, 3));
        assert!(!is_corner_cell(Loc::new(0, 1), 3, 3));

        assert!(is_edge_cell(Loc::new(0, 1), 3, 3));
        assert!(!is_edge_cell(Loc::new(1, 1), 3, 3));

        assert!(is_edge_not_corner(Loc::new(1, 0), 3, 3));
        assert!(!is_edge_not_corner(Loc::new(0, 0), 3, 3));
        assert!(!is_edge_not_corner(Loc::new(1, 1), 3, 3));
    }
}
