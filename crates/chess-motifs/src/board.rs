//! Board geometry and material helpers shared by the detectors.

use shakmaty::attacks::{self, between};
use shakmaty::{Bitboard, Board, Color, File, Rank, Role, Square};

/// Pawn-unit value of a role. The king is worth nothing in material counts.
pub fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 1,
        Role::Knight => 3,
        Role::Bishop => 3,
        Role::Rook => 5,
        Role::Queen => 9,
        Role::King => 0,
    }
}

/// Value used when weighing fork targets; the king outranks everything.
pub fn fork_value(role: Role) -> i32 {
    match role {
        Role::King => 100,
        other => piece_value(other),
    }
}

/// Total material of `color` in pawn units.
pub fn material(board: &Board, color: Color) -> i32 {
    Role::ALL
        .iter()
        .map(|&role| {
            let count = (board.by_color(color) & board.by_role(role)).count() as i32;
            count * piece_value(role)
        })
        .sum()
}

/// Material of `color` minus material of its opponent.
pub fn material_balance(board: &Board, color: Color) -> i32 {
    material(board, color) - material(board, !color)
}

/// The piece of `color` on `sq` is absolutely pinned to its own king.
pub fn is_pinned(board: &Board, color: Color, sq: Square) -> bool {
    let Some(king) = board.king_of(color) else {
        return false;
    };
    if king == sq {
        return false;
    }
    let enemy = board.by_color(!color);
    let snipers = (attacks::rook_attacks(king, Bitboard::EMPTY) & board.rooks_and_queens()
        | attacks::bishop_attacks(king, Bitboard::EMPTY) & board.bishops_and_queens())
        & enemy;
    let occupied = board.occupied();

    snipers.into_iter().any(|sniper| {
        let blockers = between(king, sniper) & occupied;
        blockers == Bitboard::from(sq)
    })
}

/// A rook or bishop on `from` looking through the queen at the king behind it,
/// with nothing between king and queen. Capturing the queen from there is
/// winning a pinned piece, not taking a hung one.
pub fn pins_queen_to_king(
    role: Role,
    from: Square,
    queen: Square,
    king: Square,
    occupied: Bitboard,
) -> bool {
    let on_line = match role {
        Role::Rook => king.file() == from.file() || king.rank() == from.rank(),
        Role::Bishop => {
            let df = (king.file() as i32 - from.file() as i32).abs();
            let dr = (king.rank() as i32 - from.rank() as i32).abs();
            df == dr && df != 0
        }
        _ => return false,
    };
    on_line
        && attacks::aligned(king, queen, from)
        && between(king, from).contains(queen)
        && (between(king, queen) & occupied).is_empty()
}

/// Home rank of `color`.
pub fn home_rank(color: Color) -> Rank {
    color.fold_wb(Rank::First, Rank::Eighth)
}

/// Squares directly in front of a king on its home rank: the adjacent files
/// on the next rank towards the centre, clipped to the board.
pub fn forward_escape_squares(king: Square, color: Color) -> Vec<Square> {
    let forward_rank = king.rank() as i32 + color.fold_wb(1, -1);
    if !(0..8).contains(&forward_rank) {
        return Vec::new();
    }
    let file = king.file() as i32;
    (file - 1..=file + 1)
        .filter(|f| (0..8).contains(f))
        .map(|f| Square::from_coords(File::new(f as u32), Rank::new(forward_rank as u32)))
        .collect()
}

/// Every on-board square around `king` holds a piece of `color`.
pub fn is_smothered(board: &Board, king: Square, color: Color) -> bool {
    (attacks::king_attacks(king) & !board.by_color(color)).is_empty()
}

/// Rank of `sq` counted from `color`'s own side, 1 to 8.
pub fn relative_rank(sq: Square, color: Color) -> u32 {
    let rank = sq.rank() as u32 + 1;
    color.fold_wb(rank, 9 - rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::position::position_from_fen;
    use shakmaty::Position;

    fn board(fen: &str) -> Board {
        position_from_fen(fen).unwrap().board().clone()
    }

    #[test]
    fn test_material_counts() {
        let start = Board::default();
        assert_eq!(material(&start, Color::White), 39);
        assert_eq!(material_balance(&start, Color::Black), 0);

        let b = board("4k3/8/8/8/8/8/8/R3K2Q w - - 0 1");
        assert_eq!(material(&b, Color::White), 14);
        assert_eq!(material_balance(&b, Color::Black), -14);
    }

    #[test]
    fn test_pin_detection() {
        // Queen on e2 pinned by the rook on e8.
        let b = board("4r1k1/8/8/8/8/8/4Q3/4K3 w - - 0 1");
        assert!(is_pinned(&b, Color::White, Square::E2));

        // A second blocker breaks the pin.
        let b = board("4r1k1/8/8/8/4P3/8/4Q3/4K3 w - - 0 1");
        assert!(!is_pinned(&b, Color::White, Square::E2));

        // Bishop diagonal.
        let b = board("6k1/8/8/7b/8/8/4Q3/3K4 w - - 0 1");
        assert!(is_pinned(&b, Color::White, Square::E2));
    }

    #[test]
    fn test_queen_pinned_to_king() {
        let occupied = Bitboard::from(Square::E1) | Bitboard::from(Square::E4) | Bitboard::from(Square::E8);
        assert!(pins_queen_to_king(Role::Rook, Square::E8, Square::E4, Square::E1, occupied));
        // Not on a rook line.
        assert!(!pins_queen_to_king(Role::Bishop, Square::E8, Square::E4, Square::E1, occupied));
        // Something between king and queen.
        let crowded = occupied | Bitboard::from(Square::E2);
        assert!(!pins_queen_to_king(Role::Rook, Square::E8, Square::E4, Square::E1, crowded));
    }

    #[test]
    fn test_escape_squares_and_ranks() {
        let squares = forward_escape_squares(Square::G8, Color::Black);
        assert_eq!(squares, vec![Square::F7, Square::G7, Square::H7]);
        let squares = forward_escape_squares(Square::A1, Color::White);
        assert_eq!(squares, vec![Square::A2, Square::B2]);
        assert_eq!(relative_rank(Square::E7, Color::Black), 2);
        assert_eq!(relative_rank(Square::E7, Color::White), 7);
        assert_eq!(home_rank(Color::Black), Rank::Eighth);
    }

    #[test]
    fn test_smothered_king() {
        let b = board("6rk/5Npp/8/8/8/8/8/6K1 b - - 0 1");
        assert!(is_smothered(&b, Square::H8, Color::Black));
        let b = board("7k/5Npp/8/8/8/8/8/6K1 b - - 0 1");
        assert!(!is_smothered(&b, Square::H8, Color::Black));
    }
}
