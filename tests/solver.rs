//! End-to-end scenarios exercising the full `Grid` solve loop: the worked
//! examples and boundary behaviors are hand-verified small puzzles with a
//! single correct completion, not golden fuzz output.

use nurikabe_solver::cell::CellValue;
use nurikabe_solver::ids::RegionId;
use nurikabe_solver::{Coord, Grid, SolveError, SolveOptions};

fn load(board_def: &str, solution_def: &str) -> Grid {
    Grid::load_puzzle(board_def, solution_def, SolveOptions::default())
        .expect("puzzle text should parse")
}

#[test]
fn diagonal_twos_in_a_2x2_are_unsolvable() {
    let mut grid = load("2_\n_2\n", "");
    let err = grid.solve().expect_err("a 2x2 with diagonal 2s has no legal completion");
    assert!(matches!(err, SolveError::Logic(_)));
}

#[test]
fn l_shaped_island_solves_uniquely() {
    // The 3 can only complete as the top-left L without either splitting the
    // sea into two components or creating an all-black 2x2 square.
    let mut grid = load("3__\n___\n__1\n", "3.*\n.**\n**1\n");
    grid.solve().unwrap();
    assert!(grid.is_solved());

    let expect_white = [
        Coord::new(0, 0),
        Coord::new(0, 1),
        Coord::new(1, 0),
        Coord::new(2, 2),
    ];
    for c in expect_white {
        assert!(grid.board().is_white(c) || grid.board().is_number(c), "{c} should be white");
    }
    let expect_black = [
        Coord::new(0, 2),
        Coord::new(1, 1),
        Coord::new(1, 2),
        Coord::new(2, 0),
        Coord::new(2, 1),
    ];
    for c in expect_black {
        assert!(grid.board().is_black(c), "{c} should be black");
    }
}

#[test]
fn four_corner_ones_force_a_plus_shaped_sea() {
    let mut grid = load("1_1\n___\n1_1\n", "");
    grid.solve().unwrap();
    assert!(grid.is_solved());

    let plus = [
        Coord::new(0, 1),
        Coord::new(1, 0),
        Coord::new(1, 1),
        Coord::new(1, 2),
        Coord::new(2, 1),
    ];
    for c in plus {
        assert!(grid.board().is_black(c), "{c} should be part of the sea");
    }
}

#[test]
fn a_lone_one_surrounded_by_sea_is_trivially_solved() {
    let mut grid = load("___\n_1_\n___\n", "");
    grid.solve().unwrap();
    assert!(grid.is_solved());
    for c in grid.board().coords() {
        if c != Coord::new(1, 1) {
            assert!(grid.board().is_black(c));
        }
    }
}

#[test]
fn one_row_board_with_two_lone_ones() {
    let mut grid = load("1__1\n", "");
    grid.solve().unwrap();
    assert!(grid.is_solved());
    assert!(grid.board().is_black(Coord::new(0, 1)));
    assert!(grid.board().is_black(Coord::new(0, 2)));
}

#[test]
fn solve_step_reaches_a_genuine_fixed_point() {
    let mut grid = load("3__\n___\n__1\n", "");
    grid.solve().unwrap();
    assert!(grid.is_solved());
    // One more step past the fixed point changes nothing further.
    assert!(!grid.solve_step().unwrap());
    assert!(grid.is_solved());
}

#[test]
fn reset_after_solving_matches_a_fresh_load() {
    let board_def = "3__\n___\n__1\n";
    let mut solved = load(board_def, "");
    solved.solve().unwrap();
    assert!(solved.is_solved());

    solved.reset();
    let fresh = load(board_def, "");

    for c in fresh.board().coords() {
        assert_eq!(solved.board().cell(c).value, fresh.board().cell(c).value);
    }
}

#[test]
fn play_solution_then_unplay_restores_cell_values() {
    let mut grid = load("3__\n___\n__1\n", "");
    let before: Vec<(Coord, CellValue)> =
        grid.board().coords().map(|c| (c, grid.board().cell(c).value)).collect();

    let solutions = grid.get_region_solutions(RegionId(0), None).unwrap();
    assert!(!solutions.is_empty());
    grid.play_solution(&solutions[0]);
    assert!(grid.hypothesis_depth() > 0);
    for &c in &solutions[0].icoords {
        assert!(grid.board().is_white(c) || grid.board().is_number(c));
    }

    grid.unplay_solution();
    assert_eq!(grid.hypothesis_depth(), 0);
    let after: Vec<(Coord, CellValue)> =
        grid.board().coords().map(|c| (c, grid.board().cell(c).value)).collect();
    assert_eq!(before, after);
}

#[test]
fn malformed_puzzle_text_is_rejected() {
    let err = Grid::load_puzzle("3_?\n___\n__1\n", "", SolveOptions::default()).unwrap_err();
    assert!(format!("{err:?}").contains("unrecognized"));
}

#[test]
fn ragged_rows_are_rejected() {
    let err = Grid::load_puzzle("3__\n__\n__1\n", "", SolveOptions::default()).unwrap_err();
    assert!(format!("{err:?}").contains("row 1"));
}

#[test]
fn medium_four_by_four_reaches_a_unique_deterministic_completion() {
    let mut grid = load("_5__\n____\n__2_\n____\n", "");
    grid.solve().unwrap();
    assert!(grid.is_solved());
    for c in grid.board().coords() {
        assert!(!grid.board().cell(c).value.is_unknown(), "{c} should be fully determined");
    }
}

#[test]
fn nine_by_nine_checkerboard_of_lone_ones_matches_its_solution_def() {
    let board_def = "1_1_1_1_1\n\
                      _________\n\
                      1_1_1_1_1\n\
                      _________\n\
                      1_1_1_1_1\n\
                      _________\n\
                      1_1_1_1_1\n\
                      _________\n\
                      1_1_1_1_1\n";
    let solution_def = "1*1*1*1*1\n\
                         *********\n\
                         1*1*1*1*1\n\
                         *********\n\
                         1*1*1*1*1\n\
                         *********\n\
                         1*1*1*1*1\n\
                         *********\n\
                         1*1*1*1*1\n";
    let mut grid = load(board_def, solution_def);
    grid.solve().unwrap();
    assert!(grid.is_solved());

    let expected = Grid::load_puzzle(solution_def, "", SolveOptions::default()).unwrap();
    for c in grid.board().coords() {
        assert_eq!(
            grid.board().cell(c).value,
            expected.board().cell(c).value,
            "{c} should match the reference solution"
        );
    }
    assert!(!grid.solve_step().unwrap());
}

#[test]
fn corner_forcing_with_two_left_blacks_the_far_corner_on_the_first_step() {
    // The 2 at (0,0) has two corner-touching Unknown exits, (0,1) and (1,0);
    // picking either would leave (1,1) as the far corner of the L it forms,
    // so it's forced Black before any region ever needs to grow into it.
    let mut grid = load("2__\n___\n__1\n", "");
    grid.solve_step().unwrap();
    assert!(grid.board().is_black(Coord::new(1, 1)));
}

#[test]
fn user_edit_is_a_self_contained_atomic_change() {
    let mut grid = load("3__\n___\n__1\n", "");
    assert!(grid.set_cell_black(Coord::new(0, 2)).unwrap());
    assert!(grid.board().is_black(Coord::new(0, 2)));
    // Setting the same cell to the same color again is a no-op, not a
    // contradiction.
    assert!(!grid.set_cell_black(Coord::new(0, 2)).unwrap());
    // But demanding the opposite color is a genuine contradiction.
    assert!(grid.set_cell_white(Coord::new(0, 2)).is_err());
}
