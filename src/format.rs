//! The puzzle text format: two newline-separated equal-width grids, a
//! `board_def` of givens and an optional `solution_def` reference
//! solution.

use anyhow::{bail, Context, Result};
use ndarray::Array2;

use crate::cell::{Cell, CellValue};

/// One decoded character of the puzzle text format.
fn char_to_value(ch: char) -> Result<CellValue> {
    match ch {
        '_' => Ok(CellValue::Unknown),
        '.' => Ok(CellValue::White),
        '*' => Ok(CellValue::Black),
        '0'..='9' => Ok(CellValue::Number(ch as u8 - b'0')),
        'A'..='Z' => Ok(CellValue::Number(ch as u8 - b'A' + 10)),
        other => bail!("unrecognized puzzle character {other:?}"),
    }
}

/// Parses a single grid of text into a rectangular `Array2<CellValue>`.
/// Every non-empty line must have the same length; an empty input yields a
/// `0x0` grid.
fn parse_grid(text: &str) -> Result<Array2<CellValue>> {
    let rows: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
    if rows.is_empty() {
        return Ok(Array2::from_elem((0, 0), CellValue::Unknown));
    }
    let cols = rows[0].chars().count();
    let mut values = Vec::with_capacity(rows.len() * cols);
    for (r, row) in rows.iter().enumerate() {
        let row_len = row.chars().count();
        if row_len != cols {
            bail!(
                "row {r} has length {row_len}, expected {cols} (all rows must be equal width)"
            );
        }
        for ch in row.chars() {
            values.push(char_to_value(ch).with_context(|| format!("in row {r}"))?);
        }
    }
    Array2::from_shape_vec((rows.len(), cols), values).context("grid shape mismatch")
}

/// A parsed puzzle: the givens, plus an optional reference solution used
/// only to cross-check forced decisions (never to drive them).
pub struct ParsedPuzzle {
    pub rows: i32,
    pub cols: i32,
    pub board: Array2<CellValue>,
    pub solution: Option<Array2<CellValue>>,
}

/// Parses `board_def` (and, if non-empty, `solution_def`) per §6 of the
/// puzzle text format: `_` Unknown, `.` White, `*` Black, `0`-`9` a small
/// Number, `A`-`Z` Number 10-35.
pub fn parse(board_def: &str, solution_def: &str) -> Result<ParsedPuzzle> {
    let board = parse_grid(board_def).context("parsing board_def")?;
    if board.nrows() == 0 || board.ncols() == 0 {
        bail!("board_def must not be empty");
    }

    let solution = if solution_def.trim().is_empty() {
        None
    } else {
        let solution = parse_grid(solution_def).context("parsing solution_def")?;
        if solution.dim() != board.dim() {
            bail!(
                "solution_def dimensions {:?} do not match board_def dimensions {:?}",
                solution.dim(),
                board.dim()
            );
        }
        Some(solution)
    };

    Ok(ParsedPuzzle {
        rows: board.nrows() as i32,
        cols: board.ncols() as i32,
        board,
        solution,
    })
}

/// Builds the `Cell` grid a [`crate::grid::Grid`] is constructed from,
/// folding in the solution hint (if any) alongside the given value.
pub fn build_cells(parsed: &ParsedPuzzle) -> Array2<Cell> {
    Array2::from_shape_fn(parsed.board.dim(), |(r, c)| {
        let mut cell = Cell::new(parsed.board[[r, c]]);
        cell.solution_hint = parsed.solution.as_ref().map(|s| s[[r, c]]);
        cell
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_digits_letters_and_symbols() {
        assert_eq!(char_to_value('_').unwrap(), CellValue::Unknown);
        assert_eq!(char_to_value('.').unwrap(), CellValue::White);
        assert_eq!(char_to_value('*').unwrap(), CellValue::Black);
        assert_eq!(char_to_value('3').unwrap(), CellValue::Number(3));
        assert_eq!(char_to_value('A').unwrap(), CellValue::Number(10));
        assert_eq!(char_to_value('Z').unwrap(), CellValue::Number(35));
        assert!(char_to_value('?').is_err());
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = parse_grid("__\n_\n").unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn parses_a_small_board_without_solution() {
        let parsed = parse("3__\n___\n__1\n", "").unwrap();
        assert_eq!((parsed.rows, parsed.cols), (3, 3));
        assert!(parsed.solution.is_none());
        assert_eq!(parsed.board[[0, 0]], CellValue::Number(3));
        assert_eq!(parsed.board[[2, 2]], CellValue::Number(1));
    }

    #[test]
    fn rejects_mismatched_solution_dimensions() {
        let err = parse("__\n__\n", "_\n").unwrap_err();
        assert!(err.to_string().contains("dimensions"));
    }
}
