use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use nurikabe_solver::cell::CellValue;
use nurikabe_solver::{Grid, SolveOptions};

#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Puzzle file; two newline-separated grids (board, then an optional
    /// reference solution). Use "-" for stdin.
    input_path: PathBuf,

    /// Print every deduced cell, not just a solved/stuck summary.
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    verbose: bool,
}

fn read_puzzle(path: &PathBuf) -> Result<(String, String)> {
    let text = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading puzzle from stdin")?
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?
    };
    match text.split_once("\n\n") {
        Some((board, solution)) => Ok((board.to_owned(), solution.to_owned())),
        None => Ok((text, String::new())),
    }
}

fn render(grid: &Grid) -> String {
    let board = grid.board();
    let mut out = String::new();
    for row in 0..board.rows() {
        for col in 0..board.cols() {
            let c = nurikabe_solver::Coord::new(row, col);
            let ch = match board.cell(c).value {
                CellValue::Unknown => "_".to_string(),
                CellValue::White => ".".to_string(),
                CellValue::Black => "*".blue().to_string(),
                CellValue::Number(n) if n < 10 => n.to_string().bold().to_string(),
                CellValue::Number(n) => ((b'A' + n - 10) as char).to_string().bold().to_string(),
            };
            out.push_str(&ch);
        }
        out.push('\n');
    }
    out
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let (board_def, solution_def) = read_puzzle(&args.input_path)?;
    let mut grid = Grid::load_puzzle(&board_def, &solution_def, SolveOptions::default())
        .context("parsing puzzle")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} solving... {msg}").unwrap());

    let mut steps = 0u32;
    let outcome = loop {
        spinner.tick();
        match grid.solve_step() {
            Ok(false) => break Ok(()),
            Ok(true) => {
                steps += 1;
                spinner.set_message(format!("{steps} steps"));
            }
            Err(e) => break Err(e),
        }
    };
    spinner.finish_and_clear();

    if args.verbose {
        println!("{}", render(&grid));
    }

    match outcome {
        Ok(()) if grid.is_solved() => {
            println!("{} in {steps} step(s)", "solved".green().bold());
            Ok(())
        }
        Ok(()) => {
            println!(
                "{} after {steps} step(s): no further deductions are possible",
                "stuck".yellow().bold()
            );
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{} after {steps} step(s): {e}", "error".red().bold());
            std::process::exit(2);
        }
    }
}
