use criterion::{Criterion, criterion_group, criterion_main};

use nurikabe_solver::{Grid, SolveOptions};

const L_SHAPE: &str = "3__\n___\n__1\n";
const FOUR_CORNERS: &str = "1_1\n___\n1_1\n";
const MEDIUM: &str = "_5__\n____\n__2_\n____\n";

fn solve_fresh(board_def: &str) {
    let mut grid =
        Grid::load_puzzle(board_def, "", SolveOptions::default()).expect("benchmark puzzle text is valid");
    grid.solve().expect("benchmark puzzle should have a legal completion");
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("l_shape_island", |b| {
        b.iter(|| solve_fresh(std::hint::black_box(L_SHAPE)));
    });

    c.bench_function("four_corner_ones", |b| {
        b.iter(|| solve_fresh(std::hint::black_box(FOUR_CORNERS)));
    });

    c.bench_function("medium_4x4", |b| {
        b.iter(|| solve_fresh(std::hint::black_box(MEDIUM)));
    });
}

criterion_group!(name = benches; config = Criterion::default().sample_size(75); targets = criterion_benchmark);
criterion_main!(benches);
