//! Region growing over the board: same-colour match groups and "does the sequence still fit".
//!
//! Both searches share one fixed-point flood fill. A candidate joins the region when it is
//! adjacent to *any* current member and the join predicate holds for that pair; passes repeat
//! until one adds nothing, because a late member can make an earlier-rejected candidate valid.

use crate::grid::{Cell, Grid};

struct Growth {
    region: Vec<usize>,
    stopped: bool,
}

fn grow_until(
    grid: &Grid,
    seed: usize,
    candidates: &[usize],
    join: impl Fn(&Cell, &Cell) -> bool,
    mut stop: impl FnMut(&[usize]) -> bool,
) -> Growth {
    let cells = grid.cells();
    let mut region = vec![seed];
    let mut member = vec![false; grid.len()];
    member[seed] = true;
    if stop(&region) {
        return Growth {
            region,
            stopped: true,
        };
    }

    loop {
        let before = region.len();
        for &cand in candidates {
            if member[cand] {
                continue;
            }
            let joins = region
                .iter()
                .any(|&m| grid.are_adjacent(m, cand) && join(&cells[cand], &cells[m]));
            if joins {
                region.push(cand);
                member[cand] = true;
                if stop(&region) {
                    return Growth {
                        region,
                        stopped: true,
                    };
                }
            }
        }
        if region.len() == before {
            return Growth {
                region,
                stopped: false,
            };
        }
    }
}

/// Grow the maximal region around `seed` within `candidates`, in insertion order.
pub fn grow_region(
    grid: &Grid,
    seed: usize,
    candidates: &[usize],
    join: impl Fn(&Cell, &Cell) -> bool,
) -> Vec<usize> {
    grow_until(grid, seed, candidates, join, |_| false).region
}

fn same_color(a: &Cell, b: &Cell) -> bool {
    a.color.key() == b.color.key()
}

/// Every same-colour region of fixed cells with at least `min_same` members.
/// Seeds are taken in row-major order; a cell already swallowed by a region is not reused.
pub fn match_regions(grid: &Grid, min_same: usize) -> Vec<Vec<usize>> {
    let fixed = grid.fixed_indices();
    let mut consumed = vec![false; grid.len()];
    let mut out = Vec::new();
    for &seed in &fixed {
        if consumed[seed] {
            continue;
        }
        let region = grow_region(grid, seed, &fixed, same_color);
        for &i in &region {
            consumed[i] = true;
        }
        if region.len() >= min_same {
            out.push(region);
        }
    }
    out
}

/// Does `region` hold a simple path of `len` adjacent cells?
///
/// Depth-first search from every member, never revisiting a cell on the current path. This
/// accepts L, S and square shapes of four and rejects branching ones such as a T or a plus.
/// Regions here are at most a board's worth of cells and `len` is at most four, so the search
/// stays small.
pub fn forms_continuous_line(grid: &Grid, region: &[usize], len: usize) -> bool {
    if len == 0 {
        return true;
    }
    let mut on_path = vec![false; region.len()];
    (0..region.len()).any(|start| extend_path(grid, region, &mut on_path, start, 1, len))
}

fn extend_path(
    grid: &Grid,
    region: &[usize],
    on_path: &mut [bool],
    at: usize,
    depth: usize,
    len: usize,
) -> bool {
    if depth >= len {
        return true;
    }
    on_path[at] = true;
    let mut found = false;
    for next in 0..region.len() {
        if !on_path[next]
            && grid.are_adjacent(region[at], region[next])
            && extend_path(grid, region, on_path, next, depth + 1, len)
        {
            found = true;
            break;
        }
    }
    on_path[at] = false;
    found
}

/// Can a sequence of `len` blocks still be placed somewhere on the board?
pub fn sequence_fits(grid: &Grid, len: usize) -> bool {
    let candidates = grid.non_fixed_indices();
    match len {
        0 => return true,
        1 => return !candidates.is_empty(),
        _ => {}
    }

    let mut visited = vec![false; grid.len()];
    for &seed in &candidates {
        if visited[seed] {
            continue;
        }
        let growth = grow_until(
            grid,
            seed,
            &candidates,
            |_, _| true,
            |region| region.len() >= len && forms_continuous_line(grid, region, len),
        );
        if growth.stopped {
            return true;
        }
        for &i in &growth.region {
            visited[i] = true;
        }
    }
    false
}
