//! Correspondence between a reference mode set and a candidate mode set.
//!
//! The input is an `R x C` similarity matrix (reference rows, candidate
//! columns). A pair `(i, j)` is *accepted* when `S[i, j] > 0` and
//! `S[i, j] >= acceptance_threshold`; pairs that are not accepted are never
//! forced, so a reference row without any accepted pair ends up unassigned.
//!
//! The optimal strategy maximizes the total accepted similarity with the
//! Kuhn-Munkres (Hungarian) method on a padded square cost matrix, then walks
//! the rows in order and moves each one to the smallest column that still
//! admits an optimal total. The result is the lexicographically smallest
//! optimal assignment, where "unassigned" sorts after every column.

use nalgebra::DMatrix;
use tracing::trace;

use crate::error::{Result, TrackingError};
use crate::settings::{MatchStrategy, TrackerSettings};

/// Result of matching reference rows against candidate columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Candidate column for each reference row, `None` when unassigned.
    pub rows: Vec<Option<usize>>,
    /// Candidate columns claimed by no row, ascending.
    pub unassigned_candidates: Vec<usize>,
    /// Sum of the similarity over assigned pairs.
    pub total: f64,
}

impl Assignment {
    fn from_rows(rows: Vec<Option<usize>>, similarity: &DMatrix<f64>) -> Self {
        let mut claimed = vec![false; similarity.ncols()];
        let mut total = 0.0;
        for (i, col) in rows.iter().enumerate() {
            if let Some(j) = *col {
                claimed[j] = true;
                total += similarity[(i, j)];
            }
        }
        let unassigned_candidates = claimed
            .iter()
            .enumerate()
            .filter_map(|(j, &c)| (!c).then_some(j))
            .collect();
        Self {
            rows,
            unassigned_candidates,
            total,
        }
    }

    /// Assigned `(reference, candidate)` pairs in reference order.
    pub fn assigned_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, col)| col.map(|j| (i, j)))
    }

    pub fn assigned_count(&self) -> usize {
        self.rows.iter().filter(|c| c.is_some()).count()
    }
}

/// Matches reference rows to candidate columns of `similarity`.
///
/// Fails with `EmptyInput` when the matrix has no rows or no columns and with
/// `InvalidInput` when an entry is not finite.
pub fn solve_assignment(
    similarity: &DMatrix<f64>,
    settings: &TrackerSettings,
) -> Result<Assignment> {
    let (rows, cols) = similarity.shape();
    if rows == 0 || cols == 0 {
        return Err(TrackingError::EmptyInput(format!(
            "cannot match a {}x{} similarity matrix",
            rows, cols
        )));
    }
    if let Some(((i, j), value)) = similarity
        .iter()
        .enumerate()
        .map(|(k, v)| ((k % rows, k / rows), v))
        .find(|(_, v)| !v.is_finite())
    {
        return Err(TrackingError::InvalidInput(format!(
            "similarity entry ({}, {}) is not finite: {}",
            i, j, value
        )));
    }

    let accepted = DMatrix::from_fn(rows, cols, |i, j| {
        let s = similarity[(i, j)];
        s > 0.0 && s >= settings.acceptance_threshold
    });

    let assigned = match settings.strategy {
        MatchStrategy::Optimal => optimal_rows(similarity, &accepted, settings.tie_tolerance),
        MatchStrategy::Greedy => greedy_rows(similarity, &accepted),
    };
    let assignment = Assignment::from_rows(assigned, similarity);

    trace!(
        rows,
        cols,
        assigned = assignment.assigned_count(),
        total = assignment.total,
        "assignment solved"
    );
    Ok(assignment)
}

/// Reference rows in index order each claim their highest scoring free
/// accepted column. The first column wins ties.
fn greedy_rows(similarity: &DMatrix<f64>, accepted: &DMatrix<bool>) -> Vec<Option<usize>> {
    let (rows, cols) = similarity.shape();
    let mut claimed = vec![false; cols];
    let mut result = Vec::with_capacity(rows);
    for i in 0..rows {
        let mut best: Option<(usize, f64)> = None;
        for j in 0..cols {
            if claimed[j] || !accepted[(i, j)] {
                continue;
            }
            let s = similarity[(i, j)];
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((j, s));
            }
        }
        if let Some((j, _)) = best {
            claimed[j] = true;
        }
        result.push(best.map(|(j, _)| j));
    }
    result
}

fn optimal_rows(
    similarity: &DMatrix<f64>,
    accepted: &DMatrix<bool>,
    tie_tolerance: f64,
) -> Vec<Option<usize>> {
    let rows = similarity.nrows();
    let (mut current, optimum) = max_weight_rows(similarity, accepted);

    for i in 0..rows {
        let limit = current[i].unwrap_or(similarity.ncols());
        for j in 0..limit {
            if !accepted[(i, j)] || current[..i].contains(&Some(j)) {
                continue;
            }
            let restricted = restrict(accepted, &current[..i], i, j);
            let (candidate, total) = max_weight_rows(similarity, &restricted);
            if total >= optimum - tie_tolerance {
                current = candidate;
                break;
            }
        }
    }
    current
}

/// Copy of `accepted` where rows `0..fixed.len()` may only use their fixed
/// column, row `row` may only use `col`, and those columns are closed to
/// every other row.
fn restrict(
    accepted: &DMatrix<bool>,
    fixed: &[Option<usize>],
    row: usize,
    col: usize,
) -> DMatrix<bool> {
    let mut pinned: Vec<(usize, Option<usize>)> = fixed.iter().copied().enumerate().collect();
    pinned.push((row, Some(col)));

    let mut restricted = accepted.clone();
    for &(i, choice) in &pinned {
        for j in 0..restricted.ncols() {
            if Some(j) != choice {
                restricted[(i, j)] = false;
            }
        }
        if let Some(j) = choice {
            for k in 0..restricted.nrows() {
                if k != i {
                    restricted[(k, j)] = false;
                }
            }
        }
    }
    restricted
}

/// Maximum-weight matching over accepted cells. Returns the row assignment
/// and its total weight.
fn max_weight_rows(
    similarity: &DMatrix<f64>,
    accepted: &DMatrix<bool>,
) -> (Vec<Option<usize>>, f64) {
    let (rows, cols) = similarity.shape();
    let n = rows.max(cols);

    // Rejected and padded cells cost nothing, which is the same as leaving
    // the row unassigned.
    let cost = DMatrix::from_fn(n, n, |i, j| {
        if i < rows && j < cols && accepted[(i, j)] {
            -similarity[(i, j)]
        } else {
            0.0
        }
    });

    let row_to_col = hungarian_min_cost(&cost);
    let mut total = 0.0;
    let assigned: Vec<Option<usize>> = (0..rows)
        .map(|i| {
            let j = row_to_col[i];
            if j < cols && accepted[(i, j)] {
                total += similarity[(i, j)];
                Some(j)
            } else {
                None
            }
        })
        .collect();
    (assigned, total)
}

/// Solves the square linear assignment problem, minimizing total cost.
/// Returns the column assigned to each row.
///
/// Shortest augmenting paths with row/column potentials, O(n^3).
fn hungarian_min_cost(cost: &DMatrix<f64>) -> Vec<usize> {
    let n = cost.nrows();
    let inf = f64::INFINITY;

    // 1-indexed; index 0 of `p` and `way` is the virtual source column.
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; n + 1];
    let mut p = vec![0_usize; n + 1];
    let mut way = vec![0_usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0_usize;
        let mut min_val = vec![inf; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = inf;
            let mut j1 = 0_usize;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost[(i0 - 1, j - 1)] - u[i0] - v[j];
                if reduced < min_val[j] {
                    min_val[j] = reduced;
                    way[j] = j0;
                }
                if min_val[j] < delta {
                    delta = min_val[j];
                    j1 = j;
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_val[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        loop {
            let prev = way[j0];
            p[j0] = p[prev];
            j0 = prev;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![0_usize; n];
    for j in 1..=n {
        if p[j] != 0 {
            row_to_col[p[j] - 1] = j - 1;
        }
    }
    row_to_col
}
