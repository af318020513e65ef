use super::grid::SeatGrid;
use super::search::{Dept, Slot};
use good_lp::variable;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    default_solver,
};
use log::{info, trace};
use std::time::{Duration, Instant};

/// Solves the department-per-seat problem exactly with the HiGHS ILP solver.
///
/// Returns `Ok(None)` when no pattern exists. The objective rewards seats that
/// keep the department the preference order put there, so the answer stays
/// close to what the mode asked for. `time_limit` is handed to HiGHS; a run
/// stopped by it returns whatever HiGHS had, so callers must check their
/// deadline before trusting the answer.
pub(crate) fn solve(
    grid: &SeatGrid,
    counts: &[usize],
    preferred: &[Dept],
    seed: u64,
    time_limit: Option<Duration>,
) -> Result<Option<Vec<Slot>>, String> {
    let start_time = Instant::now();
    let n = grid.len();
    let departments = counts.len();

    info!(
        "Setting up exact seating model with {} seats and {} departments...",
        n, departments
    );
    let mut problem = ProblemVariables::new();

    // x_pd = 1 if seat p holds a student of department d
    //        0 otherwise
    let x: Vec<Vec<Variable>> = (0..n)
        .map(|_| problem.add_vector(variable().binary(), departments))
        .collect();
    trace!("Generated {} assignment variables.", n * departments);

    let kept_preference: Expression = preferred
        .iter()
        .zip(&x)
        .map(|(&d, seat)| seat[d])
        .sum();

    let mut model = problem
        .maximise(kept_preference)
        .using(default_solver)
        .set_option("threads", 1) // single thread keeps runs reproducible
        .set_option("random_seed", (seed % i32::MAX as u64) as i32)
        .set_option("log_to_console", "false");
    if let Some(limit) = time_limit {
        trace!("Exact seating limited to {:.2?}.", limit);
        model = model.set_option("time_limit", limit.as_secs_f64());
    }

    // one department per required seat, at most one on spare seats
    for (p, seat) in x.iter().enumerate() {
        let seat_filled: Expression = seat.iter().copied().sum();
        if p < grid.required() {
            model.add_constraint(constraint!(seat_filled == 1));
        } else {
            model.add_constraint(constraint!(seat_filled <= 1));
        }
    }

    // every student seated
    for (d, &count) in counts.iter().enumerate() {
        let seated: Expression = x.iter().map(|seat| seat[d]).sum();
        let target =
            i32::try_from(count).map_err(|_| format!("{count} students in one department"))?;
        model.add_constraint(constraint!(seated == target));
    }

    // no shared department across a neighbouring pair
    let mut pairs = 0usize;
    for (q, p) in grid.adjacent_pairs() {
        for d in 0..departments {
            let a = x[q][d];
            let b = x[p][d];
            model.add_constraint(constraint!(a + b <= 1));
        }
        pairs += 1;
    }
    trace!("Added adjacency constraints for {} neighbouring pairs.", pairs);

    info!("Starting exact seating solver...");
    let solution = match model.solve() {
        Ok(s) => s,
        Err(ResolutionError::Infeasible) => {
            info!(
                "Exact seating model is infeasible ({:.2?}).",
                start_time.elapsed()
            );
            return Ok(None);
        }
        Err(e) => return Err(format!("exact seating solver failed: {}", e)),
    };
    info!("Exact seating found in {:.2?}", start_time.elapsed());

    let pattern: Vec<Slot> = x
        .iter()
        .map(|seat| seat.iter().position(|var| solution.value(*var) > 0.9))
        .collect();
    if pattern[..grid.required()].iter().any(Option::is_none) {
        return Err("exact seating solver left a required seat empty".to_string());
    }
    Ok(Some(pattern))
}
