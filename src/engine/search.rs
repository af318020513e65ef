//! Depth-first constrained placement.
//!
//! Seats are filled in grid order. At each seat the candidates are the
//! departments that still have students waiting and differ from the seat's
//! already-filled left and front neighbours, ranked by where their next
//! student sits in the preference order. Seats past the grid's required
//! prefix may also be left empty, tried only after every department. Only
//! departments are searched: the student taken from a department is always
//! that department's next one in preference order, so a department pattern
//! fixes the whole seating.
//!
//! The search keeps an explicit stack of frames, one per visited seat, and
//! undoes a frame's choice before trying its next candidate.

use super::cancel::CancellationToken;
use super::grid::SeatGrid;
use crate::error::SeatingResult;
use itertools::Itertools;
use log::trace;

pub(crate) type Dept = usize;

/// What one seat holds: a department, or `None` for an empty seat.
pub(crate) type Slot = Option<Dept>;

/// Students grouped by department, each group in preference order.
#[derive(Debug, Clone)]
pub(crate) struct DepartmentQueues {
    queues: Vec<Vec<usize>>,
    /// Position of each student in the preference order.
    rank: Vec<usize>,
}

impl DepartmentQueues {
    pub fn new(order: &[usize], dept_of: &[Dept], departments: usize) -> Self {
        let mut queues = vec![Vec::new(); departments];
        let mut rank = vec![0; dept_of.len()];
        for (position, &student) in order.iter().enumerate() {
            queues[dept_of[student]].push(student);
            rank[student] = position;
        }
        Self { queues, rank }
    }

    pub fn departments(&self) -> usize {
        self.queues.len()
    }

    pub fn count(&self, dept: Dept) -> usize {
        self.queues[dept].len()
    }

    pub fn total(&self) -> usize {
        self.queues.iter().map(Vec::len).sum()
    }

    // preference rank of the department's next unseated student
    fn head_rank(&self, dept: Dept, taken: usize) -> usize {
        self.rank[self.queues[dept][taken]]
    }

    /// Deals students into a seat pattern, each department in its own order.
    pub fn deal(&self, pattern: &[Slot]) -> Vec<Option<usize>> {
        let mut next = vec![0; self.queues.len()];
        pattern
            .iter()
            .map(|slot| {
                slot.map(|d| {
                    let student = self.queues[d][next[d]];
                    next[d] += 1;
                    student
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stuck {
    /// Every department with students left sits next to this seat.
    Blocked,
    /// `department` has more students left than the seats from here on can
    /// hold without two of them sharing a row.
    Crowded { seats_left: u32 },
}

/// Where the search got stuck furthest into the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeadEnd {
    pub position: usize,
    pub stuck: Stuck,
    /// The department that could not be seated here.
    pub department: Option<Dept>,
    /// Departments of the seat's already-filled neighbours.
    pub blocked: Vec<Dept>,
    pub remaining: Vec<usize>,
}

impl DeadEnd {
    pub fn placed(&self, total: usize) -> usize {
        total.saturating_sub(self.remaining.iter().sum())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SearchOutcome {
    /// Slot per seat position.
    Placed(Vec<Slot>),
    /// Every branch was tried.
    Exhausted(DeadEnd),
    /// The step budget ran out before an answer was found.
    BudgetSpent(DeadEnd),
}

#[derive(Debug)]
struct Frame {
    position: usize,
    candidates: Vec<Slot>,
    cursor: usize,
    chosen: Option<Slot>,
}

pub(crate) struct PlacementSearch<'a> {
    grid: &'a SeatGrid,
    queues: &'a DepartmentQueues,
    budget: u64,
}

impl<'a> PlacementSearch<'a> {
    pub fn new(grid: &'a SeatGrid, queues: &'a DepartmentQueues, budget: u64) -> Self {
        Self {
            grid,
            queues,
            budget,
        }
    }

    pub fn run(&self, cancel: &CancellationToken) -> SeatingResult<SearchOutcome> {
        let m = self.grid.len();
        let n = self.queues.total();
        if n == 0 {
            return Ok(SearchOutcome::Placed(vec![None; m]));
        }
        let spare = m.saturating_sub(n);

        let mut pattern: Vec<Slot> = vec![None; m];
        let mut taken = vec![0usize; self.queues.departments()];
        let mut placed = 0usize;
        let mut gaps = 0usize;
        let mut deepest: Option<DeadEnd> = None;
        let mut steps = 0u64;
        let mut backtracks = 0u64;

        let mut frames = vec![self.frame(0, &pattern, &taken, gaps < spare)];
        while let Some(frame) = frames.last_mut() {
            let p = frame.position;
            match frame.chosen.take() {
                Some(Some(d)) => {
                    taken[d] -= 1;
                    placed -= 1;
                }
                Some(None) => gaps -= 1,
                None => {}
            }

            if frame.cursor == frame.candidates.len() {
                if deepest.as_ref().is_none_or(|e| p > e.position) {
                    deepest = Some(self.blocked_at(p, &pattern, &taken));
                }
                frames.pop();
                backtracks += 1;
                continue;
            }

            steps += 1;
            if steps > self.budget {
                trace!(
                    "Search budget spent after {} steps and {} backtracks.",
                    steps - 1,
                    backtracks
                );
                let dead_end = deepest.unwrap_or_else(|| self.blocked_at(p, &pattern, &taken));
                return Ok(SearchOutcome::BudgetSpent(dead_end));
            }
            cancel.check(placed, n)?;

            let slot = frame.candidates[frame.cursor];
            frame.cursor += 1;
            frame.chosen = Some(slot);
            pattern[p] = slot;
            match slot {
                Some(d) => {
                    taken[d] += 1;
                    placed += 1;
                }
                None => gaps += 1,
            }

            if placed == n {
                pattern[p + 1..].fill(None);
                trace!(
                    "Placement found after {} steps and {} backtracks.",
                    steps,
                    backtracks
                );
                return Ok(SearchOutcome::Placed(pattern));
            }
            // gaps never exceed the spare seats, so seats remain for the rest
            if let Some(d) = self.crowded(p + 1, &taken) {
                if deepest.as_ref().is_none_or(|e| p + 1 > e.position) {
                    deepest = Some(self.crowded_at(p + 1, d, &pattern, &taken));
                }
                continue;
            }
            frames.push(self.frame(p + 1, &pattern, &taken, gaps < spare));
        }

        trace!("Search space exhausted after {} steps.", steps);
        let dead_end = deepest.unwrap_or_else(|| self.blocked_at(0, &pattern, &taken));
        Ok(SearchOutcome::Exhausted(dead_end))
    }

    fn blocked(&self, p: usize, pattern: &[Slot]) -> Vec<Dept> {
        self.grid
            .neighbours_before(p)
            .filter_map(|q| pattern[q])
            .unique()
            .collect()
    }

    fn frame(&self, p: usize, pattern: &[Slot], taken: &[usize], gap_left: bool) -> Frame {
        let blocked = self.blocked(p, pattern);
        let mut candidates: Vec<Slot> = (0..self.queues.departments())
            .filter(|&d| taken[d] < self.queues.count(d) && !blocked.contains(&d))
            .sorted_by_key(|&d| self.queues.head_rank(d, taken[d]))
            .map(Some)
            .collect();
        if gap_left && p >= self.grid.required() {
            candidates.push(None);
        }
        Frame {
            position: p,
            candidates,
            cursor: 0,
            chosen: None,
        }
    }

    // a department that needs more seats than the remaining rows can give it
    fn crowded(&self, p: usize, taken: &[usize]) -> Option<Dept> {
        let bound = self.grid.horizontal_bound(p) as usize;
        (0..self.queues.departments()).find(|&d| self.queues.count(d) - taken[d] > bound)
    }

    fn remaining(&self, taken: &[usize]) -> Vec<usize> {
        (0..self.queues.departments())
            .map(|d| self.queues.count(d) - taken[d])
            .collect()
    }

    fn blocked_at(&self, p: usize, pattern: &[Slot], taken: &[usize]) -> DeadEnd {
        let department = (0..self.queues.departments())
            .filter(|&d| taken[d] < self.queues.count(d))
            .min_by_key(|&d| self.queues.head_rank(d, taken[d]));
        DeadEnd {
            position: p,
            stuck: Stuck::Blocked,
            department,
            blocked: self.blocked(p, pattern),
            remaining: self.remaining(taken),
        }
    }

    fn crowded_at(&self, p: usize, dept: Dept, pattern: &[Slot], taken: &[usize]) -> DeadEnd {
        DeadEnd {
            position: p,
            stuck: Stuck::Crowded {
                seats_left: self.grid.horizontal_bound(p),
            },
            department: Some(dept),
            blocked: self.blocked(p, pattern),
            remaining: self.remaining(taken),
        }
    }
}
