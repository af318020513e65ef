use crate::data::Room;

/// A seat identified by its room's position in the fill order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Seat {
    pub room: usize,
    pub row: u32,
    pub seat: u32,
}

/// Seats of a room sequence in fill order: rooms in the given order, each
/// filled row-major before the next is opened.
///
/// Positions are indices into that order. A seat's left and front neighbours
/// always come earlier, so a left-to-right placement only ever has to look
/// backwards. Positions below `required` must hold a student; the rest may be
/// left empty.
#[derive(Debug, Clone)]
pub(crate) struct SeatGrid {
    seats: Vec<Seat>,
    left: Vec<Option<usize>>,
    front: Vec<Option<usize>>,
    horizontal_bound: Vec<u32>,
    required: usize,
}

impl SeatGrid {
    /// The first `n` seats, every one of them taken.
    pub fn fill(rooms: &[Room], n: usize) -> Self {
        Self::build(rooms, n, n)
    }

    /// Every seat of the rooms opened for `n` students. Rooms before the last
    /// one opened are filled completely; the last room's spare seats may stay
    /// empty so students can be spread out.
    pub fn with_spare_seats(rooms: &[Room], n: usize) -> Self {
        let mut opened = 0usize;
        for room in rooms {
            let capacity = room.capacity() as usize;
            if opened + capacity >= n {
                return Self::build(rooms, opened + capacity, opened);
            }
            opened += capacity;
        }
        Self::build(rooms, opened, opened)
    }

    fn build(rooms: &[Room], limit: usize, required: usize) -> Self {
        let mut seats = Vec::with_capacity(limit);
        let mut left = Vec::with_capacity(limit);
        let mut front = Vec::with_capacity(limit);

        'rooms: for (room_idx, room) in rooms.iter().enumerate() {
            let width = room.seats_per_row() as usize;
            for row in 0..room.rows() {
                for seat in 0..room.seats_per_row() {
                    if seats.len() == limit {
                        break 'rooms;
                    }
                    let p = seats.len();
                    left.push((seat > 0).then(|| p - 1));
                    front.push((row > 0).then(|| p - width));
                    seats.push(Seat {
                        room: room_idx,
                        row,
                        seat,
                    });
                }
            }
        }

        let horizontal_bound = horizontal_bound(&seats);
        Self {
            required: required.min(seats.len()),
            seats,
            left,
            front,
            horizontal_bound,
        }
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Positions before this one may not be left empty.
    pub fn required(&self) -> usize {
        self.required
    }

    pub fn seat(&self, p: usize) -> Seat {
        self.seats[p]
    }

    /// Already-filled neighbours of position `p`: left, then front.
    pub fn neighbours_before(&self, p: usize) -> impl Iterator<Item = usize> + '_ {
        self.left[p].into_iter().chain(self.front[p])
    }

    /// Upper bound on how many seats from `p` onwards a single department
    /// could hold if only same-row neighbours were constrained.
    pub fn horizontal_bound(&self, p: usize) -> u32 {
        self.horizontal_bound[p]
    }

    /// Every adjacent pair `(earlier, later)`.
    pub fn adjacent_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.len()).flat_map(move |p| self.neighbours_before(p).map(move |q| (q, p)))
    }
}

// bound[p] = ceil(rest of p's row / 2) + bound[start of next row]
fn horizontal_bound(seats: &[Seat]) -> Vec<u32> {
    let n = seats.len();
    let mut bound = vec![0u32; n + 1];
    let mut run = 0u32;
    let mut after_row = 0u32;
    for p in (0..n).rev() {
        let ends_row = seats
            .get(p + 1)
            .is_none_or(|next| next.room != seats[p].room || next.row != seats[p].row);
        if ends_row {
            run = 0;
            after_row = bound[p + 1];
        }
        run += 1;
        bound[p] = run.div_ceil(2) + after_row;
    }
    bound
}
