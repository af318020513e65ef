use crate::data::{AlgorithmMode, Student};
use itertools::Itertools;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Student indices in the order the mode wants them seated.
pub(crate) fn preference_order(students: &[Student], mode: AlgorithmMode, seed: u64) -> Vec<usize> {
    let by_roll = (0..students.len())
        .sorted_by(|&a, &b| students[a].roll_number.cmp(&students[b].roll_number));

    match mode {
        AlgorithmMode::Sequential => by_roll.collect(),
        AlgorithmMode::Alternate => round_robin(students),
        AlgorithmMode::Random => {
            let mut order: Vec<usize> = by_roll.collect();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            order.shuffle(&mut rng);
            order
        }
    }
}

// departments in name order, each sorted by roll number, dealt one at a time
fn round_robin(students: &[Student]) -> Vec<usize> {
    let groups: Vec<Vec<usize>> = (0..students.len())
        .sorted_by(|&a, &b| {
            (&students[a].department, &students[a].roll_number)
                .cmp(&(&students[b].department, &students[b].roll_number))
        })
        .chunk_by(|&i| students[i].department.as_str())
        .into_iter()
        .map(|(_, group)| group.collect())
        .collect();

    let longest = groups.iter().map(Vec::len).max().unwrap_or(0);
    (0..longest)
        .flat_map(|depth| groups.iter().filter_map(move |g| g.get(depth).copied()))
        .collect()
}
