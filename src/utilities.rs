//! Internal utility functions.
//!
//! Sequence helpers shared by the analysis and normalization modules.

/// Group ascending numbers into runs of consecutive values.
///
/// The input is not sorted first.
///
/// ```text
/// [1, 2, 3, 5, 6, 7, 9] -> [[1, 2, 3], [5, 6, 7], [9]]
/// ```
pub fn group_runs(numbers: &[usize]) -> Vec<Vec<usize>> {
    let mut runs: Vec<Vec<usize>> = Vec::new();
    for &number in numbers {
        match runs.last_mut() {
            Some(run) if run.last().is_some_and(|&last| last + 1 == number) => run.push(number),
            _ => runs.push(vec![number]),
        }
    }
    runs
}

/// Keep the items whose index within each `cycle` is in `offsets`, or the
/// ones that are not when `inverse` is set.
///
/// `cycle` must be at least 1; duplicate offsets are ignored.
pub fn select_every<T: Clone>(data: &[T], cycle: usize, offsets: &[usize], inverse: bool) -> Vec<T> {
    debug_assert!(cycle >= 1, "cycle must be at least 1");
    data.iter()
        .enumerate()
        .filter(|(n, _)| offsets.contains(&(n % cycle)) != inverse)
        .map(|(_, item)| item.clone())
        .collect()
}

/// Most frequent value; ties go to the value seen first.
pub fn most_common(values: &[usize]) -> Option<usize> {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for &value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    // `max_by_key` keeps the last maximum, so walk in reverse to favour the first.
    counts
        .into_iter()
        .rev()
        .max_by_key(|&(_, count)| count)
        .map(|(value, _)| value)
}

/// Greatest common divisor.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
