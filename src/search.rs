//! Binary search over sorted, indexed data.
//!
//! Font tables store sorted records in arrays that are read on demand rather than collected into
//! slices, so these helpers are expressed in terms of an element count and an accessor.

use std::cmp::Ordering;

/// Binary search the indices `0..len`.
///
/// `f` compares the element at the given index with the target, returning `Less` if the element
/// sorts before the target. Returns `Ok(index)` of a matching element or `Err(index)` of the
/// position the target would be inserted at, like `slice::binary_search_by`.
pub fn binary_search_by<F>(len: usize, mut f: F) -> Result<usize, usize>
where
    F: FnMut(usize) -> Ordering,
{
    // INVARIANTS:
    // - 0 <= left <= right <= len
    // - f returns Less for everything in [..left]
    // - f returns Greater for everything in [right..]
    let mut left = 0;
    let mut right = len;
    while left < right {
        let mid = left + (right - left) / 2;
        match f(mid) {
            Ordering::Less => left = mid + 1,
            Ordering::Greater => right = mid,
            Ordering::Equal => return Ok(mid),
        }
    }
    Err(left)
}

/// Find the index of the range that contains `value`.
///
/// The ranges, returned by `range` as inclusive `(start, end)` pairs, must be sorted ascending
/// and must not overlap. A malformed range (`start > end`) never contains anything.
pub fn find_range<T, F>(len: usize, value: T, mut range: F) -> Option<usize>
where
    T: PartialOrd + Copy,
    F: FnMut(usize) -> (T, T),
{
    binary_search_by(len, |index| {
        let (start, end) = range(index);
        if end < value {
            Ordering::Less
        } else if value < start {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_search_by() {
        let values = [1, 3, 5, 7, 9];
        let search = |target: i32| binary_search_by(values.len(), |i| values[i].cmp(&target));
        assert_eq!(search(1), Ok(0));
        assert_eq!(search(9), Ok(4));
        assert_eq!(search(4), Err(2));
        assert_eq!(search(10), Err(5));
        assert_eq!(binary_search_by(0, |_| Ordering::Equal), Err(0));
    }

    #[test]
    fn test_find_range() {
        let ranges = [(10u32, 20u32), (30, 30), (40, 0xFFFF)];
        let find = |value| find_range(ranges.len(), value, |i| ranges[i]);
        assert_eq!(find(9), None);
        assert_eq!(find(10), Some(0));
        assert_eq!(find(20), Some(0));
        assert_eq!(find(21), None);
        assert_eq!(find(30), Some(1));
        assert_eq!(find(0xFFFF), Some(2));
        assert_eq!(find(0x10000), None);
    }
}
