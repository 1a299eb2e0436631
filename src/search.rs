//! Lower-bound search over strictly increasing tables.
//!
//! Shared by both extern stages. All functions are pure and allocation-free.

use core::cmp::Ordering;

/// Binary search for the first index in `[0, len)` at which `is_less(i)` is
/// false, or `len` if it holds everywhere.
///
/// `is_less(i)` must be `true` for a (possibly empty) prefix of the indices
/// and `false` for the rest. This is the form used for tables that live in a
/// strided view rather than a contiguous slice.
///
/// ```
/// use interp_extern::search::lower_bound_by;
///
/// let table = [1.0_f64, 3.0, 5.0, 7.0];
/// assert_eq!(lower_bound_by(table.len(), |i| table[i] < 4.0), 2);
/// ```
#[inline]
pub fn lower_bound_by(len: usize, mut is_less: impl FnMut(usize) -> bool) -> usize {
    let mut lo = 0;
    let mut hi = len;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if is_less(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Smallest `i` in `[0, xs.len()]` with `xs[i] >= x`.
///
/// Returns `xs.len()` when `x` is greater than every element. Ties resolve to
/// the first qualifying index. A NaN query compares less than nothing and
/// lands at index 0.
///
/// ```
/// use interp_extern::search::lower_bound;
///
/// let xs = [1.0_f64, 3.0, 5.0, 7.0];
/// assert_eq!(lower_bound(&xs, 0.0), 0);
/// assert_eq!(lower_bound(&xs, 3.0), 1);
/// assert_eq!(lower_bound(&xs, 4.0), 2);
/// assert_eq!(lower_bound(&xs, 9.0), 4);
/// ```
#[inline]
pub fn lower_bound<T: PartialOrd>(xs: &[T], x: T) -> usize {
    lower_bound_by(xs.len(), |i| xs[i] < x)
}

/// Whether `len` values read through `at` are strictly increasing.
///
/// NaN anywhere in the sequence makes it unordered.
pub fn is_strictly_increasing_by<T: PartialOrd>(len: usize, mut at: impl FnMut(usize) -> T) -> bool {
    if len == 0 {
        return true;
    }
    let mut prev = at(0);
    if prev.partial_cmp(&prev).is_none() {
        return false;
    }
    for i in 1..len {
        let next = at(i);
        if next.partial_cmp(&prev) != Some(Ordering::Greater) {
            return false;
        }
        prev = next;
    }
    true
}

/// Whether `xs` is strictly increasing.
///
/// ```
/// use interp_extern::search::is_strictly_increasing;
///
/// assert!(is_strictly_increasing(&[0.0_f64, 0.5, 2.0]));
/// assert!(!is_strictly_increasing(&[0.0_f64, 1.0, 1.0]));
/// assert!(!is_strictly_increasing(&[0.0_f64, f64::NAN]));
/// ```
pub fn is_strictly_increasing<T: PartialOrd + Copy>(xs: &[T]) -> bool {
    is_strictly_increasing_by(xs.len(), |i| xs[i])
}
