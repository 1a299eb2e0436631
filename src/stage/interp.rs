use num_traits::Float;

use crate::buffer::{Interval, Region, View, ViewMut};
use crate::search::{is_strictly_increasing_by, lower_bound_by};

use super::{require_covers, table_length, ComputeReport, ContractViolation, ExternStage};

/// Where a query falls relative to a table of `len >= 1` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// At or below the first entry.
    Below,
    /// At or above the last entry.
    Above,
    /// Strictly inside segment `[i - 1, i]`, with `1 <= i < len`.
    Between(usize),
    /// Not comparable with the table (NaN query, or an unsorted table).
    Unordered,
}

/// Classify `x` against the table read through `at`.
///
/// The low edge is tested first, so a single-entry table places every
/// ordered query `Below` or `Above`.
///
/// ```
/// use interp_extern::stage::{place, Placement};
///
/// let xp = [1.0_f64, 2.0, 3.0];
/// assert_eq!(place(3, |i| xp[i], 0.5), Placement::Below);
/// assert_eq!(place(3, |i| xp[i], 2.0), Placement::Between(1));
/// assert_eq!(place(3, |i| xp[i], 2.5), Placement::Between(2));
/// assert_eq!(place(3, |i| xp[i], 3.0), Placement::Above);
/// ```
#[inline]
pub fn place<T: PartialOrd + Copy>(len: usize, at: impl Fn(usize) -> T, x: T) -> Placement {
    debug_assert!(len > 0, "cannot place a query in an empty table");
    if x <= at(0) {
        return Placement::Below;
    }
    if x >= at(len - 1) {
        return Placement::Above;
    }
    let i = lower_bound_by(len, |k| at(k) < x);
    if i == 0 || i >= len {
        Placement::Unordered
    } else {
        Placement::Between(i)
    }
}

/// Value at `x` on the line through `(x0, y0)` and `(x1, y1)`.
///
/// Evaluated as `slope * (x - x0) + y0`, which reproduces `y0` exactly at
/// `x == x0`.
#[inline]
pub fn lerp<T: Float>(x0: T, x1: T, y0: T, y1: T, x: T) -> T {
    ((y1 - y0) / (x1 - x0)) * (x - x0) + y0
}

/// Piecewise-linear interpolation over slices, clamped at both ends.
///
/// `xp` must be strictly increasing and non-empty, `fp` at least as long.
/// Queries outside `[xp[0], xp[n-1]]` take the nearest boundary ordinate;
/// a NaN query yields NaN.
///
/// ```
/// use interp_extern::stage::interp_clamped;
///
/// let xp = [1.0_f64, 2.0, 3.0];
/// let fp = [10.0, 20.0, 30.0];
/// assert_eq!(interp_clamped(&xp, &fp, 0.5), 10.0);
/// assert_eq!(interp_clamped(&xp, &fp, 2.5), 25.0);
/// assert_eq!(interp_clamped(&xp, &fp, 5.0), 30.0);
/// ```
pub fn interp_clamped<T: Float>(xp: &[T], fp: &[T], x: T) -> T {
    let n = xp.len();
    match place(n, |i| xp[i], x) {
        Placement::Below => fp[0],
        Placement::Above => fp[n - 1],
        Placement::Between(i) => lerp(xp[i - 1], xp[i], fp[i - 1], fp[i], x),
        Placement::Unordered => T::nan(),
    }
}

/// Settings for [`PiecewiseInterp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpSettings {
    /// Shared length of the abscissa table and of each ordinate row.
    pub grid_size: i32,
    /// Reject abscissa tables that are not strictly increasing instead of
    /// producing unspecified values.
    pub validate_table: bool,
}

impl InterpSettings {
    pub const fn new(grid_size: i32) -> Self {
        Self {
            grid_size,
            validate_table: false,
        }
    }

    pub const fn with_validation(mut self, validate_table: bool) -> Self {
        self.validate_table = validate_table;
        self
    }
}

/// Inputs to a [`PiecewiseInterp`] compute call.
#[derive(Debug, Clone, Copy)]
pub struct InterpInputs<'a> {
    /// Abscissae to evaluate at, covering the output region.
    pub queries: View<'a, f64, 2>,
    /// Strictly increasing abscissa table, covering `[0, grid_size)`.
    pub xp: View<'a, f64, 1>,
    /// Ordinates: axis 0 is the table axis `[0, grid_size)`, axis 1 covers
    /// the output's batch rows.
    pub fp: View<'a, f64, 2>,
}

/// Regions a [`PiecewiseInterp`] needs for a given output region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpBounds {
    pub queries: Region<2>,
    pub xp: Region<1>,
    pub fp: Region<2>,
}

/// Resamples each batch row of an ordinate table at the query abscissae.
///
/// For output `(x, y)` with query `q = queries[x, y]`:
///
/// - `q <= xp[0]` → `fp[0, y]`
/// - `q >= xp[n-1]` → `fp[n-1, y]`
/// - otherwise the line through the two table points bracketing `q`.
///
/// Row `y` of the output reads only row `y` of `fp`.
#[derive(Debug, Clone, Copy)]
pub struct PiecewiseInterp {
    settings: InterpSettings,
}

impl PiecewiseInterp {
    /// Returns `ContractViolation::InvalidLength` for a negative grid size and
    /// `ContractViolation::EmptyTable` for zero.
    pub fn new(settings: InterpSettings) -> Result<Self, ContractViolation> {
        if table_length("xp", settings.grid_size)? == 0 {
            return Err(ContractViolation::EmptyTable { buffer: "xp" });
        }
        Ok(Self { settings })
    }
}

impl ExternStage for PiecewiseInterp {
    const NAME: &'static str = "interp";

    type Inputs<'a> = InterpInputs<'a>;
    type Output = f64;
    type Bounds = InterpBounds;

    fn negotiate(&self, output: &Region<2>) -> InterpBounds {
        let table = Interval::new(0, self.settings.grid_size);
        InterpBounds {
            queries: *output,
            xp: Region::new([table]),
            fp: Region::new([table, output[1]]),
        }
    }

    fn compute(
        &self,
        inputs: InterpInputs<'_>,
        mut output: ViewMut<'_, f64, 2>,
    ) -> Result<ComputeReport, ContractViolation> {
        let region = output.region();
        let bounds = self.negotiate(&region);
        require_covers("xs", &inputs.queries.region(), &bounds.queries)?;
        require_covers("xp", &inputs.xp.region(), &bounds.xp)?;
        require_covers("fp", &inputs.fp.region(), &bounds.fp)?;

        let n = self.settings.grid_size as usize;
        let last = self.settings.grid_size - 1;
        let InterpInputs { queries, xp, fp } = inputs;
        let at = |i: usize| xp[[i as i32]];
        if self.settings.validate_table && !is_strictly_increasing_by(n, at) {
            return Err(ContractViolation::NotSorted { buffer: "xp" });
        }

        let mut report = ComputeReport {
            elements: region.len(),
            ..ComputeReport::default()
        };
        for y in region[1].range() {
            for x in region[0].range() {
                let q = queries[[x, y]];
                output[[x, y]] = match place(n, at, q) {
                    Placement::Below => {
                        report.clamped_low += 1;
                        tracing::trace!(stage = Self::NAME, x, y, query = q, "clamped low");
                        fp[[0, y]]
                    }
                    Placement::Above => {
                        report.clamped_high += 1;
                        tracing::trace!(stage = Self::NAME, x, y, query = q, "clamped high");
                        fp[[last, y]]
                    }
                    Placement::Between(i) => {
                        let i = i as i32;
                        lerp(xp[[i - 1]], xp[[i]], fp[[i - 1, y]], fp[[i, y]], q)
                    }
                    Placement::Unordered => f64::NAN,
                };
            }
        }
        Ok(report)
    }
}
