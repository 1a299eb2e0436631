use crate::buffer::{Interval, Region, View, ViewMut};
use crate::search::{is_strictly_increasing_by, lower_bound_by};

use super::{require_covers, table_length, ComputeReport, ContractViolation, ExternStage};

/// Settings for [`IndexLocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateSettings {
    /// Logical table length requested during negotiation and searched during
    /// compute.
    pub table_extent: i32,
    /// Reject tables that are not strictly increasing instead of returning
    /// unspecified indices.
    pub validate_table: bool,
}

impl LocateSettings {
    pub const fn new(table_extent: i32) -> Self {
        Self {
            table_extent,
            validate_table: false,
        }
    }

    pub const fn with_validation(mut self, validate_table: bool) -> Self {
        self.validate_table = validate_table;
        self
    }
}

/// Inputs to an [`IndexLocator`] compute call.
#[derive(Debug, Clone, Copy)]
pub struct LocateInputs<'a> {
    /// Query values, covering the output region.
    pub queries: View<'a, f64, 2>,
    /// Strictly increasing table, covering `[0, table_extent)`.
    pub table: View<'a, f64, 1>,
}

/// Regions an [`IndexLocator`] needs for a given output region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateBounds {
    pub queries: Region<2>,
    pub table: Region<1>,
}

/// Writes, for every query, the index of the first table entry not less than
/// the query.
///
/// The output is `i32`: index `n` (the table length) means the query exceeds
/// every entry.
#[derive(Debug, Clone, Copy)]
pub struct IndexLocator {
    settings: LocateSettings,
}

impl IndexLocator {
    /// Returns `ContractViolation::InvalidLength` for a negative table extent.
    pub fn new(settings: LocateSettings) -> Result<Self, ContractViolation> {
        table_length("xp", settings.table_extent)?;
        Ok(Self { settings })
    }
}

impl ExternStage for IndexLocator {
    const NAME: &'static str = "bsearch_lut";

    type Inputs<'a> = LocateInputs<'a>;
    type Output = i32;
    type Bounds = LocateBounds;

    fn negotiate(&self, output: &Region<2>) -> LocateBounds {
        LocateBounds {
            queries: *output,
            table: Region::new([Interval::new(0, self.settings.table_extent)]),
        }
    }

    fn compute(
        &self,
        inputs: LocateInputs<'_>,
        mut output: ViewMut<'_, i32, 2>,
    ) -> Result<ComputeReport, ContractViolation> {
        let region = output.region();
        let bounds = self.negotiate(&region);
        require_covers("xs", &inputs.queries.region(), &bounds.queries)?;
        require_covers("xp", &inputs.table.region(), &bounds.table)?;

        let n = self.settings.table_extent as usize;
        let table = inputs.table;
        if self.settings.validate_table && !is_strictly_increasing_by(n, |i| table[[i as i32]]) {
            return Err(ContractViolation::NotSorted { buffer: "xp" });
        }

        for y in region[1].range() {
            for x in region[0].range() {
                let q = inputs.queries[[x, y]];
                // n <= i32::MAX, so the index always fits
                output[[x, y]] = lower_bound_by(n, |i| table[[i as i32]] < q) as i32;
            }
        }

        Ok(ComputeReport {
            elements: region.len(),
            ..ComputeReport::default()
        })
    }
}
