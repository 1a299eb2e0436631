//! Extern stages: callbacks driven by a scheduling runtime in two phases.
//!
//! The runtime first asks a stage which input regions it needs to produce a
//! given output region ([`Request::Negotiate`]). It then allocates and fills
//! those inputs and asks the stage to fill the output ([`Request::Compute`]).
//! The output region is the independent variable of the negotiation: input
//! regions are always derived from it, never the reverse.
//!
//! Region policy shared by both stages:
//!
//! - batch arrays (queries, and the batch axis of the ordinate table) mirror
//!   the output region axis for axis;
//! - search tables are needed whole, `[0, n)`, whatever the output tiling.
//!   A compute request whose table view does not cover `[0, n)` is rejected
//!   with [`ContractViolation::Uncovered`].
//!
//! # Stages
//!
//! - [`IndexLocator`]: lower-bound index of each query in a sorted table
//! - [`PiecewiseInterp`]: piecewise-linear interpolation with edge clamping
//!
//! # Example
//!
//! ```
//! use interp_extern::buffer::{Interval, Region, View, ViewMut};
//! use interp_extern::stage::{ExternStage, LocateInputs, IndexLocator, LocateSettings, Request, Response};
//!
//! let stage = IndexLocator::new(LocateSettings::new(4)).unwrap();
//! let out_region = Region::new([Interval::new(0, 2), Interval::new(0, 1)]);
//!
//! // Phase 1: what does the stage need?
//! let Ok(Response::Bounds(bounds)) = stage.handle(Request::Negotiate { output: out_region }) else {
//!     panic!("expected bounds");
//! };
//! assert_eq!(bounds.table, Region::new([Interval::new(0, 4)]));
//!
//! // Phase 2: hand it exactly that.
//! let queries = [4.0_f64, 8.0];
//! let table = [1.0_f64, 3.0, 5.0, 7.0];
//! let mut out = [0_i32; 2];
//! let inputs = LocateInputs {
//!     queries: View::dense(&queries, bounds.queries).unwrap(),
//!     table: View::dense(&table, bounds.table).unwrap(),
//! };
//! let output = ViewMut::dense(&mut out, out_region).unwrap();
//! stage.handle(Request::Compute { inputs, output }).unwrap();
//! assert_eq!(out, [2, 4]);
//! ```

mod interp;
mod locate;


pub use interp::{
    interp_clamped, lerp, place, InterpBounds, InterpInputs, InterpSettings, PiecewiseInterp,
    Placement,
};
pub use locate::{IndexLocator, LocateBounds, LocateInputs, LocateSettings};

use crate::buffer::{Interval, LayoutError, Region, ViewMut};
use crate::traits::{Element, ElementType, TypeDescriptor};

/// A caller/stage contract violation.
///
/// These indicate a bug on one side of the boundary, never bad input data.
/// The C ABI adapter aborts the process on any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    /// A descriptor pointer was null.
    #[error("{buffer}: descriptor is null")]
    MissingDescriptor { buffer: &'static str },
    /// A descriptor declares dimensions but its `dim` array is null.
    #[error("{buffer}: dim array is null")]
    MissingDims { buffer: &'static str },
    /// A buffer has the wrong number of dimensions.
    #[error("{buffer}: expected rank {expected}, got {got}")]
    Rank {
        buffer: &'static str,
        expected: usize,
        got: i32,
    },
    /// A buffer has the wrong element type.
    #[error("{buffer}: expected element type {expected}, got {got}")]
    ElementType {
        buffer: &'static str,
        expected: ElementType,
        got: TypeDescriptor,
    },
    /// A compute-phase buffer has no storage attached.
    #[error("{buffer}: no storage attached in compute phase")]
    MissingStorage { buffer: &'static str },
    /// A buffer's layout cannot be addressed.
    #[error("{buffer}: {source}")]
    Layout {
        buffer: &'static str,
        source: LayoutError,
    },
    /// An input does not cover the region negotiation asked for.
    #[error("{buffer}: axis {axis} covers {got} but {required} is required")]
    Uncovered {
        buffer: &'static str,
        axis: usize,
        required: Interval,
        got: Interval,
    },
    /// A declared table length is negative.
    #[error("{buffer}: declared length {got} is negative")]
    InvalidLength { buffer: &'static str, got: i32 },
    /// A table that must hold at least one point is empty.
    #[error("{buffer}: table is empty")]
    EmptyTable { buffer: &'static str },
    /// A table is not strictly increasing (only with table validation on).
    #[error("{buffer}: table is not strictly increasing")]
    NotSorted { buffer: &'static str },
}

/// Summary of a compute call.
///
/// Clamping is not an error: clamped elements hold a well-defined boundary
/// value. The counts are a side channel for callers that want to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComputeReport {
    /// Number of output elements written.
    pub elements: usize,
    /// Queries at or below the first table entry.
    pub clamped_low: usize,
    /// Queries at or above the last table entry.
    pub clamped_high: usize,
}

impl ComputeReport {
    /// Total number of clamped elements.
    pub fn clamped(&self) -> usize {
        self.clamped_low + self.clamped_high
    }
}

/// One call into a stage. The variant is the phase.
pub enum Request<'a, S: ExternStage + ?Sized> {
    /// Declare the input regions needed to produce `output`. Touches no data.
    Negotiate { output: Region<2> },
    /// Fill `output` from `inputs`, which cover the negotiated regions.
    Compute {
        inputs: S::Inputs<'a>,
        output: ViewMut<'a, S::Output, 2>,
    },
}

/// Result of a successful [`ExternStage::handle`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<B> {
    /// Input regions required by a negotiation request.
    Bounds(B),
    /// Outcome of a compute request.
    Computed(ComputeReport),
}

/// A two-phase extern callback.
///
/// Stages are stateless between calls: `handle` takes `&self`, so one stage
/// may serve concurrent calls for disjoint output regions.
pub trait ExternStage {
    /// Name used in diagnostics.
    const NAME: &'static str;

    /// Borrowed input views for a compute request.
    type Inputs<'a>;
    /// Element type of the rank-2 output.
    type Output: Element;
    /// Input regions produced by negotiation.
    type Bounds: Copy + PartialEq + core::fmt::Debug;

    /// Input regions needed to produce `output`. Pure function of `output`.
    fn negotiate(&self, output: &Region<2>) -> Self::Bounds;

    /// Fill every element of `output` from `inputs`.
    ///
    /// Reads only inside the regions [`negotiate`](Self::negotiate) returns
    /// for `output.region()`, and never changes any view's shape.
    fn compute(
        &self,
        inputs: Self::Inputs<'_>,
        output: ViewMut<'_, Self::Output, 2>,
    ) -> Result<ComputeReport, ContractViolation>;

    /// Dispatch a request to the phase it names.
    fn handle(&self, request: Request<'_, Self>) -> Result<Response<Self::Bounds>, ContractViolation> {
        match request {
            Request::Negotiate { output } => {
                let bounds = self.negotiate(&output);
                tracing::debug!(stage = Self::NAME, %output, ?bounds, "bounds query");
                Ok(Response::Bounds(bounds))
            }
            Request::Compute { inputs, output } => {
                let report = self.compute(inputs, output)?;
                tracing::debug!(
                    stage = Self::NAME,
                    elements = report.elements,
                    clamped_low = report.clamped_low,
                    clamped_high = report.clamped_high,
                    "computed"
                );
                Ok(Response::Computed(report))
            }
        }
    }
}

/// Check that an input region covers what negotiation required.
pub(crate) fn require_covers<const D: usize>(
    buffer: &'static str,
    got: &Region<D>,
    required: &Region<D>,
) -> Result<(), ContractViolation> {
    match got.first_uncovered(required) {
        None => Ok(()),
        Some(axis) => Err(ContractViolation::Uncovered {
            buffer,
            axis,
            required: required[axis],
            got: got[axis],
        }),
    }
}

/// Validate a declared table length.
pub(crate) fn table_length(buffer: &'static str, len: i32) -> Result<i32, ContractViolation> {
    if len < 0 {
        Err(ContractViolation::InvalidLength { buffer, got: len })
    } else {
        Ok(len)
    }
}
