//! # interp-extern
//!
//! Sorted-table search and piecewise-linear interpolation packaged as extern
//! stages for a tiling/scheduling pipeline compiler. No heap allocation:
//! every buffer is owned by the caller, the stages only read inputs and
//! write the output tile they are handed.
//!
//! ## Quick start
//!
//! ```
//! use interp_extern::stage::interp_clamped;
//!
//! // Resample a coarse spectrum onto finer abscissae, clamping at the edges
//! let xp = [1.0_f64, 2.0, 3.0];
//! let fp = [10.0, 20.0, 30.0];
//! assert_eq!(interp_clamped(&xp, &fp, 2.5), 25.0);
//! assert_eq!(interp_clamped(&xp, &fp, 9.0), 30.0);
//! ```
//!
//! ## Modules
//!
//! - [`buffer`]: `Interval` / `Region` coordinate ranges and the strided
//!   [`View`] / [`ViewMut`] types that address caller-owned storage.
//!
//! - [`search`]: lower-bound binary search over strictly increasing tables,
//!   on slices or through an index accessor.
//!
//! - [`stage`]: the two-phase protocol ([`ExternStage`], [`Request`],
//!   [`Response`]) and its two implementations:
//!   - [`IndexLocator`]: insertion index of each query in a sorted table
//!   - [`PiecewiseInterp`]: per-row linear interpolation with edge clamping
//!
//! - [`ffi`]: `#[repr(C)]` runtime buffer descriptors and the exported
//!   `bsearch_lut_extern` / `interp_extern` symbols. Requires `ffi`.
//!
//! - [`traits`]: element types: [`Element`] (`f64`, `i32`) with its
//!   [`ElementType`] tag and the runtime's raw type descriptor.
//!
//! ## Diagnostics
//!
//! Stages emit [`tracing`] events: `debug` per negotiation and per compute
//! call, `trace` per clamped query, `error` before the C ABI aborts on a
//! contract violation. Nothing is printed unless the host installs a
//! subscriber.
//!
//! ## Cargo features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `std`   | yes     | Links `std`; without it the crate is `no_std` |
//! | `ffi`   | no      | C ABI entry points (implies `std`) |
//! | `all`   | no      | All features |

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(all(test, not(feature = "std")))]
extern crate std;

pub mod buffer;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod search;
pub mod stage;
pub mod traits;

pub use buffer::{Interval, Region, View, ViewMut};
pub use search::lower_bound;
pub use stage::{
    ComputeReport, ContractViolation, ExternStage, IndexLocator, PiecewiseInterp, Request,
    Response,
};
pub use traits::{Element, ElementType};
