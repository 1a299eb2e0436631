//! C ABI entry points for the scheduling runtime.
//!
//! The runtime calls each symbol twice per output tile, with the same
//! descriptors. If any input descriptor has no host storage the call is a
//! bounds query: every input descriptor still in bounds-query state gets the
//! region the stage needs written into its `dim[]` array. Otherwise the call
//! computes the output tile. Both phases return `0`.
//!
//! Ranks and element types are checked on entry for every descriptor. A
//! contract violation is a caller bug: the process logs the violation and
//! aborts.
//!
//! Requires the `ffi` feature.
//!
//! ```text
//! int bsearch_lut_extern(halide_buffer_t *xs, halide_buffer_t *xp, int xp_extent,
//!                        halide_buffer_t *out);
//! int interp_extern(halide_buffer_t *xs, halide_buffer_t *xp, halide_buffer_t *fp,
//!                   int n_fft, halide_buffer_t *out);
//! ```

mod buffer;

pub use buffer::{HalideBuffer, HalideDimension};

use crate::stage::{
    ContractViolation, ExternStage, IndexLocator, InterpInputs, InterpSettings, LocateInputs,
    LocateSettings, PiecewiseInterp, Request, Response,
};

/// Locate every query of `xs` in the table `xp`, writing indices to `out`.
///
/// Result-returning body of [`bsearch_lut_extern`].
///
/// # Safety
///
/// Each descriptor must be valid as described on [`HalideBuffer::view`], and
/// `out`'s storage must not overlap `xs` or `xp`.
pub unsafe fn bsearch_lut(
    xs: &mut HalideBuffer,
    xp: &mut HalideBuffer,
    xp_extent: i32,
    out: &mut HalideBuffer,
) -> Result<(), ContractViolation> {
    xs.check::<f64, 2>("xs")?;
    xp.check::<f64, 1>("xp")?;
    out.check::<i32, 2>("out")?;
    let stage = IndexLocator::new(LocateSettings::new(xp_extent))?;

    let output = out.region::<2>();
    let request: Request<'_, IndexLocator> = if xs.has_storage() && xp.has_storage() {
        Request::Compute {
            inputs: LocateInputs {
                queries: xs.view("xs")?,
                table: xp.view("xp")?,
            },
            output: out.view_mut("out")?,
        }
    } else {
        Request::Negotiate { output }
    };

    if let Response::Bounds(bounds) = stage.handle(request)? {
        if xs.is_bounds_query() {
            xs.set_region(&bounds.queries);
        }
        if xp.is_bounds_query() {
            xp.set_region(&bounds.table);
        }
    }
    Ok(())
}

/// Interpolate rows of `fp` sampled at `xp` onto the abscissae in `xs`.
///
/// Result-returning body of [`interp_extern`].
///
/// # Safety
///
/// As for [`bsearch_lut`].
pub unsafe fn interp(
    xs: &mut HalideBuffer,
    xp: &mut HalideBuffer,
    fp: &mut HalideBuffer,
    n_fft: i32,
    out: &mut HalideBuffer,
) -> Result<(), ContractViolation> {
    xs.check::<f64, 2>("xs")?;
    xp.check::<f64, 1>("xp")?;
    fp.check::<f64, 2>("fp")?;
    out.check::<f64, 2>("out")?;
    let stage = PiecewiseInterp::new(InterpSettings::new(n_fft))?;

    let output = out.region::<2>();
    let has_storage = xs.has_storage() && xp.has_storage() && fp.has_storage();
    let request: Request<'_, PiecewiseInterp> = if has_storage {
        Request::Compute {
            inputs: InterpInputs {
                queries: xs.view("xs")?,
                xp: xp.view("xp")?,
                fp: fp.view("fp")?,
            },
            output: out.view_mut("out")?,
        }
    } else {
        Request::Negotiate { output }
    };

    if let Response::Bounds(bounds) = stage.handle(request)? {
        if xs.is_bounds_query() {
            xs.set_region(&bounds.queries);
        }
        if xp.is_bounds_query() {
            xp.set_region(&bounds.xp);
        }
        if fp.is_bounds_query() {
            fp.set_region(&bounds.fp);
        }
    }
    Ok(())
}

fn status_or_abort(callback: &str, result: Result<(), ContractViolation>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(violation) => {
            tracing::error!(callback, %violation, "contract violation");
            eprintln!("{callback}: contract violation: {violation}");
            std::process::abort()
        }
    }
}

/// # Safety
///
/// All pointers must be null or point to valid, distinct descriptors; see
/// [`bsearch_lut`].
#[no_mangle]
pub unsafe extern "C" fn bsearch_lut_extern(
    xs: *mut HalideBuffer,
    xp: *mut HalideBuffer,
    xp_extent: i32,
    out: *mut HalideBuffer,
) -> i32 {
    let result = match (xs.as_mut(), xp.as_mut(), out.as_mut()) {
        (Some(xs), Some(xp), Some(out)) => bsearch_lut(xs, xp, xp_extent, out),
        (None, _, _) => Err(ContractViolation::MissingDescriptor { buffer: "xs" }),
        (_, None, _) => Err(ContractViolation::MissingDescriptor { buffer: "xp" }),
        (_, _, None) => Err(ContractViolation::MissingDescriptor { buffer: "out" }),
    };
    status_or_abort("bsearch_lut_extern", result)
}

/// # Safety
///
/// All pointers must be null or point to valid, distinct descriptors; see
/// [`interp`].
#[no_mangle]
pub unsafe extern "C" fn interp_extern(
    xs: *mut HalideBuffer,
    xp: *mut HalideBuffer,
    fp: *mut HalideBuffer,
    n_fft: i32,
    out: *mut HalideBuffer,
) -> i32 {
    let result = match (xs.as_mut(), xp.as_mut(), fp.as_mut(), out.as_mut()) {
        (Some(xs), Some(xp), Some(fp), Some(out)) => interp(xs, xp, fp, n_fft, out),
        (None, ..) => Err(ContractViolation::MissingDescriptor { buffer: "xs" }),
        (_, None, ..) => Err(ContractViolation::MissingDescriptor { buffer: "xp" }),
        (_, _, None, _) => Err(ContractViolation::MissingDescriptor { buffer: "fp" }),
        (.., None) => Err(ContractViolation::MissingDescriptor { buffer: "out" }),
    };
    status_or_abort("interp_extern", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ElementType, TypeDescriptor};

    fn f64_type() -> TypeDescriptor {
        ElementType::Float64.descriptor()
    }

    #[test]
    fn bounds_query_detection() {
        let mut dims = [HalideDimension::default(); 1];
        let mut buf = HalideBuffer::new(core::ptr::null_mut(), f64_type(), &mut dims);
        assert!(buf.is_bounds_query());
        buf.device = 1;
        assert!(!buf.is_bounds_query());
        assert!(!buf.has_storage());
    }

    #[test]
    fn rank_checked_on_entry() {
        let mut d2 = [HalideDimension::new(0, 1, 1); 2];
        let mut d1 = [HalideDimension::new(0, 4, 1); 1];
        let mut d_bad = [HalideDimension::new(0, 1, 1); 3];
        let mut xs = HalideBuffer::new(core::ptr::null_mut(), f64_type(), &mut d2);
        let mut xp = HalideBuffer::new(core::ptr::null_mut(), f64_type(), &mut d1);
        let mut out = HalideBuffer::new(
            core::ptr::null_mut(),
            ElementType::Int32.descriptor(),
            &mut d_bad,
        );
        let err = unsafe { bsearch_lut(&mut xs, &mut xp, 4, &mut out) }.unwrap_err();
        assert_eq!(
            err,
            ContractViolation::Rank {
                buffer: "out",
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn type_checked_during_negotiation() {
        let mut d2 = [HalideDimension::new(0, 1, 1); 2];
        let mut d1 = [HalideDimension::new(0, 4, 1); 1];
        let mut d_out = [HalideDimension::new(0, 1, 1); 2];
        let mut xs = HalideBuffer::new(core::ptr::null_mut(), f64_type(), &mut d2);
        let mut xp = HalideBuffer::new(core::ptr::null_mut(), f64_type(), &mut d1);
        // Locator output must be int32
        let mut out = HalideBuffer::new(core::ptr::null_mut(), f64_type(), &mut d_out);
        let err = unsafe { bsearch_lut(&mut xs, &mut xp, 4, &mut out) }.unwrap_err();
        assert_eq!(
            err,
            ContractViolation::ElementType {
                buffer: "out",
                expected: ElementType::Int32,
                got: f64_type(),
            }
        );
    }

    #[test]
    fn compute_without_output_storage() {
        let mut xs_data = [1.0_f64];
        let mut xp_data = [0.0_f64, 2.0];
        let mut d_xs = [HalideDimension::new(0, 1, 1), HalideDimension::new(0, 1, 1)];
        let mut d_xp = [HalideDimension::new(0, 2, 1)];
        let mut d_out = [HalideDimension::new(0, 1, 1), HalideDimension::new(0, 1, 1)];
        let mut xs = HalideBuffer::new(xs_data.as_mut_ptr().cast(), f64_type(), &mut d_xs);
        let mut xp = HalideBuffer::new(xp_data.as_mut_ptr().cast(), f64_type(), &mut d_xp);
        let mut out = HalideBuffer::new(
            core::ptr::null_mut(),
            ElementType::Int32.descriptor(),
            &mut d_out,
        );
        let err = unsafe { bsearch_lut(&mut xs, &mut xp, 2, &mut out) }.unwrap_err();
        assert_eq!(err, ContractViolation::MissingStorage { buffer: "out" });
    }

    #[test]
    fn reversed_queries_interpolate() {
        // xs stored back to front: host points at coordinate 0, the last slot
        let mut xs_data = [2.5_f64, 1.5, 0.5];
        let mut xp_data = [1.0_f64, 2.0, 3.0];
        let mut fp_data = [10.0_f64, 20.0, 30.0];
        let mut out_data = [0.0_f64; 3];
        let mut d_xs = [HalideDimension::new(0, 3, -1), HalideDimension::new(0, 1, 3)];
        let mut d_xp = [HalideDimension::new(0, 3, 1)];
        let mut d_fp = [HalideDimension::new(0, 3, 1), HalideDimension::new(0, 1, 3)];
        let mut d_out = [HalideDimension::new(0, 3, 1), HalideDimension::new(0, 1, 3)];
        let host = unsafe { xs_data.as_mut_ptr().add(2) };
        let mut xs = HalideBuffer::new(host.cast(), f64_type(), &mut d_xs);
        let mut xp = HalideBuffer::new(xp_data.as_mut_ptr().cast(), f64_type(), &mut d_xp);
        let mut fp = HalideBuffer::new(fp_data.as_mut_ptr().cast(), f64_type(), &mut d_fp);
        let mut out = HalideBuffer::new(out_data.as_mut_ptr().cast(), f64_type(), &mut d_out);

        unsafe { interp(&mut xs, &mut xp, &mut fp, 3, &mut out) }.unwrap();
        assert_eq!(out_data, [10.0, 15.0, 25.0]);
        assert_eq!(d_xs[0], HalideDimension::new(0, 3, -1));
    }

    #[test]
    fn null_dim_array_reported() {
        let mut d1 = [HalideDimension::new(0, 4, 1); 1];
        let mut buf = HalideBuffer::new(core::ptr::null_mut(), f64_type(), &mut d1);
        buf.dim = core::ptr::null_mut();
        let err = unsafe { buf.check::<f64, 1>("xp") }.unwrap_err();
        assert_eq!(err, ContractViolation::MissingDims { buffer: "xp" });
        assert_eq!(std::format!("{err}"), "xp: dim array is null");
    }

    #[test]
    fn overflowing_coordinates_are_a_layout_violation() {
        let mut data = [0.0_f64; 4];
        let mut dims = [HalideDimension::new(i32::MAX - 1, 4, 1)];
        let buf = HalideBuffer::new(data.as_mut_ptr().cast(), f64_type(), &mut dims);
        let err = unsafe { buf.view::<f64, 1>("xp") }.unwrap_err();
        assert_eq!(
            err,
            ContractViolation::Layout {
                buffer: "xp",
                source: crate::buffer::LayoutError::Overflow,
            }
        );
    }
}
