use core::ffi::c_void;
use core::ptr;

use crate::buffer::{footprint, Dim, Interval, LayoutError, Region, View, ViewMut};
use crate::stage::ContractViolation;
use crate::traits::{Element, TypeDescriptor};

/// One axis of a runtime buffer. Layout-compatible with `halide_dimension_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HalideDimension {
    pub min: i32,
    pub extent: i32,
    pub stride: i32,
    pub flags: u32,
}

impl HalideDimension {
    pub const fn new(min: i32, extent: i32, stride: i32) -> Self {
        Self {
            min,
            extent,
            stride,
            flags: 0,
        }
    }
}

/// Buffer descriptor exchanged with the scheduling runtime.
///
/// Layout-compatible with `halide_buffer_t`. A null `host` with `device == 0`
/// marks the buffer as a bounds query: the callee is expected to fill in the
/// `min`/`extent` of every dimension.
#[repr(C)]
#[derive(Debug)]
pub struct HalideBuffer {
    pub device: u64,
    pub device_interface: *const c_void,
    pub host: *mut u8,
    pub flags: u64,
    pub type_: TypeDescriptor,
    pub dimensions: i32,
    pub dim: *mut HalideDimension,
    pub padding: *mut c_void,
}

impl HalideBuffer {
    /// Describe `dims` with optional host storage (null for a bounds query).
    ///
    /// The descriptor borrows `dims` through a raw pointer; it must not
    /// outlive the slice.
    pub fn new(host: *mut u8, type_: TypeDescriptor, dims: &mut [HalideDimension]) -> Self {
        Self {
            device: 0,
            device_interface: ptr::null(),
            host,
            flags: 0,
            type_,
            dimensions: dims.len() as i32,
            dim: dims.as_mut_ptr(),
            padding: ptr::null_mut(),
        }
    }

    /// Host storage is absent and no device allocation stands in for it.
    #[inline]
    pub fn is_bounds_query(&self) -> bool {
        self.host.is_null() && self.device == 0
    }

    #[inline]
    pub fn has_storage(&self) -> bool {
        !self.host.is_null()
    }

    /// # Safety
    ///
    /// `dim` must point to `dimensions` valid entries (or be null).
    pub unsafe fn dims(&self) -> &[HalideDimension] {
        if self.dim.is_null() || self.dimensions <= 0 {
            &[]
        } else {
            core::slice::from_raw_parts(self.dim, self.dimensions as usize)
        }
    }

    /// # Safety
    ///
    /// `dim` must point to `dimensions` valid, uniquely borrowed entries
    /// (or be null).
    pub unsafe fn dims_mut(&mut self) -> &mut [HalideDimension] {
        if self.dim.is_null() || self.dimensions <= 0 {
            &mut []
        } else {
            core::slice::from_raw_parts_mut(self.dim, self.dimensions as usize)
        }
    }

    /// Check rank and element type against what the callback expects.
    ///
    /// # Safety
    ///
    /// See [`dims`](Self::dims).
    pub unsafe fn check<T: Element, const D: usize>(
        &self,
        buffer: &'static str,
    ) -> Result<(), ContractViolation> {
        if self.dimensions != D as i32 {
            return Err(ContractViolation::Rank {
                buffer,
                expected: D,
                got: self.dimensions,
            });
        }
        if self.dims().len() != D {
            return Err(ContractViolation::MissingDims { buffer });
        }
        if self.type_.element_type() != Some(T::TYPE) {
            return Err(ContractViolation::ElementType {
                buffer,
                expected: T::TYPE,
                got: self.type_,
            });
        }
        Ok(())
    }

    /// The region this descriptor covers. Rank must already be checked.
    ///
    /// # Safety
    ///
    /// See [`dims`](Self::dims).
    pub unsafe fn region<const D: usize>(&self) -> Region<D> {
        let dims = self.dims();
        Region::new(core::array::from_fn(|k| Interval::new(dims[k].min, dims[k].extent)))
    }

    /// Write a negotiated region into the shape fields. Strides and storage
    /// are left alone.
    ///
    /// # Safety
    ///
    /// See [`dims_mut`](Self::dims_mut).
    pub unsafe fn set_region<const D: usize>(&mut self, region: &Region<D>) {
        for (dim, axis) in self.dims_mut().iter_mut().zip(region.axes()) {
            dim.min = axis.min;
            dim.extent = axis.extent;
        }
    }

    /// Strided layout and the storage it touches, starting at the lowest
    /// addressed element (before `host` when an axis has a negative stride).
    unsafe fn layout<T: Element, const D: usize>(
        &self,
        buffer: &'static str,
    ) -> Result<([Dim; D], *mut T, usize), ContractViolation> {
        self.check::<T, D>(buffer)?;
        if self.host.is_null() {
            return Err(ContractViolation::MissingStorage { buffer });
        }
        let raw = self.dims();
        let dims: [Dim; D] = core::array::from_fn(|k| Dim::new(raw[k].min, raw[k].extent, raw[k].stride));
        let fp = footprint(&dims).map_err(|source| ContractViolation::Layout { buffer, source })?;
        let align = core::mem::align_of::<T>();
        if (self.host as usize) % align != 0 {
            return Err(ContractViolation::Layout {
                buffer,
                source: LayoutError::Misaligned {
                    address: self.host as usize,
                    align,
                },
            });
        }
        let start = if fp.len == 0 {
            self.host.cast::<T>()
        } else {
            self.host.cast::<T>().sub(fp.before)
        };
        Ok((dims, start, fp.len))
    }

    /// Borrow the host storage as a read-only strided view.
    ///
    /// # Safety
    ///
    /// Every element the dimensions address relative to `host` (including
    /// those before it along negative strides) must be valid for reads and
    /// not written through any other pointer for the lifetime of the view.
    pub unsafe fn view<T: Element, const D: usize>(
        &self,
        buffer: &'static str,
    ) -> Result<View<'_, T, D>, ContractViolation> {
        let (dims, start, len) = self.layout::<T, D>(buffer)?;
        let data: &[T] = if len == 0 {
            &[]
        } else {
            core::slice::from_raw_parts(start, len)
        };
        View::new(data, dims).map_err(|source| ContractViolation::Layout { buffer, source })
    }

    /// Borrow the host storage as a mutable strided view.
    ///
    /// # Safety
    ///
    /// As for [`view`](Self::view), and the storage must not be reachable
    /// through any other live reference for the lifetime of the view.
    pub unsafe fn view_mut<T: Element, const D: usize>(
        &mut self,
        buffer: &'static str,
    ) -> Result<ViewMut<'_, T, D>, ContractViolation> {
        let (dims, start, len) = self.layout::<T, D>(buffer)?;
        let data: &mut [T] = if len == 0 {
            &mut []
        } else {
            core::slice::from_raw_parts_mut(start, len)
        };
        ViewMut::new(data, dims).map_err(|source| ContractViolation::Layout { buffer, source })
    }
}
