//! Regions and strided views over caller-owned buffer storage.
//!
//! A buffer crossing the extern boundary is described per axis by a half-open
//! coordinate range `[min, min + extent)` and a stride in elements. [`View`]
//! and [`ViewMut`] borrow the storage behind such a description and resolve
//! coordinate tuples to elements in O(1). Coordinates outside the view's
//! region trip a debug assertion; in release builds the slice bounds check
//! still prevents reads or writes outside the borrowed storage.
//!
//! The scheduling runtime hands out host pointers to the element at the
//! region's minimum corner. With negative strides some elements sit before
//! that corner, so a view's storage starts at the lowest addressed element
//! and the corner lies [`Footprint::before`] elements into it.
//!
//! # Examples
//!
//! ```
//! use interp_extern::buffer::{Interval, Region, View};
//!
//! // 3 columns (axis 0) by 2 rows (axis 1), rows starting at y = 4
//! let data = [1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let region = Region::new([Interval::new(0, 3), Interval::new(4, 2)]);
//! let view = View::dense(&data, region).unwrap();
//! assert_eq!(view[[2, 4]], 3.0);
//! assert_eq!(view[[0, 5]], 4.0);
//! assert_eq!(view.get([0, 6]), None);
//! ```

mod view;


pub use view::{View, ViewMut};

use core::ops::{Index, IndexMut, Range};

/// Half-open coordinate range `[min, min + extent)` along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interval {
    pub min: i32,
    pub extent: i32,
}

impl Interval {
    #[inline]
    pub const fn new(min: i32, extent: i32) -> Self {
        Self { min, extent }
    }

    /// One past the last coordinate, saturating at `i32::MAX`.
    #[inline]
    pub const fn end(&self) -> i32 {
        self.min.saturating_add(self.extent)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.extent <= 0
    }

    #[inline]
    pub const fn contains(&self, coord: i32) -> bool {
        coord >= self.min && coord < self.end()
    }

    /// Whether every coordinate of `other` lies inside `self`.
    ///
    /// An empty interval is covered by anything.
    ///
    /// ```
    /// use interp_extern::buffer::Interval;
    ///
    /// let table = Interval::new(0, 8);
    /// assert!(table.covers(&Interval::new(2, 6)));
    /// assert!(!table.covers(&Interval::new(2, 7)));
    /// assert!(table.covers(&Interval::new(100, 0)));
    /// ```
    #[inline]
    pub const fn covers(&self, other: &Interval) -> bool {
        other.is_empty() || (self.min <= other.min && other.end() <= self.end())
    }

    /// Iterate the coordinates of this interval in ascending order.
    #[inline]
    pub fn range(&self) -> Range<i32> {
        self.min..self.end()
    }

    /// Number of coordinates, zero for an empty interval.
    #[inline]
    pub fn len(&self) -> usize {
        self.extent.max(0) as usize
    }
}

impl core::fmt::Display for Interval {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {})", self.min, self.end())
    }
}

/// Per-axis regions of a rank-`D` buffer. Axis 0 is innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region<const D: usize>(pub [Interval; D]);

impl<const D: usize> Region<D> {
    #[inline]
    pub const fn new(axes: [Interval; D]) -> Self {
        Self(axes)
    }

    #[inline]
    pub fn axes(&self) -> &[Interval; D] {
        &self.0
    }

    /// Whether `self` covers `other` along every axis.
    pub fn covers(&self, other: &Region<D>) -> bool {
        other.is_empty() || self.0.iter().zip(other.0.iter()).all(|(a, b)| a.covers(b))
    }

    /// First axis along which `self` fails to cover `other`.
    pub fn first_uncovered(&self, other: &Region<D>) -> Option<usize> {
        if other.is_empty() {
            return None;
        }
        (0..D).find(|&k| !self.0[k].covers(&other.0[k]))
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().any(Interval::is_empty)
    }

    /// Total number of coordinates in the region.
    pub fn len(&self) -> usize {
        self.0.iter().map(Interval::len).product()
    }
}

impl<const D: usize> Index<usize> for Region<D> {
    type Output = Interval;

    #[inline]
    fn index(&self, axis: usize) -> &Interval {
        &self.0[axis]
    }
}

impl<const D: usize> IndexMut<usize> for Region<D> {
    #[inline]
    fn index_mut(&mut self, axis: usize) -> &mut Interval {
        &mut self.0[axis]
    }
}

impl<const D: usize> core::fmt::Display for Region<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (k, axis) in self.0.iter().enumerate() {
            if k > 0 {
                write!(f, " x ")?;
            }
            write!(f, "{axis}")?;
        }
        Ok(())
    }
}

/// One axis of a strided buffer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dim {
    pub min: i32,
    pub extent: i32,
    /// Distance in elements between neighbouring coordinates on this axis.
    pub stride: i32,
}

impl Dim {
    #[inline]
    pub const fn new(min: i32, extent: i32, stride: i32) -> Self {
        Self { min, extent, stride }
    }

    #[inline]
    pub const fn interval(&self) -> Interval {
        Interval::new(self.min, self.extent)
    }
}

/// Errors from describing storage with a strided layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// An axis has a negative extent.
    #[error("axis {axis} has negative extent {extent}")]
    NegativeExtent { axis: usize, extent: i32 },
    /// The layout addresses more elements than the storage holds.
    #[error("layout spans {required} elements but storage holds {available}")]
    StorageTooSmall { required: usize, available: usize },
    /// Storage is not aligned for its element type.
    #[error("storage at {address:#x} is not aligned to {align} bytes")]
    Misaligned { address: usize, align: usize },
    /// A coordinate range or the layout span does not fit its integer type.
    #[error("layout span overflows the address space")]
    Overflow,
}

/// Storage a strided layout touches, measured from the element at the
/// minimum corner.
///
/// Negative strides place elements before the minimum corner: `before`
/// counts them, and the layout occupies `len` contiguous elements starting
/// `before` elements ahead of the corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Footprint {
    pub before: usize,
    pub len: usize,
}

/// Dense layout for `region`: axis 0 has unit stride, each outer axis
/// strides over the full extent of the axes inside it.
///
/// ```
/// use interp_extern::buffer::{dense_dims, Dim, Interval, Region};
///
/// let dims = dense_dims(&Region::new([Interval::new(0, 4), Interval::new(2, 3)]));
/// assert_eq!(dims, [Dim::new(0, 4, 1), Dim::new(2, 3, 4)]);
/// ```
pub fn dense_dims<const D: usize>(region: &Region<D>) -> [Dim; D] {
    let mut stride = 1i32;
    let mut dims = [Dim::default(); D];
    for (dim, axis) in dims.iter_mut().zip(region.0.iter()) {
        *dim = Dim::new(axis.min, axis.extent, stride);
        stride *= axis.extent.max(1);
    }
    dims
}

/// Storage footprint of a strided layout.
///
/// ```
/// use interp_extern::buffer::{footprint, Dim, Footprint};
///
/// // 3 elements read back to front from the last slot of the storage
/// let fp = footprint(&[Dim::new(0, 3, -1)]).unwrap();
/// assert_eq!(fp, Footprint { before: 2, len: 3 });
/// ```
pub fn footprint<const D: usize>(dims: &[Dim; D]) -> Result<Footprint, LayoutError> {
    let mut before = 0usize;
    let mut after = 0usize;
    for (axis, dim) in dims.iter().enumerate() {
        if dim.extent < 0 {
            return Err(LayoutError::NegativeExtent { axis, extent: dim.extent });
        }
        if dim.min.checked_add(dim.extent).is_none() {
            return Err(LayoutError::Overflow);
        }
        if dim.extent == 0 {
            return Ok(Footprint::default());
        }
        let reach = ((dim.extent - 1) as usize)
            .checked_mul(dim.stride.unsigned_abs() as usize)
            .ok_or(LayoutError::Overflow)?;
        let side = if dim.stride < 0 { &mut before } else { &mut after };
        *side = side.checked_add(reach).ok_or(LayoutError::Overflow)?;
    }
    let len = before
        .checked_add(after)
        .and_then(|n| n.checked_add(1))
        .ok_or(LayoutError::Overflow)?;
    if len > isize::MAX as usize {
        return Err(LayoutError::Overflow);
    }
    Ok(Footprint { before, len })
}
