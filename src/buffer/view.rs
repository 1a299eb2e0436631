use core::ops::{Index, IndexMut};

use super::{dense_dims, footprint, Dim, LayoutError, Region};

/// Resolve `coords` to an element offset from the start of storage, where
/// the minimum corner sits at `origin`.
///
/// Coordinates outside the region can produce a negative offset, which
/// wraps to a huge `usize` and is rejected by the slice bounds check.
#[inline]
fn offset<const D: usize>(origin: usize, dims: &[Dim; D], coords: [i32; D]) -> usize {
    let mut offset = origin as isize;
    for (axis, (dim, &c)) in dims.iter().zip(coords.iter()).enumerate() {
        debug_assert!(
            dim.interval().contains(c),
            "coordinate {c} out of bounds on axis {axis}: {}",
            dim.interval(),
        );
        offset += (c as isize - dim.min as isize) * dim.stride as isize;
    }
    offset as usize
}

/// Position of the minimum corner in storage of `available` elements.
fn checked_origin<const D: usize>(available: usize, dims: &[Dim; D]) -> Result<usize, LayoutError> {
    let fp = footprint(dims)?;
    if available < fp.len {
        return Err(LayoutError::StorageTooSmall {
            required: fp.len,
            available,
        });
    }
    Ok(fp.before)
}

#[inline]
fn in_region<const D: usize>(dims: &[Dim; D], coords: &[i32; D]) -> bool {
    dims.iter().zip(coords.iter()).all(|(d, &c)| d.interval().contains(c))
}

#[inline]
fn region_of<const D: usize>(dims: &[Dim; D]) -> Region<D> {
    Region::new(core::array::from_fn(|k| dims[k].interval()))
}

/// Read-only strided view over borrowed storage.
#[derive(Debug, Clone, Copy)]
pub struct View<'a, T, const D: usize> {
    data: &'a [T],
    dims: [Dim; D],
    origin: usize,
}

impl<'a, T, const D: usize> View<'a, T, D> {
    /// Wrap `data` with an explicit strided layout.
    ///
    /// `data` starts at the lowest addressed element; for layouts without
    /// negative strides that is the minimum corner. Fails if the layout
    /// reaches past the end of `data`.
    pub fn new(data: &'a [T], dims: [Dim; D]) -> Result<Self, LayoutError> {
        let origin = checked_origin(data.len(), &dims)?;
        Ok(Self { data, dims, origin })
    }

    /// Wrap `data` as a dense array covering `region` (axis 0 innermost).
    pub fn dense(data: &'a [T], region: Region<D>) -> Result<Self, LayoutError> {
        Self::new(data, dense_dims(&region))
    }

    #[inline]
    pub fn dims(&self) -> &[Dim; D] {
        &self.dims
    }

    /// The coordinate region this view covers.
    #[inline]
    pub fn region(&self) -> Region<D> {
        region_of(&self.dims)
    }

    /// Element at `coords`, or `None` outside the view's region.
    #[inline]
    pub fn get(&self, coords: [i32; D]) -> Option<&'a T> {
        if in_region(&self.dims, &coords) {
            self.data.get(offset(self.origin, &self.dims, coords))
        } else {
            None
        }
    }
}

impl<T, const D: usize> Index<[i32; D]> for View<'_, T, D> {
    type Output = T;

    #[inline]
    fn index(&self, coords: [i32; D]) -> &T {
        &self.data[offset(self.origin, &self.dims, coords)]
    }
}

/// Mutable strided view over borrowed storage.
#[derive(Debug)]
pub struct ViewMut<'a, T, const D: usize> {
    data: &'a mut [T],
    dims: [Dim; D],
    origin: usize,
}

impl<'a, T, const D: usize> ViewMut<'a, T, D> {
    /// Wrap `data` with an explicit strided layout.
    ///
    /// The layout must not map two coordinates to the same element; writes
    /// through an aliasing layout overwrite each other in coordinate order.
    pub fn new(data: &'a mut [T], dims: [Dim; D]) -> Result<Self, LayoutError> {
        let origin = checked_origin(data.len(), &dims)?;
        Ok(Self { data, dims, origin })
    }

    /// Wrap `data` as a dense array covering `region` (axis 0 innermost).
    pub fn dense(data: &'a mut [T], region: Region<D>) -> Result<Self, LayoutError> {
        Self::new(data, dense_dims(&region))
    }

    #[inline]
    pub fn dims(&self) -> &[Dim; D] {
        &self.dims
    }

    #[inline]
    pub fn region(&self) -> Region<D> {
        region_of(&self.dims)
    }

    #[inline]
    pub fn get(&self, coords: [i32; D]) -> Option<&T> {
        if in_region(&self.dims, &coords) {
            self.data.get(offset(self.origin, &self.dims, coords))
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, coords: [i32; D]) -> Option<&mut T> {
        if in_region(&self.dims, &coords) {
            self.data.get_mut(offset(self.origin, &self.dims, coords))
        } else {
            None
        }
    }

    /// Reborrow as a read-only view.
    #[inline]
    pub fn as_view(&self) -> View<'_, T, D> {
        View {
            data: &*self.data,
            dims: self.dims,
            origin: self.origin,
        }
    }
}

impl<T, const D: usize> Index<[i32; D]> for ViewMut<'_, T, D> {
    type Output = T;

    #[inline]
    fn index(&self, coords: [i32; D]) -> &T {
        &self.data[offset(self.origin, &self.dims, coords)]
    }
}

impl<T, const D: usize> IndexMut<[i32; D]> for ViewMut<'_, T, D> {
    #[inline]
    fn index_mut(&mut self, coords: [i32; D]) -> &mut T {
        &mut self.data[offset(self.origin, &self.dims, coords)]
    }
}
