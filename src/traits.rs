use core::fmt::Debug;

/// Element type tag carried by every buffer crossing the extern boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 64-bit IEEE float (queries, tables, interpolated output).
    Float64,
    /// 32-bit signed integer (search-index output).
    Int32,
}

impl ElementType {
    /// The runtime type descriptor for this element type (scalar, one lane).
    pub const fn descriptor(self) -> TypeDescriptor {
        match self {
            ElementType::Float64 => TypeDescriptor::new(TypeDescriptor::FLOAT, 64, 1),
            ElementType::Int32 => TypeDescriptor::new(TypeDescriptor::INT, 32, 1),
        }
    }
}

impl core::fmt::Display for ElementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ElementType::Float64 => write!(f, "float64"),
            ElementType::Int32 => write!(f, "int32"),
        }
    }
}

/// Raw `(code, bits, lanes)` triple as the scheduling runtime encodes it.
///
/// Layout-compatible with `halide_type_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub code: u8,
    pub bits: u8,
    pub lanes: u16,
}

impl TypeDescriptor {
    pub const INT: u8 = 0;
    pub const UINT: u8 = 1;
    pub const FLOAT: u8 = 2;
    pub const HANDLE: u8 = 3;

    pub const fn new(code: u8, bits: u8, lanes: u16) -> Self {
        Self { code, bits, lanes }
    }

    /// Map back to an [`ElementType`], if this crate understands the descriptor.
    ///
    /// ```
    /// use interp_extern::traits::{ElementType, TypeDescriptor};
    ///
    /// assert_eq!(ElementType::Int32.descriptor().element_type(), Some(ElementType::Int32));
    /// assert_eq!(TypeDescriptor::new(TypeDescriptor::UINT, 8, 1).element_type(), None);
    /// ```
    pub const fn element_type(self) -> Option<ElementType> {
        match (self.code, self.bits, self.lanes) {
            (Self::FLOAT, 64, 1) => Some(ElementType::Float64),
            (Self::INT, 32, 1) => Some(ElementType::Int32),
            _ => None,
        }
    }
}

impl core::fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match self.code {
            Self::INT => "int",
            Self::UINT => "uint",
            Self::FLOAT => "float",
            Self::HANDLE => "handle",
            _ => "unknown",
        };
        write!(f, "{kind}{}", self.bits)?;
        if self.lanes != 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

/// Trait for types that can be stored in an extern buffer.
///
/// Implemented for exactly the element types the callbacks exchange.
pub trait Element: Copy + PartialEq + Debug + Send + Sync + 'static {
    /// Tag checked against the descriptor of a foreign buffer.
    const TYPE: ElementType;
}

macro_rules! impl_element {
    ($($t:ty => $tag:ident),*) => {
        $(
            impl Element for $t {
                const TYPE: ElementType = ElementType::$tag;
            }
        )*
    };
}

impl_element!(f64 => Float64, i32 => Int32);
