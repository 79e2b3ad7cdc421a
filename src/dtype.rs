//! Data-type descriptor and typed sample accessors (spec component A).
//!
//! A [`DType`] names one of ten numeric widths or four opaque "coded"
//! widths. Numeric samples are read and written through the crate's
//! [`WorkingFloat`]; coded samples are copied verbatim, byte for byte.

use bytemuck::{Pod, Zeroable};

use crate::error::{GridError, Result};

/// The common floating-point type numeric accessors widen into.
///
/// A 64-bit float on 64-bit targets, a 32-bit float otherwise, matching the
/// `NUMERIC_WORKING_TYPE` compile-time choice in the source system.
#[cfg(target_pointer_width = "64")]
pub type WorkingFloat = f64;

#[cfg(not(target_pointer_width = "64"))]
pub type WorkingFloat = f32;

/// The style of a [`DType`]: interpreted numerically, or copied as opaque
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Numeric,
    Coded,
}

/// One of the ten numeric widths or four coded widths this crate supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DTypeSpecifier {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Coded8,
    Coded16,
    Coded32,
    Coded64,
}

/// A value object describing one sample type: its specifier, element size in
/// bytes, style, and canonical name.
///
/// Equality of `DType` is equality of specifier and size (which are
/// redundant in practice, but kept distinct to mirror the source layout).
#[derive(Debug, Clone, Copy)]
pub struct DType {
    specifier: DTypeSpecifier,
    size: usize,
    style: Style,
    name: &'static str,
}

impl PartialEq for DType {
    fn eq(&self, other: &Self) -> bool {
        self.specifier == other.specifier && self.size == other.size
    }
}
impl Eq for DType {}

impl DType {
    const fn new(specifier: DTypeSpecifier, size: usize, style: Style, name: &'static str) -> Self {
        Self {
            specifier,
            size,
            style,
            name,
        }
    }

    pub const U8: DType = DType::new(DTypeSpecifier::U8, 1, Style::Numeric, "uint8");
    pub const U16: DType = DType::new(DTypeSpecifier::U16, 2, Style::Numeric, "uint16");
    pub const U32: DType = DType::new(DTypeSpecifier::U32, 4, Style::Numeric, "uint32");
    pub const U64: DType = DType::new(DTypeSpecifier::U64, 8, Style::Numeric, "uint64");
    pub const I8: DType = DType::new(DTypeSpecifier::I8, 1, Style::Numeric, "int8");
    pub const I16: DType = DType::new(DTypeSpecifier::I16, 2, Style::Numeric, "int16");
    pub const I32: DType = DType::new(DTypeSpecifier::I32, 4, Style::Numeric, "int32");
    pub const I64: DType = DType::new(DTypeSpecifier::I64, 8, Style::Numeric, "int64");
    pub const F32: DType = DType::new(DTypeSpecifier::F32, 4, Style::Numeric, "float32");
    pub const F64: DType = DType::new(DTypeSpecifier::F64, 8, Style::Numeric, "float64");
    pub const CODED8: DType = DType::new(DTypeSpecifier::Coded8, 1, Style::Coded, "coded8");
    pub const CODED16: DType = DType::new(DTypeSpecifier::Coded16, 2, Style::Coded, "coded16");
    pub const CODED32: DType = DType::new(DTypeSpecifier::Coded32, 4, Style::Coded, "coded32");
    pub const CODED64: DType = DType::new(DTypeSpecifier::Coded64, 8, Style::Coded, "coded64");

    /// Parse a canonical dtype name (`"uint8"`, `"float64"`, `"coded32"`, ...).
    pub fn parse(name: &str) -> Result<Self> {
        Ok(match name {
            "uint8" => Self::U8,
            "uint16" => Self::U16,
            "uint32" => Self::U32,
            "uint64" => Self::U64,
            "int8" => Self::I8,
            "int16" => Self::I16,
            "int32" => Self::I32,
            "int64" => Self::I64,
            "float32" => Self::F32,
            "float64" => Self::F64,
            "coded8" => Self::CODED8,
            "coded16" => Self::CODED16,
            "coded32" => Self::CODED32,
            "coded64" => Self::CODED64,
            other => return Err(GridError::InvalidDType(other.to_string())),
        })
    }

    pub fn specifier(&self) -> DTypeSpecifier {
        self.specifier
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_numeric(&self) -> bool {
        self.style == Style::Numeric
    }

    pub fn is_coded(&self) -> bool {
        self.style == Style::Coded
    }

    /// Read a single sample from `buf` at element index `i`, widening to
    /// [`WorkingFloat`]. Panics if `self` is a coded dtype — use
    /// [`DType::coded_get`] instead.
    #[inline]
    pub fn get(&self, buf: &[u8], i: usize) -> WorkingFloat {
        debug_assert!(self.is_numeric(), "get() called on a coded dtype");
        macro_rules! widen {
            ($t:ty) => {{
                let bytes = self.size;
                let start = i * bytes;
                let arr: $t = bytemuck::pod_read_unaligned(&buf[start..start + bytes]);
                arr as WorkingFloat
            }};
        }
        match self.specifier {
            DTypeSpecifier::U8 => widen!(u8),
            DTypeSpecifier::U16 => widen!(u16),
            DTypeSpecifier::U32 => widen!(u32),
            DTypeSpecifier::U64 => widen!(u64),
            DTypeSpecifier::I8 => widen!(i8),
            DTypeSpecifier::I16 => widen!(i16),
            DTypeSpecifier::I32 => widen!(i32),
            DTypeSpecifier::I64 => widen!(i64),
            DTypeSpecifier::F32 => widen!(f32),
            DTypeSpecifier::F64 => widen!(f64),
            _ => unreachable!("coded dtype passed to numeric get()"),
        }
    }

    /// Write a single sample into `buf` at element index `i`, narrowing from
    /// [`WorkingFloat`] with the target type's `as` truncation semantics.
    #[inline]
    pub fn put(&self, buf: &mut [u8], i: usize, value: WorkingFloat) {
        debug_assert!(self.is_numeric(), "put() called on a coded dtype");
        macro_rules! narrow {
            ($t:ty) => {{
                let bytes = self.size;
                let start = i * bytes;
                let narrowed = value as $t;
                buf[start..start + bytes].copy_from_slice(bytemuck::bytes_of(&narrowed));
            }};
        }
        match self.specifier {
            DTypeSpecifier::U8 => narrow!(u8),
            DTypeSpecifier::U16 => narrow!(u16),
            DTypeSpecifier::U32 => narrow!(u32),
            DTypeSpecifier::U64 => narrow!(u64),
            DTypeSpecifier::I8 => narrow!(i8),
            DTypeSpecifier::I16 => narrow!(i16),
            DTypeSpecifier::I32 => narrow!(i32),
            DTypeSpecifier::I64 => narrow!(i64),
            DTypeSpecifier::F32 => narrow!(f32),
            DTypeSpecifier::F64 => narrow!(f64),
            _ => unreachable!("coded dtype passed to numeric put()"),
        }
    }

    /// Verbatim byte copy of one coded sample out of `buf` at element index
    /// `i`, into `out` (which must be exactly `self.size()` bytes).
    #[inline]
    pub fn coded_get(&self, buf: &[u8], i: usize, out: &mut [u8]) {
        debug_assert!(self.is_coded(), "coded_get() called on a numeric dtype");
        debug_assert_eq!(out.len(), self.size);
        let start = i * self.size;
        out.copy_from_slice(&buf[start..start + self.size]);
    }

    /// Verbatim byte copy of one coded sample from `input` into `buf` at
    /// element index `i`.
    #[inline]
    pub fn coded_put(&self, buf: &mut [u8], i: usize, input: &[u8]) {
        debug_assert!(self.is_coded(), "coded_put() called on a numeric dtype");
        debug_assert_eq!(input.len(), self.size);
        let start = i * self.size;
        buf[start..start + self.size].copy_from_slice(input);
    }
}

/// Ensure `input` and `output` dtypes share a style, as required by every
/// reduction function (spec §4.1). Coded reductions copy bytes verbatim, so
/// a coded input/output pair must additionally share the exact same dtype —
/// unlike numeric dtypes, there is no narrowing conversion between widths.
pub(crate) fn check_style_match(input: DType, output: DType) -> Result<()> {
    if input.style() != output.style() {
        return Err(GridError::StyleMismatch {
            input: input.name().to_string(),
            output: output.name().to_string(),
        });
    }
    if input.is_coded() && input != output {
        return Err(GridError::StyleMismatch {
            input: input.name().to_string(),
            output: output.name().to_string(),
        });
    }
    Ok(())
}

/// Marker used when serializing the node array/observation array to a flat
/// byte buffer; kept here since [`crate::kdtree`] and [`crate::index_file`]
/// both need a `Pod` bound on the same small fixed-size records.
pub(crate) trait PodRecord: Pod + Zeroable {}
impl<T: Pod + Zeroable> PodRecord for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_all_names() {
        for name in [
            "uint8", "uint16", "uint32", "uint64", "int8", "int16", "int32", "int64", "float32",
            "float64", "coded8", "coded16", "coded32", "coded64",
        ] {
            let d = DType::parse(name).unwrap();
            assert_eq!(d.name(), name);
        }
    }

    #[test]
    fn unknown_name_fails() {
        assert!(matches!(
            DType::parse("quux"),
            Err(GridError::InvalidDType(_))
        ));
    }

    #[test]
    fn numeric_round_trip_exact() {
        let mut buf = vec![0u8; 4];
        DType::F32.put(&mut buf, 0, 3.5);
        assert_eq!(DType::F32.get(&buf, 0), 3.5);
    }

    #[test]
    fn numeric_round_trip_narrowing() {
        let mut buf = vec![0u8; 1];
        DType::U8.put(&mut buf, 0, 300.0);
        // `300.0 as u8` saturates per Rust's float->int cast semantics.
        assert_eq!(DType::U8.get(&buf, 0), 255.0);
    }

    #[test]
    fn coded_round_trip_verbatim() {
        let mut buf = vec![0u8; 8];
        let payload = [1u8, 2, 3, 4];
        DType::CODED32.coded_put(&mut buf, 1, &payload);
        let mut out = [0u8; 4];
        DType::CODED32.coded_get(&buf, 1, &mut out);
        assert_eq!(out, payload);
    }

    #[test]
    fn style_mismatch_detected() {
        assert!(check_style_match(DType::F32, DType::CODED32).is_err());
        assert!(check_style_match(DType::F32, DType::U8).is_ok());
    }

    #[test]
    fn coded_dtypes_must_match_exactly() {
        assert!(check_style_match(DType::CODED8, DType::CODED16).is_err());
        assert!(check_style_match(DType::CODED32, DType::CODED32).is_ok());
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            /// Any finite `f32` survives a float32 round trip exactly: no
            /// numeric dtype narrows a value already at its own width.
            #[test]
            fn float32_round_trip_is_exact(value: f32) {
                prop_assume!(value.is_finite());
                let mut buf = vec![0u8; 4];
                DType::F32.put(&mut buf, 0, value as WorkingFloat);
                prop_assert_eq!(DType::F32.get(&buf, 0), value as WorkingFloat);
            }

            /// A byte pattern copied through a coded dtype never has its bits
            /// reinterpreted, regardless of content.
            #[test]
            fn coded32_round_trip_is_verbatim(payload: [u8; 4]) {
                let mut buf = vec![0u8; 4];
                DType::CODED32.coded_put(&mut buf, 0, &payload);
                let mut out = [0u8; 4];
                DType::CODED32.coded_get(&buf, 0, &mut out);
                prop_assert_eq!(out, payload);
            }
        }
    }
}
