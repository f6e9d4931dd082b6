use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::header::PyValue;
use crate::error::CsError;

// ---------------------------------------------------------------------------
// Endian / ScalarKind / Scalar – one fixed-width element
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
    /// `|` – single-byte or byte-string types.
    NotApplicable,
}

impl Endian {
    fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    fn is_native(self) -> bool {
        self == Endian::NotApplicable || self == Endian::native()
    }

    fn symbol(self) -> char {
        match self {
            Endian::Little => '<',
            Endian::Big => '>',
            Endian::NotApplicable => '|',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    UInt,
    Float,
    Complex,
    Bytes,
    /// UCS-4 text; the element size is four bytes per character.
    Unicode,
    Void,
    /// Unit string such as `ns`; empty for the generic type.
    DateTime(String),
    TimeDelta(String),
}

/// A fixed-width element type, parsed from a type string like `<f4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    pub kind: ScalarKind,
    pub endian: Endian,
    /// Element size in bytes.
    pub size: usize,
}

impl Scalar {
    /// Parse a numpy array-protocol type string (`<f4`, `|S10`, `<M8[ns]`).
    pub fn parse(typestr: &str) -> Result<Self, CsError> {
        let unsupported = || CsError::UnsupportedDtype(typestr.to_string());

        let (endian, mut rest) = match typestr.chars().next() {
            Some('<') => (Endian::Little, &typestr[1..]),
            Some('>') => (Endian::Big, &typestr[1..]),
            Some('|') => (Endian::NotApplicable, &typestr[1..]),
            Some('=') => (Endian::native(), &typestr[1..]),
            _ => (Endian::native(), typestr),
        };

        let code = rest.chars().next().ok_or_else(unsupported)?;
        rest = &rest[code.len_utf8()..];

        let (digits, unit) = match rest.find('[') {
            Some(i) if rest.ends_with(']') => (&rest[..i], rest[i + 1..rest.len() - 1].to_string()),
            Some(_) => return Err(unsupported()),
            None => (rest, String::new()),
        };
        let count: usize = digits.parse().map_err(|_| unsupported())?;

        let (kind, size) = match code {
            'b' => (ScalarKind::Bool, count),
            'i' => (ScalarKind::Int, count),
            'u' => (ScalarKind::UInt, count),
            'f' => (ScalarKind::Float, count),
            'c' => (ScalarKind::Complex, count),
            'S' | 'a' => (ScalarKind::Bytes, count),
            'U' => (ScalarKind::Unicode, count.checked_mul(4).ok_or_else(unsupported)?),
            'V' => (ScalarKind::Void, count),
            'M' => (ScalarKind::DateTime(unit), count),
            'm' => (ScalarKind::TimeDelta(unit), count),
            // Object arrays are pickled and cannot be read without a Python runtime.
            _ => return Err(unsupported()),
        };
        Ok(Scalar { kind, endian, size })
    }

    /// Integer and floating-point kinds that can be decoded into `f64`.
    pub fn is_numeric(&self) -> bool {
        match self.kind {
            ScalarKind::Int | ScalarKind::UInt => matches!(self.size, 1 | 2 | 4 | 8),
            ScalarKind::Float => matches!(self.size, 2 | 4 | 8),
            _ => false,
        }
    }

    /// Decode one element; `None` for non-numeric kinds.
    pub fn read_f64(&self, bytes: &[u8]) -> Option<f64> {
        match self.endian {
            Endian::Big => self.read_with::<BigEndian>(bytes),
            _ => self.read_with::<LittleEndian>(bytes),
        }
    }

    fn read_with<B: ByteOrder>(&self, bytes: &[u8]) -> Option<f64> {
        let b = bytes.get(..self.size)?;
        let value = match (&self.kind, self.size) {
            (ScalarKind::Int, 1) => b[0] as i8 as f64,
            (ScalarKind::Int, 2) => B::read_i16(b) as f64,
            (ScalarKind::Int, 4) => B::read_i32(b) as f64,
            (ScalarKind::Int, 8) => B::read_i64(b) as f64,
            (ScalarKind::UInt, 1) => b[0] as f64,
            (ScalarKind::UInt, 2) => B::read_u16(b) as f64,
            (ScalarKind::UInt, 4) => B::read_u32(b) as f64,
            (ScalarKind::UInt, 8) => B::read_u64(b) as f64,
            (ScalarKind::Float, 2) => f16_to_f64(B::read_u16(b)),
            (ScalarKind::Float, 4) => B::read_f32(b) as f64,
            (ScalarKind::Float, 8) => B::read_f64(b),
            _ => return None,
        };
        Some(value)
    }

    /// The array-protocol type string, as found in `descr`.
    pub fn typestr(&self) -> String {
        let code = match &self.kind {
            ScalarKind::Bool => "b",
            ScalarKind::Int => "i",
            ScalarKind::UInt => "u",
            ScalarKind::Float => "f",
            ScalarKind::Complex => "c",
            ScalarKind::Bytes => "S",
            ScalarKind::Unicode => "U",
            ScalarKind::Void => "V",
            ScalarKind::DateTime(_) => "M",
            ScalarKind::TimeDelta(_) => "m",
        };
        let count = match self.kind {
            ScalarKind::Unicode => self.size / 4,
            _ => self.size,
        };
        let unit = match &self.kind {
            ScalarKind::DateTime(u) | ScalarKind::TimeDelta(u) if !u.is_empty() => format!("[{u}]"),
            _ => String::new(),
        };
        format!("{}{code}{count}{unit}", self.endian.symbol())
    }
}

/// Matches `str(np.dtype(...))`: `float32`, `|S10`, `<U5`, `datetime64[ns]`,
/// or the raw type string for non-native byte order.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = self.size * 8;
        let named = match &self.kind {
            ScalarKind::Bool => Some("bool".to_string()),
            ScalarKind::Int => Some(format!("int{bits}")),
            ScalarKind::UInt => Some(format!("uint{bits}")),
            ScalarKind::Float => Some(format!("float{bits}")),
            ScalarKind::Complex => Some(format!("complex{bits}")),
            ScalarKind::DateTime(u) if u.is_empty() => Some("datetime64".to_string()),
            ScalarKind::DateTime(u) => Some(format!("datetime64[{u}]")),
            ScalarKind::TimeDelta(u) if u.is_empty() => Some("timedelta64".to_string()),
            ScalarKind::TimeDelta(u) => Some(format!("timedelta64[{u}]")),
            ScalarKind::Bytes | ScalarKind::Unicode | ScalarKind::Void => None,
        };
        match named {
            Some(name) if self.endian.is_native() => f.write_str(&name),
            _ => f.write_str(&self.typestr()),
        }
    }
}

/// IEEE 754 half precision to double.
fn f16_to_f64(bits: u16) -> f64 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = ((bits >> 10) & 0x1f) as i32;
    let mantissa = (bits & 0x3ff) as f64;
    match exponent {
        0 => sign * mantissa * 2f64.powi(-24),
        0x1f if mantissa == 0.0 => sign * f64::INFINITY,
        0x1f => f64::NAN,
        e => sign * (1.0 + mantissa / 1024.0) * 2f64.powi(e - 15),
    }
}

// ---------------------------------------------------------------------------
// DType – scalar, sub-array or nested record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DType {
    Scalar(Scalar),
    /// A fixed-shape block of `base` elements stored inline in each row.
    SubArray { base: Box<DType>, shape: Vec<usize> },
    Record(Record),
}

/// A nested structured type.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub fields: Vec<RecordField>,
    /// Includes any padding, so it can exceed the end of the last field.
    pub itemsize: usize,
}

/// A named member of a record type with its byte offset inside the record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub dtype: DType,
    pub offset: usize,
}

impl DType {
    /// Size of one element in bytes. Saturates for a type too large to
    /// address; [`parse_record`] never builds one.
    pub fn itemsize(&self) -> usize {
        self.checked_itemsize().unwrap_or(usize::MAX)
    }

    fn checked_itemsize(&self) -> Option<usize> {
        match self {
            DType::Scalar(s) => Some(s.size),
            DType::SubArray { base, shape } => {
                base.checked_itemsize()?.checked_mul(element_count(shape)?)
            }
            DType::Record(record) => Some(record.itemsize),
        }
    }

    /// The numeric scalar stored by this type and how many of them each row
    /// holds, or `None` if the type does not support arithmetic reduction.
    pub fn numeric_layout(&self) -> Option<(Scalar, usize)> {
        match self {
            DType::Scalar(s) if s.is_numeric() => Some((s.clone(), 1)),
            DType::SubArray { base, shape } => {
                let (s, n) = base.numeric_layout()?;
                Some((s, n.checked_mul(element_count(shape)?)?))
            }
            _ => None,
        }
    }

    /// Parse the type part of a `descr` entry: a type string or a nested list.
    pub fn from_descr(value: &PyValue) -> Result<Self, CsError> {
        match value {
            PyValue::Str(typestr) => Scalar::parse(typestr).map(DType::Scalar),
            PyValue::List(_) => parse_record(value).map(DType::Record),
            other => Err(CsError::Header(format!("bad field type {other}"))),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Scalar(s) => write!(f, "{s}"),
            DType::SubArray { base, shape } => {
                write!(f, "({}, {})", base.descr_repr(), shape_repr(shape))
            }
            DType::Record(_) => f.write_str(&self.descr_repr()),
        }
    }
}

impl DType {
    fn descr_repr(&self) -> String {
        match self {
            DType::Scalar(s) => format!("'{}'", s.typestr()),
            DType::SubArray { .. } => self.to_string(),
            DType::Record(record) => {
                let parts: Vec<String> = record
                    .fields
                    .iter()
                    .map(|field| match &field.dtype {
                        DType::SubArray { base, shape } => format!(
                            "('{}', {}, {})",
                            field.name,
                            base.descr_repr(),
                            shape_repr(shape)
                        ),
                        dtype => format!("('{}', {})", field.name, dtype.descr_repr()),
                    })
                    .collect();
                format!("[{}]", parts.join(", "))
            }
        }
    }
}

/// Number of elements in a block of `shape`, `None` on overflow.
fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |n, &d| n.checked_mul(d))
}

fn shape_repr(shape: &[usize]) -> String {
    match shape {
        [n] => format!("({n},)"),
        dims => {
            let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
            format!("({})", dims.join(", "))
        }
    }
}

/// Parse a list-form `descr` into a record with packed offsets.
///
/// Unnamed `|V` entries are alignment padding: they are dropped from the
/// field list but still advance the offset.
pub fn parse_record(descr: &PyValue) -> Result<Record, CsError> {
    let PyValue::List(entries) = descr else {
        return Err(CsError::UnsupportedDtype(format!(
            "{descr} (only structured arrays are supported)"
        )));
    };

    let mut fields = Vec::with_capacity(entries.len());
    let mut offset = 0;
    for entry in entries {
        let PyValue::Tuple(parts) = entry else {
            return Err(CsError::Header(format!("bad descr entry {entry}")));
        };
        let (name, type_value, shape) = match parts.as_slice() {
            [name, ty] => (name, ty, None),
            [name, ty, shape] => (name, ty, Some(shape)),
            _ => return Err(CsError::Header(format!("bad descr entry {entry}"))),
        };
        let name = match name {
            PyValue::Str(s) => s.clone(),
            // (title, name) pairs
            PyValue::Tuple(pair) if pair.len() == 2 => pair[1]
                .as_str()
                .ok_or_else(|| CsError::Header(format!("bad field name {entry}")))?
                .to_string(),
            _ => return Err(CsError::Header(format!("bad field name {entry}"))),
        };

        let mut dtype = DType::from_descr(type_value)?;
        if let Some(shape) = shape {
            let dims = parse_shape(shape)?;
            if !dims.is_empty() {
                dtype = DType::SubArray {
                    base: Box::new(dtype),
                    shape: dims,
                };
            }
        }

        let too_large = || CsError::UnsupportedDtype(format!("{entry} is too large"));
        let size = dtype.checked_itemsize().ok_or_else(too_large)?;
        let is_padding = name.is_empty()
            && matches!(&dtype, DType::Scalar(Scalar { kind: ScalarKind::Void, .. }));
        if !is_padding {
            fields.push(RecordField {
                name,
                dtype,
                offset,
            });
        }
        offset = offset.checked_add(size).ok_or_else(too_large)?;
    }
    Ok(Record {
        fields,
        itemsize: offset,
    })
}

/// Parse a shape literal: `(3,)`, `(2, 2)` or a bare integer.
pub fn parse_shape(value: &PyValue) -> Result<Vec<usize>, CsError> {
    let dim = |v: &PyValue| {
        v.as_int()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| CsError::Header(format!("bad shape {value}")))
    };
    match value {
        PyValue::Tuple(dims) => dims.iter().map(dim).collect(),
        PyValue::Int(_) => Ok(vec![dim(value)?]),
        _ => Err(CsError::Header(format!("bad shape {value}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::header::parse_literal;

    #[test]
    fn parses_and_classifies_scalars() {
        let f4 = Scalar::parse("<f4").unwrap();
        assert_eq!(f4.kind, ScalarKind::Float);
        assert_eq!(f4.size, 4);
        assert!(f4.is_numeric());

        assert!(Scalar::parse("<u8").unwrap().is_numeric());
        assert!(Scalar::parse("|i1").unwrap().is_numeric());
        assert!(!Scalar::parse("|b1").unwrap().is_numeric());
        assert!(!Scalar::parse("<c8").unwrap().is_numeric());
        assert!(!Scalar::parse("|S10").unwrap().is_numeric());
        assert_eq!(Scalar::parse("<U5").unwrap().size, 20);
        assert!(matches!(
            Scalar::parse("|O"),
            Err(CsError::UnsupportedDtype(_))
        ));
    }

    #[test]
    fn displays_like_numpy() {
        let shown = |s: &str| Scalar::parse(s).unwrap().to_string();
        if cfg!(target_endian = "little") {
            assert_eq!(shown("<f4"), "float32");
            assert_eq!(shown("<u8"), "uint64");
            assert_eq!(shown(">f4"), ">f4");
            assert_eq!(shown("<M8[ns]"), "datetime64[ns]");
        }
        assert_eq!(shown("|b1"), "bool");
        assert_eq!(shown("|S10"), "|S10");
        assert_eq!(shown("<U5"), "<U5");
        assert_eq!(shown("|V16"), "|V16");
    }

    #[test]
    fn decodes_elements_in_both_byte_orders() {
        let le = Scalar::parse("<i4").unwrap();
        assert_eq!(le.read_f64(&(-7i32).to_le_bytes()), Some(-7.0));
        let be = Scalar::parse(">f8").unwrap();
        assert_eq!(be.read_f64(&2.5f64.to_be_bytes()), Some(2.5));
        let half = Scalar::parse("<f2").unwrap();
        assert_eq!(half.read_f64(&0x3c00u16.to_le_bytes()), Some(1.0));
        assert_eq!(half.read_f64(&0xc000u16.to_le_bytes()), Some(-2.0));
        assert_eq!(Scalar::parse("|S4").unwrap().read_f64(b"abcd"), None);
    }

    #[test]
    fn record_offsets_skip_padding() {
        let descr = parse_literal(
            "[('uid', '<u8'), ('', '|V4'), ('blob/idx', '<u4'), \
             ('alignments3D/shift', '<f4', (2,)), ('ctf', [('df1_A', '<f4'), ('df2_A', '<f4')])]",
        )
        .unwrap();
        let record = parse_record(&descr).unwrap();
        assert_eq!(record.itemsize, 32);
        let fields = &record.fields;
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["uid", "blob/idx", "alignments3D/shift", "ctf"]);
        let offsets: Vec<usize> = fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, [0, 12, 16, 24]);

        let shift = &fields[2].dtype;
        assert_eq!(shift.itemsize(), 8);
        assert_eq!(shift.numeric_layout().map(|(_, n)| n), Some(2));
        if cfg!(target_endian = "little") {
            assert_eq!(shift.to_string(), "('<f4', (2,))");
            assert_eq!(fields[3].dtype.to_string(), "[('df1_A', '<f4'), ('df2_A', '<f4')]");
        }
        assert!(fields[3].dtype.numeric_layout().is_none());
    }

    #[test]
    fn oversized_types_are_rejected() {
        assert!(matches!(
            Scalar::parse("<U4611686018427387904"),
            Err(CsError::UnsupportedDtype(_))
        ));
        let wide = parse_literal("[('a', '<f8', (4611686018427387904, 4))]").unwrap();
        assert!(matches!(parse_record(&wide), Err(CsError::UnsupportedDtype(_))));
        let long = parse_literal(
            "[('a', '|V9223372036854775807'), ('b', '|V9223372036854775807'), ('c', '<f4')]",
        )
        .unwrap();
        assert!(matches!(parse_record(&long), Err(CsError::UnsupportedDtype(_))));
    }

    #[test]
    fn empty_sub_array_has_no_elements() {
        let descr = parse_literal("[('a', '<f4', (0,))]").unwrap();
        let record = parse_record(&descr).unwrap();
        assert_eq!(record.itemsize, 0);
        assert_eq!(record.fields[0].dtype.numeric_layout().map(|(_, n)| n), Some(0));
    }

    #[test]
    fn plain_descr_is_not_a_structured_array() {
        let descr = parse_literal("'<f8'").unwrap();
        assert!(matches!(parse_record(&descr), Err(CsError::UnsupportedDtype(_))));
    }
}
