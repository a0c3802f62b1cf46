use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

use crate::error::{DecimateError, Result};
use crate::types::PolyMesh;

/// Name of the point-data array carried through as vertex colors.
pub const COLORS_ARRAY: &str = "Colors";

fn parse_err(msg: impl Into<String>) -> DecimateError {
    DecimateError::Parse(msg.into())
}

/// Scalar storage types of the legacy format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl ValueType {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "unsigned_char" => Ok(ValueType::U8),
            "char" | "signed_char" => Ok(ValueType::I8),
            "unsigned_short" => Ok(ValueType::U16),
            "short" => Ok(ValueType::I16),
            "unsigned_int" | "vtktypeuint32" => Ok(ValueType::U32),
            // Legacy writers store vtkIdType cells as 32-bit ints.
            "int" | "vtkIdType" | "vtktypeint32" => Ok(ValueType::I32),
            "unsigned_long" | "vtktypeuint64" => Ok(ValueType::U64),
            "long" | "vtktypeint64" => Ok(ValueType::I64),
            "float" => Ok(ValueType::F32),
            "double" => Ok(ValueType::F64),
            other => Err(parse_err(format!("unsupported data type '{other}'"))),
        }
    }

    fn size(self) -> usize {
        match self {
            ValueType::U8 | ValueType::I8 => 1,
            ValueType::U16 | ValueType::I16 => 2,
            ValueType::U32 | ValueType::I32 | ValueType::F32 => 4,
            ValueType::U64 | ValueType::I64 | ValueType::F64 => 8,
        }
    }

    fn is_float(self) -> bool {
        matches!(self, ValueType::F32 | ValueType::F64)
    }
}

/// Cursor over the raw file bytes. Keyword lines are always ASCII; data
/// blocks are either whitespace-separated tokens or big-endian binary.
struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
    binary: bool,
}

impl<'a> Scanner<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            binary: false,
        }
    }

    fn whitespace_end(&self) -> usize {
        let mut pos = self.pos;
        while pos < self.data.len() && self.data[pos].is_ascii_whitespace() {
            pos += 1;
        }
        pos
    }

    fn skip_whitespace(&mut self) {
        self.pos = self.whitespace_end();
    }

    fn at_end(&self) -> bool {
        self.whitespace_end() >= self.data.len()
    }

    /// Raw line up to (not including) the next `\n`.
    fn raw_line(&mut self) -> Option<&'a [u8]> {
        let data: &'a [u8] = self.data;
        if self.pos >= data.len() {
            return None;
        }
        let rest = &data[self.pos..];
        let len = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        self.pos += (len + 1).min(rest.len());
        let line = &rest[..len];
        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }

    fn text_line(&mut self) -> Result<&'a str> {
        let line = self
            .raw_line()
            .ok_or_else(|| parse_err("unexpected end of file"))?;
        std::str::from_utf8(line).map_err(|_| parse_err("keyword line is not valid text"))
    }

    /// Next non-blank keyword line, split into tokens. `METADATA` blocks are skipped.
    fn keyword_line(&mut self) -> Result<Option<Vec<&'a str>>> {
        loop {
            if self.at_end() {
                return Ok(None);
            }
            self.skip_whitespace();
            let tokens: Vec<&str> = self.text_line()?.split_whitespace().collect();
            if tokens.first().is_some_and(|t| t.eq_ignore_ascii_case("METADATA")) {
                self.skip_metadata();
                continue;
            }
            return Ok(Some(tokens));
        }
    }

    /// A metadata block runs until the first empty line.
    fn skip_metadata(&mut self) {
        while let Some(line) = self.raw_line() {
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                break;
            }
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.data[self.whitespace_end()..].starts_with(keyword.as_bytes())
    }

    fn token(&mut self) -> Result<&'a str> {
        let data: &'a [u8] = self.data;
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < data.len() && !data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(parse_err("unexpected end of data block"));
        }
        std::str::from_utf8(&data[start..self.pos])
            .map_err(|_| parse_err("data token is not valid text"))
    }

    /// Read `count` values of type `ty` as `f64`.
    fn values(&mut self, ty: ValueType, count: usize) -> Result<Vec<f64>> {
        if self.binary {
            self.binary_values(ty, count)
        } else {
            (0..count)
                .map(|_| {
                    let tok = self.token()?;
                    tok.parse::<f64>()
                        .map_err(|_| parse_err(format!("invalid numeric value '{tok}'")))
                })
                .collect()
        }
    }

    fn binary_values(&mut self, ty: ValueType, count: usize) -> Result<Vec<f64>> {
        let size = ty.size();
        let byte_len = array_len(count, size)?;
        if byte_len > self.data.len() - self.pos {
            return Err(parse_err(format!(
                "binary block truncated: need {byte_len} bytes, {} left",
                self.data.len() - self.pos
            )));
        }
        let data: &'a [u8] = self.data;
        let block = &data[self.pos..self.pos + byte_len];
        self.pos += byte_len;

        let values = block
            .chunks_exact(size)
            .map(|b| match ty {
                ValueType::U8 => b[0] as f64,
                ValueType::I8 => b[0] as i8 as f64,
                ValueType::U16 => BigEndian::read_u16(b) as f64,
                ValueType::I16 => BigEndian::read_i16(b) as f64,
                ValueType::U32 => BigEndian::read_u32(b) as f64,
                ValueType::I32 => BigEndian::read_i32(b) as f64,
                ValueType::U64 => BigEndian::read_u64(b) as f64,
                ValueType::I64 => BigEndian::read_i64(b) as f64,
                ValueType::F32 => BigEndian::read_f32(b) as f64,
                ValueType::F64 => BigEndian::read_f64(b),
            })
            .collect();
        Ok(values)
    }

    /// Read `count` non-negative integer values (cell sizes, point ids).
    fn indices(&mut self, ty: ValueType, count: usize) -> Result<Vec<u32>> {
        self.values(ty, count)?
            .into_iter()
            .map(|v| {
                if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
                    Ok(v as u32)
                } else {
                    Err(parse_err(format!("invalid cell index value {v}")))
                }
            })
            .collect()
    }
}

/// Which dataset attribute section subsequent arrays belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Point(usize),
    Cell(usize),
}

impl Section {
    fn tuples(self) -> usize {
        match self {
            Section::Point(n) | Section::Cell(n) => n,
        }
    }
}

/// Length of an array of `count` tuples with `components` values each.
fn array_len(count: usize, components: usize) -> Result<usize> {
    count
        .checked_mul(components)
        .ok_or_else(|| parse_err("declared array length overflows"))
}

fn parse_count(token: Option<&&str>, what: &str) -> Result<usize> {
    token
        .and_then(|t| t.parse::<usize>().ok())
        .ok_or_else(|| parse_err(format!("missing or invalid {what}")))
}

/// Parse a legacy VTK polydata file (ASCII or binary) into a `PolyMesh`.
pub fn parse_vtk(data: &[u8]) -> Result<PolyMesh> {
    let mut sc = Scanner::new(data);

    let version_line = sc.text_line()?;
    if !version_line.trim_start().starts_with("# vtk DataFile Version") {
        return Err(parse_err("missing '# vtk DataFile Version' header"));
    }
    let title = sc.text_line()?.trim();
    sc.binary = match sc.text_line()?.trim().to_ascii_uppercase().as_str() {
        "ASCII" => false,
        "BINARY" => true,
        other => return Err(parse_err(format!("unknown file type '{other}'"))),
    };

    match sc.keyword_line()?.as_deref() {
        Some(["DATASET", kind, ..]) if kind.eq_ignore_ascii_case("POLYDATA") => {}
        Some(["DATASET", kind, ..]) => {
            return Err(parse_err(format!("unsupported dataset type '{kind}'")));
        }
        _ => return Err(parse_err("missing DATASET declaration")),
    }

    debug!(title, binary = sc.binary, "Parsing VTK polydata");

    let mut positions: Vec<f32> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut colors: Option<Vec<[u8; 3]>> = None;
    let mut section: Option<Section> = None;

    while let Some(tokens) = sc.keyword_line()? {
        let Some(keyword) = tokens.first() else {
            continue;
        };
        match keyword.to_ascii_uppercase().as_str() {
            "POINTS" => {
                let n = parse_count(tokens.get(1), "point count")?;
                let ty = ValueType::parse(tokens.get(2).copied().unwrap_or("float"))?;
                positions = sc.values(ty, array_len(n, 3)?)?.into_iter().map(|v| v as f32).collect();
            }
            "POLYGONS" => {
                for cell in read_cells(&mut sc, &tokens)? {
                    fan_triangulate(&cell, &mut indices);
                }
            }
            "TRIANGLE_STRIPS" => {
                for cell in read_cells(&mut sc, &tokens)? {
                    strip_triangulate(&cell, &mut indices);
                }
            }
            "VERTICES" | "LINES" => {
                read_cells(&mut sc, &tokens)?;
            }
            "FIELD" => {
                // Dataset-level field data (or field data inside an attribute section).
                let arrays = parse_count(tokens.get(2), "FIELD array count")?;
                for _ in 0..arrays {
                    if let Some(c) = read_field_array(&mut sc, section)? {
                        colors = Some(c);
                    }
                }
            }
            "POINT_DATA" => {
                let n = parse_count(tokens.get(1), "POINT_DATA count")?;
                let vertex_count = positions.len() / 3;
                if n != vertex_count {
                    return Err(parse_err(format!(
                        "POINT_DATA declares {n} tuples but mesh has {vertex_count} points"
                    )));
                }
                section = Some(Section::Point(n));
            }
            "CELL_DATA" => {
                section = Some(Section::Cell(parse_count(tokens.get(1), "CELL_DATA count")?));
            }
            "SCALARS" | "COLOR_SCALARS" | "VECTORS" | "NORMALS" | "TEXTURE_COORDINATES"
            | "TENSORS" | "LOOKUP_TABLE" => {
                let current = section.ok_or_else(|| {
                    parse_err(format!("{keyword} outside of POINT_DATA/CELL_DATA"))
                })?;
                if let Some(c) = read_attribute(&mut sc, &tokens, current)? {
                    colors = Some(c);
                }
            }
            other => return Err(parse_err(format!("unexpected keyword '{other}'"))),
        }
    }

    let mesh = PolyMesh {
        positions,
        indices,
        colors,
    };
    mesh.validate().map_err(parse_err)?;
    Ok(mesh)
}

/// Read a cell block (`POLYGONS`, `LINES`, ...) in either the legacy
/// `n size` layout or the `OFFSETS`/`CONNECTIVITY` layout.
fn read_cells(sc: &mut Scanner<'_>, tokens: &[&str]) -> Result<Vec<Vec<u32>>> {
    let first = parse_count(tokens.get(1), "cell count")?;
    let second = parse_count(tokens.get(2), "cell list size")?;

    if sc.peek_keyword("OFFSETS") {
        let ty = offsets_type(sc, "OFFSETS")?;
        let offsets = sc.indices(ty, first)?;
        if !sc.peek_keyword("CONNECTIVITY") {
            return Err(parse_err("OFFSETS block not followed by CONNECTIVITY"));
        }
        let ty = offsets_type(sc, "CONNECTIVITY")?;
        let connectivity = sc.indices(ty, second)?;

        return offsets
            .windows(2)
            .map(|w| {
                let (start, end) = (w[0] as usize, w[1] as usize);
                connectivity
                    .get(start..end)
                    .map(|c| c.to_vec())
                    .ok_or_else(|| parse_err("cell offsets exceed connectivity length"))
            })
            .collect();
    }

    let flat = sc.indices(ValueType::I32, second)?;
    // Every cell takes at least its size value.
    if first > flat.len() {
        return Err(parse_err(format!(
            "{first} cells declared but the cell list holds {} values",
            flat.len()
        )));
    }
    let mut cells = Vec::with_capacity(first);
    let mut cursor = 0usize;
    for _ in 0..first {
        let k = *flat
            .get(cursor)
            .ok_or_else(|| parse_err("cell list shorter than declared cell count"))?
            as usize;
        let cell = flat
            .get(cursor + 1..cursor + 1 + k)
            .ok_or_else(|| parse_err("cell list size mismatch"))?;
        cells.push(cell.to_vec());
        cursor += k + 1;
    }
    if cursor != flat.len() {
        return Err(parse_err(format!(
            "cell list declares {} values but cells use {cursor}",
            flat.len()
        )));
    }
    Ok(cells)
}

fn offsets_type(sc: &mut Scanner<'_>, keyword: &str) -> Result<ValueType> {
    let tokens = sc
        .keyword_line()?
        .ok_or_else(|| parse_err(format!("missing {keyword} header")))?;
    ValueType::parse(tokens.get(1).copied().unwrap_or("vtktypeint64"))
}

fn fan_triangulate(cell: &[u32], out: &mut Vec<u32>) {
    if cell.len() < 3 {
        return;
    }
    for i in 1..cell.len() - 1 {
        out.extend_from_slice(&[cell[0], cell[i], cell[i + 1]]);
    }
}

fn strip_triangulate(cell: &[u32], out: &mut Vec<u32>) {
    for (j, w) in cell.windows(3).enumerate() {
        if j % 2 == 0 {
            out.extend_from_slice(&[w[0], w[1], w[2]]);
        } else {
            out.extend_from_slice(&[w[1], w[0], w[2]]);
        }
    }
}

/// Read one attribute array. Returns converted colors when the array is the
/// point-data `Colors` array.
fn read_attribute(
    sc: &mut Scanner<'_>,
    tokens: &[&str],
    section: Section,
) -> Result<Option<Vec<[u8; 3]>>> {
    let keyword = tokens[0].to_ascii_uppercase();
    let name = tokens.get(1).copied().unwrap_or_default();
    let n = section.tuples();

    let (ty, components, values) = match keyword.as_str() {
        "SCALARS" => {
            let ty = ValueType::parse(tokens.get(2).copied().unwrap_or("float"))?;
            let components = match tokens.get(3) {
                Some(c) => parse_count(Some(c), "SCALARS component count")?,
                None => 1,
            };
            if sc.peek_keyword("LOOKUP_TABLE") {
                sc.keyword_line()?;
            }
            (ty, components, sc.values(ty, array_len(n, components)?)?)
        }
        "COLOR_SCALARS" => {
            let components = parse_count(tokens.get(2), "COLOR_SCALARS component count")?;
            // Normalized floats in ASCII files, unsigned bytes in binary files.
            let ty = if sc.binary { ValueType::U8 } else { ValueType::F32 };
            let mut values = sc.values(ty, array_len(n, components)?)?;
            if sc.binary {
                values.iter_mut().for_each(|v| *v /= 255.0);
            }
            (ValueType::F32, components, values)
        }
        "VECTORS" | "NORMALS" => {
            let ty = ValueType::parse(tokens.get(2).copied().unwrap_or("float"))?;
            (ty, 3, sc.values(ty, array_len(n, 3)?)?)
        }
        "TEXTURE_COORDINATES" => {
            let dim = parse_count(tokens.get(2), "texture coordinate dimension")?;
            let ty = ValueType::parse(tokens.get(3).copied().unwrap_or("float"))?;
            (ty, dim, sc.values(ty, array_len(n, dim)?)?)
        }
        "TENSORS" => {
            let ty = ValueType::parse(tokens.get(2).copied().unwrap_or("float"))?;
            (ty, 9, sc.values(ty, array_len(n, 9)?)?)
        }
        "LOOKUP_TABLE" => {
            let size = parse_count(tokens.get(2), "LOOKUP_TABLE size")?;
            let ty = if sc.binary { ValueType::U8 } else { ValueType::F32 };
            sc.values(ty, array_len(size, 4)?)?;
            return Ok(None);
        }
        _ => unreachable!("caller dispatches attribute keywords only"),
    };

    if matches!(section, Section::Point(_)) && name == COLORS_ARRAY {
        return colors_from_values(ty, components, &values).map(Some);
    }
    Ok(None)
}

/// Read one array of a `FIELD` block.
fn read_field_array(
    sc: &mut Scanner<'_>,
    section: Option<Section>,
) -> Result<Option<Vec<[u8; 3]>>> {
    let tokens = sc
        .keyword_line()?
        .ok_or_else(|| parse_err("FIELD block truncated"))?;
    let name = tokens.first().copied().unwrap_or_default();
    if name == "NULL_ARRAY" {
        return Ok(None);
    }
    let components = parse_count(tokens.get(1), "field array component count")?;
    let tuples = parse_count(tokens.get(2), "field array tuple count")?;
    let ty = ValueType::parse(tokens.get(3).copied().unwrap_or("float"))?;
    let values = sc.values(ty, array_len(tuples, components)?)?;

    match section {
        Some(Section::Point(n)) => {
            if tuples != n {
                return Err(parse_err(format!(
                    "point field array '{name}' has {tuples} tuples, expected {n}"
                )));
            }
            if name == COLORS_ARRAY {
                return colors_from_values(ty, components, &values).map(Some);
            }
            Ok(None)
        }
        _ => Ok(None),
    }
}

/// Convert a color array to bytes. Float arrays within [0, 1] are treated as
/// normalized and scaled by 255; anything else is clamped into [0, 255].
fn colors_from_values(ty: ValueType, components: usize, values: &[f64]) -> Result<Vec<[u8; 3]>> {
    if components < 3 {
        return Err(parse_err(format!(
            "'{COLORS_ARRAY}' array needs at least 3 components, found {components}"
        )));
    }
    let normalized = ty.is_float() && values.iter().all(|v| (0.0..=1.0).contains(v));
    let scale = if normalized { 255.0 } else { 1.0 };
    let to_byte = |v: f64| (v * scale).round().clamp(0.0, 255.0) as u8;

    Ok(values
        .chunks_exact(components)
        .map(|c| [to_byte(c[0]), to_byte(c[1]), to_byte(c[2])])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_QUAD: &str = "\
# vtk DataFile Version 3.0
quad
ASCII
DATASET POLYDATA
POINTS 4 float
0 0 0 1 0 0 1 1 0
0 1 0
POLYGONS 1 5
4 0 1 2 3
";

    #[test]
    fn parse_ascii_quad_fan_triangulates() {
        let mesh = parse_vtk(ASCII_QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(!mesh.has_colors());
    }

    #[test]
    fn parse_float_color_scalars_scaled_to_bytes() {
        let src = "\
# vtk DataFile Version 3.0
colored
ASCII
DATASET POLYDATA
POINTS 3 double
0 0 0 1 0 0 0 1 0
POLYGONS 1 4
3 0 1 2
POINT_DATA 3
SCALARS Colors float 3
LOOKUP_TABLE default
1 0 0
0 0.5 0
0 0 1
";
        let mesh = parse_vtk(src.as_bytes()).unwrap();
        let colors = mesh.colors.unwrap();
        assert_eq!(colors, vec![[255, 0, 0], [0, 128, 0], [0, 0, 255]]);
    }

    #[test]
    fn parse_byte_colors_pass_through() {
        let src = "\
# vtk DataFile Version 3.0
colored
ASCII
DATASET POLYDATA
POINTS 3 float
0 0 0 1 0 0 0 1 0
POLYGONS 1 4
3 0 1 2
POINT_DATA 3
SCALARS Colors unsigned_char 3
LOOKUP_TABLE default
10 20 30
40 50 60
70 80 90
";
        let mesh = parse_vtk(src.as_bytes()).unwrap();
        assert_eq!(
            mesh.colors.unwrap(),
            vec![[10, 20, 30], [40, 50, 60], [70, 80, 90]]
        );
    }

    #[test]
    fn parse_color_scalars_and_skips_other_arrays() {
        let src = "\
# vtk DataFile Version 3.0
mixed
ASCII
DATASET POLYDATA
FIELD FieldData 1
TimeValue 1 1 double
0.5
POINTS 3 float
0 0 0 1 0 0 0 1 0
POLYGONS 1 4
3 0 1 2
CELL_DATA 1
SCALARS label int 1
LOOKUP_TABLE default
7
POINT_DATA 3
NORMALS Normals float
0 0 1 0 0 1 0 0 1
METADATA
INFORMATION 0

COLOR_SCALARS Colors 3
0 0 0 1 1 1 0.2 0.4 0.6
";
        let mesh = parse_vtk(src.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(
            mesh.colors.unwrap(),
            vec![[0, 0, 0], [255, 255, 255], [51, 102, 153]]
        );
    }

    #[test]
    fn parse_offsets_connectivity_layout() {
        let src = "\
# vtk DataFile Version 5.1
new layout
ASCII
DATASET POLYDATA
POINTS 4 float
0 0 0 1 0 0 1 1 0 0 1 0
POLYGONS 3 6
OFFSETS vtktypeint64
0 3 6
CONNECTIVITY vtktypeint64
0 1 2 0 2 3
";
        let mesh = parse_vtk(src.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn parse_triangle_strip_alternates_winding() {
        let src = "\
# vtk DataFile Version 3.0
strip
ASCII
DATASET POLYDATA
POINTS 4 float
0 0 0 0 1 0 1 0 0 1 1 0
TRIANGLE_STRIPS 1 5
4 0 1 2 3
";
        let mesh = parse_vtk(src.as_bytes()).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn parse_binary_polydata() {
        let mut data = b"# vtk DataFile Version 3.0\nbin\nBINARY\nDATASET POLYDATA\nPOINTS 3 float\n"
            .to_vec();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            data.extend_from_slice(&v.to_be_bytes());
        }
        data.extend_from_slice(b"\nPOLYGONS 1 4\n");
        for v in [3i32, 0, 1, 2] {
            data.extend_from_slice(&v.to_be_bytes());
        }
        data.extend_from_slice(b"\nPOINT_DATA 3\nCOLOR_SCALARS Colors 3\n");
        data.extend_from_slice(&[255, 0, 0, 0, 255, 0, 0, 0, 255]);
        data.push(b'\n');

        let mesh = parse_vtk(&data).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.positions[3], 1.0);
        assert_eq!(
            mesh.colors.unwrap(),
            vec![[255, 0, 0], [0, 255, 0], [0, 0, 255]]
        );
    }

    #[test]
    fn malformed_header_is_parse_error() {
        let err = parse_vtk(b"hello\nworld\nASCII\n").unwrap_err();
        assert!(matches!(err, DecimateError::Parse(_)));
    }

    #[test]
    fn unsupported_dataset_is_parse_error() {
        let src = "# vtk DataFile Version 3.0\ngrid\nASCII\nDATASET STRUCTURED_POINTS\n";
        let err = parse_vtk(src.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("STRUCTURED_POINTS"));
    }

    #[test]
    fn point_data_count_mismatch_is_parse_error() {
        let src = format!("{ASCII_QUAD}POINT_DATA 5\n");
        let err = parse_vtk(src.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("POINT_DATA"));
    }

    #[test]
    fn truncated_points_is_parse_error() {
        let src = "# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\nPOINTS 3 float\n0 0 0 1\n";
        assert!(parse_vtk(src.as_bytes()).is_err());
    }

    #[test]
    fn out_of_range_index_is_parse_error() {
        let src = "\
# vtk DataFile Version 3.0
bad
ASCII
DATASET POLYDATA
POINTS 3 float
0 0 0 1 0 0 0 1 0
POLYGONS 1 4
3 0 1 9
";
        let err = parse_vtk(src.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn zero_triangle_mesh_is_valid() {
        let src = "# vtk DataFile Version 3.0\nempty\nASCII\nDATASET POLYDATA\nPOINTS 0 float\n";
        let mesh = parse_vtk(src.as_bytes()).unwrap();
        assert!(mesh.is_empty());
        assert_eq!(mesh.triangle_count(), 0);
    }

    const EMPTY_HEADER: &str = "# vtk DataFile Version 3.0\nhuge\nASCII\nDATASET POLYDATA\n";

    #[test]
    fn huge_cell_count_is_parse_error() {
        let src = format!("{EMPTY_HEADER}POINTS 0 float\nPOLYGONS 4000000000000000000 0\n");
        let err = parse_vtk(src.as_bytes()).unwrap_err();
        assert!(matches!(err, DecimateError::Parse(_)));
        assert!(err.to_string().contains("cells declared"));
    }

    #[test]
    fn overflowing_point_count_is_parse_error() {
        let src = format!("{EMPTY_HEADER}POINTS 9223372036854775807 float\n0 0 0\n");
        let err = parse_vtk(src.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("overflows"));

        let binary = src.replace("ASCII", "BINARY");
        let err = parse_vtk(binary.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn oversized_binary_block_is_parse_error() {
        let src = "# vtk DataFile Version 3.0\nbig\nBINARY\nDATASET POLYDATA\nPOINTS 1000000000000 float\n\0\0";
        let err = parse_vtk(src.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn overflowing_attribute_lengths_are_parse_errors() {
        let cell_scalars = format!(
            "{ASCII_QUAD}CELL_DATA 9223372036854775807\nSCALARS area float 3\nLOOKUP_TABLE default\n1\n"
        );
        let field = format!("{ASCII_QUAD}FIELD FieldData 1\nweights 4 9223372036854775807 float\n1\n");
        let lut = format!(
            "{ASCII_QUAD}POINT_DATA 4\nLOOKUP_TABLE lut 9223372036854775807\n1\n"
        );
        for src in [cell_scalars, field, lut] {
            let err = parse_vtk(src.as_bytes()).unwrap_err();
            assert!(err.to_string().contains("overflows"), "{err}");
        }
    }
}
