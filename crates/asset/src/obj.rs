//! Minimal OBJ parser supporting positions, normals and texture coordinates.
//!
//! Faces are fan-triangulated and every corner is expanded into a full
//! [`Vertex`]; exactly equal vertices share one slot in the output.

use std::{
    collections::{HashMap, hash_map::Entry},
    ffi::OsStr,
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use corelib::{AssetConfig, LoadError, LoadResult, ParseError, ParseErrorKind};

use crate::mesh::{MeshData, Normal, Position, TexCoord, Vertex};

/// Only extension accepted by the file loaders.
pub const OBJ_EXTENSION: &str = "obj";

/// Origin reported for I/O errors raised while reading a stream.
const READER_ORIGIN: &str = "<reader>";

/// Record kind of a non-empty, non-comment line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Position,
    TexCoord,
    Normal,
    Face,
    /// Anything else (`o`, `g`, `s`, `usemtl`, ...). Ignored.
    Other,
}

/// Classify a line from its first one or two characters.
pub fn classify_line(line: &str) -> LineKind {
    classify_bytes(line.as_bytes())
}

/// Byte-level [`classify_line`]; works before the line is known to be UTF-8.
fn classify_bytes(line: &[u8]) -> LineKind {
    match line {
        [b'v', c, ..] if c.is_ascii_whitespace() => LineKind::Position,
        [b'v', b't', ..] => LineKind::TexCoord,
        [b'v', b'n', ..] => LineKind::Normal,
        [b'f', ..] => LineKind::Face,
        _ => LineKind::Other,
    }
}

/// One `v/vt/vn` reference as written in the file (1-based, negative is relative).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceVertexRef {
    pub position: i64,
    pub tex_coord: Option<i64>,
    pub normal: Option<i64>,
}

/// Three face references in winding order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle(pub [FaceVertexRef; 3]);

impl fmt::Display for FaceVertexRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.position)?;
        match (self.tex_coord, self.normal) {
            (None, None) => Ok(()),
            (Some(vt), None) => write!(f, "/{vt}"),
            (None, Some(vn)) => write!(f, "//{vn}"),
            (Some(vt), Some(vn)) => write!(f, "/{vt}/{vn}"),
        }
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = &self.0;
        write!(f, "Triangle({a} {b} {c})")
    }
}

/// Resolve `file_name` against the asset directory and load it.
pub fn load_obj_data(config: &AssetConfig, file_name: impl AsRef<Path>) -> LoadResult<MeshData> {
    load_obj_from_path(config.resolve(file_name))
}

/// Same as [`load_obj_data`] with the directory taken from the environment.
pub fn load_obj_data_from_env(file_name: impl AsRef<Path>) -> LoadResult<MeshData> {
    let config = AssetConfig::from_env()?;
    load_obj_data(&config, file_name)
}

/// Load an OBJ mesh from a file path. The extension must be `.obj`.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> LoadResult<MeshData> {
    let path = path.as_ref();
    let extension = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    if extension != OBJ_EXTENSION {
        return Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: extension.to_owned(),
        });
    }

    log::info!("Loading OBJ data from {}", path.display());
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let mesh = parse_obj(BufReader::new(file), path)?;

    log::info!(
        "Loaded OBJ {}: {} vertices, {} indices ({} triangles)",
        path.display(),
        mesh.vertex_count(),
        mesh.index_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> LoadResult<MeshData> {
    parse_obj(reader, Path::new(READER_ORIGIN))
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> LoadResult<MeshData> {
    load_obj_from_reader(io::Cursor::new(contents))
}

fn parse_obj<R: BufRead>(mut reader: R, origin: &Path) -> LoadResult<MeshData> {
    let mut parser = ObjParser::default();
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| LoadError::io(origin, e))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        parser.push_line(line_no, &buf)?;
    }
    let mesh = parser.finish()?;

    if !mesh.is_valid() {
        log::warn!("OBJ {} contained no triangles", origin.display());
    }
    Ok(mesh)
}

/// Face reference with every index turned into a 0-based slot.
#[derive(Clone, Copy, Debug)]
struct ResolvedRef {
    position: usize,
    tex_coord: Option<usize>,
    normal: Option<usize>,
}

/// Accumulates attributes and triangles line by line.
#[derive(Debug, Default)]
struct ObjParser {
    positions: Vec<Position>,
    tex_coords: Vec<TexCoord>,
    normals: Vec<Normal>,
    triangles: Vec<[ResolvedRef; 3]>,
}

impl ObjParser {
    /// `line_no` is 1-based. Comments and ignored directives are never decoded,
    /// so they may hold any bytes; records must be UTF-8 up to their comment.
    fn push_line(&mut self, line_no: usize, raw: &[u8]) -> Result<(), ParseError> {
        let raw = raw.trim_ascii();
        if raw.is_empty() || raw[0] == b'#' {
            return Ok(());
        }

        let kind = classify_bytes(raw);
        if kind == LineKind::Other {
            log::trace!(
                "Ignoring OBJ line {}: '{}'",
                line_no,
                String::from_utf8_lossy(raw)
            );
            return Ok(());
        }

        // '#' never occurs inside a multi-byte UTF-8 sequence.
        let record = match raw.iter().position(|&b| b == b'#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let line = std::str::from_utf8(record)
            .map_err(|_| ParseError::new(line_no, ParseErrorKind::InvalidUtf8))?;

        match kind {
            LineKind::Position => self.positions.push(parse_position(line, line_no)?),
            LineKind::TexCoord => self.tex_coords.push(parse_tex_coord(line, line_no)?),
            LineKind::Normal => self.normals.push(parse_normal(line, line_no)?),
            LineKind::Face => {
                for Triangle([a, b, c]) in parse_face(line, line_no)? {
                    let resolved = [
                        self.resolve(a, line_no)?,
                        self.resolve(b, line_no)?,
                        self.resolve(c, line_no)?,
                    ];
                    self.triangles.push(resolved);
                }
            }
            LineKind::Other => {}
        }
        Ok(())
    }

    /// Bounds are checked against what has been declared so far.
    fn resolve(&self, face_ref: FaceVertexRef, line_no: usize) -> Result<ResolvedRef, ParseError> {
        let position = resolve_index(face_ref.position, self.positions.len(), "position", line_no)?;
        let tex_coord = face_ref
            .tex_coord
            .map(|i| resolve_index(i, self.tex_coords.len(), "texture coordinate", line_no))
            .transpose()?;
        let normal = face_ref
            .normal
            .map(|i| resolve_index(i, self.normals.len(), "normal", line_no))
            .transpose()?;
        Ok(ResolvedRef {
            position,
            tex_coord,
            normal,
        })
    }

    fn vertex(&self, r: &ResolvedRef) -> Vertex {
        Vertex::new(
            self.positions[r.position],
            r.tex_coord.map(|i| self.tex_coords[i]).unwrap_or_default(),
            r.normal.map(|i| self.normals[i]).unwrap_or_default(),
        )
    }

    /// Expand triangles into unique vertices plus indices.
    fn finish(self) -> LoadResult<MeshData> {
        let mut unique: HashMap<VertexKey, u32> = HashMap::new();
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::with_capacity(self.triangles.len() * 3);

        for corner in self.triangles.iter().flatten() {
            let vertex = self.vertex(corner);
            let index = match unique.entry(VertexKey::new(&vertex)) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let idx =
                        u32::try_from(vertices.len()).map_err(|_| LoadError::TooManyVertices)?;
                    vertices.push(vertex);
                    *entry.insert(idx)
                }
            };
            indices.push(index);
        }

        log::debug!(
            "OBJ attributes: {} positions, {} texcoords, {} normals -> {} unique vertices",
            self.positions.len(),
            self.tex_coords.len(),
            self.normals.len(),
            vertices.len()
        );
        Ok(MeshData::new(vertices, indices))
    }
}

/// Hashable identity of a [`Vertex`]: the bit patterns of its nine floats,
/// with `-0.0` folded into `0.0` so that `==`-equal vertices share a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct VertexKey([u32; 9]);

impl VertexKey {
    fn new(vertex: &Vertex) -> Self {
        Self(vertex.as_array().map(|f| if f == 0.0 { 0 } else { f.to_bits() }))
    }
}

/// Drop a trailing `#` comment.
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parse a `v x y z [# comment]` line.
pub fn parse_position(line: &str, line_no: usize) -> Result<Position, ParseError> {
    let [x, y, z] = parse_triple(line, line_no)?;
    Ok(Position::new(x, y, z))
}

/// Parse a `vn x y z [# comment]` line.
pub fn parse_normal(line: &str, line_no: usize) -> Result<Normal, ParseError> {
    let [x, y, z] = parse_triple(line, line_no)?;
    Ok(Normal::new(x, y, z))
}

/// Parse a `vt u v [t]` line. A third value is accepted but not read; `t` is always 0.
pub fn parse_tex_coord(line: &str, line_no: usize) -> Result<TexCoord, ParseError> {
    let mut fields = strip_comment(line).split_whitespace().skip(1);
    let mut uv = [0.0_f32; 2];
    for (found, slot) in uv.iter_mut().enumerate() {
        let token = fields.next().ok_or_else(|| {
            ParseError::new(line_no, ParseErrorKind::MissingField { expected: 2, found })
        })?;
        *slot = parse_f32(token, line_no)?;
    }
    Ok(TexCoord::new(uv[0], uv[1]))
}

/// Exactly three floats after the prefix token.
fn parse_triple(line: &str, line_no: usize) -> Result<[f32; 3], ParseError> {
    let mut fields = strip_comment(line).split_whitespace().skip(1);
    let mut out = [0.0_f32; 3];
    for (found, slot) in out.iter_mut().enumerate() {
        let token = fields.next().ok_or_else(|| {
            ParseError::new(line_no, ParseErrorKind::MissingField { expected: 3, found })
        })?;
        *slot = parse_f32(token, line_no)?;
    }
    if fields.next().is_some() {
        return Err(ParseError::new(line_no, ParseErrorKind::TooManyFields));
    }
    Ok(out)
}

/// Decimal only: `nan`, `inf` and values overflowing to infinity are rejected.
fn parse_f32(token: &str, line_no: usize) -> Result<f32, ParseError> {
    token
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            ParseError::new(
                line_no,
                ParseErrorKind::InvalidNumber {
                    token: token.to_owned(),
                },
            )
        })
}

/// Parse an `f ref ref ref ...` line and fan-triangulate it around the first reference.
pub fn parse_face(line: &str, line_no: usize) -> Result<Vec<Triangle>, ParseError> {
    let refs = strip_comment(line)
        .split_whitespace()
        .skip(1)
        .map(|token| parse_face_vertex(token, line_no))
        .collect::<Result<Vec<_>, _>>()?;

    if refs.len() < 3 {
        return Err(ParseError::new(
            line_no,
            ParseErrorKind::FaceTooSmall { found: refs.len() },
        ));
    }

    Ok((1..refs.len() - 1)
        .map(|i| Triangle([refs[0], refs[i], refs[i + 1]]))
        .collect())
}

/// Parse `v`, `v/vt`, `v/vt/vn` or `v//vn`.
fn parse_face_vertex(token: &str, line_no: usize) -> Result<FaceVertexRef, ParseError> {
    let malformed = || {
        ParseError::new(
            line_no,
            ParseErrorKind::MalformedFaceVertex {
                token: token.to_owned(),
            },
        )
    };

    let mut split = token.split('/');
    let position = match split.next() {
        Some(value) if !value.is_empty() => parse_index(value, line_no)?,
        _ => return Err(malformed()),
    };
    let tex_coord = match split.next() {
        Some(value) if !value.is_empty() => Some(parse_index(value, line_no)?),
        _ => None,
    };
    let normal = match split.next() {
        Some(value) if !value.is_empty() => Some(parse_index(value, line_no)?),
        _ => None,
    };
    if split.next().is_some() {
        return Err(malformed());
    }

    Ok(FaceVertexRef {
        position,
        tex_coord,
        normal,
    })
}

fn parse_index(token: &str, line_no: usize) -> Result<i64, ParseError> {
    token.parse::<i64>().map_err(|_| {
        ParseError::new(
            line_no,
            ParseErrorKind::InvalidIndex {
                token: token.to_owned(),
            },
        )
    })
}

/// Map a 1-based (or negative, relative) OBJ index onto `0..len`.
fn resolve_index(
    raw: i64,
    len: usize,
    attribute: &'static str,
    line_no: usize,
) -> Result<usize, ParseError> {
    let slot = if raw > 0 {
        usize::try_from(raw - 1).ok()
    } else {
        usize::try_from(raw.unsigned_abs())
            .ok()
            .and_then(|back| len.checked_sub(back))
    };

    match slot {
        Some(idx) if raw != 0 && idx < len => Ok(idx),
        _ => Err(ParseError::new(
            line_no,
            ParseErrorKind::IndexOutOfRange {
                attribute,
                index: raw,
                len,
            },
        )),
    }
}
