//! Lenient Wavefront OBJ parser.
//!
//! Not a validating parser (see <http://paulbourke.net/dataformats/obj/>):
//! unknown directives are reported and skipped, malformed numbers degrade
//! to NaN unless strict mode is enabled, and out-of-range face indices
//! resolve to a zero sentinel instead of faulting. Faces are
//! fan-triangulated and every vertex reference is re-expanded into flat
//! attribute buffers; shared vertices are not deduplicated, which trades
//! buffer size for a simpler single pass.

use std::path::Path;

use anyhow::{Context, Result};

use crate::ParseError;
use crate::lex::{parse_floats, parse_int, split_keyword, tuple2, tuple3};
use crate::mesh::{Diagnostic, Geometry, GeometryData, ParsedModel};

/// Parser configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseOptions {
    /// When set, malformed numeric tokens abort the parse with
    /// [`ParseError::MalformedNumber`] instead of degrading silently.
    pub strict: bool,
}

/// Wavefront OBJ parser. Cheap to construct and stateless between calls:
/// each [`parse`](Self::parse) owns its accumulation state, so a parser
/// may be reused or shared across independent documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjParser {
    options: ParseOptions,
}

/// Directives understood by the parser. Anything else is an unknown
/// keyword and only produces a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Directive {
    V,
    Vn,
    Vt,
    F,
    G,
    O,
    UseMtl,
    MtlLib,
    S,
}

impl Directive {
    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "v" => Self::V,
            "vn" => Self::Vn,
            "vt" => Self::Vt,
            "f" => Self::F,
            "g" => Self::G,
            "o" => Self::O,
            "usemtl" => Self::UseMtl,
            "mtllib" => Self::MtlLib,
            "s" => Self::S,
            _ => return None,
        })
    }
}

/// Per-kind tuple stores. Slot 0 is pre-filled with a zero sentinel so the
/// format's 1-based indices resolve without an off-by-one adjustment, and
/// failed resolutions have somewhere harmless to land. Append-only for the
/// duration of one parse.
struct AttributeStore {
    positions: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
}

impl AttributeStore {
    fn new() -> Self {
        Self {
            positions: vec![[0.0; 3]],
            texcoords: vec![[0.0; 2]],
            normals: vec![[0.0; 3]],
            colors: vec![[0.0; 3]],
        }
    }
}

/// In-progress geometry. Context fields are frozen at creation time; a
/// later `o`/`g`/`usemtl` only affects geometries opened afterwards.
struct GeometryBuilder {
    object: String,
    groups: Vec<String>,
    material: String,
    position: Vec<f32>,
    texcoord: Vec<f32>,
    normal: Vec<f32>,
    color: Vec<f32>,
}

impl GeometryBuilder {
    fn new(object: String, groups: Vec<String>, material: String) -> Self {
        Self {
            object,
            groups,
            material,
            position: Vec::new(),
            texcoord: Vec::new(),
            normal: Vec::new(),
            color: Vec::new(),
        }
    }

    /// Zero-length buffers are omitted from the final record, not padded.
    fn finish(self) -> Geometry {
        fn keep(buffer: Vec<f32>) -> Option<Vec<f32>> {
            if buffer.is_empty() { None } else { Some(buffer) }
        }
        Geometry {
            object: self.object,
            groups: self.groups,
            material: self.material,
            data: GeometryData {
                position: keep(self.position),
                texcoord: keep(self.texcoord),
                normal: keep(self.normal),
                color: keep(self.color),
            },
        }
    }
}

/// All mutable state of one parse call. Owning it explicitly keeps the
/// parser reentrant and makes the geometry open/close rule a function of
/// state plus directive.
struct ParserState {
    store: AttributeStore,
    geometries: Vec<GeometryBuilder>,
    /// Whether the last entry of `geometries` is still accepting faces.
    open: bool,
    object: String,
    groups: Vec<String>,
    material: String,
    material_libs: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl ParserState {
    fn new() -> Self {
        Self {
            store: AttributeStore::new(),
            geometries: Vec::new(),
            open: false,
            object: "default".to_string(),
            groups: vec!["default".to_string()],
            material: "default".to_string(),
            material_libs: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Close the open geometry so the next face starts a fresh one. An
    /// open geometry with no position data yet stays open and is reused
    /// rather than duplicated; reopening is based solely on "is one open",
    /// never on context equality.
    fn close_open(&mut self) {
        if self.open && self.geometries.last().is_some_and(|g| !g.position.is_empty()) {
            self.open = false;
        }
    }

    /// Make sure a geometry is open, creating one lazily from the current
    /// object/group/material context.
    fn ensure_open(&mut self) {
        if !self.open {
            self.geometries.push(GeometryBuilder::new(
                self.object.clone(),
                self.groups.clone(),
                self.material.clone(),
            ));
            self.open = true;
        }
    }

    /// Emit one face vertex reference (`p[/t][/n]`, fields optional and
    /// possibly negative) into the open geometry's flat buffers.
    fn add_vertex(&mut self, reference: &str, line: usize, strict: bool) -> Result<(), ParseError> {
        let colors_active = self.store.colors.len() > 1;
        let Some(geometry) = self.geometries.last_mut() else {
            return Ok(());
        };
        for (slot, token) in reference.split('/').take(3).enumerate() {
            if token.is_empty() {
                continue;
            }
            let raw = parse_int(token, line, strict)?;
            match slot {
                0 => {
                    let index = resolve(raw, self.store.positions.len());
                    geometry.position.extend_from_slice(&self.store.positions[index]);
                    // Extended vertex colors ride along with the position
                    // component, sharing its index.
                    if colors_active {
                        let color = self.store.colors.get(index).copied().unwrap_or_default();
                        geometry.color.extend_from_slice(&color);
                    }
                }
                1 => {
                    let index = resolve(raw, self.store.texcoords.len());
                    geometry.texcoord.extend_from_slice(&self.store.texcoords[index]);
                }
                _ => {
                    let index = resolve(raw, self.store.normals.len());
                    geometry.normal.extend_from_slice(&self.store.normals[index]);
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> ParsedModel {
        ParsedModel {
            geometries: self.geometries.into_iter().map(GeometryBuilder::finish).collect(),
            material_libs: self.material_libs,
            diagnostics: self.diagnostics,
        }
    }
}

/// Resolve a possibly negative 1-based index to a store slot. Negative
/// indices count back from the end of the store. Zero and out-of-range
/// references fall back to the zero sentinel in slot 0.
fn resolve(raw: i64, len: usize) -> usize {
    let effective = if raw >= 0 { raw } else { len as i64 + raw };
    usize::try_from(effective)
        .ok()
        .filter(|&index| index < len)
        .unwrap_or(0)
}

impl ObjParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Parse one OBJ document. In lenient mode (the default) this never
    /// fails; the returned model may contain NaN components or
    /// sentinel-resolved vertices, which callers wanting strict
    /// guarantees must post-check themselves.
    pub fn parse(&self, text: &str) -> Result<ParsedModel, ParseError> {
        let strict = self.options.strict;
        let mut state = ParserState::new();

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (keyword, rest) = split_keyword(line);
            let args: Vec<&str> = rest.split_whitespace().collect();

            let Some(directive) = Directive::from_keyword(keyword) else {
                log::warn!("unhandled OBJ keyword '{}' on line {}", keyword, line_no);
                state.diagnostics.push(Diagnostic {
                    line: line_no,
                    keyword: keyword.to_string(),
                });
                continue;
            };

            match directive {
                Directive::V => {
                    let values = parse_floats(&args, line_no, strict)?;
                    // More than 3 values means the tail is an extended
                    // vertex color.
                    if values.len() > 3 {
                        state.store.positions.push(tuple3(&values[..3]));
                        state.store.colors.push(tuple3(&values[3..]));
                    } else {
                        state.store.positions.push(tuple3(&values));
                    }
                }
                Directive::Vn => {
                    let values = parse_floats(&args, line_no, strict)?;
                    state.store.normals.push(tuple3(&values));
                }
                Directive::Vt => {
                    let values = parse_floats(&args, line_no, strict)?;
                    state.store.texcoords.push(tuple2(&values));
                }
                Directive::F => {
                    state.ensure_open();
                    // Fan triangulation: n references -> n-2 triangles
                    // anchored at the first reference.
                    for tri in 1..args.len().saturating_sub(1) {
                        state.add_vertex(args[0], line_no, strict)?;
                        state.add_vertex(args[tri], line_no, strict)?;
                        state.add_vertex(args[tri + 1], line_no, strict)?;
                    }
                }
                Directive::G => {
                    state.groups = args.iter().map(|s| s.to_string()).collect();
                    state.close_open();
                }
                Directive::O => {
                    state.object = rest.to_string();
                    state.close_open();
                }
                Directive::UseMtl => {
                    // Raw remainder: material names may contain spaces.
                    state.material = rest.to_string();
                    state.close_open();
                }
                Directive::MtlLib => {
                    state.material_libs.push(rest.to_string());
                }
                // Smoothing groups carry no geometric effect here.
                Directive::S => {}
            }
        }

        Ok(state.finish())
    }
}

/// Parse an OBJ document with default (lenient) options.
pub fn parse_obj_str(text: &str) -> ParsedModel {
    // Lenient mode has no failure path.
    ObjParser::new().parse(text).unwrap_or_default()
}

/// Load and parse an OBJ file with default options.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> Result<ParsedModel> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read OBJ file: {}", path.display()))?;
    Ok(parse_obj_str(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";

    #[test]
    fn single_triangle_positions_only() {
        let model = parse_obj_str(TRIANGLE);
        assert_eq!(model.geometries.len(), 1);
        let data = &model.geometries[0].data;
        assert_eq!(data.vertex_count(), 3);
        assert_eq!(
            data.position.as_deref(),
            Some(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0][..])
        );
        assert_eq!(data.texcoord, None);
        assert_eq!(data.normal, None);
        assert_eq!(data.color, None);
    }

    #[test]
    fn quad_fan_triangulates_to_two_triangles() {
        let src = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";
        let model = parse_obj_str(src);
        let data = &model.geometries[0].data;
        // n-2 triangles, 3 emissions each: (1,2,3) then (1,3,4).
        assert_eq!(data.vertex_count(), 6);
        let positions = data.position.as_deref().unwrap();
        assert_eq!(&positions[0..3], &[0.0, 0.0, 0.0]);
        assert_eq!(&positions[9..12], &[0.0, 0.0, 0.0]);
        assert_eq!(&positions[15..18], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn negative_index_counts_from_end() {
        let positive = parse_obj_str("v 0 0 0\nv 1 2 3\nf 2 2 2\n");
        let negative = parse_obj_str("v 0 0 0\nv 1 2 3\nf -1 -1 -1\n");
        assert_eq!(
            positive.geometries[0].data.position,
            negative.geometries[0].data.position,
        );
    }

    #[test]
    fn slash_references_fill_texcoord_and_normal() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.5 0.5
vn 0 0 1
f 1/1/1 2/1/1 3/1/1
";
        let model = parse_obj_str(src);
        let data = &model.geometries[0].data;
        assert_eq!(data.texcoord.as_deref(), Some(&[0.5, 0.5, 0.5, 0.5, 0.5, 0.5][..]));
        assert_eq!(data.normal.as_deref(), Some(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0][..]));
    }

    #[test]
    fn missing_middle_field_skips_texcoord() {
        let src = "v 0 0 0\nvn 0 1 0\nf 1//1 1//1 1//1\n";
        let model = parse_obj_str(src);
        let data = &model.geometries[0].data;
        assert_eq!(data.texcoord, None);
        assert_eq!(data.normal.as_deref().map(<[f32]>::len), Some(9));
    }

    #[test]
    fn extended_vertex_colors_activate_color_buffer() {
        let src = "\
v 0 0 0 1.0 0.0 0.0
v 1 0 0 0.0 1.0 0.0
v 0 1 0 0.0 0.0 1.0
f 1 2 3
";
        let model = parse_obj_str(src);
        let data = &model.geometries[0].data;
        let color = data.color.as_deref().unwrap();
        assert_eq!(color.len(), data.vertex_count() * 3);
        assert_eq!(&color[0..3], &[1.0, 0.0, 0.0]);
        assert_eq!(&color[6..9], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn unknown_keyword_is_skipped_with_diagnostic() {
        let src = "v 0 0 0\nwobble 1 2\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let model = parse_obj_str(src);
        assert_eq!(model.diagnostics.len(), 1);
        assert_eq!(model.diagnostics[0].keyword, "wobble");
        assert_eq!(model.diagnostics[0].line, 2);
        // Both surrounding v lines survive, in order.
        let positions = model.geometries[0].data.position.as_deref().unwrap();
        assert_eq!(&positions[0..3], &[0.0, 0.0, 0.0]);
        assert_eq!(&positions[3..6], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn object_change_closes_nonempty_geometry() {
        let src = "\
o A
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
f 1 2 3
o B
f 1 2 3
";
        let model = parse_obj_str(src);
        assert_eq!(model.geometries.len(), 2);
        assert_eq!(model.geometries[0].object, "A");
        assert_eq!(model.geometries[0].data.vertex_count(), 6);
        assert_eq!(model.geometries[1].object, "B");
        assert_eq!(model.geometries[1].data.vertex_count(), 3);
    }

    #[test]
    fn context_changes_without_faces_do_not_duplicate() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\no A\no B\nusemtl metal\nf 1 2 3\n";
        let model = parse_obj_str(src);
        assert_eq!(model.geometries.len(), 1);
        assert_eq!(model.geometries[0].object, "B");
        assert_eq!(model.geometries[0].material, "metal");
    }

    #[test]
    fn group_directive_takes_split_names() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\ng left wing\nf 1 2 3\n";
        let model = parse_obj_str(src);
        assert_eq!(model.geometries[0].groups, vec!["left", "wing"]);
    }

    #[test]
    fn usemtl_and_mtllib_keep_embedded_spaces() {
        let src = "mtllib my room.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl brushed metal\nf 1 2 3\n";
        let model = parse_obj_str(src);
        assert_eq!(model.material_libs, vec!["my room.mtl"]);
        assert_eq!(model.geometries[0].material, "brushed metal");
    }

    #[test]
    fn out_of_range_index_resolves_to_sentinel() {
        let src = "v 1 1 1\nv 2 2 2\nv 3 3 3\nf 1 2 9\n";
        let model = parse_obj_str(src);
        let positions = model.geometries[0].data.position.as_deref().unwrap();
        assert_eq!(&positions[6..9], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn lenient_malformed_float_becomes_nan() {
        let model = parse_obj_str("v 0 zero 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let positions = model.geometries[0].data.position.as_deref().unwrap();
        assert!(positions[1].is_nan());
    }

    #[test]
    fn strict_mode_rejects_malformed_float() {
        let parser = ObjParser::with_options(ParseOptions { strict: true });
        let err = parser.parse("v 0 zero 0\n").unwrap_err();
        let ParseError::MalformedNumber { line, token } = err;
        assert_eq!(line, 1);
        assert_eq!(token, "zero");
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let src = "# header\n\nv 0 0 0\n   # indented comment\nv 1 0 0\nv 0 1 0\nf 1 2 3\ns off\n";
        let model = parse_obj_str(src);
        assert!(model.diagnostics.is_empty());
        assert_eq!(model.geometries[0].data.vertex_count(), 3);
    }
}
