//! CPU-side model representation produced by the OBJ parser.

/// Unknown-keyword event recorded during a parse. The parse itself keeps
/// going; callers that care can inspect these afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based source line number.
    pub line: usize,
    pub keyword: String,
}

/// Flat per-vertex attribute buffers for one geometry.
///
/// `None` means the source never provided that attribute: buffers that end
/// a parse with zero length are dropped rather than padded, so a model
/// without texture coordinates simply has no texcoord buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryData {
    /// xyz triples.
    pub position: Option<Vec<f32>>,
    /// uv pairs.
    pub texcoord: Option<Vec<f32>>,
    /// xyz triples.
    pub normal: Option<Vec<f32>>,
    /// rgb triples, present only when the source carried extended
    /// vertex-color `v` lines.
    pub color: Option<Vec<f32>>,
}

impl GeometryData {
    /// Number of vertices, derived from the position buffer (stride 3).
    pub fn vertex_count(&self) -> usize {
        self.position.as_ref().map_or(0, |p| p.len() / 3)
    }

    /// Axis-aligned extents of the position buffer, if there is one.
    pub fn extents(&self) -> Option<Extents> {
        let positions = self.position.as_deref()?;
        let mut triples = positions.chunks_exact(3);
        let first = triples.next()?;
        let mut extents = Extents {
            min: [first[0], first[1], first[2]],
            max: [first[0], first[1], first[2]],
        };
        for triple in triples {
            for axis in 0..3 {
                extents.min[axis] = extents.min[axis].min(triple[axis]);
                extents.max[axis] = extents.max[axis].max(triple[axis]);
            }
        }
        Some(extents)
    }
}

/// One contiguous drawable vertex-buffer group sharing object/group/material
/// context. Emitted in file order by the parser.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub object: String,
    /// Group names from the most recent `g` directive. Order follows the
    /// source; lookup semantics do not depend on it.
    pub groups: Vec<String>,
    pub material: String,
    pub data: GeometryData,
}

/// Result of parsing one OBJ document. The only durable output of a parse
/// call; all intermediate accumulation state is discarded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedModel {
    pub geometries: Vec<Geometry>,
    /// `mtllib` references in file order. May contain spaces.
    pub material_libs: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedModel {
    /// Union of the extents of every geometry carrying position data.
    /// Hosts use this to frame a camera around the model.
    pub fn extents(&self) -> Option<Extents> {
        self.geometries
            .iter()
            .filter_map(|geometry| geometry.data.extents())
            .reduce(Extents::union)
    }
}

/// Axis-aligned bounding range over position data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Extents {
    pub fn union(self, other: Extents) -> Extents {
        let mut out = self;
        for axis in 0..3 {
            out.min[axis] = out.min[axis].min(other.min[axis]);
            out.max[axis] = out.max[axis].max(other.max[axis]);
        }
        out
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }
}
