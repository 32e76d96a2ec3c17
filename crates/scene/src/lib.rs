//! Scene assembly: merge parsed geometries with their resolved materials
//! into renderer-ready parts.
//!
//! This is the boundary to the rendering collaborators. Texture lookup and
//! GPU upload stay behind [`TextureResolver`] and [`MeshSink`]; everything
//! here is plain CPU-side data movement.

use asset::mtl::{Material, MaterialLibrary};
use asset::{Geometry, ParsedModel, generate_tangents};

/// Opaque texture lookup service. Given an MTL path reference it returns
/// a handle the renderer understands. Memoizing repeated paths is the
/// host's job, not this crate's.
pub trait TextureResolver {
    type Handle: Clone;

    fn resolve(&mut self, path: &str) -> Self::Handle;

    /// Plain white stand-in for absent diffuse/specular maps.
    fn default_white(&mut self) -> Self::Handle;

    /// Flat +Z stand-in for absent normal maps.
    fn default_normal(&mut self) -> Self::Handle;
}

/// Upload boundary: accepts an assembled part and returns whatever the
/// renderer uses as a drawable handle.
pub trait MeshSink<H: Clone> {
    type Drawable;

    fn upload(&mut self, part: &RenderPart<H>) -> Self::Drawable;
}

/// One vertex attribute as handed to the renderer: either a real
/// per-vertex buffer with an explicit component count, or a constant
/// applied to every vertex.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Buffer { components: u8, data: Vec<f32> },
    Constant(Vec<f32>),
}

impl Attribute {
    fn buffer(components: u8, data: Vec<f32>) -> Self {
        Self::Buffer { components, data }
    }

    fn constant(values: &[f32]) -> Self {
        Self::Constant(values.to_vec())
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self, Self::Buffer { .. })
    }
}

/// Renderer-ready attributes for one geometry. Every slot is always
/// populated; attributes the source lacked are constants.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexAttributes {
    pub position: Attribute,
    pub texcoord: Attribute,
    pub normal: Attribute,
    pub color: Attribute,
    pub tangent: Attribute,
}

/// Material after the default-merge: every field concrete, every map a
/// resolved handle. A referenced-but-missing material is never an error,
/// it just comes out as the default.
#[derive(Clone, Debug)]
pub struct ResolvedMaterial<H> {
    pub name: String,
    pub diffuse: [f32; 3],
    pub ambient: [f32; 3],
    pub specular: [f32; 3],
    pub emissive: [f32; 3],
    pub shininess: f32,
    pub opacity: f32,
    pub optical_density: f32,
    pub illum: i32,
    pub diffuse_map: H,
    pub specular_map: H,
    pub normal_map: H,
}

/// One drawable part: merged material plus fully-substituted attributes.
#[derive(Clone, Debug)]
pub struct RenderPart<H> {
    pub object: String,
    pub groups: Vec<String>,
    pub vertex_count: usize,
    pub material: ResolvedMaterial<H>,
    pub attributes: VertexAttributes,
}

/// Build a render part from one geometry. Returns `None` when the
/// geometry carries no position data, which can happen for a face
/// directive with fewer than three vertex references.
pub fn assemble_geometry<R: TextureResolver>(
    geometry: &Geometry,
    library: &MaterialLibrary,
    resolver: &mut R,
) -> Option<RenderPart<R::Handle>> {
    let data = &geometry.data;
    let Some(position) = data.position.clone() else {
        log::warn!(
            "skipping geometry '{}' ('{}'): no position data",
            geometry.object,
            geometry.material
        );
        return None;
    };

    let color = match &data.color {
        // A color buffer matching the position length is three-component;
        // the renderer's default stride assumption is four.
        Some(color) if color.len() == position.len() => Attribute::buffer(3, color.clone()),
        Some(color) => Attribute::buffer(4, color.clone()),
        None => Attribute::constant(&[1.0, 1.0, 1.0, 1.0]),
    };

    // Tangents need both texcoords (for the UV Jacobian) and normals (for
    // the renderer's TBN basis) to be worth generating.
    let tangent = match (&data.texcoord, &data.normal) {
        (Some(texcoord), Some(_)) => {
            Attribute::buffer(3, generate_tangents(&position, texcoord, None))
        }
        _ => Attribute::constant(&[1.0, 0.0, 0.0]),
    };

    let texcoord = match &data.texcoord {
        Some(texcoord) => Attribute::buffer(2, texcoord.clone()),
        None => Attribute::constant(&[0.0, 0.0]),
    };

    // Normals are never synthesized from geometry here; absent means a
    // constant flat +Z.
    let normal = match &data.normal {
        Some(normal) => Attribute::buffer(3, normal.clone()),
        None => Attribute::constant(&[0.0, 0.0, 1.0]),
    };

    let material = resolve_material(library.get(&geometry.material), &geometry.material, resolver);

    Some(RenderPart {
        object: geometry.object.clone(),
        groups: geometry.groups.clone(),
        vertex_count: position.len() / 3,
        material,
        attributes: VertexAttributes {
            position: Attribute::buffer(3, position),
            texcoord,
            normal,
            color,
            tangent,
        },
    })
}

/// Merge a parsed material over the hard-coded default so every field is
/// defined downstream: diffuse/specular white, ambient/emissive black,
/// moderate shininess, fully opaque.
fn resolve_material<R: TextureResolver>(
    material: Option<&Material>,
    name: &str,
    resolver: &mut R,
) -> ResolvedMaterial<R::Handle> {
    let mut resolved = ResolvedMaterial {
        name: name.to_string(),
        diffuse: [1.0, 1.0, 1.0],
        ambient: [0.0, 0.0, 0.0],
        specular: [1.0, 1.0, 1.0],
        emissive: [0.0, 0.0, 0.0],
        shininess: 5.0,
        opacity: 1.0,
        optical_density: 1.0,
        illum: 2,
        diffuse_map: resolver.default_white(),
        specular_map: resolver.default_white(),
        normal_map: resolver.default_normal(),
    };
    let Some(material) = material else {
        return resolved;
    };
    if let Some(value) = material.diffuse {
        resolved.diffuse = value;
    }
    if let Some(value) = material.ambient {
        resolved.ambient = value;
    }
    if let Some(value) = material.specular {
        resolved.specular = value;
    }
    if let Some(value) = material.emissive {
        resolved.emissive = value;
    }
    if let Some(value) = material.shininess {
        resolved.shininess = value;
    }
    if let Some(value) = material.opacity {
        resolved.opacity = value;
    }
    if let Some(value) = material.optical_density {
        resolved.optical_density = value;
    }
    if let Some(value) = material.illum {
        resolved.illum = value;
    }
    if let Some(path) = &material.diffuse_map {
        resolved.diffuse_map = resolver.resolve(path);
    }
    if let Some(path) = &material.specular_map {
        resolved.specular_map = resolver.resolve(path);
    }
    if let Some(path) = &material.normal_map {
        resolved.normal_map = resolver.resolve(path);
    }
    resolved
}

/// Assemble every geometry of a parsed model, in emission order.
pub fn assemble_model<R: TextureResolver>(
    model: &ParsedModel,
    library: &MaterialLibrary,
    resolver: &mut R,
) -> Vec<RenderPart<R::Handle>> {
    model
        .geometries
        .iter()
        .filter_map(|geometry| assemble_geometry(geometry, library, resolver))
        .collect()
}

/// Assemble a model and hand every part to the upload service.
pub fn upload_model<R, S>(
    model: &ParsedModel,
    library: &MaterialLibrary,
    resolver: &mut R,
    sink: &mut S,
) -> Vec<S::Drawable>
where
    R: TextureResolver,
    S: MeshSink<R::Handle>,
{
    assemble_model(model, library, resolver)
        .iter()
        .map(|part| sink.upload(part))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::mtl::parse_mtl_str;
    use asset::obj::parse_obj_str;

    /// Handles are just the paths; defaults are tagged strings.
    struct PathResolver;

    impl TextureResolver for PathResolver {
        type Handle = String;

        fn resolve(&mut self, path: &str) -> String {
            path.to_string()
        }

        fn default_white(&mut self) -> String {
            "<white>".to_string()
        }

        fn default_normal(&mut self) -> String {
            "<normal>".to_string()
        }
    }

    struct CountingSink {
        uploads: usize,
    }

    impl MeshSink<String> for CountingSink {
        type Drawable = usize;

        fn upload(&mut self, part: &RenderPart<String>) -> usize {
            assert!(part.vertex_count > 0);
            self.uploads += 1;
            self.uploads
        }
    }

    const TEXTURED_TRIANGLE: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn bare_triangle_gets_constant_substitutes() {
        let model = parse_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let library = MaterialLibrary::default();
        let part = assemble_geometry(&model.geometries[0], &library, &mut PathResolver).unwrap();
        assert_eq!(part.vertex_count, 3);
        assert!(part.attributes.position.is_buffer());
        assert_eq!(part.attributes.texcoord, Attribute::Constant(vec![0.0, 0.0]));
        assert_eq!(part.attributes.normal, Attribute::Constant(vec![0.0, 0.0, 1.0]));
        assert_eq!(part.attributes.tangent, Attribute::Constant(vec![1.0, 0.0, 0.0]));
        assert_eq!(
            part.attributes.color,
            Attribute::Constant(vec![1.0, 1.0, 1.0, 1.0])
        );
    }

    #[test]
    fn texcoord_and_normal_enable_tangent_generation() {
        let model = parse_obj_str(TEXTURED_TRIANGLE);
        let library = MaterialLibrary::default();
        let part = assemble_geometry(&model.geometries[0], &library, &mut PathResolver).unwrap();
        let Attribute::Buffer { components, data } = &part.attributes.tangent else {
            panic!("expected generated tangent buffer");
        };
        assert_eq!(*components, 3);
        assert_eq!(data.len(), part.vertex_count * 3);
        // Axis-aligned UVs: tangent along +X.
        assert_eq!(&data[0..3], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn matching_color_buffer_is_marked_three_component() {
        let src = "\
v 0 0 0 1 0 0
v 1 0 0 0 1 0
v 0 1 0 0 0 1
f 1 2 3
";
        let model = parse_obj_str(src);
        let library = MaterialLibrary::default();
        let part = assemble_geometry(&model.geometries[0], &library, &mut PathResolver).unwrap();
        let Attribute::Buffer { components, data } = &part.attributes.color else {
            panic!("expected color buffer");
        };
        assert_eq!(*components, 3);
        assert_eq!(data.len(), part.vertex_count * 3);
    }

    #[test]
    fn missing_material_merges_to_defaults() {
        let model = parse_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl ghost\nf 1 2 3\n");
        let library = MaterialLibrary::default();
        let part = assemble_geometry(&model.geometries[0], &library, &mut PathResolver).unwrap();
        let material = &part.material;
        assert_eq!(material.name, "ghost");
        assert_eq!(material.diffuse, [1.0, 1.0, 1.0]);
        assert_eq!(material.shininess, 5.0);
        assert_eq!(material.opacity, 1.0);
        assert_eq!(material.diffuse_map, "<white>");
        assert_eq!(material.normal_map, "<normal>");
    }

    #[test]
    fn named_material_overrides_only_its_fields() {
        let model = parse_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl red\nf 1 2 3\n");
        let library = parse_mtl_str("newmtl red\nKd 1 0 0\nmap_Kd red.png\n");
        let part = assemble_geometry(&model.geometries[0], &library, &mut PathResolver).unwrap();
        assert_eq!(part.material.diffuse, [1.0, 0.0, 0.0]);
        assert_eq!(part.material.diffuse_map, "red.png");
        // Untouched fields keep their defaults.
        assert_eq!(part.material.specular, [1.0, 1.0, 1.0]);
        assert_eq!(part.material.specular_map, "<white>");
    }

    #[test]
    fn upload_model_walks_every_part() {
        let src = "\
o A
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o B
f 1 2 3
";
        let model = parse_obj_str(src);
        let library = MaterialLibrary::default();
        let mut sink = CountingSink { uploads: 0 };
        let drawables = upload_model(&model, &library, &mut PathResolver, &mut sink);
        assert_eq!(drawables, vec![1, 2]);
    }

    #[test]
    fn positionless_geometry_is_skipped() {
        // A face with fewer than 3 references opens a geometry but never
        // emits vertices.
        let model = parse_obj_str("v 0 0 0\nf 1\n");
        assert_eq!(model.geometries.len(), 1);
        let library = MaterialLibrary::default();
        let parts = assemble_model(&model, &library, &mut PathResolver);
        assert!(parts.is_empty());
    }
}
