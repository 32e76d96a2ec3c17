//! Lenient Wavefront MTL material parser.
//!
//! Shares the line discipline of the OBJ parser. Map directives keep
//! their argument verbatim as an opaque path reference: option flags like
//! `-bm` are deliberately not interpreted, and no filesystem access
//! happens here.

use std::collections::HashMap;

use crate::ParseError;
use crate::lex::{first_float, parse_floats, parse_int, split_keyword, tuple3};
use crate::mesh::Diagnostic;
use crate::obj::ParseOptions;

/// One named material. Every field is optional: the parser records only
/// what the source provides and leaves defaulting to the assembler.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub name: String,
    pub shininess: Option<f32>,
    pub ambient: Option<[f32; 3]>,
    pub diffuse: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub emissive: Option<[f32; 3]>,
    pub optical_density: Option<f32>,
    pub opacity: Option<f32>,
    pub illum: Option<i32>,
    pub diffuse_map: Option<String>,
    pub specular_map: Option<String>,
    pub normal_map: Option<String>,
}

/// Result of parsing one or more concatenated MTL documents.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialLibrary {
    pub materials: HashMap<String, Material>,
    pub diagnostics: Vec<Diagnostic>,
}

impl MaterialLibrary {
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Directive {
    NewMtl,
    Ns,
    Ka,
    Kd,
    Ks,
    Ke,
    Ni,
    D,
    Illum,
    MapKd,
    MapNs,
    MapBump,
}

impl Directive {
    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "newmtl" => Self::NewMtl,
            "Ns" => Self::Ns,
            "Ka" => Self::Ka,
            "Kd" => Self::Kd,
            "Ks" => Self::Ks,
            "Ke" => Self::Ke,
            "Ni" => Self::Ni,
            "d" => Self::D,
            "illum" => Self::Illum,
            "map_Kd" => Self::MapKd,
            "map_Ns" => Self::MapNs,
            "map_Bump" => Self::MapBump,
            _ => return None,
        })
    }
}

/// Wavefront MTL parser, same construction pattern as
/// [`ObjParser`](crate::obj::ObjParser).
#[derive(Clone, Copy, Debug, Default)]
pub struct MtlParser {
    options: ParseOptions,
}

impl MtlParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Parse a (possibly concatenated) MTL document. Lenient mode never
    /// fails. Property directives before the first `newmtl` have no
    /// target material and are ignored with a diagnostic.
    pub fn parse(&self, text: &str) -> Result<MaterialLibrary, ParseError> {
        let strict = self.options.strict;
        let mut materials: HashMap<String, Material> = HashMap::new();
        let mut diagnostics = Vec::new();
        let mut current: Option<String> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (keyword, rest) = split_keyword(line);
            let args: Vec<&str> = rest.split_whitespace().collect();

            let Some(directive) = Directive::from_keyword(keyword) else {
                log::warn!("unhandled MTL keyword '{}' on line {}", keyword, line_no);
                diagnostics.push(Diagnostic {
                    line: line_no,
                    keyword: keyword.to_string(),
                });
                continue;
            };

            if directive == Directive::NewMtl {
                // Raw remainder: names may contain spaces. A repeated
                // name replaces the earlier definition.
                let name = rest.to_string();
                materials.insert(
                    name.clone(),
                    Material {
                        name: name.clone(),
                        ..Default::default()
                    },
                );
                current = Some(name);
                continue;
            }

            let Some(material) = current.as_ref().and_then(|name| materials.get_mut(name)) else {
                log::warn!(
                    "MTL directive '{}' before any newmtl on line {}, ignored",
                    keyword,
                    line_no
                );
                diagnostics.push(Diagnostic {
                    line: line_no,
                    keyword: keyword.to_string(),
                });
                continue;
            };
            apply_property(material, directive, &args, rest, line_no, strict)?;
        }

        Ok(MaterialLibrary {
            materials,
            diagnostics,
        })
    }
}

fn apply_property(
    material: &mut Material,
    directive: Directive,
    args: &[&str],
    rest: &str,
    line: usize,
    strict: bool,
) -> Result<(), ParseError> {
    match directive {
        Directive::Ns => material.shininess = Some(first_float(args, line, strict)?),
        Directive::Ka => material.ambient = Some(tuple3(&parse_floats(args, line, strict)?)),
        Directive::Kd => material.diffuse = Some(tuple3(&parse_floats(args, line, strict)?)),
        Directive::Ks => material.specular = Some(tuple3(&parse_floats(args, line, strict)?)),
        Directive::Ke => material.emissive = Some(tuple3(&parse_floats(args, line, strict)?)),
        Directive::Ni => material.optical_density = Some(first_float(args, line, strict)?),
        Directive::D => material.opacity = Some(first_float(args, line, strict)?),
        // An integer slot cannot carry the NaN sentinel; the lenient
        // fallback collapses to 0.
        Directive::Illum => {
            material.illum = Some(parse_int(args.first().copied().unwrap_or(""), line, strict)? as i32)
        }
        Directive::MapKd => material.diffuse_map = Some(rest.to_string()),
        Directive::MapNs => material.specular_map = Some(rest.to_string()),
        Directive::MapBump => material.normal_map = Some(rest.to_string()),
        // Handled by the caller before dispatching here.
        Directive::NewMtl => {}
    }
    Ok(())
}

/// Parse an MTL document with default (lenient) options.
pub fn parse_mtl_str(text: &str) -> MaterialLibrary {
    // Lenient mode has no failure path.
    MtlParser::new().parse(text).unwrap_or_default()
}
