//! CLI driver: parse an OBJ model and its material libraries, assemble
//! render parts, and push them through a logging upload sink.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use asset::mtl::{MaterialLibrary, MtlParser};
use asset::obj::{ObjParser, ParseOptions};
use asset::{Diagnostic, ParsedModel};
use scene::{Attribute, MeshSink, RenderPart, TextureResolver, VertexAttributes, upload_model};

struct CliArgs {
    model: PathBuf,
    strict: bool,
    /// Bypass `mtllib` resolution and read this file instead.
    mtl_override: Option<PathBuf>,
}

fn parse_args() -> Result<CliArgs> {
    let mut model = None;
    let mut strict = false;
    let mut mtl_override = None;

    for arg in std::env::args().skip(1) {
        if arg == "--strict" {
            strict = true;
        } else if let Some(path) = arg.strip_prefix("--mtl=") {
            mtl_override = Some(PathBuf::from(path));
        } else if arg.starts_with("--") {
            eprintln!("[warn] Unknown flag '{}', ignoring.", arg);
        } else {
            model = Some(PathBuf::from(arg));
        }
    }

    match model {
        Some(model) => Ok(CliArgs {
            model,
            strict,
            mtl_override,
        }),
        None => bail!("Usage: app [--strict] [--mtl=FILE] MODEL.obj"),
    }
}

/// Texture "resolution" that hands back the path itself, logging each
/// distinct reference once. A real host would upload and memoize here.
#[derive(Default)]
struct PathTextures {
    seen: HashSet<String>,
}

impl TextureResolver for PathTextures {
    type Handle = String;

    fn resolve(&mut self, path: &str) -> String {
        if self.seen.insert(path.to_string()) {
            log::info!("Texture reference: {}", path);
        }
        path.to_string()
    }

    fn default_white(&mut self) -> String {
        "<default-white>".to_string()
    }

    fn default_normal(&mut self) -> String {
        "<default-normal>".to_string()
    }
}

/// Upload service that only reports what it would send to the GPU.
#[derive(Default)]
struct LogSink {
    next_id: u32,
}

impl MeshSink<String> for LogSink {
    type Drawable = u32;

    fn upload(&mut self, part: &RenderPart<String>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        log::info!(
            "part #{}: object='{}' material='{}' vertices={} [{}]",
            id,
            part.object,
            part.material.name,
            part.vertex_count,
            describe_attributes(&part.attributes),
        );
        id
    }
}

fn describe_attributes(attributes: &VertexAttributes) -> String {
    fn label(attribute: &Attribute) -> &'static str {
        match attribute {
            Attribute::Buffer { .. } => "buffer",
            Attribute::Constant(_) => "constant",
        }
    }
    format!(
        "position={} texcoord={} normal={} color={} tangent={}",
        label(&attributes.position),
        label(&attributes.texcoord),
        label(&attributes.normal),
        label(&attributes.color),
        label(&attributes.tangent),
    )
}

fn report_diagnostics(source: &str, diagnostics: &[Diagnostic]) {
    if !diagnostics.is_empty() {
        log::warn!(
            "{}: {} unrecognized directive(s), first: '{}' on line {}",
            source,
            diagnostics.len(),
            diagnostics[0].keyword,
            diagnostics[0].line,
        );
    }
}

/// Gather material text for the model: either the override file, or every
/// `mtllib` reference resolved next to the model, concatenated. Missing
/// libraries are tolerated with a warning.
fn collect_material_text(args: &CliArgs, model: &ParsedModel) -> Result<String> {
    if let Some(path) = &args.mtl_override {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read MTL file: {}", path.display()));
    }

    let base = args.model.parent().unwrap_or(Path::new("."));
    let mut texts = Vec::new();
    for name in &model.material_libs {
        let path = base.join(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => texts.push(text),
            Err(err) => log::warn!("Skipping material library {}: {}", path.display(), err),
        }
    }
    Ok(texts.join("\n"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    log::info!("Loading model {} (strict={})", args.model.display(), args.strict);

    let text = std::fs::read_to_string(&args.model)
        .with_context(|| format!("Failed to read OBJ file: {}", args.model.display()))?;
    let options = ParseOptions {
        strict: args.strict,
    };
    let model = ObjParser::with_options(options)
        .parse(&text)
        .with_context(|| format!("Failed to parse {}", args.model.display()))?;
    report_diagnostics("OBJ", &model.diagnostics);
    log::info!(
        "Parsed {} geometries, {} material library reference(s)",
        model.geometries.len(),
        model.material_libs.len()
    );

    let material_text = collect_material_text(&args, &model)?;
    let library: MaterialLibrary = MtlParser::with_options(options)
        .parse(&material_text)
        .context("Failed to parse material libraries")?;
    report_diagnostics("MTL", &library.diagnostics);
    log::info!("Loaded {} material(s)", library.len());

    if let Some(extents) = model.extents() {
        log::info!(
            "Model extents: min={:?} max={:?} center={:?}",
            extents.min,
            extents.max,
            extents.center()
        );
    }

    let mut resolver = PathTextures::default();
    let mut sink = LogSink::default();
    let drawables = upload_model(&model, &library, &mut resolver, &mut sink);
    log::info!("Assembled {} part(s). Bye!", drawables.len());
    Ok(())
}
