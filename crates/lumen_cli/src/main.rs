//! `lumen`: render a sphere scene under an HDR light probe.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lumen_core::{load_radiance, AmbientSource, RenderSettings, SceneDescription};
use lumen_renderer::{
    Camera, IblMaps, IblShader, PathTracer, RenderConfig, Renderer, Scene, SphereMap, Technique,
};

#[derive(Parser, Debug)]
#[command(name = "lumen", version, about)]
struct Args {
    /// Angular light probe in Radiance HDR format
    probe: PathBuf,

    /// Render settings as JSON; missing fields take their defaults
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Scene description as JSON, replacing the demo scene
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Built-in scene used when no --scene is given
    #[arg(long, value_enum, default_value_t)]
    demo: DemoScene,

    #[arg(short, long, value_enum, default_value_t)]
    mode: RenderMode,

    #[arg(short, long, default_value = "lumen.png")]
    output: PathBuf,

    /// Also write the linear render as Radiance HDR
    #[arg(long)]
    hdr: Option<PathBuf>,

    /// Write the precomputed IBL maps into this directory
    #[arg(long)]
    dump_ibl: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long)]
    spp: Option<u32>,

    #[arg(long)]
    max_depth: Option<u32>,

    /// Seed for the demo scene and every random stream of the render
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum DemoScene {
    /// Metal spheres of random roughness around one large metal sphere
    #[default]
    Metals,
    /// Diffuse, metal and glass spheres
    Mixed,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum RenderMode {
    /// Importance-sampled path tracing
    #[default]
    Path,
    /// Path tracing through the simple scatter contract
    Scatter,
    /// Direct light plus image-based ambient, from the settings' ambient source
    Ibl,
    /// As ibl, with a blurry specular level standing in for irradiance
    IblPseudo,
}

impl RenderMode {
    fn uses_ibl(self) -> bool {
        matches!(self, RenderMode::Ibl | RenderMode::IblPseudo)
    }

    /// Diffuse ambient source of the IBL modes; `configured` comes from the
    /// shading settings.
    fn ambient_source(self, configured: AmbientSource) -> Option<AmbientSource> {
        match self {
            RenderMode::Ibl => Some(configured),
            RenderMode::IblPseudo => Some(AmbientSource::SpecularMip),
            RenderMode::Path | RenderMode::Scatter => None,
        }
    }
}

/// Settings file (or defaults) with command-line overrides applied.
fn load_settings(args: &Args) -> Result<RenderSettings> {
    let mut settings = match &args.settings {
        Some(path) => RenderSettings::load(path)
            .with_context(|| format!("Failed to load settings {}", path.display()))?,
        None => RenderSettings::default(),
    };

    if let Some(width) = args.width {
        settings.width = width;
    }
    if let Some(height) = args.height {
        settings.height = height;
    }
    if let Some(spp) = args.spp {
        settings.samples_per_pixel = spp;
    }
    if let Some(max_depth) = args.max_depth {
        settings.max_depth = max_depth;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }

    settings.validate().context("Invalid render settings")?;
    log::debug!("Settings: {:?}", settings);
    Ok(settings)
}

fn load_scene(args: &Args, seed: u64) -> Result<SceneDescription> {
    match &args.scene {
        Some(path) => SceneDescription::load(path)
            .with_context(|| format!("Failed to load scene {}", path.display())),
        None => Ok(match args.demo {
            DemoScene::Metals => SceneDescription::demo_metals(seed),
            DemoScene::Mixed => SceneDescription::demo_mixed(seed),
        }),
    }
}

/// Write every precomputed map as HDR, plus a PNG preview of each.
fn dump_ibl(maps: &IblMaps, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut named = vec![("irradiance".to_string(), &maps.irradiance)];
    for (level, map) in maps.specular.iter().enumerate() {
        named.push((format!("specular_{level}"), map));
    }
    named.push(("brdf".to_string(), &maps.brdf));

    for (name, map) in named {
        let hdr = dir.join(format!("{name}.hdr"));
        map.save_hdr(&hdr)
            .with_context(|| format!("Failed to write {}", hdr.display()))?;
        let png = dir.join(format!("{name}.png"));
        map.save_png(&png)
            .with_context(|| format!("Failed to write {}", png.display()))?;
    }
    log::info!("Wrote IBL maps to {}", dir.display());
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let settings = load_settings(&args)?;
    let description = load_scene(&args, settings.seed)?;
    let scene = Scene::from_description(&description);
    log::info!("Scene has {} spheres", scene.len());

    let probe = load_radiance(&args.probe)
        .with_context(|| format!("Failed to load light probe {}", args.probe.display()))?;
    let env = SphereMap::from_image(probe);

    let maps = if args.mode.uses_ibl() || args.dump_ibl.is_some() {
        Some(IblMaps::generate(&env, &settings.ibl))
    } else {
        None
    };
    if let (Some(maps), Some(dir)) = (&maps, &args.dump_ibl) {
        dump_ibl(maps, dir)?;
    }

    let config = RenderConfig::from_settings(&settings);
    let tracer = PathTracer::new(config.max_depth);
    let technique = match (args.mode, &maps) {
        (RenderMode::Path, _) => Technique::Path(tracer),
        (RenderMode::Scatter, _) => Technique::Scatter(tracer),
        (mode, Some(maps)) => {
            let source = mode
                .ambient_source(settings.shading.ambient_source)
                .unwrap_or_default();
            Technique::Ibl {
                shader: IblShader::new(&settings.shading).with_ambient_source(source),
                maps,
            }
        }
        (mode, None) => anyhow::bail!("IBL maps missing for mode {:?}", mode),
    };

    let camera = Camera::from_settings(&settings.camera, settings.width, settings.height);
    let renderer = Renderer::new(camera, &scene, &env, technique, &config);

    let name = args
        .output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lumen".to_string());
    let image = renderer.render(&name);

    image
        .save_png(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    log::info!("Wrote {}", args.output.display());

    if let Some(path) = &args.hdr {
        image
            .save_hdr(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {}", path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    run(Args::parse())
}
