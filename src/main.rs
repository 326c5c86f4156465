use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use goggles::{config, FaceLandmarks, GogglesTransform, Placement, YuNetDetector};
use image::DynamicImage;
use log::{info, warn};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "goggles")]
#[command(version, about = "Occlude faces with synthetic goggles for dataset augmentation")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw goggles over the first face in an image
    Apply {
        /// Input image
        input: PathBuf,
        /// Output image (defaults to <input>_goggles.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print a JSON report of the placement
        #[arg(long)]
        json: bool,
    },
    /// Detect a face and print landmarks and goggles geometry
    Inspect {
        /// Input image
        input: PathBuf,
    },
    /// Open config file in editor
    Config,
}

#[derive(Serialize)]
struct Report<'a> {
    input: &'a Path,
    output: &'a Path,
    width: u32,
    height: u32,
    placement: Option<Placement>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_target(false)
        .format_timestamp(None)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Apply {
            input,
            output,
            json,
        } => {
            let cfg = config::load_config(config_path)?;
            let output = output.unwrap_or_else(|| default_output(&input));
            apply(&cfg, &input, &output, json)
        }
        Commands::Inspect { input } => {
            let cfg = config::load_config(config_path)?;
            inspect(&cfg, &input)
        }
        Commands::Config => open_config(config_path),
    }
}

fn transform(cfg: &config::Config) -> Result<GogglesTransform<YuNetDetector>> {
    info!("Loading detector: {}", cfg.model_path.display());
    let detector = YuNetDetector::open(&cfg.model_path, cfg.score_threshold, cfg.nms_threshold)
        .context("Failed to initialize face detector")?;
    Ok(GogglesTransform::new(detector).with_angle_mode(cfg.angle_mode))
}

fn apply(cfg: &config::Config, input: &Path, output: &Path, json: bool) -> Result<()> {
    let img = image::open(input).with_context(|| format!("opening {}", input.display()))?;
    let keep_alpha = img.color().has_alpha();
    let (width, height) = (img.width(), img.height());

    let mut transform = transform(cfg)?;
    let (out, placement) = transform
        .apply_with_placement(img.to_rgba8())
        .with_context(|| format!("applying goggles to {}", input.display()))?;

    match &placement {
        Some(p) => info!(
            "Goggles placed at ({:.1}, {:.1}), {:.1}x{:.1}, angle {:.2}",
            p.geometry.eye_midpoint.x,
            p.geometry.eye_midpoint.y,
            p.geometry.width,
            p.geometry.height,
            p.geometry.angle_degrees
        ),
        None => warn!("No face detected in {}, writing it unchanged", input.display()),
    }

    let out = DynamicImage::ImageRgba8(out);
    let out = if keep_alpha {
        out
    } else {
        DynamicImage::ImageRgb8(out.to_rgb8())
    };
    out.save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    info!("✓ Wrote {}", output.display());

    if json {
        let report = Report {
            input,
            output,
            width,
            height,
            placement,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn inspect(cfg: &config::Config, input: &Path) -> Result<()> {
    let img = image::open(input)
        .with_context(|| format!("opening {}", input.display()))?
        .to_rgba8();
    let mut transform = transform(cfg)?;

    let Some((detection, geometry)) = transform.inspect(&img)? else {
        info!("No face detected in {}", input.display());
        return Ok(());
    };

    println!("Faces detected: {}", detection.face_count());
    if let Some(bbox) = detection.first_box() {
        println!(
            "BBox: [{:.1}, {:.1}, {:.1}, {:.1}] (x, y, w, h)",
            bbox[0], bbox[1], bbox[2], bbox[3]
        );
    }
    if let Some(flat) = detection.first_landmarks() {
        let lm = FaceLandmarks::from_flat(flat)?;
        let names = ["LeftEye", "RightEye", "Nose", "LeftMouth", "RightMouth"];
        println!("Landmarks:");
        for (name, p) in names.iter().zip(lm.points()) {
            println!("  {}: ({:.1}, {:.1})", name, p.x, p.y);
        }
    }
    println!(
        "Goggles: {:.1}x{:.1} at ({:.1}, {:.1}), angle {:.2} deg ({:?})",
        geometry.width,
        geometry.height,
        geometry.eye_midpoint.x,
        geometry.eye_midpoint.y,
        geometry.angle_degrees,
        transform.angle_mode()
    );
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    input.with_file_name(format!("{}_goggles.{}", stem, ext))
}

fn open_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(&config::CONFIG_PATH);
    if !config_path.exists() {
        config::save_config(&config::Config::default(), Some(config_path))
            .context("Failed to write default config")?;
        info!("Wrote default config to {}", config_path.display());
    }

    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_keeps_extension() {
        assert_eq!(
            default_output(Path::new("data/face.jpg")),
            PathBuf::from("data/face_goggles.jpg")
        );
        assert_eq!(
            default_output(Path::new("face")),
            PathBuf::from("face_goggles.png")
        );
    }

    #[test]
    fn cli_parses_apply() {
        let cli = Cli::try_parse_from(["goggles", "apply", "in.png", "-o", "out.png", "--json"])
            .unwrap();
        match cli.command {
            Commands::Apply {
                input,
                output,
                json,
            } => {
                assert_eq!(input, PathBuf::from("in.png"));
                assert_eq!(output, Some(PathBuf::from("out.png")));
                assert!(json);
            }
            _ => panic!("expected apply"),
        }
    }
}
