//! `generate-heart-qr` — synthesize a silhouette-shaped QR PNG.
//!
//! Exits non-zero when the scannability check fails, so build scripts
//! can gate on the verdict.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use qr_shaper::{Caption, Logo, RunConfig, Strategy, Verdict, config, synthesize};
use silhouette::Curve;

#[derive(Parser, Debug)]
#[command(version, about = "Shape-constrained QR code generator")]
struct Cli {
    /// The URL (or any text payload) to encode
    url: String,

    /// Output PNG path
    out: PathBuf,

    /// JSON run configuration; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Canvas side length in pixels
    #[arg(long)]
    canvas: Option<u32>,

    /// Target symbol side length in pixels
    #[arg(long)]
    qr_size: Option<u32>,

    /// Transform strategy (default: auto-selected, never polar-morph)
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Force a silhouette scale in pixels per curve unit
    #[arg(long)]
    scale: Option<f32>,

    /// Silhouette curve: heart | bridged-heart
    #[arg(long)]
    curve: Option<String>,

    /// Caption text drawn beneath the silhouette
    #[arg(long)]
    caption: Option<String>,

    /// TTF/OTF font for the caption
    #[arg(long)]
    font: Option<PathBuf>,

    /// Logo image overlaid in the top-left corner
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Dark module color, #rrggbb
    #[arg(long)]
    dark: Option<String>,

    /// Light module color, #rrggbb
    #[arg(long)]
    light: Option<String>,

    /// Decode timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    report: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Clip,
    EnlargedSafeClip,
    PolarMorph,
}

impl From<StrategyArg> for Strategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Clip => Strategy::Clip,
            StrategyArg::EnlargedSafeClip => Strategy::EnlargedSafeClip,
            StrategyArg::PolarMorph => Strategy::PolarMorph,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    tracing::info!(url = %cli.url, canvas_px = config.canvas_px, "Starting synthesis");

    let mut result = synthesize(&cli.url, &config)
        .await
        .context("synthesis failed")?;

    fs::write(&cli.out, &result.png)
        .with_context(|| format!("failed to write {}", cli.out.display()))?;
    result.report.output_path = Some(cli.out.clone());

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&result.report)?);
    }

    let validation = &result.report.validation;
    match validation.verdict {
        Verdict::Pass => {
            println!(
                "PASS: {} decodes back ({}% of modules recovered), wrote {}",
                cli.url,
                (validation.modules_recovered_ratio * 100.0).round(),
                cli.out.display()
            );
            Ok(())
        }
        Verdict::Fail => {
            eprintln!(
                "FAIL: {} did not decode from the composite ({}% of modules recovered)",
                cli.url,
                (validation.modules_recovered_ratio * 100.0).round()
            );
            if result.report.strategy == Strategy::PolarMorph {
                eprintln!("hint: retry with --strategy clip for a conservative transform");
            } else {
                eprintln!("hint: enlarge --canvas or drop the forced --scale");
            }
            std::process::exit(1);
        }
    }
}

fn build_config(cli: &Cli) -> Result<RunConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => RunConfig::default(),
    };

    if let Some(canvas) = cli.canvas {
        cfg.canvas_px = canvas;
    }
    if let Some(qr_size) = cli.qr_size {
        cfg.qr_px = qr_size;
    }
    if let Some(strategy) = cli.strategy {
        cfg.strategy = Some(strategy.into());
    }
    if let Some(scale) = cli.scale {
        cfg.silhouette.scale = Some(scale);
        cfg.silhouette.auto_fit = false;
    }
    if let Some(curve) = &cli.curve {
        cfg.silhouette.curve = curve.parse::<Curve>().map_err(anyhow::Error::from)?;
    }
    if let Some(dark) = &cli.dark {
        cfg.palette.dark = config::parse_hex_color(dark)?;
        cfg.palette.stroke = cfg.palette.dark;
    }
    if let Some(light) = &cli.light {
        cfg.palette.light = config::parse_hex_color(light)?;
    }
    if let Some(timeout) = cli.timeout_ms {
        cfg.decode_timeout_ms = timeout;
    }

    if let Some(text) = &cli.caption {
        let Some(font) = &cli.font else {
            bail!("--caption requires --font <path to a .ttf/.otf>");
        };
        cfg.decoration.caption = Some(Caption {
            text: text.clone(),
            font_path: font.clone(),
            px: 48.0,
            origin: None,
        });
    }
    if let Some(logo) = &cli.logo {
        cfg.decoration.logo = Some(Logo {
            path: logo.clone(),
            px: 120,
            origin: None,
        });
    }

    Ok(cfg)
}
