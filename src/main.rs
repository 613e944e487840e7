use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reveal_gallery::{AppConfig, GalleryConfig};

#[derive(Parser, Debug)]
#[command(name = "reveal-gallery", version, about = "Animated image-reveal gallery")]
struct Cli {
    /// Gallery layout JSON. Defaults to the built-in eight-plane header.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show the single-plane page with orbit camera and debug panel.
    #[arg(long, default_value_t = false, conflicts_with = "config")]
    controls: bool,

    /// Directory that relative image paths are resolved against.
    #[arg(long, default_value = ".")]
    image_root: PathBuf,

    /// Window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let gallery = match &cli.config {
        Some(path) => GalleryConfig::load(path)
            .with_context(|| format!("loading gallery config {}", path.display()))?,
        None if cli.controls => GalleryConfig::controls(),
        None => GalleryConfig::default(),
    }
    .with_image_root(&cli.image_root);

    let app = AppConfig::new()
        .title("Reveal Gallery")
        .size(cli.width, cli.height);

    reveal_gallery::run(app, gallery).context("gallery exited with an error")?;
    Ok(())
}
