//! Offline renderer: draws persisted annotations over an image and writes the
//! composited canvas to a PNG.
//!
//! ```text
//! annotator-render <annotations.json> <output.png> [--image PATH] [--size WxH] [--config PATH]
//! ```
//!
//! The natural size comes from `--image` when given, otherwise from `--size`.

use std::path::PathBuf;
use std::process::ExitCode;

use annotator::config::{init_logger, ConfigError, LogLevel};
use annotator::format::{load_annotations_file, FormatError};
use annotator::model::Size;
use annotator::{Editor, EditorConfig, EditorError};
use clap::Parser;

#[derive(Debug, thiserror::Error)]
enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Image size unknown: pass --image or --size")]
    UnknownSize,

    #[error("Nothing to render")]
    EmptyCanvas,
}

/// Render persisted annotations over an image into a PNG.
#[derive(Debug, Parser)]
#[command(name = "annotator-render")]
#[command(version, about)]
struct Args {
    /// Persisted annotations (JSON array).
    annotations: PathBuf,

    /// Output PNG path.
    output: PathBuf,

    /// Source image; its size becomes the natural size.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Natural size as WIDTHxHEIGHT when no image is given.
    #[arg(long, value_parser = parse_size, required_unless_present = "image")]
    size: Option<Size>,

    /// Editor configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_size(value: &str) -> Result<Size, String> {
    let parsed = value.split_once(['x', 'X']).and_then(|(w, h)| {
        Some(Size::new(w.trim().parse().ok()?, h.trim().parse().ok()?))
    });
    match parsed {
        Some(size) if !size.is_empty() => Ok(size),
        _ => Err(format!("expected WIDTHxHEIGHT with a positive area, got '{}'", value)),
    }
}

fn run(args: Args) -> Result<(), RenderError> {
    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    init_logger(config.log_level);

    let pixels = match &args.image {
        Some(path) => Some(image::open(path)?.to_rgba8()),
        None => None,
    };
    let natural = match (&pixels, args.size) {
        (Some(image), _) => Size::new(image.width() as f32, image.height() as f32),
        (None, Some(size)) => size,
        (None, None) => return Err(RenderError::UnknownSize),
    };

    let annotations = load_annotations_file(&args.annotations)?;
    let mut editor = Editor::new(config);
    editor.load_image(natural, natural, &annotations)?;
    if let Some(pixels) = pixels {
        editor.set_image_pixels(pixels);
    }
    if let Err(e) = editor.validate() {
        log::warn!("⚠️ {}", e);
    }

    let canvas = editor
        .redraw()
        .and_then(|layers| layers.to_rgba_image())
        .ok_or(RenderError::EmptyCanvas)?;
    canvas.save(&args.output)?;
    log::info!(
        "Rendered {} annotations to {:?}",
        editor.data().objects.len(),
        args.output
    );
    Ok(())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The logger may not be up yet when the config failed to load
            init_logger(LogLevel::Error);
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("annotator-render").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_positional_and_flags() {
        let parsed = parse(&["a.json", "out.png", "--size", "640x480"]).unwrap();
        assert_eq!(parsed.annotations, PathBuf::from("a.json"));
        assert_eq!(parsed.output, PathBuf::from("out.png"));
        assert_eq!(parsed.size, Some(Size::new(640.0, 480.0)));
        assert!(parsed.image.is_none());

        let parsed = parse(&["a.json", "out.png", "--image", "img.png"]).unwrap();
        assert_eq!(parsed.image, Some(PathBuf::from("img.png")));
        assert!(parsed.size.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse(&["a.json"]).is_err());
        assert!(parse(&["a.json", "out.png"]).is_err());
        assert!(parse(&["a.json", "out.png", "--size", "0x10"]).is_err());
        assert!(parse(&["a.json", "out.png", "--size", "wide"]).is_err());
        assert!(parse(&["a.json", "out.png", "--size", "4x4", "--bogus"]).is_err());
        assert!(parse(&["a.json", "out.png", "--image"]).is_err());
    }

    #[test]
    fn test_size_accepts_either_separator() {
        assert_eq!(parse_size("10X20"), Ok(Size::new(10.0, 20.0)));
        assert_eq!(parse_size(" 3 x 4 "), Ok(Size::new(3.0, 4.0)));
    }
}
