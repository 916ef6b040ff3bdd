//! Command-line argument definitions and type conversions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use streamscale::Boundary;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Edge {
    /// Extend the edge pixels outward
    Clamp,
    /// Mirror the image at its edges
    Reflect,
    /// Treat the image as periodic (tileable textures)
    Wrap,
}

impl Edge {
    pub fn to_boundary(self) -> Boundary {
        match self {
            Edge::Clamp => Boundary::Clamp,
            Edge::Reflect => Boundary::Reflect,
            Edge::Wrap => Boundary::Wrap,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "streamscale",
    about = "Streaming separable image rescaler",
    long_about = "Rescales an image by separable convolution, streaming it through one \
                  resample engine per channel. RGB channels are filtered in linear light \
                  unless --no-linear is given."
)]
pub struct Args {
    /// Input image (any format the image crate decodes)
    pub input: Option<PathBuf>,

    /// Output image path (encoded from the extension; PNG recommended)
    pub output: Option<PathBuf>,

    /// Destination width in pixels
    #[arg(short = 'W', long)]
    pub width: Option<u32>,

    /// Destination height in pixels; when only one of --width/--height is
    /// given the other follows the source aspect ratio
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Reconstruction filter (see --list-filters for the registry)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Edge handling for samples outside the source image
    #[arg(long, value_enum, default_value_t = Edge::Clamp)]
    pub edge: Edge,

    /// Kernel width multiplier; values above 1.0 soften the result
    #[arg(long, default_value_t = 1.0)]
    pub filter_scale: f32,

    /// Filter raw sRGB values instead of converting to linear light first
    #[arg(long)]
    pub no_linear: bool,

    /// List the registered filter names and exit
    #[arg(long)]
    pub list_filters: bool,
}
