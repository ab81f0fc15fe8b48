mod canvas;
#[allow(clippy::module_inception)]
mod visualizer;

pub use canvas::{Canvas, Gradient, Rgb};
pub use visualizer::{
    Visualizer, VisualizerConfig, BACKGROUND, GRADIENT_BOTTOM, GRADIENT_TOP,
};
