//! In-memory drawable surface for the frequency-bar renderer.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

/// Two-color vertical gradient sampled by row.
#[derive(Debug, Clone, Copy)]
pub struct Gradient {
    pub top: Rgb,
    pub bottom: Rgb,
}

impl Gradient {
    pub const fn new(top: Rgb, bottom: Rgb) -> Self {
        Self { top, bottom }
    }

    /// Color at normalized vertical position `t` (0 = top, 1 = bottom).
    pub fn at(&self, t: f32) -> Rgb {
        self.top.lerp(self.bottom, t)
    }
}

/// Fixed-size RGB pixel surface.
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
    frames_painted: u64,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![Rgb::new(0, 0, 0); width * height],
            frames_painted: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of completed paint passes.
    pub fn frames_painted(&self) -> u64 {
        self.frames_painted
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.iter_mut().for_each(|p| *p = color);
    }

    /// Fill a rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: Rgb) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.pixels[row * self.width + col] = color;
            }
        }
    }

    /// Paint one frame of frequency bars: clear to the background, then one
    /// vertical bar per bin, bottom-aligned, height proportional to the bin
    /// magnitude, colored by the vertical gradient.
    pub fn paint_bars(&mut self, bins: &[u8], background: Rgb, gradient: Gradient) {
        self.fill(background);

        if !bins.is_empty() {
            let bar_width = (self.width as f32 / bins.len() as f32) * 2.5;
            let mut x = 0.0f32;

            for &magnitude in bins {
                let bar_height =
                    (magnitude as f32 / 255.0 * self.height as f32).round() as usize;
                let left = x as usize;
                if left >= self.width {
                    break;
                }

                let w = bar_width.max(1.0) as usize;
                let top = self.height - bar_height.min(self.height);
                // Row-by-row so each row takes the gradient color at its depth.
                for row in top..self.height {
                    let t = row as f32 / (self.height.saturating_sub(1)).max(1) as f32;
                    self.fill_rect(left, row, w, 1, gradient.at(t));
                }

                x += bar_width + 1.0;
            }
        }

        self.frames_painted += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgb = Rgb::new(20, 20, 30);
    const TOP: Rgb = Rgb::new(0x60, 0xA5, 0xFA);
    const BOTTOM: Rgb = Rgb::new(0x2D, 0xD4, 0xBF);

    #[test]
    fn silent_bins_leave_only_background() {
        let mut canvas = Canvas::new(300, 100);
        canvas.paint_bars(&[0; 128], BG, Gradient::new(TOP, BOTTOM));

        assert_eq!(canvas.frames_painted(), 1);
        for x in [0, 150, 299] {
            for y in [0, 50, 99] {
                assert_eq!(canvas.pixel(x, y), Some(BG));
            }
        }
    }

    #[test]
    fn full_magnitude_bar_reaches_the_top() {
        let mut canvas = Canvas::new(300, 100);
        let mut bins = [0u8; 128];
        bins[0] = 255;
        canvas.paint_bars(&bins, BG, Gradient::new(TOP, BOTTOM));

        // First bar spans the full height; top row takes the top color,
        // bottom row the bottom color.
        assert_eq!(canvas.pixel(0, 0), Some(TOP));
        assert_eq!(canvas.pixel(0, 99), Some(BOTTOM));
        // Pixels right of the first bar (width 300/128*2.5 ~= 5.8) stay
        // background.
        assert_eq!(canvas.pixel(20, 50), Some(BG));
    }

    #[test]
    fn half_magnitude_bar_covers_the_lower_half() {
        let mut canvas = Canvas::new(300, 100);
        let mut bins = [0u8; 128];
        bins[0] = 128;
        canvas.paint_bars(&bins, BG, Gradient::new(TOP, BOTTOM));

        assert_eq!(canvas.pixel(0, 10), Some(BG));
        assert_ne!(canvas.pixel(0, 90), Some(BG));
    }

    #[test]
    fn gradient_interpolates_between_endpoints() {
        let gradient = Gradient::new(Rgb::new(0, 0, 0), Rgb::new(200, 100, 50));
        assert_eq!(gradient.at(0.0), Rgb::new(0, 0, 0));
        assert_eq!(gradient.at(1.0), Rgb::new(200, 100, 50));
        assert_eq!(gradient.at(0.5), Rgb::new(100, 50, 25));
    }

    #[test]
    fn fill_rect_clips_at_the_edges() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill(BG);
        canvas.fill_rect(8, 8, 5, 5, TOP);

        assert_eq!(canvas.pixel(9, 9), Some(TOP));
        assert_eq!(canvas.pixel(7, 7), Some(BG));
    }
}
