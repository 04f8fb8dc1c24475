//! Colors, text styles and ANSI SGR emission.
//!
//! Styles are folded along the renderer's stack: a field left unset by a
//! nested style inherits from the enclosing one. Truecolor values are
//! down-sampled to the 256- or 16-color palette by nearest CIE76 (Lab)
//! distance, which is deterministic for a given input.

use crate::term::ColorSupport;

/// A terminal color. `Ansi` indices 0-7 are the basic colors, 8-15 their
/// bright variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Ansi(u8),
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl Color {
    pub const BLACK: Color = Color::Ansi(0);
    pub const RED: Color = Color::Ansi(1);
    pub const GREEN: Color = Color::Ansi(2);
    pub const YELLOW: Color = Color::Ansi(3);
    pub const BLUE: Color = Color::Ansi(4);
    pub const MAGENTA: Color = Color::Ansi(5);
    pub const CYAN: Color = Color::Ansi(6);
    pub const WHITE: Color = Color::Ansi(7);
    pub const GRAY: Color = Color::Ansi(8);
    pub const BRIGHT_RED: Color = Color::Ansi(9);
    pub const BRIGHT_GREEN: Color = Color::Ansi(10);
    pub const BRIGHT_YELLOW: Color = Color::Ansi(11);
    pub const BRIGHT_BLUE: Color = Color::Ansi(12);
    pub const BRIGHT_MAGENTA: Color = Color::Ansi(13);
    pub const BRIGHT_CYAN: Color = Color::Ansi(14);
    pub const BRIGHT_WHITE: Color = Color::Ansi(15);

    /// Reduces the color to what `support` can display. Returns `None` when
    /// the sink displays no color at all.
    pub fn adapt(self, support: ColorSupport) -> Option<Color> {
        match support {
            ColorSupport::None => None,
            ColorSupport::TrueColor => Some(self),
            ColorSupport::Ansi256 => Some(match self {
                Color::Rgb(r, g, b) => Color::Indexed(nearest_ansi256(r, g, b)),
                other => other,
            }),
            ColorSupport::Ansi16 => Some(match self {
                Color::Rgb(r, g, b) => Color::Ansi(nearest_ansi16(r, g, b)),
                Color::Indexed(i) => {
                    let (r, g, b) = ansi256_to_rgb(i);
                    Color::Ansi(nearest_ansi16(r, g, b))
                }
                ansi => ansi,
            }),
        }
    }

    fn sgr(self, background: bool, out: &mut Vec<String>) {
        let offset: u8 = if background { 10 } else { 0 };
        match self {
            Color::Ansi(n) if n < 8 => out.push((30 + offset + n).to_string()),
            Color::Ansi(n) => out.push((90 + offset + (n - 8) % 8).to_string()),
            Color::Indexed(n) => out.push(format!("{};5;{}", 38 + offset, n)),
            Color::Rgb(r, g, b) => out.push(format!("{};2;{};{};{}", 38 + offset, r, g, b)),
        }
    }
}

/// Style fields carried by an `AnsiStyled` span. Unset fields inherit from
/// the enclosing style on the render stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub dim: Option<bool>,
    pub strikethrough: Option<bool>,
}

impl Style {
    pub fn new() -> Self {
        Style::default()
    }

    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = Some(true);
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = Some(true);
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = Some(true);
        self
    }

    pub fn dim(mut self) -> Self {
        self.dim = Some(true);
        self
    }

    pub fn strikethrough(mut self) -> Self {
        self.strikethrough = Some(true);
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == Style::default()
    }

    /// Overlays `over` on `self`: set fields in `over` win.
    pub fn overlaid(mut self, over: &Style) -> Style {
        if over.fg.is_some() {
            self.fg = over.fg;
        }
        if over.bg.is_some() {
            self.bg = over.bg;
        }
        if over.bold.is_some() {
            self.bold = over.bold;
        }
        if over.italic.is_some() {
            self.italic = over.italic;
        }
        if over.underline.is_some() {
            self.underline = over.underline;
        }
        if over.dim.is_some() {
            self.dim = over.dim;
        }
        if over.strikethrough.is_some() {
            self.strikethrough = over.strikethrough;
        }
        self
    }

    /// Folds a style stack bottom-up into the effective style.
    pub fn effective(stack: &[Style]) -> Style {
        stack
            .iter()
            .fold(Style::default(), |acc, frame| acc.overlaid(frame))
    }

    /// The SGR sequence that applies this style from a reset state, already
    /// down-sampled for `support`. Empty when the effective style is plain or
    /// the sink displays no color.
    pub fn sgr_sequence(&self, support: ColorSupport) -> String {
        if support == ColorSupport::None {
            return String::new();
        }
        let mut codes: Vec<String> = Vec::new();
        if self.bold == Some(true) {
            codes.push("1".into());
        }
        if self.dim == Some(true) {
            codes.push("2".into());
        }
        if self.italic == Some(true) {
            codes.push("3".into());
        }
        if self.underline == Some(true) {
            codes.push("4".into());
        }
        if self.strikethrough == Some(true) {
            codes.push("9".into());
        }
        if let Some(fg) = self.fg.and_then(|c| c.adapt(support)) {
            fg.sgr(false, &mut codes);
        }
        if let Some(bg) = self.bg.and_then(|c| c.adapt(support)) {
            bg.sgr(true, &mut codes);
        }
        if codes.is_empty() {
            String::new()
        } else {
            format!("\x1b[{}m", codes.join(";"))
        }
    }
}

/// xterm's default rendition of the 16 basic colors.
const ANSI16_RGB: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (205, 0, 0),
    (0, 205, 0),
    (205, 205, 0),
    (0, 0, 238),
    (205, 0, 205),
    (0, 205, 205),
    (229, 229, 229),
    (127, 127, 127),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (92, 92, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

/// RGB value of an xterm 256-palette index.
pub(crate) fn ansi256_to_rgb(index: u8) -> (u8, u8, u8) {
    match index {
        0..=15 => ANSI16_RGB[index as usize],
        16..=231 => {
            const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
            let i = index as usize - 16;
            (LEVELS[i / 36], LEVELS[(i / 6) % 6], LEVELS[i % 6])
        }
        232..=255 => {
            let gray = 8 + 10 * (index - 232);
            (gray, gray, gray)
        }
    }
}

fn nearest_ansi16(r: u8, g: u8, b: u8) -> u8 {
    nearest_in(&ANSI16_RGB, r, g, b) as u8
}

fn nearest_ansi256(r: u8, g: u8, b: u8) -> u8 {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    let target = rgb_to_lab(r, g, b);
    for index in 0..=255usize {
        let (cr, cg, cb) = ansi256_to_rgb(index as u8);
        let dist = lab_distance_sq(target, rgb_to_lab(cr, cg, cb));
        if dist < best_dist {
            best_dist = dist;
            best = index;
        }
    }
    best as u8
}

fn nearest_in(palette: &[(u8, u8, u8)], r: u8, g: u8, b: u8) -> usize {
    let target = rgb_to_lab(r, g, b);
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (index, &(cr, cg, cb)) in palette.iter().enumerate() {
        let dist = lab_distance_sq(target, rgb_to_lab(cr, cg, cb));
        if dist < best_dist {
            best_dist = dist;
            best = index;
        }
    }
    best
}

/// sRGB -> CIE L*a*b* under D65. CIE76 distance is then Euclidean in Lab.
fn rgb_to_lab(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    fn linearize(c: u8) -> f64 {
        let c = c as f64 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    let (rl, gl, bl) = (linearize(r), linearize(g), linearize(b));

    let x = (0.4124 * rl + 0.3576 * gl + 0.1805 * bl) / 0.95047;
    let y = 0.2126 * rl + 0.7152 * gl + 0.0722 * bl;
    let z = (0.0193 * rl + 0.1192 * gl + 0.9505 * bl) / 1.08883;

    fn f(t: f64) -> f64 {
        if t > 0.008856 {
            t.cbrt()
        } else {
            7.787 * t + 16.0 / 116.0
        }
    }
    let (fx, fy, fz) = (f(x), f(y), f(z));
    (116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

fn lab_distance_sq(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    let dl = a.0 - b.0;
    let da = a.1 - b.1;
    let db = a.2 - b.2;
    dl * dl + da * da + db * db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_style_inherits_unset_fields() {
        let outer = Style::new().fg(Color::RED).bold();
        let inner = Style::new().fg(Color::BLUE);
        let effective = Style::effective(&[outer, inner]);
        assert_eq!(effective.fg, Some(Color::BLUE));
        assert_eq!(effective.bold, Some(true));
    }

    #[test]
    fn inner_frame_can_disable_an_attribute() {
        let outer = Style::new().bold();
        let inner = Style {
            bold: Some(false),
            ..Style::default()
        };
        assert_eq!(Style::effective(&[outer, inner]).bold, Some(false));
    }

    #[test]
    fn sgr_sequence_for_basic_colors() {
        let style = Style::new().fg(Color::RED).bold();
        assert_eq!(style.sgr_sequence(ColorSupport::Ansi16), "\x1b[1;31m");
        assert_eq!(
            Style::new().fg(Color::BRIGHT_GREEN).sgr_sequence(ColorSupport::Ansi16),
            "\x1b[92m"
        );
        assert_eq!(
            Style::new().bg(Color::BLUE).sgr_sequence(ColorSupport::Ansi16),
            "\x1b[44m"
        );
    }

    #[test]
    fn none_support_emits_nothing() {
        let style = Style::new().fg(Color::Rgb(10, 20, 30)).bold().underline();
        assert_eq!(style.sgr_sequence(ColorSupport::None), "");
    }

    #[test]
    fn truecolor_passes_rgb_through() {
        let style = Style::new().fg(Color::Rgb(1, 2, 3));
        assert_eq!(style.sgr_sequence(ColorSupport::TrueColor), "\x1b[38;2;1;2;3m");
    }

    #[test]
    fn downsampling_is_deterministic_and_exact_on_palette_points() {
        // A palette point maps to itself.
        assert_eq!(Color::Rgb(255, 0, 0).adapt(ColorSupport::Ansi16), Some(Color::Ansi(9)));
        assert_eq!(
            Color::Rgb(0, 0, 0).adapt(ColorSupport::Ansi256),
            Some(Color::Indexed(0))
        );
        // Same input, same output.
        let once = Color::Rgb(123, 57, 200).adapt(ColorSupport::Ansi256);
        let twice = Color::Rgb(123, 57, 200).adapt(ColorSupport::Ansi256);
        assert_eq!(once, twice);
    }

    #[test]
    fn indexed_survives_ansi256_but_downsamples_to_16() {
        assert_eq!(
            Color::Indexed(196).adapt(ColorSupport::Ansi256),
            Some(Color::Indexed(196))
        );
        // 196 is pure red in the cube.
        assert_eq!(Color::Indexed(196).adapt(ColorSupport::Ansi16), Some(Color::Ansi(9)));
    }

    #[test]
    fn color_cube_round_trip() {
        assert_eq!(ansi256_to_rgb(16), (0, 0, 0));
        assert_eq!(ansi256_to_rgb(231), (255, 255, 255));
        assert_eq!(ansi256_to_rgb(232), (8, 8, 8));
        assert_eq!(ansi256_to_rgb(255), (238, 238, 238));
    }
}
