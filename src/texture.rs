use crate::color::Color;
use crate::config::TextureConfig;
use ab_glyph::{point, Font, FontArc, Glyph, PxScale, ScaleFont};
use anyhow::{bail, Context, Result};
use image::{Pixel, Rgba, RgbaImage};
use std::fmt;
use std::fs;
use std::path::Path;

pub const MIN_TEXTURE_SIZE: u32 = 128;
const MAX_LABEL_CHARS: usize = 3;
const MAX_GLYPH_SIZE: f32 = 2048.0;
const MAX_TEXTURE_SIZE: u32 = 8192;
const DISAMBIGUATION_MARK: &str = "  .";
const FACE_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

/// Short text printed on a die face.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaceLabel(String);

impl FaceLabel {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let count = text.chars().count();
        if count == 0 || count > MAX_LABEL_CHARS {
            bail!("Face label '{text}' must be 1..={MAX_LABEL_CHARS} characters long");
        }
        if text.trim().is_empty() {
            bail!("Face label must contain something besides whitespace");
        }
        if let Some(bad) = text.chars().find(|ch| ch.is_control()) {
            bail!("Face label {text:?} contains control character {bad:?}");
        }
        Ok(Self(text))
    }

    pub fn number(value: u32) -> Result<Self> {
        Self::new(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Labels that read the same upside down get a trailing period.
    pub fn needs_disambiguation(&self) -> bool {
        matches!(self.0.as_str(), "6" | "9")
    }
}

impl fmt::Display for FaceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generated face bitmap. Regenerate rather than mutate when the label or colors change.
#[derive(Clone)]
pub struct Texture {
    label: FaceLabel,
    text_color: Color,
    back_color: Color,
    image: RgbaImage,
}

impl Texture {
    pub fn label(&self) -> &FaceLabel {
        &self.label
    }

    pub fn text_color(&self) -> Color {
        self.text_color
    }

    pub fn back_color(&self) -> Color {
        self.back_color
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn size(&self) -> u32 {
        self.image.width()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.image.save(path).with_context(|| format!("Failed to write texture {}", path.display()))
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("label", &self.label)
            .field("text_color", &self.text_color)
            .field("back_color", &self.back_color)
            .field("size", &self.size())
            .finish()
    }
}

/// `max(128, 2^floor(log2(approx)))`.
pub fn calculate_texture_size(approx: f32) -> u32 {
    if !(approx >= MIN_TEXTURE_SIZE as f32) {
        return MIN_TEXTURE_SIZE;
    }
    let exponent = approx.log2().floor() as u32;
    (1u32 << exponent.min(31)).max(MIN_TEXTURE_SIZE)
}

#[derive(Clone)]
pub struct TextureGenerator {
    glyph_size: f32,
    margin: f32,
    font: FontArc,
}

impl TextureGenerator {
    /// Generator using the embedded bold sans face.
    pub fn new(glyph_size: f32, margin: f32) -> Result<Self> {
        let font = FontArc::try_from_slice(FACE_FONT).context("embedded face font is unreadable")?;
        Self::with_font(glyph_size, margin, font)
    }

    pub fn with_font(glyph_size: f32, margin: f32, font: FontArc) -> Result<Self> {
        if !glyph_size.is_finite() || glyph_size <= 0.0 || glyph_size > MAX_GLYPH_SIZE {
            bail!("Glyph size {glyph_size} must be in (0, {MAX_GLYPH_SIZE}]");
        }
        if !margin.is_finite() || margin < 0.0 {
            bail!("Text margin {margin} must be finite and non-negative");
        }
        if glyph_size / 2.0 + glyph_size * margin >= MAX_TEXTURE_SIZE as f32 {
            bail!("Glyph size {glyph_size} with margin {margin} exceeds {MAX_TEXTURE_SIZE}px textures");
        }
        Ok(Self { glyph_size, margin, font })
    }

    /// Builds the generator from config, loading `font` from disk when one is set.
    pub fn from_config(config: &TextureConfig) -> Result<Self> {
        match &config.font {
            Some(path) => {
                let font = load_font(path)?;
                Self::with_font(config.glyph_size, config.margin, font)
            }
            None => Self::new(config.glyph_size, config.margin),
        }
    }

    /// Side length of every texture this generator produces.
    pub fn texture_size(&self) -> u32 {
        calculate_texture_size(self.glyph_size / 2.0 + self.glyph_size * self.margin) * 2
    }

    pub fn font_size(&self) -> f32 {
        self.texture_size() as f32 / (1.0 + 2.0 * self.margin)
    }

    pub fn generate(&self, label: &FaceLabel, text_color: Color, back_color: Color) -> Texture {
        let size = self.texture_size();
        let mut image = RgbaImage::from_pixel(size, size, Rgba(back_color.to_rgba()));
        let center = size as f32 / 2.0;
        let scale = PxScale::from(self.font_size());

        draw_centered(&mut image, &self.font, scale, label.as_str(), text_color, center, center);
        if label.needs_disambiguation() {
            draw_centered(&mut image, &self.font, scale, DISAMBIGUATION_MARK, text_color, center, center);
        }

        Texture { label: label.clone(), text_color, back_color, image }
    }

    /// Same as [`generate`](Self::generate) but from color specs; rejects invalid specs before drawing.
    pub fn generate_from_specs(&self, label: &FaceLabel, text_color: &str, back_color: &str) -> Result<Texture> {
        let text = Color::parse(text_color).with_context(|| format!("text color for label '{label}'"))?;
        let back = Color::parse(back_color).with_context(|| format!("background color for label '{label}'"))?;
        Ok(self.generate(label, text, back))
    }
}

impl fmt::Debug for TextureGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureGenerator")
            .field("glyph_size", &self.glyph_size)
            .field("margin", &self.margin)
            .field("texture_size", &self.texture_size())
            .finish_non_exhaustive()
    }
}

fn load_font(path: &Path) -> Result<FontArc> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
    FontArc::try_from_vec(bytes).with_context(|| format!("Failed to parse font {}", path.display()))
}

/// Lays `text` out on one line and draws it centered on `(cx, cy)`, vertically centered on the
/// ascent/descent box the way a canvas `middle` baseline does.
fn draw_centered(
    canvas: &mut RgbaImage,
    font: &FontArc,
    scale: PxScale,
    text: &str,
    color: Color,
    cx: f32,
    cy: f32,
) {
    let scaled = font.as_scaled(scale);
    let mut glyphs: Vec<Glyph> = Vec::with_capacity(text.len());
    let mut caret = 0.0;
    let mut previous = None;
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(previous) = previous {
            caret += scaled.kern(previous, id);
        }
        glyphs.push(id.with_scale_and_position(scale, point(caret, 0.0)));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }

    let left = cx - caret / 2.0;
    let baseline = cy - (scaled.ascent() - scaled.descent()) / 2.0 + scaled.ascent();
    let (width, height) = canvas.dimensions();
    for mut glyph in glyphs {
        glyph.position = point(glyph.position.x + left, baseline);
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|x, y, coverage| {
            let px = bounds.min.x as i64 + x as i64;
            let py = bounds.min.y as i64 + y as i64;
            if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                return;
            }
            let alpha = (coverage.clamp(0.0, 1.0) * color.a as f32).round() as u8;
            if alpha > 0 {
                canvas.get_pixel_mut(px as u32, py as u32).blend(&Rgba([color.r, color.g, color.b, alpha]));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_size_follows_power_of_two_floor() {
        assert_eq!(calculate_texture_size(0.0), 128);
        assert_eq!(calculate_texture_size(f32::NAN), 128);
        assert_eq!(calculate_texture_size(150.0), 128);
        assert_eq!(calculate_texture_size(255.9), 128);
        assert_eq!(calculate_texture_size(256.0), 256);
        assert_eq!(calculate_texture_size(1000.0), 512);
    }

    #[test]
    fn default_generator_produces_256_square() {
        let generator = TextureGenerator::from_config(&TextureConfig::default()).unwrap();
        assert_eq!(generator.texture_size(), 256);
        assert!((generator.font_size() - 256.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn rejects_bad_generator_parameters() {
        assert!(TextureGenerator::new(0.0, 1.0).is_err());
        assert!(TextureGenerator::new(f32::INFINITY, 1.0).is_err());
        assert!(TextureGenerator::new(100.0, -0.5).is_err());
        assert!(TextureGenerator::new(2000.0, 1e9).is_err());
    }

    #[test]
    fn label_validation() {
        assert!(FaceLabel::new("").is_err());
        assert!(FaceLabel::new("1234").is_err());
        assert!(FaceLabel::new("   ").is_err());
        assert!(FaceLabel::new("1\n").is_err());
        assert_eq!(FaceLabel::new("A").unwrap().as_str(), "A");
        assert_eq!(FaceLabel::number(12).unwrap().as_str(), "12");
        assert!(FaceLabel::new("6").unwrap().needs_disambiguation());
        assert!(!FaceLabel::new("66").unwrap().needs_disambiguation());
    }

    #[test]
    fn font_file_from_config_is_loaded_or_reported() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = dir.path().join("face.ttf");
        fs::write(&font_path, FACE_FONT).unwrap();
        let config = TextureConfig { font: Some(font_path), ..TextureConfig::default() };
        let generator = TextureGenerator::from_config(&config).unwrap();
        assert_eq!(generator.texture_size(), 256);

        let garbage = dir.path().join("garbage.ttf");
        fs::write(&garbage, b"not a font").unwrap();
        let err = TextureGenerator::from_config(&TextureConfig { font: Some(garbage), ..TextureConfig::default() })
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse font"));

        let missing = TextureConfig { font: Some(dir.path().join("missing.ttf")), ..TextureConfig::default() };
        assert!(TextureGenerator::from_config(&missing).is_err());
    }

    #[test]
    fn antialiased_edges_blend_between_text_and_background() {
        let generator = TextureGenerator::new(100.0, 1.0).unwrap();
        let back = Color::BLACK;
        let texture = generator.generate(&FaceLabel::number(8).unwrap(), Color::WHITE, back);
        let pixels = texture.image().pixels();
        let partial = pixels.filter(|p| p.0[0] > 0 && p.0[0] < 255).count();
        assert!(partial > 0, "outline rasterization should produce partial coverage");
        assert!(texture.image().pixels().all(|p| p.0[3] == 255 && p.0[0] == p.0[1] && p.0[1] == p.0[2]));
    }

    #[test]
    fn invalid_color_spec_fails_before_drawing() {
        let generator = TextureGenerator::new(100.0, 1.0).unwrap();
        let label = FaceLabel::number(1).unwrap();
        assert!(generator.generate_from_specs(&label, "white", "not-a-color").is_err());
        assert!(generator.generate_from_specs(&label, "#zzz", "indigo").is_err());
        assert!(generator.generate_from_specs(&label, "white", "indigo").is_ok());
    }

    #[test]
    fn background_fills_corners() {
        let generator = TextureGenerator::new(100.0, 1.0).unwrap();
        let back = Color::parse("indigo").unwrap();
        let texture = generator.generate(&FaceLabel::number(3).unwrap(), Color::WHITE, back);
        let last = texture.size() - 1;
        for (x, y) in [(0, 0), (last, 0), (0, last), (last, last)] {
            assert_eq!(texture.image().get_pixel(x, y).0, back.to_rgba());
        }
    }
}
