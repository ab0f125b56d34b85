use crate::color::Color;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DieKind {
    D4,
    D6,
}

impl DieKind {
    pub fn label(self) -> &'static str {
        match self {
            DieKind::D4 => "d4",
            DieKind::D6 => "d6",
        }
    }

    pub const fn face_count(self) -> usize {
        match self {
            DieKind::D4 => 4,
            DieKind::D6 => 6,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "d4" => Some(DieKind::D4),
            "d6" => Some(DieKind::D6),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "PhysicsConfig::default_gravity")]
    pub gravity: [f32; 3],
    #[serde(default = "PhysicsConfig::default_fixed_dt")]
    pub fixed_dt: f32,
    #[serde(default = "PhysicsConfig::default_max_backlog")]
    pub max_backlog: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub target: [f32; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnclosureConfig {
    #[serde(default = "EnclosureConfig::default_color")]
    pub color: Color,
    /// Distance from the center to each wall.
    #[serde(default = "EnclosureConfig::default_half_extent")]
    pub half_extent: f32,
    /// Wall rotation in radians; walls lean inward when below a quarter turn.
    #[serde(default = "EnclosureConfig::default_wall_tilt")]
    pub wall_tilt: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextureConfig {
    #[serde(default = "TextureConfig::default_glyph_size")]
    pub glyph_size: f32,
    #[serde(default = "TextureConfig::default_margin")]
    pub margin: f32,
    /// TrueType/OpenType file used instead of the embedded face font.
    #[serde(default)]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct D4Config {
    #[serde(default = "D4Config::default_radius")]
    pub radius: f32,
    #[serde(default = "default_die_mass")]
    pub mass: f32,
    #[serde(default = "D4Config::default_face_colors")]
    pub face_colors: Vec<Color>,
    #[serde(default)]
    pub uv_tab: f32,
    #[serde(default)]
    pub uv_angle_offset: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct D6Config {
    #[serde(default = "D6Config::default_size")]
    pub size: f32,
    #[serde(default = "default_die_mass")]
    pub mass: f32,
    #[serde(default = "D6Config::default_text_color")]
    pub text_color: Color,
    #[serde(default = "D6Config::default_die_color")]
    pub die_color: Color,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiePlacement {
    pub kind: DieKind,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "RunConfig::default_rolls")]
    pub rolls: u32,
    #[serde(default = "RunConfig::default_steps_per_roll")]
    pub steps_per_roll: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub enclosure: EnclosureConfig,
    #[serde(default)]
    pub texture: TextureConfig,
    #[serde(default)]
    pub d4: D4Config,
    #[serde(default)]
    pub d6: D6Config,
    #[serde(default = "AppConfig::default_dice")]
    pub dice: Vec<DiePlacement>,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub seed: Option<u64>,
    pub rolls: Option<u32>,
    pub steps_per_roll: Option<u32>,
    pub dice: Option<Vec<DieKind>>,
}

const fn default_die_mass() -> f32 {
    1.0
}

impl PhysicsConfig {
    const fn default_gravity() -> [f32; 3] {
        [0.0, 0.0, -30.0]
    }

    const fn default_fixed_dt() -> f32 {
        1.0 / 60.0
    }

    const fn default_max_backlog() -> f32 {
        0.25
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Self::default_gravity(),
            fixed_dt: Self::default_fixed_dt(),
            max_backlog: Self::default_max_backlog(),
        }
    }
}

impl CameraConfig {
    const fn default_position() -> [f32; 3] {
        [0.0, -12.0, 16.0]
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { position: Self::default_position(), target: [0.0; 3] }
    }
}

impl EnclosureConfig {
    const fn default_color() -> Color {
        Color::rgb(0x69, 0xd2, 0xe7)
    }

    const fn default_half_extent() -> f32 {
        10.0
    }

    const fn default_wall_tilt() -> f32 {
        1.0
    }
}

impl Default for EnclosureConfig {
    fn default() -> Self {
        Self {
            color: Self::default_color(),
            half_extent: Self::default_half_extent(),
            wall_tilt: Self::default_wall_tilt(),
        }
    }
}

impl TextureConfig {
    const fn default_glyph_size() -> f32 {
        100.0
    }

    const fn default_margin() -> f32 {
        1.0
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self { glyph_size: Self::default_glyph_size(), margin: Self::default_margin(), font: None }
    }
}

impl D4Config {
    const fn default_radius() -> f32 {
        2.0
    }

    fn default_face_colors() -> Vec<Color> {
        vec![
            Color::rgb(0x80, 0x80, 0x80),
            Color::WHITE,
            Color::rgb(0xa5, 0x2a, 0x2a),
            Color::BLACK,
        ]
    }
}

impl Default for D4Config {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            mass: default_die_mass(),
            face_colors: Self::default_face_colors(),
            uv_tab: 0.0,
            uv_angle_offset: 0.0,
        }
    }
}

impl D6Config {
    const fn default_size() -> f32 {
        2.5
    }

    const fn default_text_color() -> Color {
        Color::WHITE
    }

    const fn default_die_color() -> Color {
        Color::rgb(0x4b, 0x00, 0x82)
    }
}

impl Default for D6Config {
    fn default() -> Self {
        Self {
            size: Self::default_size(),
            mass: default_die_mass(),
            text_color: Self::default_text_color(),
            die_color: Self::default_die_color(),
        }
    }
}

impl DiePlacement {
    pub fn new(kind: DieKind, position: [f32; 3]) -> Self {
        Self { kind, position, rotation: [0.0; 3] }
    }

    /// Default drop point for the `index`-th die when only kinds are given.
    pub fn staggered(kind: DieKind, index: usize) -> Self {
        let step = index as f32;
        Self::new(kind, [step * 3.0, 0.0, 2.0 + step * 1.5])
    }
}

impl RunConfig {
    const fn default_rolls() -> u32 {
        3
    }

    const fn default_steps_per_roll() -> u32 {
        600
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { seed: 0, rolls: Self::default_rolls(), steps_per_roll: Self::default_steps_per_roll() }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            camera: CameraConfig::default(),
            enclosure: EnclosureConfig::default(),
            texture: TextureConfig::default(),
            d4: D4Config::default(),
            d6: D6Config::default(),
            dice: Self::default_dice(),
            run: RunConfig::default(),
        }
    }
}

impl AppConfig {
    fn default_dice() -> Vec<DiePlacement> {
        vec![DiePlacement::new(DieKind::D6, [0.0, 0.0, 2.0])]
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(seed) = overrides.seed {
            self.run.seed = seed;
        }
        if let Some(rolls) = overrides.rolls {
            self.run.rolls = rolls;
        }
        if let Some(steps) = overrides.steps_per_roll {
            self.run.steps_per_roll = steps;
        }
        if let Some(kinds) = &overrides.dice {
            self.dice =
                kinds.iter().enumerate().map(|(index, kind)| DiePlacement::staggered(*kind, index)).collect();
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.seed.is_none() && self.rolls.is_none() && self.steps_per_roll.is_none() && self.dice.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.seed.is_some() {
            fields.push("seed");
        }
        if self.rolls.is_some() {
            fields.push("rolls");
        }
        if self.steps_per_roll.is_some() {
            fields.push("steps_per_roll");
        }
        if self.dice.is_some() {
            fields.push("dice");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").expect("parse empty config");
        assert_eq!(cfg.physics.gravity, [0.0, 0.0, -30.0]);
        assert_eq!(cfg.camera.position, [0.0, -12.0, 16.0]);
        assert_eq!(cfg.enclosure.color.to_string(), "#69d2e7");
        assert_eq!(cfg.d4.face_colors.len(), 4);
        assert_eq!(cfg.dice.len(), 1);
        assert_eq!(cfg.dice[0].kind, DieKind::D6);
    }

    #[test]
    fn colors_parse_from_names() {
        let cfg: AppConfig =
            serde_json::from_str(r##"{ "d6": { "text_color": "black", "die_color": "#fff" } }"##).unwrap();
        assert_eq!(cfg.d6.text_color, Color::BLACK);
        assert_eq!(cfg.d6.die_color, Color::WHITE);
        assert_eq!(cfg.d6.size, 2.5);
    }

    #[test]
    fn hex_colors_with_hash_survive_raw_json() {
        let cfg: AppConfig = serde_json::from_str(
            r##"{ "enclosure": { "color": "#102030" }, "d4": { "face_colors": ["#f00", "#0f0", "#00f", "#000"] } }"##,
        )
        .unwrap();
        assert_eq!(cfg.enclosure.color, Color::rgb(0x10, 0x20, 0x30));
        assert_eq!(cfg.d4.face_colors[2], Color::rgb(0, 0, 0xff));
        assert!(cfg.texture.font.is_none());
    }

    #[test]
    fn invalid_color_is_a_parse_error() {
        let result = serde_json::from_str::<AppConfig>(r#"{ "enclosure": { "color": "plaid" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "dice": [], "run": {{ "seed": 42 }} }}"#).unwrap();
        let cfg = AppConfig::load(file.path()).expect("load config");
        assert!(cfg.dice.is_empty());
        assert_eq!(cfg.run.seed, 42);
        assert_eq!(cfg.run.rolls, 3);

        let err = AppConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn overrides_replace_dice_list() {
        let mut cfg = AppConfig::default();
        let overrides = AppConfigOverrides {
            seed: Some(9),
            dice: Some(vec![DieKind::D4, DieKind::D6]),
            ..Default::default()
        };
        cfg.apply_overrides(&overrides);
        assert_eq!(cfg.run.seed, 9);
        assert_eq!(cfg.dice.iter().map(|d| d.kind).collect::<Vec<_>>(), vec![DieKind::D4, DieKind::D6]);
        assert_ne!(cfg.dice[0].position, cfg.dice[1].position);
        assert_eq!(overrides.applied_fields(), vec!["seed", "dice"]);
    }
}
