use crate::config::{AppConfigOverrides, DieKind};
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

pub const USAGE: &str = "Usage: dicebox [--config <path>] [--seed <u64>] [--rolls <n>] [--steps <n>] \
                         [--dice d4,d6,...] [--dump-textures <dir>]";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub dump_textures: Option<PathBuf>,
    pub help: bool,
    seed: Option<u64>,
    rolls: Option<u32>,
    steps: Option<u32>,
    dice: Option<Vec<DieKind>>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if flag == "-h" || flag == "--help" {
                overrides.help = true;
                continue;
            }
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. {USAGE}");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(PathBuf::from(value)),
                "dump-textures" => overrides.dump_textures = Some(PathBuf::from(value)),
                "seed" => {
                    overrides.seed = Some(value.parse::<u64>().with_context(|| format!("Invalid seed '{value}'"))?);
                }
                "rolls" => {
                    overrides.rolls =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid roll count '{value}'"))?);
                }
                "steps" => {
                    overrides.steps =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid step count '{value}'"))?);
                }
                "dice" => overrides.dice = Some(parse_dice_list(&value)?),
                _ => bail!("Unknown flag '{flag}'. {USAGE}"),
            }
        }
        Ok(overrides)
    }

    pub fn into_config_overrides(self) -> AppConfigOverrides {
        AppConfigOverrides { seed: self.seed, rolls: self.rolls, steps_per_roll: self.steps, dice: self.dice }
    }
}

fn parse_dice_list(value: &str) -> Result<Vec<DieKind>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|raw| DieKind::parse(raw).ok_or_else(|| anyhow!("Unknown die '{}'. Use d4 or d6.", raw.trim())))
        .collect()
}
