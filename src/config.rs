use crate::error::Result;
use crate::policy::{LruMode, OptimalAnchor};
use crate::virtual_memory::Settings;
use clap::Parser;
use log::warn;
use std::env;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, default_value_t = env_or_default("SIM_PAGE_COUNT", crate::DEFAULT_PAGE_COUNT))]
    pub page_count: usize,

    #[arg(long, default_value_t = env_or_default("SIM_FRAME_COUNT", crate::DEFAULT_FRAME_COUNT))]
    pub frame_count: usize,

    /// Number of references to generate when no explicit sequence is given.
    #[arg(long, default_value_t = env_or_default("SIM_REFERENCE_LENGTH", crate::DEFAULT_REFERENCE_LENGTH))]
    pub reference_length: usize,

    /// Seed for reference generation and physical address sampling; falls back to `SIM_SEED`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Explicit reference sequence, e.g. "0,1,0,2,1,3".
    #[arg(long, conflicts_with = "file_references")]
    pub references: Option<String>,

    /// Text file of whitespace separated page indices.
    #[arg(long)]
    pub file_references: Option<String>,

    #[arg(long, value_enum, default_value_t = OptimalAnchor::FrameZero)]
    pub optimal_anchor: OptimalAnchor,

    #[arg(long, value_enum, default_value_t = LruMode::Literal)]
    pub lru_mode: LruMode,
}

impl Config {
    /// Check the values clap cannot check on its own.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` if either count is zero.
    pub fn validate(&self) -> Result<()> {
        self.settings().validate()
    }

    pub fn settings(&self) -> Settings {
        Settings::build(self.page_count, self.frame_count)
            .with_optimal_anchor(self.optimal_anchor)
            .with_lru_mode(self.lru_mode)
    }

    /// The seed from the command line, else from `SIM_SEED`. `None` means OS entropy.
    pub fn seed(&self) -> Option<u64> {
        self.seed.or_else(|| {
            env::var("SIM_SEED")
                .ok()
                .and_then(|val| match val.trim().parse() {
                    Ok(seed) => Some(seed),
                    Err(_) => {
                        warn!("ignoring env var 'SIM_SEED': expected an unsigned int");
                        None
                    }
                })
        })
    }

    pub fn display(&self) {
        println!("simulation configuration values: ");
        println!("{:#?}", self);
    }
}

fn env_or_default<T: FromStr + Copy>(varname: &str, default: T) -> T {
    match env::var(varname) {
        Ok(val) => val.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring env var '{}': expected an unsigned int", varname);
            default
        }),
        _ => default,
    }
}
