pub mod address;
pub mod config;
pub mod error;
pub mod evictor;
pub mod policy;
pub mod reference;
pub mod snapshot;
pub mod table;
pub mod tracker;
pub mod virtual_memory;

use config::Config;
use error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reference::ReferenceSequence;
use tracker::Ledger;
use virtual_memory::Simulation;

pub use error::Error;
pub use policy::{LruMode, OptimalAnchor, Policy};
pub use virtual_memory::Settings;

pub const DEFAULT_PAGE_COUNT: usize = 15;
pub const DEFAULT_FRAME_COUNT: usize = 10;
pub const DEFAULT_REFERENCE_LENGTH: usize = 19;

const PROGRESS_TEMPLATE: &str = "{spinner} [{bar:40}] {pos}/{len} {msg}";

fn reference_sequence(config: &Config, rng: &mut StdRng) -> Result<ReferenceSequence> {
    match (&config.references, &config.file_references) {
        (Some(text), _) => ReferenceSequence::parse(text, config.page_count),
        (None, Some(path)) => ReferenceSequence::read(path, config.page_count),
        (None, None) => {
            ReferenceSequence::generate(rng, config.page_count, config.reference_length)
        }
    }
}

/// Build a simulation from the resolved configuration, replay the reference sequence with a
/// progress bar and print the final frame state, allocation table and statistics.
///
/// # Errors
///
/// Any ingestion error (bad reference, unreadable file, invalid counts) is returned before the
/// first reference is processed; an invariant violation aborts the run part way.
pub fn run_simulation(config: Config) -> Result<Ledger> {
    let mut rng = match config.seed() {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let references = reference_sequence(&config, &mut rng)?;
    let labels = references
        .as_slice()
        .iter()
        .map(|page| page.to_string())
        .collect::<Vec<String>>()
        .join(", ");
    println!("reference string for page requests: [{}]", labels);

    let mut simulation = Simulation::with_sequence(config.settings(), references, rng)?;

    let progress = ProgressBar::new(simulation.references().len() as u64);
    progress.set_style(ProgressStyle::with_template(PROGRESS_TEMPLATE)?.progress_chars("##-"));
    let outcome = simulation
        .run_with(|snapshot| {
            if let Some(event) = &snapshot.last_event {
                info!("{}", event);
                progress.set_message(event.page.to_string());
            }
            progress.inc(1);
        })
        .map(Ledger::clone);
    progress.finish_and_clear();
    let ledger = outcome?;

    println!();
    println!("{}", simulation.snapshot().frame_state());
    println!();
    print!("{}", ledger.table());
    println!("{}", ledger);
    Ok(ledger)
}
