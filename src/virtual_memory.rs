use crate::address::AddressTranslator;
use crate::error::{Error, Result};
use crate::evictor::{Evictor, FifoEvictor, LruEvictor, OptimalEvictor, Residency};
use crate::policy::{LruMode, OptimalAnchor, Policy, PolicyRotator};
use crate::reference::ReferenceSequence;
use crate::snapshot::{Event, FrameSlot, Snapshot};
use crate::table::{FrameTable, Page, PageTable};
use crate::tracker::{AllocationRecord, Ledger};
use log::{debug, error, info};
use rand::Rng;

/// The sizing and behaviour switches of a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub page_count: usize,
    pub frame_count: usize,
    pub optimal_anchor: OptimalAnchor,
    pub lru_mode: LruMode,
}

impl Settings {
    pub fn build(page_count: usize, frame_count: usize) -> Self {
        Self {
            page_count,
            frame_count,
            optimal_anchor: OptimalAnchor::default(),
            lru_mode: LruMode::default(),
        }
    }

    pub fn with_optimal_anchor(self, optimal_anchor: OptimalAnchor) -> Self {
        Self {
            optimal_anchor,
            ..self
        }
    }

    pub fn with_lru_mode(self, lru_mode: LruMode) -> Self {
        Self { lru_mode, ..self }
    }

    /// Reject page spaces or frame sets of size zero.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` naming the offending count.
    pub fn validate(&self) -> Result<()> {
        if self.page_count == 0 {
            return Err(Error::InvalidConfig(String::from(
                "'page_count' must be non-zero",
            )));
        }
        if self.frame_count == 0 {
            return Err(Error::InvalidConfig(String::from(
                "'frame_count' must be non-zero",
            )));
        }
        Ok(())
    }
}

/// The `Simulation` struct owns every piece of state for one pass over a reference sequence: the
/// page and frame tables, the three evictors and the rotator choosing between them, the address
/// translator and the ledger. Each call to `step` processes one reference to completion. An
/// instance serves exactly one run and is never reset.
#[derive(Debug)]
pub struct Simulation<R: Rng> {
    settings: Settings,
    references: ReferenceSequence,
    cursor: usize,
    pages: PageTable,
    frames: FrameTable,
    rotator: PolicyRotator,
    fifo: FifoEvictor,
    lru: LruEvictor,
    optimal: OptimalEvictor,
    translator: AddressTranslator<R>,
    ledger: Ledger,
    last_event: Option<Event>,
    /// Index of the reference whose processing failed; set once, never cleared.
    failed_at: Option<usize>,
}

impl<R: Rng> Simulation<R> {
    /// Create a new `Simulation` instance ready to replay `references`.
    ///
    /// # Arguments
    ///
    /// * `settings` - page/frame counts and evictor switches.
    /// * `references` - raw page indices, each of which must lie in `[0, page_count)`.
    /// * `rng` - source used to sample physical address tags.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` for zero page or frame counts, `Error::InvalidReference` for the
    /// first out-of-range reference. No reference is processed when building fails.
    pub fn build(settings: Settings, references: &[usize], rng: R) -> Result<Self> {
        let references = ReferenceSequence::build(references, settings.page_count)?;
        Self::with_sequence(settings, references, rng)
    }

    /// Like `build`, for a sequence that has already been validated.
    ///
    /// # Errors
    ///
    /// Fails when the settings are invalid or the sequence was validated against a different
    /// page space.
    pub fn with_sequence(settings: Settings, references: ReferenceSequence, rng: R) -> Result<Self> {
        settings.validate()?;
        if references.page_count() != settings.page_count {
            return Err(Error::InvalidConfig(format!(
                "reference sequence covers {} pages, settings declare {}",
                references.page_count(),
                settings.page_count
            )));
        }

        Ok(Self {
            settings,
            references,
            cursor: 0,
            pages: PageTable::new(),
            frames: FrameTable::build(settings.frame_count),
            rotator: PolicyRotator::new(),
            fifo: FifoEvictor::new(),
            lru: LruEvictor::build(settings.lru_mode),
            optimal: OptimalEvictor::build(settings.optimal_anchor),
            translator: AddressTranslator::build(rng),
            ledger: Ledger::new(),
            last_event: None,
            failed_at: None,
        })
    }

    /// Process the next reference: look it up, and on a fault find or free a frame, occupy it and
    /// record the allocation. Returns `Ok(None)` once the sequence is exhausted.
    ///
    /// # Errors
    ///
    /// `Error::InvariantViolation` if an eviction cannot find a resident victim. The failure is
    /// fatal: every later call returns `Error::RunAborted`.
    pub fn step(&mut self) -> Result<Option<Event>> {
        if let Some(position) = self.failed_at {
            return Err(Error::RunAborted(position));
        }
        let Some(page) = self.references.get(self.cursor) else {
            return Ok(None);
        };

        let outcome = match self.pages.find(page) {
            Some(frame_index) => self.hit(page, frame_index),
            None => self.fault(page),
        };
        let event = match outcome {
            Ok(event) => event,
            Err(err) => {
                error!("aborting run at reference {}: {}", self.cursor, err);
                self.failed_at = Some(self.cursor);
                return Err(err);
            }
        };

        self.cursor += 1;
        self.last_event = Some(event.clone());
        Ok(Some(event))
    }

    /// Process every remaining reference.
    pub fn run(&mut self) -> Result<&Ledger> {
        while self.step()?.is_some() {}
        Ok(&self.ledger)
    }

    /// Process every remaining reference, handing a snapshot to `observer` after each one.
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<&Ledger>
    where
        F: FnMut(&Snapshot<'_>),
    {
        while self.step()?.is_some() {
            observer(&self.snapshot());
        }
        Ok(&self.ledger)
    }

    fn hit(&mut self, page: Page, frame_index: usize) -> Result<Event> {
        let mapping = self
            .translator
            .mapping(page)
            .ok_or(Error::MissingMapping(page))?;
        self.ledger.record_hit();
        self.lru.record_hit(page, self.cursor);
        debug!("{} is already in memory (frame {})", page, frame_index);

        Ok(Event {
            page,
            hit: true,
            frame_index,
            policy: None,
            victim: None,
            virtual_address: mapping.virtual_address,
            physical_address: mapping.physical_address,
        })
    }

    fn fault(&mut self, page: Page) -> Result<Event> {
        debug!("{} is a page miss", page);
        let (frame_index, policy, victim) = match self.frames.find_free() {
            Some(frame_index) => (frame_index, None, None),
            None => {
                let policy = self.rotator.advance();
                let (frame_index, victim) = self.evict(policy)?;
                (frame_index, Some(policy), Some(victim))
            }
        };

        self.frames.occupy(frame_index, page);
        self.pages.insert(page, frame_index);
        self.fifo.record_arrival(page, self.cursor);
        self.lru.record_allocation(page, self.cursor);
        let mapping = self.translator.assign(page);

        self.ledger.record_fault(AllocationRecord {
            page,
            frame_index,
            policy,
            virtual_address: mapping.virtual_address,
            physical_address: mapping.physical_address,
        });
        debug!(
            "allocated {} to frame {}: virtual {}, physical {}",
            page, frame_index, mapping.virtual_address, mapping.physical_address
        );

        Ok(Event {
            page,
            hit: false,
            frame_index,
            policy,
            victim,
            virtual_address: mapping.virtual_address,
            physical_address: mapping.physical_address,
        })
    }

    /// Ask the evictor for `policy` to pick a victim, then unmap it and free its frame.
    fn evict(&mut self, policy: Policy) -> Result<(usize, Page)> {
        let residency = Residency {
            pages: &self.pages,
            frames: &self.frames,
            references: &self.references,
            cursor: self.cursor,
        };
        let evictor: &mut dyn Evictor = match policy {
            Policy::Fifo => &mut self.fifo,
            Policy::Optimal => &mut self.optimal,
            Policy::Lru => &mut self.lru,
        };
        debug_assert_eq!(evictor.policy(), policy);
        let victim = evictor.select_victim(&residency)?;

        let frame_index = match self.pages.remove(victim) {
            Some(frame_index) => frame_index,
            None => {
                error!("{} chose {} which is not in the page table", policy, victim);
                return Err(Error::InvariantViolation {
                    policy,
                    candidate: Some(victim),
                });
            }
        };
        self.frames.release(frame_index);
        self.translator.release(victim);
        self.ledger.record_replacement(policy);
        info!("replaced {} from frame {} using {}", victim, frame_index, policy);

        Ok((frame_index, victim))
    }

    /// A read-only view of the current frames, the last event, the counters and the ledger.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            frames: self
                .frames
                .slots()
                .iter()
                .enumerate()
                .map(|(index, page)| FrameSlot { index, page: *page })
                .collect(),
            last_event: self.last_event.clone(),
            cumulative_faults: self.ledger.page_faults,
            cumulative_hits: self.ledger.page_hits,
            ledger: self.ledger.records(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn references(&self) -> &ReferenceSequence {
        &self.references
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.references.len()
    }

    /// Whether an earlier reference failed and the run has been abandoned.
    pub fn is_aborted(&self) -> bool {
        self.failed_at.is_some()
    }

    /// Pages currently holding a frame, in frame order.
    pub fn resident_pages(&self) -> Vec<Page> {
        self.frames.resident().map(|(_, page)| page).collect()
    }

    pub fn page_table(&self) -> &PageTable {
        &self.pages
    }

    pub fn frame_table(&self) -> &FrameTable {
        &self.frames
    }

    /// The FIFO arrival queue, oldest first, stale entries included.
    pub fn fifo_order(&self) -> Vec<Page> {
        self.fifo.order()
    }

    /// The LRU recency order, least recent first, stale entries included.
    pub fn lru_order(&self) -> Vec<Page> {
        self.lru.order()
    }
}
