use crate::error::{Error, Result};
use crate::policy::{LruMode, OptimalAnchor, Policy};
use crate::reference::ReferenceSequence;
use crate::table::{FrameTable, Page, PageTable};
use linked_hash_map::LinkedHashMap;
use log::error;

/// A read-only view of the shared residency state, handed to an evictor when it has to pick a
/// victim.
#[derive(Debug, Clone, Copy)]
pub struct Residency<'a> {
    pub pages: &'a PageTable,
    pub frames: &'a FrameTable,
    pub references: &'a ReferenceSequence,
    /// Index of the reference being processed.
    pub cursor: usize,
}

/// The interface every replacement strategy implements. All three strategies operate over the
/// same frame set; the rotator decides which one is asked.
pub trait Evictor {
    fn policy(&self) -> Policy;

    /// Choose a resident page to evict. The evictor may update its own bookkeeping while doing so
    /// but never touches the page or frame tables.
    ///
    /// # Errors
    ///
    /// `Error::InvariantViolation` when no resident candidate can be found.
    fn select_victim(&mut self, residency: &Residency<'_>) -> Result<Page>;
}

/// Pop entries from the old end of `order` until one names a page that is still resident. Entries
/// for pages evicted earlier under another policy are stale and silently dropped.
fn pop_resident(
    order: &mut LinkedHashMap<Page, usize>,
    pages: &PageTable,
    policy: Policy,
) -> Result<Page> {
    let mut candidate = None;
    while let Some((page, _)) = order.pop_front() {
        if pages.contains(page) {
            return Ok(page);
        }
        candidate = Some(page);
    }
    error!("{} order exhausted without a resident page", policy);
    Err(Error::InvariantViolation { policy, candidate })
}

/// The `FifoEvictor` keeps resident pages in arrival order. Arrivals are recorded on every
/// fault-driven allocation, whichever policy happens to be evicting at the time.
#[derive(Debug, Default)]
pub struct FifoEvictor {
    arrivals: LinkedHashMap<Page, usize>,
}

impl FifoEvictor {
    pub fn new() -> Self {
        Self {
            arrivals: LinkedHashMap::new(),
        }
    }

    /// Record that `page` arrived in a frame while processing reference `step`. A page arriving
    /// again goes to the back of the queue.
    pub fn record_arrival(&mut self, page: Page, step: usize) {
        self.arrivals.remove(&page);
        self.arrivals.insert(page, step);
    }

    /// Pages in the queue, oldest first, stale entries included.
    pub fn order(&self) -> Vec<Page> {
        self.arrivals.keys().copied().collect()
    }
}

impl Evictor for FifoEvictor {
    fn policy(&self) -> Policy {
        Policy::Fifo
    }

    fn select_victim(&mut self, residency: &Residency<'_>) -> Result<Page> {
        pop_resident(&mut self.arrivals, residency.pages, Policy::Fifo)
    }
}

/// The `LruEvictor` keeps a recency order, least recent first. In `LruMode::Literal` a hit takes
/// the page out of the order and does not put it back, so a page that was hit and never faulted
/// again is invisible to this evictor.
#[derive(Debug, Default)]
pub struct LruEvictor {
    mode: LruMode,
    recency: LinkedHashMap<Page, usize>,
}

impl LruEvictor {
    pub fn build(mode: LruMode) -> Self {
        Self {
            mode,
            recency: LinkedHashMap::new(),
        }
    }

    pub fn mode(&self) -> LruMode {
        self.mode
    }

    /// Update the recency order for a reference that hit a resident page.
    pub fn record_hit(&mut self, page: Page, step: usize) {
        match self.mode {
            LruMode::Literal => {
                self.recency.remove(&page);
            }
            LruMode::Conventional => match self.recency.get_refresh(&page) {
                Some(last_use) => *last_use = step,
                None => {
                    self.recency.insert(page, step);
                }
            },
        }
    }

    /// Update the recency order for a page that has just been allocated a frame.
    pub fn record_allocation(&mut self, page: Page, step: usize) {
        self.recency.remove(&page);
        self.recency.insert(page, step);
    }

    /// Pages in the recency order, least recent first, stale entries included.
    pub fn order(&self) -> Vec<Page> {
        self.recency.keys().copied().collect()
    }
}

impl Evictor for LruEvictor {
    fn policy(&self) -> Policy {
        Policy::Lru
    }

    fn select_victim(&mut self, residency: &Residency<'_>) -> Result<Page> {
        pop_resident(&mut self.recency, residency.pages, Policy::Lru)
    }
}

/// The `OptimalEvictor` evicts the resident page whose next use lies furthest in the future, with
/// pages never used again ranking above every page that is. Ties go to the lowest frame index.
///
/// How far "the future" reaches depends on the anchor: with `OptimalAnchor::FrameZero` the search
/// window opens right after the first occurrence, in the whole sequence, of the page held by frame
/// 0; with `OptimalAnchor::Current` it opens right after the reference being processed.
#[derive(Debug, Default)]
pub struct OptimalEvictor {
    anchor: OptimalAnchor,
}

impl OptimalEvictor {
    pub fn build(anchor: OptimalAnchor) -> Self {
        Self { anchor }
    }

    pub fn anchor(&self) -> OptimalAnchor {
        self.anchor
    }

    fn window_start(&self, residency: &Residency<'_>) -> Result<usize> {
        match self.anchor {
            OptimalAnchor::Current => Ok(residency.cursor + 1),
            OptimalAnchor::FrameZero => {
                let anchor_page = residency
                    .frames
                    .slots()
                    .first()
                    .copied()
                    .flatten()
                    .ok_or(Error::InvariantViolation {
                        policy: Policy::Optimal,
                        candidate: None,
                    })?;
                residency
                    .references
                    .first_occurrence(anchor_page)
                    .map(|position| position + 1)
                    .ok_or(Error::InvariantViolation {
                        policy: Policy::Optimal,
                        candidate: Some(anchor_page),
                    })
            }
        }
    }
}

impl Evictor for OptimalEvictor {
    fn policy(&self) -> Policy {
        Policy::Optimal
    }

    fn select_victim(&mut self, residency: &Residency<'_>) -> Result<Page> {
        let future = residency.references.window(self.window_start(residency)?);

        // `usize::MAX` stands for "never used again"; real distances are bounded by the window.
        let mut victim: Option<(usize, Page)> = None;
        for (_, page) in residency.frames.resident() {
            if !residency.pages.contains(page) {
                continue;
            }
            let distance = future
                .iter()
                .position(|&p| p == page)
                .unwrap_or(usize::MAX);
            if victim.map_or(true, |(best, _)| distance > best) {
                victim = Some((distance, page));
            }
        }

        victim.map(|(_, page)| page).ok_or_else(|| {
            error!("no resident frame to choose an optimal victim from");
            Error::InvariantViolation {
                policy: Policy::Optimal,
                candidate: None,
            }
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn resident_state(frames: &[usize], page_count: usize) -> (PageTable, FrameTable) {
        let mut pages = PageTable::new();
        let mut table = FrameTable::build(frames.len());
        frames.iter().enumerate().for_each(|(index, &page)| {
            pages.insert(Page(page), index);
            table.occupy(index, Page(page));
        });
        assert!(frames.iter().all(|&page| page < page_count));
        (pages, table)
    }

    #[cfg(test)]
    mod fifo_evictor_tests {

        use super::*;

        #[test]
        fn evicts_oldest_arrival() {
            // arrange
            let (pages, frames) = resident_state(&[0, 1, 2], 4);
            let references = ReferenceSequence::build(&[0, 1, 2, 3], 4).unwrap();
            let mut fifo = FifoEvictor::new();
            (0..3).for_each(|x| fifo.record_arrival(Page(x), x));
            let residency = Residency {
                pages: &pages,
                frames: &frames,
                references: &references,
                cursor: 3,
            };

            // act
            let victim = fifo.select_victim(&residency).unwrap();

            // assert
            assert_eq!(victim, Page(0));
            assert_eq!(fifo.order(), vec![Page(1), Page(2)]);
        }

        #[test]
        fn skips_stale_entries() {
            let (pages, frames) = resident_state(&[2, 3], 5);
            let references = ReferenceSequence::build(&[0, 1, 2, 3, 4], 5).unwrap();
            let mut fifo = FifoEvictor::new();
            (0..4).for_each(|x| fifo.record_arrival(Page(x), x));
            let residency = Residency {
                pages: &pages,
                frames: &frames,
                references: &references,
                cursor: 4,
            };

            assert_eq!(fifo.select_victim(&residency).unwrap(), Page(2));
            assert_eq!(fifo.order(), vec![Page(3)]);
        }

        #[test]
        fn rearrival_moves_to_back() {
            let mut fifo = FifoEvictor::new();
            fifo.record_arrival(Page(0), 0);
            fifo.record_arrival(Page(1), 1);
            fifo.record_arrival(Page(0), 2);
            assert_eq!(fifo.order(), vec![Page(1), Page(0)]);
        }

        #[test]
        fn exhausted_queue_is_an_invariant_violation() {
            let (pages, frames) = resident_state(&[3], 4);
            let references = ReferenceSequence::build(&[3], 4).unwrap();
            let mut fifo = FifoEvictor::new();
            fifo.record_arrival(Page(1), 0);
            let residency = Residency {
                pages: &pages,
                frames: &frames,
                references: &references,
                cursor: 0,
            };

            assert!(matches!(
                fifo.select_victim(&residency),
                Err(Error::InvariantViolation {
                    policy: Policy::Fifo,
                    candidate: Some(Page(1))
                })
            ));
        }
    }

    #[cfg(test)]
    mod lru_evictor_tests {

        use super::*;

        #[test]
        fn literal_hit_drops_entry() {
            let mut lru = LruEvictor::build(LruMode::Literal);
            (0..3).for_each(|x| lru.record_allocation(Page(x), x));
            lru.record_hit(Page(0), 3);
            assert_eq!(lru.order(), vec![Page(1), Page(2)]);
            lru.record_hit(Page(0), 4);
            assert_eq!(lru.order(), vec![Page(1), Page(2)]);
        }

        #[test]
        fn conventional_hit_refreshes_entry() {
            let mut lru = LruEvictor::build(LruMode::Conventional);
            (0..3).for_each(|x| lru.record_allocation(Page(x), x));
            lru.record_hit(Page(0), 3);
            assert_eq!(lru.order(), vec![Page(1), Page(2), Page(0)]);
        }

        #[test]
        fn evicts_least_recent_resident() {
            let (pages, frames) = resident_state(&[0, 1, 2], 4);
            let references = ReferenceSequence::build(&[0, 1, 2, 0, 3], 4).unwrap();
            let mut lru = LruEvictor::build(LruMode::Conventional);
            lru.record_allocation(Page(3), 0);
            (0..3).for_each(|x| lru.record_allocation(Page(x), x + 1));
            lru.record_hit(Page(0), 4);
            let residency = Residency {
                pages: &pages,
                frames: &frames,
                references: &references,
                cursor: 4,
            };

            // Page 3 is stale, page 0 was refreshed.
            assert_eq!(lru.select_victim(&residency).unwrap(), Page(1));
        }

        #[test]
        fn literal_mode_can_lose_every_resident_page() {
            let (pages, frames) = resident_state(&[0], 2);
            let references = ReferenceSequence::build(&[0, 0], 2).unwrap();
            let mut lru = LruEvictor::build(LruMode::Literal);
            lru.record_allocation(Page(0), 0);
            lru.record_hit(Page(0), 1);
            let residency = Residency {
                pages: &pages,
                frames: &frames,
                references: &references,
                cursor: 1,
            };

            assert!(matches!(
                lru.select_victim(&residency),
                Err(Error::InvariantViolation {
                    policy: Policy::Lru,
                    candidate: None
                })
            ));
        }
    }

    #[cfg(test)]
    mod optimal_evictor_tests {

        use super::*;

        #[test]
        fn prefers_page_never_used_again() {
            let (pages, frames) = resident_state(&[0, 1, 2], 4);
            let references = ReferenceSequence::build(&[0, 1, 2, 3, 0, 1], 4).unwrap();
            let mut optimal = OptimalEvictor::build(OptimalAnchor::Current);
            let residency = Residency {
                pages: &pages,
                frames: &frames,
                references: &references,
                cursor: 3,
            };

            assert_eq!(optimal.select_victim(&residency).unwrap(), Page(2));
        }

        #[test]
        fn furthest_next_use_wins() {
            let (pages, frames) = resident_state(&[0, 1, 2], 4);
            let references = ReferenceSequence::build(&[0, 1, 2, 3, 2, 0, 1], 4).unwrap();
            let mut optimal = OptimalEvictor::build(OptimalAnchor::Current);
            let residency = Residency {
                pages: &pages,
                frames: &frames,
                references: &references,
                cursor: 3,
            };

            assert_eq!(optimal.select_victim(&residency).unwrap(), Page(1));
        }

        #[test]
        fn ties_go_to_lowest_frame() {
            let (pages, frames) = resident_state(&[2, 0, 1], 4);
            let references = ReferenceSequence::build(&[2, 0, 1, 3], 4).unwrap();
            let mut optimal = OptimalEvictor::build(OptimalAnchor::Current);
            let residency = Residency {
                pages: &pages,
                frames: &frames,
                references: &references,
                cursor: 3,
            };

            assert_eq!(optimal.select_victim(&residency).unwrap(), Page(2));
        }

        #[test]
        fn frame_zero_anchor_uses_first_occurrence() {
            // Frame 0 holds page 1, first seen at position 0, so the window is [1, 2, 3, 0, 2]
            // and page 0 is used furthest out. From the true cursor (3) the window is [0, 2] and
            // page 1 is never used again.
            let (pages, frames) = resident_state(&[1, 2, 0], 4);
            let references = ReferenceSequence::build(&[1, 1, 2, 3, 0, 2], 4).unwrap();
            let residency = Residency {
                pages: &pages,
                frames: &frames,
                references: &references,
                cursor: 3,
            };

            let mut literal = OptimalEvictor::build(OptimalAnchor::FrameZero);
            let mut corrected = OptimalEvictor::build(OptimalAnchor::Current);
            assert_eq!(literal.select_victim(&residency).unwrap(), Page(0));
            assert_eq!(corrected.select_victim(&residency).unwrap(), Page(1));

            let (pages, frames) = resident_state(&[2, 1, 0], 4);
            let references = ReferenceSequence::build(&[2, 1, 0, 0, 3, 1, 2], 4).unwrap();
            let residency = Residency {
                pages: &pages,
                frames: &frames,
                references: &references,
                cursor: 4,
            };
            // Literal window starts at 1: [1, 0, 0, 3, 1, 2] -> page 2 furthest (5).
            // Corrected window starts at 5: [1, 2] -> page 0 never used again.
            assert_eq!(literal.select_victim(&residency).unwrap(), Page(2));
            assert_eq!(corrected.select_victim(&residency).unwrap(), Page(0));
        }
    }
}
