use crate::address::{PhysicalAddress, VirtualAddress};
use crate::policy::Policy;
use crate::table::Page;
use crate::tracker::AllocationRecord;
use std::fmt;

/// The outcome of processing a single reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub page: Page,
    pub hit: bool,
    pub frame_index: usize,
    /// The policy that freed the frame; always `None` for hits and for faults served by a free
    /// frame.
    pub policy: Option<Policy>,
    /// The page evicted to make room, if any.
    pub victim: Option<Page>,
    pub virtual_address: VirtualAddress,
    pub physical_address: PhysicalAddress,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.hit, self.policy, self.victim) {
            (true, _, _) => write!(
                f,
                "{} is already in memory (Frame {})",
                self.page, self.frame_index
            ),
            (false, Some(policy), Some(victim)) => write!(
                f,
                "Replaced {} from Frame {} using {}. Allocated {} to Frame {}. Virtual Address: {}, Physical Address: {}",
                victim,
                self.frame_index,
                policy,
                self.page,
                self.frame_index,
                self.virtual_address,
                self.physical_address
            ),
            (false, _, _) => write!(
                f,
                "Allocated {} to Frame {}. Virtual Address: {}, Physical Address: {}",
                self.page, self.frame_index, self.virtual_address, self.physical_address
            ),
        }
    }
}

/// A slot of the frame table as seen from outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSlot {
    pub index: usize,
    pub page: Option<Page>,
}

impl fmt::Display for FrameSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "Frame {:<4} {}", self.index, page),
            None => write!(f, "Frame {:<4} Empty", self.index),
        }
    }
}

/// A read-only view of the engine after a reference has been processed. Renderers consume this
/// and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<'a> {
    pub frames: Vec<FrameSlot>,
    pub last_event: Option<Event>,
    pub cumulative_faults: usize,
    pub cumulative_hits: usize,
    pub ledger: &'a [AllocationRecord],
}

impl Snapshot<'_> {
    /// Render the current frame state, one line per frame.
    pub fn frame_state(&self) -> String {
        self.frames
            .iter()
            .map(FrameSlot::to_string)
            .collect::<Vec<String>>()
            .join("\n")
    }
}
