use crate::address::{PhysicalAddress, VirtualAddress};
use crate::policy::Policy;
use crate::table::Page;
use std::fmt;

const NO_REPLACEMENT: &str = "No Replacement Needed";

/// One row of the allocation ledger, written for every fault.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRecord {
    pub page: Page,
    pub frame_index: usize,
    /// The policy that freed the frame, or `None` when a free frame was available.
    pub policy: Option<Policy>,
    pub virtual_address: VirtualAddress,
    pub physical_address: PhysicalAddress,
}

impl fmt::Display for AllocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = self
            .policy
            .map_or_else(|| String::from(NO_REPLACEMENT), |policy| policy.to_string());
        write!(
            f,
            "{:<10} {:>5}  {:<22} {:<15} {:<16}",
            self.page.to_string(),
            self.frame_index,
            method,
            self.virtual_address.to_string(),
            self.physical_address.to_string(),
        )
    }
}

/// The `Ledger` struct is the append-only record of a run: one `AllocationRecord` per fault, the
/// policies used by each eviction in order, and the running hit and fault counters. Counters only
/// ever grow.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ledger {
    records: Vec<AllocationRecord>,
    replacement_history: Vec<Policy>,
    pub page_hits: usize,
    pub page_faults: usize,
}

impl Ledger {
    /// Create a new instance of the `Ledger` struct with no records and all counters at zero.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            replacement_history: Vec::new(),
            page_hits: 0,
            page_faults: 0,
        }
    }

    pub fn record_hit(&mut self) {
        self.page_hits += 1;
    }

    pub fn record_fault(&mut self, record: AllocationRecord) {
        self.page_faults += 1;
        self.records.push(record);
    }

    pub fn record_replacement(&mut self, policy: Policy) {
        self.replacement_history.push(policy);
    }

    pub fn records(&self) -> &[AllocationRecord] {
        &self.records
    }

    pub fn replacement_history(&self) -> &[Policy] {
        &self.replacement_history
    }

    pub fn references(&self) -> usize {
        self.page_hits + self.page_faults
    }

    /// Faults per hit. The small bias keeps the ratio finite for runs without hits.
    pub fn fault_hit_ratio(&self) -> f64 {
        self.page_faults as f64 / (self.page_hits as f64 + 1e-6)
    }

    pub fn hit_ratio(&self) -> f64 {
        match self.references() {
            0 => 0.0,
            total => self.page_hits as f64 / total as f64,
        }
    }

    /// Render the allocation table, one line per fault.
    pub fn table(&self) -> String {
        let mut out = format!(
            "{:<10} {:>5}  {:<22} {:<15} {:<16}\n",
            "Page", "Frame", "Method", "Virtual Address", "Physical Address"
        );
        self.records.iter().for_each(|record| {
            out.push_str(&record.to_string());
            out.push('\n');
        });
        out
    }
}

impl fmt::Display for Ledger {
    /// Display format specification for the `Ledger` struct implemented to simplify the process
    /// of outputting statistics to the terminal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let history = self
            .replacement_history
            .iter()
            .map(Policy::to_string)
            .collect::<Vec<String>>()
            .join(", ");
        write!(
            f,
            "
Stats Tracked
---------------------------------
references:               {:08}
page_hits:                {:08}
page_faults:              {:08}
replacements:             {:08}


hit ratio:                {:.06}
fault-to-hit ratio:       {:.06}
replacement history:      [{}]
               ",
            self.references(),
            self.page_hits,
            self.page_faults,
            self.replacement_history.len(),
            self.hit_ratio(),
            self.fault_hit_ratio(),
            history,
        )
    }
}
