use crate::table::Page;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;

const PHYSICAL_TAG_MIN: u8 = 0x00;
const PHYSICAL_TAG_MAX: u8 = 0xFF;

/// `VirtualAddress` is the address a page is known by from the process side. It is a pure
/// function of the page identity and never changes across allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualAddress(pub usize);

impl From<Page> for VirtualAddress {
    /// Encode a page's index as its virtual address.
    ///
    /// # Examples
    ///
    /// ```
    /// use paging_sim::address::VirtualAddress;
    /// use paging_sim::table::Page;
    /// let address = VirtualAddress::from(Page(10));
    /// assert_eq!(address.to_string(), "0x000A");
    /// ```
    fn from(page: Page) -> Self {
        Self(page.index())
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// `PhysicalAddress` is an opaque tag handed out on every allocation. Nothing ties the tag of one
/// allocation to the tag of a later allocation of the same page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicalAddress(pub u8);

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// The virtual/physical pair recorded for a resident page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub virtual_address: VirtualAddress,
    pub physical_address: PhysicalAddress,
}

/// The `AddressTranslator` struct derives addresses for pages as they are allocated and keeps the
/// current mapping of every resident page. All randomness comes from the injected source `R`, so a
/// seeded generator makes every tag reproducible.
#[derive(Debug)]
pub struct AddressTranslator<R: Rng> {
    rng: R,
    mappings: HashMap<Page, Mapping>,
}

impl<R: Rng> AddressTranslator<R> {
    pub fn build(rng: R) -> Self {
        Self {
            rng,
            mappings: HashMap::new(),
        }
    }

    /// Assign a mapping for a freshly allocated page: the virtual address is derived from the
    /// page, the physical tag is sampled anew even when the page has been mapped before.
    ///
    /// # Arguments
    ///
    /// * `page` - the page that has just been given a frame.
    pub fn assign(&mut self, page: Page) -> Mapping {
        let mapping = Mapping {
            virtual_address: VirtualAddress::from(page),
            physical_address: PhysicalAddress(
                self.rng.random_range(PHYSICAL_TAG_MIN..=PHYSICAL_TAG_MAX),
            ),
        };
        self.mappings.insert(page, mapping);
        mapping
    }

    pub fn mapping(&self, page: Page) -> Option<Mapping> {
        self.mappings.get(&page).copied()
    }

    /// Drop the mapping of an evicted page.
    pub fn release(&mut self, page: Page) -> Option<Mapping> {
        self.mappings.remove(&page)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
