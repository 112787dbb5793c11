use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

/// A logical page identified by its index in the bounded page space. Pages are plain values; the
/// whole universe of them exists from the start of a run and none is ever destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Page(pub usize);

impl Page {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {}", self.0 + 1)
    }
}

/// The `PageTable` struct maps every resident page to the frame holding it. An entry exists if
/// and only if the page is resident: it is created when the page is allocated a frame and deleted
/// when the page is evicted.
#[derive(Debug, Default)]
pub struct PageTable(HashMap<Page, usize>);

impl PageTable {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Provided a page, return the index of the frame holding it. A `None` value implies the page
    /// is not resident and a reference to it is a fault.
    ///
    /// # Arguments
    ///
    /// * `page` - logical page
    ///
    pub fn find(&self, page: Page) -> Option<usize> {
        self.0.get(&page).copied()
    }

    pub fn contains(&self, page: Page) -> bool {
        self.0.contains_key(&page)
    }

    pub fn insert(&mut self, page: Page, frame_index: usize) {
        self.0.insert(page, frame_index);
    }

    /// Remove the entry for `page` and return the frame it occupied, or `None` when the page was
    /// not resident.
    pub fn remove(&mut self, page: Page) -> Option<usize> {
        self.0.remove(&page)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pages(&self) -> impl Iterator<Item = Page> + '_ {
        self.0.keys().copied()
    }
}

/// The `FrameTable` struct is the fixed array of physical frame slots. Each slot is either empty
/// or holds exactly one resident page; slots are only mutated through `occupy` and `release`.
#[derive(Debug)]
pub struct FrameTable {
    entries: Vec<Option<Page>>,
}

impl FrameTable {
    /// Create a frame table of `table_size` empty slots.
    ///
    /// # Arguments
    ///
    /// * `table_size` - number of physical frames.
    pub fn build(table_size: usize) -> Self {
        Self {
            entries: vec![None; table_size],
        }
    }

    /// Scan the slots in index order and return the first empty one. The lowest free index always
    /// wins.
    pub fn find_free(&self) -> Option<usize> {
        self.entries.iter().position(Option::is_none)
    }

    pub fn occupy(&mut self, index: usize, page: Page) {
        self.entries[index] = Some(page);
    }

    /// Empty the slot at `index` and return the page that was held there.
    pub fn release(&mut self, index: usize) -> Option<Page> {
        self.entries[index].take()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn occupied(&self) -> usize {
        self.entries.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterate over `(index, page)` for every occupied slot in ascending index order.
    pub fn resident(&self) -> impl Iterator<Item = (usize, Page)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|page| (index, page)))
    }

    pub fn slots(&self) -> &[Option<Page>] {
        &self.entries
    }
}

impl Index<usize> for FrameTable {
    type Output = Option<Page>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}
