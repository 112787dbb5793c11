use clap::ValueEnum;
use std::fmt;

/// The replacement policies available to the simulation, in the order the rotator hands them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    Fifo,
    Optimal,
    Lru,
}

impl Policy {
    pub const ROTATION: [Policy; 3] = [Policy::Fifo, Policy::Optimal, Policy::Lru];
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::Fifo => "FIFO",
            Policy::Optimal => "Optimal",
            Policy::Lru => "LRU",
        };
        f.write_str(name)
    }
}

/// Where the Optimal evictor starts looking for future references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OptimalAnchor {
    /// Right after the first occurrence, within the whole sequence, of the page held by frame 0.
    #[default]
    FrameZero,
    /// Right after the reference currently being processed.
    Current,
}

/// How the LRU evictor treats a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LruMode {
    /// A hit drops the page from the recency order without putting it back.
    #[default]
    Literal,
    /// A hit moves the page to the most-recent end.
    Conventional,
}

/// The `PolicyRotator` hands out policies round-robin, one per eviction event. It knows nothing
/// about pages; a policy is consumed only when no free frame exists.
#[derive(Debug, Clone)]
pub struct PolicyRotator {
    policies: [Policy; 3],
    cursor: usize,
}

impl PolicyRotator {
    pub fn new() -> Self {
        Self {
            policies: Policy::ROTATION,
            cursor: 0,
        }
    }

    /// The policy the next eviction event will use.
    pub fn peek(&self) -> Policy {
        self.policies[self.cursor]
    }

    /// Consume the policy at the cursor and move the cursor forward, wrapping around.
    pub fn advance(&mut self) -> Policy {
        let policy = self.policies[self.cursor];
        self.cursor = (self.cursor + 1) % self.policies.len();
        policy
    }
}

impl Default for PolicyRotator {
    fn default() -> Self {
        Self::new()
    }
}
