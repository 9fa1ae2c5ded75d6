//! Faction Relations
//!
//! Every ship and station belongs to a faction. Hostility is a static,
//! symmetric table lookup; nothing here has state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The player and their allies
    Friendly,
    /// Pirates and other aggressors
    Hostile,
    /// Traders, derelicts; nobody's enemy
    Neutral,
}

impl Faction {
    fn index(self) -> usize {
        match self {
            Faction::Friendly => 0,
            Faction::Hostile => 1,
            Faction::Neutral => 2,
        }
    }
}

/// Row/column order follows `Faction::index`.
const RELATIONS: [[bool; 3]; 3] = [
    // Friendly Hostile Neutral
    [false, true, false],  // Friendly
    [true, false, false],  // Hostile
    [false, false, false], // Neutral
];

/// Are factions `a` and `b` hostile to each other?
pub fn are_enemies(a: Faction, b: Faction) -> bool {
    RELATIONS[a.index()][b.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Faction; 3] = [Faction::Friendly, Faction::Hostile, Faction::Neutral];

    #[test]
    fn test_relations_are_symmetric() {
        for a in ALL {
            for b in ALL {
                assert_eq!(are_enemies(a, b), are_enemies(b, a), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_nobody_hates_themselves() {
        for f in ALL {
            assert!(!are_enemies(f, f));
        }
    }

    #[test]
    fn test_friendly_vs_hostile() {
        assert!(are_enemies(Faction::Friendly, Faction::Hostile));
        assert!(!are_enemies(Faction::Neutral, Faction::Hostile));
    }
}
