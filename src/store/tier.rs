use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{MediaError, MediaResult};

/// Pixel budgets of the scaled tiers `s0..s9`.
pub const SCALED_PIXEL_BUDGETS: [u64; 10] = [
    1_024, 4_096, 9_216, 25_600, 65_536, 193_600, 577_600, 1_721_344, 5_062_500, 14_745_600,
];

/// Scaled tiers written eagerly whenever a full-tier artifact is created.
pub const PRECOMPUTED_LADDER: [Tier; 5] = [
    Tier::Scaled(2),
    Tier::Scaled(3),
    Tier::Scaled(4),
    Tier::Scaled(5),
    Tier::Scaled(6),
];

/// Storage tier: the full-resolution artifact or one downscaled bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Full resolution (`F`).
    Full,
    /// Downscaled to [`SCALED_PIXEL_BUDGETS`]`[i]` (`s0`..`s9`).
    Scaled(u8),
}

impl Tier {
    /// Every tier, full first.
    pub fn all() -> impl Iterator<Item = Tier> {
        std::iter::once(Tier::Full).chain((0..SCALED_PIXEL_BUDGETS.len() as u8).map(Tier::Scaled))
    }

    /// Directory name under the image root.
    pub fn dir_name(self) -> String {
        self.to_string()
    }

    /// Target pixel count, `None` for the full tier.
    pub fn pixel_budget(self) -> Option<u64> {
        match self {
            Tier::Full => None,
            Tier::Scaled(i) => SCALED_PIXEL_BUDGETS.get(usize::from(i)).copied(),
        }
    }

    /// Dense index used to address per-tier tables.
    pub(crate) fn index(self) -> usize {
        match self {
            Tier::Full => 0,
            Tier::Scaled(i) => 1 + usize::from(i),
        }
    }

    /// Number of distinct tiers.
    pub(crate) const COUNT: usize = 1 + SCALED_PIXEL_BUDGETS.len();
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Full => f.write_str("F"),
            Tier::Scaled(i) => write!(f, "s{i}"),
        }
    }
}

impl FromStr for Tier {
    type Err = MediaError;

    fn from_str(s: &str) -> MediaResult<Self> {
        if s == "F" {
            return Ok(Tier::Full);
        }
        let idx = s
            .strip_prefix('s')
            .filter(|d| d.len() == 1)
            .and_then(|d| d.parse::<u8>().ok())
            .filter(|i| usize::from(*i) < SCALED_PIXEL_BUDGETS.len());
        idx.map(Tier::Scaled)
            .ok_or_else(|| MediaError::not_found(format!("no tier named '{s}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/tier.rs"]
mod tests;
