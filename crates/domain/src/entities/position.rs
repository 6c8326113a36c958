use serde::{Deserialize, Serialize};

/// Inclusive bin bounds of the active position.
///
/// Replaced wholesale on relocation; never patched in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionRange {
    pub lower_bin_id: i32,
    pub upper_bin_id: i32,
}

impl PositionRange {
    pub fn new(lower_bin_id: i32, upper_bin_id: i32) -> Self {
        Self {
            lower_bin_id,
            upper_bin_id,
        }
    }

    /// Builds a range of `width` bins on each side of `center`.
    pub fn centered(center: i32, width: u32) -> Self {
        let width = width as i32;
        Self::new(center - width, center + width)
    }

    pub fn contains(&self, bin_id: i32) -> bool {
        bin_id >= self.lower_bin_id && bin_id <= self.upper_bin_id
    }

    /// Number of bins covered by the range.
    pub fn bin_count(&self) -> u32 {
        (self.upper_bin_id - self.lower_bin_id + 1).max(0) as u32
    }
}

impl std::fmt::Display for PositionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lower_bin_id, self.upper_bin_id)
    }
}

/// A position as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    /// Position account address.
    pub address: String,
    pub range: PositionRange,
}
