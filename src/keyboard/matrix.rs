//! Charlieplex matrix mapping resolution
//!
//! On a charlieplexed board any two distinct lines can form a drive/sense
//! pair, so there is no fixed row/column grid to read a key's wiring from.
//! The resolver enumerates every ordered line pair, asks the layout's
//! matrix transform which logical position the pair addresses, and records
//! the result so a report can point a technician at the two physical pins
//! behind a misbehaving key.

use super::layout::{LayoutProvider, MatrixKind};

/// Drive/sense line pair for one logical key position.
///
/// Derived data: rebuilt from scratch on every resolution pass and never
/// patched incrementally, so a layout switch between requests cannot leave
/// stale coordinates behind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpioMapping {
    pub drive_line: u16,
    pub sense_line: u16,
    pub valid: bool,
}

/// Result of one resolution pass over the active layout
#[derive(Debug, Clone)]
pub struct MatrixMapping {
    /// Whether the active hardware is charlieplexed at all
    pub supported: bool,
    /// One entry per keymap position, invalid where no pair maps
    pub entries: Vec<GpioMapping>,
}

impl MatrixMapping {
    /// Mapping for a position, `None` when out of range or unmapped
    pub fn get(&self, position: usize) -> Option<GpioMapping> {
        self.entries
            .get(position)
            .copied()
            .filter(|mapping| mapping.valid)
    }
}

/// Recomputes the line-pair mapping for the active layout.
///
/// The scan is O(N^2) in the line count; N is tens of lines at most, so
/// recomputing per request is cheaper than staying correct across layout
/// switches any other way.
pub struct MatrixMappingResolver;

impl MatrixMappingResolver {
    /// Enumerate all `N*(N-1)` ordered distinct line pairs and build the
    /// per-position mapping.
    ///
    /// Self-pairs are skipped (a line cannot drive and sense itself). A
    /// pair the transform maps to no position is simply unmapped. If two
    /// pairs resolve to the same position the first one wins, keeping the
    /// pass deterministic in enumeration order. A non-charlieplex matrix
    /// yields an all-invalid mapping with `supported == false`.
    pub fn resolve(provider: &dyn LayoutProvider) -> MatrixMapping {
        let keymap_len = provider.keymap_len();
        let mut entries = vec![GpioMapping::default(); keymap_len];

        let matrix = provider.matrix();
        if matrix.kind != MatrixKind::Charlieplex {
            return MatrixMapping {
                supported: false,
                entries,
            };
        }

        let line_count = matrix.lines.len();
        for drive in 0..line_count {
            for sense in 0..line_count {
                if drive == sense {
                    continue;
                }
                let Some(position) = provider.position_for_pair(drive, sense) else {
                    continue;
                };
                if position >= keymap_len || entries[position].valid {
                    continue;
                }
                entries[position] = GpioMapping {
                    drive_line: drive as u16,
                    sense_line: sense as u16,
                    valid: true,
                };
            }
        }

        MatrixMapping {
            supported: true,
            entries,
        }
    }
}
