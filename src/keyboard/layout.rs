//! Physical layout collaborator interface
//!
//! The layout database lives outside this crate (in firmware it is the
//! keymap/kscan configuration). The diagnostics engine only ever queries it
//! through [`LayoutProvider`], and copies what it needs: the active layout
//! can change between requests, so nothing here is cached across calls.

use serde::{Deserialize, Serialize};

/// Geometry record for one key in the physical layout.
///
/// Coordinates and sizes are in layout units (typically centi-keyunits);
/// rotation is in degrees for keys mounted at an angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyGeometry {
    /// Logical key position this record describes
    pub position: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Rotation in degrees, if the key is not axis-aligned
    pub rotation: Option<i32>,
}

/// Hardware identity of one matrix line, enough to locate the solder joint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioPin {
    /// GPIO controller label, e.g. "gpio0"
    pub port: String,
    /// Pin number on that controller
    pub pin: u32,
    /// Raw devicetree-style flags (pull direction, active level)
    pub flags: u32,
}

impl GpioPin {
    pub fn new(port: impl Into<String>, pin: u32, flags: u32) -> Self {
        Self {
            port: port.into(),
            pin,
            flags,
        }
    }
}

/// Kind of switch-scan wiring the active hardware uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    /// Any two distinct lines can form a drive/sense pair
    Charlieplex,
    /// Fixed row/column grid
    RowColumn,
    /// One dedicated line per key
    Direct,
}

/// The scan wiring description: kind plus the full ordered line set
#[derive(Debug, Clone)]
pub struct MatrixDescriptor {
    pub kind: MatrixKind,
    pub lines: Vec<GpioPin>,
}

/// Identity of the currently active layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutInfo {
    pub name: String,
    pub index: u32,
}

/// Read-only view of the layout database.
///
/// `position_for_pair` is the matrix-transform capability: given a
/// (drive, sense) line pair, return the logical position that pair
/// addresses, or `None` if the pair maps to no key. Implementations must
/// not be assumed to be anything beyond this contract.
pub trait LayoutProvider: Send + Sync {
    /// Identity of the active layout
    fn active_layout(&self) -> LayoutInfo;

    /// Number of logical key positions in the keymap
    fn keymap_len(&self) -> usize;

    /// Geometry of every physical key, in layout order
    fn key_geometry(&self) -> Vec<KeyGeometry>;

    /// Scan wiring of the active hardware
    fn matrix(&self) -> MatrixDescriptor;

    /// Logical position addressed by a (drive, sense) line pair
    fn position_for_pair(&self, drive: usize, sense: usize) -> Option<usize>;
}

/// Table-driven [`LayoutProvider`] for the simulator and tests.
///
/// Holds the layout data as plain values; the pair table is the explicit
/// (drive, sense) → position relation a charlieplex kscan driver would
/// compute from its wiring.
#[derive(Debug, Clone)]
pub struct StaticLayout {
    info: LayoutInfo,
    keymap_len: usize,
    geometry: Vec<KeyGeometry>,
    kind: MatrixKind,
    lines: Vec<GpioPin>,
    pairs: Vec<((usize, usize), usize)>,
}

impl StaticLayout {
    pub fn new(
        name: impl Into<String>,
        index: u32,
        keymap_len: usize,
        kind: MatrixKind,
        lines: Vec<GpioPin>,
    ) -> Self {
        Self {
            info: LayoutInfo {
                name: name.into(),
                index,
            },
            keymap_len,
            geometry: Vec::new(),
            kind,
            lines,
            pairs: Vec::new(),
        }
    }

    /// Append a geometry record
    pub fn with_key(mut self, geometry: KeyGeometry) -> Self {
        self.geometry.push(geometry);
        self
    }

    /// Map a (drive, sense) line pair to a logical position
    pub fn with_pair(mut self, drive: usize, sense: usize, position: usize) -> Self {
        self.pairs.push(((drive, sense), position));
        self
    }
}

impl LayoutProvider for StaticLayout {
    fn active_layout(&self) -> LayoutInfo {
        self.info.clone()
    }

    fn keymap_len(&self) -> usize {
        self.keymap_len
    }

    fn key_geometry(&self) -> Vec<KeyGeometry> {
        self.geometry.clone()
    }

    fn matrix(&self) -> MatrixDescriptor {
        MatrixDescriptor {
            kind: self.kind,
            lines: self.lines.clone(),
        }
    }

    fn position_for_pair(&self, drive: usize, sense: usize) -> Option<usize> {
        self.pairs
            .iter()
            .find(|(pair, _)| *pair == (drive, sense))
            .map(|(_, position)| *position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_line_layout() -> StaticLayout {
        StaticLayout::new(
            "test",
            0,
            2,
            MatrixKind::Charlieplex,
            vec![GpioPin::new("gpio0", 4, 0), GpioPin::new("gpio0", 5, 0)],
        )
        .with_pair(0, 1, 0)
        .with_pair(1, 0, 1)
    }

    #[test]
    fn pair_table_lookup() {
        let layout = two_line_layout();
        assert_eq!(layout.position_for_pair(0, 1), Some(0));
        assert_eq!(layout.position_for_pair(1, 0), Some(1));
        assert_eq!(layout.position_for_pair(0, 0), None);
    }

    #[test]
    fn matrix_descriptor_preserves_line_order() {
        let layout = two_line_layout();
        let matrix = layout.matrix();
        assert_eq!(matrix.kind, MatrixKind::Charlieplex);
        assert_eq!(matrix.lines[0].pin, 4);
        assert_eq!(matrix.lines[1].pin, 5);
    }

    #[test]
    fn geometry_is_copied_in_order() {
        let layout = two_line_layout()
            .with_key(KeyGeometry {
                position: 0,
                x: 0,
                y: 0,
                width: 100,
                height: 100,
                rotation: None,
            })
            .with_key(KeyGeometry {
                position: 1,
                x: 100,
                y: 0,
                width: 100,
                height: 100,
                rotation: Some(15),
            });

        let geometry = layout.key_geometry();
        assert_eq!(geometry.len(), 2);
        assert_eq!(geometry[1].rotation, Some(15));
    }
}
