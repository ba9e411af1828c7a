//! Regular lattice geometry
//!
//! Maps a repetition index onto a point of a 2D or 3D grid. One
//! [`LatticeCoordinate`] binding yields a single axis component, so two or
//! three bindings sharing the same [`Lattice`] describe one point per
//! repetition.
//!
//! The origin is the corner of the grid (the point at index 0). Indices wrap
//! on every axis. Triangular packing shifts odd rows by half the X spacing
//! and, in 3D, odd layers by half the Y spacing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lattice axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn position(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// How successive rows are packed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Packing {
    #[default]
    Rectangular,
    Triangular,
}

impl Packing {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rectangular" => Some(Packing::Rectangular),
            "triangular" => Some(Packing::Triangular),
            _ => None,
        }
    }
}

impl fmt::Display for Packing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packing::Rectangular => f.write_str("rectangular"),
            Packing::Triangular => f.write_str("triangular"),
        }
    }
}

/// A regular grid of `dims[0] * dims[1] * dims[2]` points
///
/// Planar lattices have a single layer (`dims[2] == 1`, zero Z extent).
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    dims: [u32; 3],
    origin: [f64; 3],
    lengths: [f64; 3],
    packing: Packing,
    rank: usize,
}

impl Lattice {
    /// Planar lattice. `dims` must be at least 1 on each axis.
    pub fn planar(dims: [u32; 2], origin: [f64; 2], lengths: [f64; 2], packing: Packing) -> Self {
        Self {
            dims: [dims[0].max(1), dims[1].max(1), 1],
            origin: [origin[0], origin[1], 0.0],
            lengths: [lengths[0], lengths[1], 0.0],
            packing,
            rank: 2,
        }
    }

    /// Spatial lattice. `dims` must be at least 1 on each axis.
    pub fn spatial(dims: [u32; 3], origin: [f64; 3], lengths: [f64; 3], packing: Packing) -> Self {
        Self {
            dims: dims.map(|d| d.max(1)),
            origin,
            lengths,
            packing,
            rank: 3,
        }
    }

    /// Number of axes (2 or 3)
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn packing(&self) -> Packing {
        self.packing
    }

    /// Total number of distinct points before indices wrap
    pub fn point_count(&self) -> u64 {
        self.dims.iter().map(|&d| d as u64).product()
    }

    /// Distance between neighbouring points along `axis`
    pub fn spacing(&self, axis: Axis) -> f64 {
        let a = axis.position();
        self.lengths[a] / self.dims[a] as f64
    }

    /// Whether `axis` exists on this lattice
    pub fn has_axis(&self, axis: Axis) -> bool {
        axis.position() < self.rank
    }

    /// Integer grid cell of the point for `iteration`
    pub fn cell(&self, iteration: u32) -> [u32; 3] {
        let [nx, ny, nz] = self.dims;
        let i = iteration as u64;
        let ix = i % nx as u64;
        let iy = (i / nx as u64) % ny as u64;
        let iz = (i / (nx as u64 * ny as u64)) % nz as u64;
        [ix as u32, iy as u32, iz as u32]
    }

    /// Full coordinates of the point for `iteration`
    pub fn point(&self, iteration: u32) -> [f64; 3] {
        let [ix, iy, iz] = self.cell(iteration);
        let (sx, sy, sz) = (self.spacing(Axis::X), self.spacing(Axis::Y), self.spacing(Axis::Z));

        let mut x = self.origin[0] + ix as f64 * sx;
        let mut y = self.origin[1] + iy as f64 * sy;
        let z = self.origin[2] + iz as f64 * sz;

        if self.packing == Packing::Triangular {
            if iy % 2 == 1 {
                x += 0.5 * sx;
            }
            if iz % 2 == 1 {
                y += 0.5 * sy;
            }
        }

        [x, y, z]
    }

    /// One component of the point for `iteration`
    pub fn coordinate(&self, axis: Axis, iteration: u32) -> f64 {
        self.point(iteration)[axis.position()]
    }
}

/// One axis of a lattice, as bound to a placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeCoordinate {
    pub lattice: Lattice,
    pub axis: Axis,
}

impl LatticeCoordinate {
    pub fn new(lattice: Lattice, axis: Axis) -> Self {
        Self { lattice, axis }
    }

    pub fn evaluate(&self, iteration: u32) -> f64 {
        self.lattice.coordinate(self.axis, iteration)
    }
}

impl fmt::Display for LatticeCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lattice {}D axis {}",
            self.lattice.packing, self.lattice.rank, self.axis
        )
    }
}
