//! Connected component analysis
//!
//! This module labels connected components with a two-pass Union-Find
//! (disjoint set) scan, and builds the edge filter on top of it: edge cells
//! connect only to neighbors of the same weak/strong class, and components
//! shorter than a minimum length are dropped.

use crate::error::{RegionError, RegionResult};
use edgeotsu_core::{BinaryMask, EdgeClass, EdgeClasses, GeoTransform, PixelBounds};

/// Connectivity type for component analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityType {
    /// 4-way connectivity (up, down, left, right)
    #[default]
    FourWay,
    /// 8-way connectivity (includes diagonals)
    EightWay,
}

impl ConnectivityType {
    /// Offsets of the neighbors already visited in a raster scan
    fn prior_neighbors(self) -> &'static [(i64, i64)] {
        match self {
            ConnectivityType::FourWay => &[(-1, 0), (0, -1)],
            ConnectivityType::EightWay => &[(-1, 0), (-1, -1), (0, -1), (1, -1)],
        }
    }
}

/// A connected component
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectedComponent {
    /// Label in the producing [`LabelMap`] (1-based)
    pub label: u32,
    /// Number of cells in this component
    pub pixel_count: u32,
    /// Bounding box of this component
    pub bounds: PixelBounds,
}

/// Grid of component labels; 0 is background
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    transform: GeoTransform,
    labels: Vec<u32>,
    count: u32,
}

impl LabelMap {
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Row-major labels
    #[inline]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Label at (x, y), or `None` outside the grid
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.labels[(y as usize) * (self.width as usize) + (x as usize)])
    }

    /// Number of components; labels run from 1 to this value
    #[inline]
    pub fn num_components(&self) -> u32 {
        self.count
    }
}

/// Disjoint set forest with path halving and union by smaller root
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        // Slot 0 is the background label
        Self { parent: vec![0] }
    }

    fn make_set(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi as usize] = lo;
        }
    }
}

/// Two-pass labeling of cells where `member(i)` holds; neighbors join
/// when `joins(i, j)` holds.
fn label_with<M, J>(
    width: u32,
    height: u32,
    connectivity: ConnectivityType,
    member: M,
    joins: J,
) -> (Vec<u32>, u32)
where
    M: Fn(usize) -> bool,
    J: Fn(usize, usize) -> bool,
{
    let (w, h) = (width as usize, height as usize);
    let mut provisional = vec![0u32; w * h];
    let mut uf = UnionFind::new();

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if !member(i) {
                continue;
            }
            let mut current = 0u32;
            for &(dx, dy) in connectivity.prior_neighbors() {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= w as i64 {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                let l = provisional[j];
                if l == 0 || !joins(i, j) {
                    continue;
                }
                if current == 0 {
                    current = l;
                } else {
                    uf.union(current, l);
                }
            }
            if current == 0 {
                current = uf.make_set();
            }
            provisional[i] = current;
        }
    }

    // Resolve roots to consecutive labels in scan order
    let mut compact = vec![0u32; uf.parent.len()];
    let mut count = 0u32;
    for l in provisional.iter_mut() {
        if *l == 0 {
            continue;
        }
        let root = uf.find(*l) as usize;
        if compact[root] == 0 {
            count += 1;
            compact[root] = count;
        }
        *l = compact[root];
    }
    (provisional, count)
}

/// Label the connected components of the set cells of `mask`.
///
/// No-data cells are background.
pub fn label_components(mask: &BinaryMask, connectivity: ConnectivityType) -> LabelMap {
    let data = mask.data();
    let (labels, count) = label_with(
        mask.width(),
        mask.height(),
        connectivity,
        |i| data[i] == 1,
        |_, _| true,
    );
    LabelMap {
        width: mask.width(),
        height: mask.height(),
        transform: *mask.transform(),
        labels,
        count,
    }
}

/// Label edge cells, joining neighbors only when they share a class.
pub fn label_edge_classes(classes: &EdgeClasses, connectivity: ConnectivityType) -> LabelMap {
    let data = classes.data();
    let (labels, count) = label_with(
        classes.width(),
        classes.height(),
        connectivity,
        |i| data[i].is_edge(),
        |i, j| data[i] == data[j],
    );
    LabelMap {
        width: classes.width(),
        height: classes.height(),
        transform: *classes.transform(),
        labels,
        count,
    }
}

/// Cell count of every component; index `label - 1`.
pub fn component_sizes(labels: &LabelMap) -> Vec<u32> {
    let mut sizes = vec![0u32; labels.count as usize];
    for &l in &labels.labels {
        if l > 0 {
            sizes[(l - 1) as usize] += 1;
        }
    }
    sizes
}

/// Find all connected components of the set cells of `mask`.
///
/// Components are ordered by label, i.e. by their first cell in raster order.
pub fn find_connected_components(
    mask: &BinaryMask,
    connectivity: ConnectivityType,
) -> Vec<ConnectedComponent> {
    let labels = label_components(mask, connectivity);
    let mut components: Vec<ConnectedComponent> = (1..=labels.count)
        .map(|label| ConnectedComponent {
            label,
            pixel_count: 0,
            bounds: PixelBounds {
                x0: u32::MAX,
                y0: u32::MAX,
                x1: 0,
                y1: 0,
            },
        })
        .collect();
    let w = labels.width as usize;
    for (i, &l) in labels.labels.iter().enumerate() {
        if l == 0 {
            continue;
        }
        let (x, y) = ((i % w) as u32, (i / w) as u32);
        let c = &mut components[(l - 1) as usize];
        c.pixel_count += 1;
        c.bounds.x0 = c.bounds.x0.min(x);
        c.bounds.y0 = c.bounds.y0.min(y);
        c.bounds.x1 = c.bounds.x1.max(x + 1);
        c.bounds.y1 = c.bounds.y1.max(y + 1);
    }
    components
}

/// Options for [`filter_edges`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFilterOptions {
    /// Minimum (capped) component size to keep
    pub min_length: u32,
    /// Cap on the counted size of a component
    pub connected_pixels: u32,
}

impl Default for EdgeFilterOptions {
    fn default() -> Self {
        Self {
            min_length: 25,
            connected_pixels: 100,
        }
    }
}

impl EdgeFilterOptions {
    pub fn new(min_length: u32, connected_pixels: u32) -> Self {
        Self {
            min_length,
            connected_pixels,
        }
    }

    /// Reject caps that no component could ever satisfy.
    pub fn validate(&self) -> RegionResult<()> {
        if self.connected_pixels == 0 {
            return Err(RegionError::InvalidParameters(
                "connected pixel cap must be >= 1".to_string(),
            ));
        }
        if self.min_length > self.connected_pixels {
            return Err(RegionError::InvalidParameters(format!(
                "edge length {} exceeds connected pixel cap {}",
                self.min_length, self.connected_pixels
            )));
        }
        Ok(())
    }
}

/// Drop short edge components, keeping the weak/strong class of survivors.
///
/// Components are 8-connected runs of same-class edge cells. A component's
/// size counts at most `connected_pixels` cells and it survives when that
/// capped size reaches `min_length`. Filtering is idempotent.
///
/// # Errors
///
/// Returns [`RegionError::InvalidParameters`] for invalid options.
pub fn filter_edge_classes(
    classes: &EdgeClasses,
    options: &EdgeFilterOptions,
) -> RegionResult<EdgeClasses> {
    options.validate()?;

    let labels = label_edge_classes(classes, ConnectivityType::EightWay);
    let keep: Vec<bool> = component_sizes(&labels)
        .into_iter()
        .map(|n| n.min(options.connected_pixels) >= options.min_length)
        .collect();

    let data: Vec<EdgeClass> = classes
        .data()
        .iter()
        .zip(labels.labels())
        .map(|(&c, &l)| {
            if l > 0 && !keep[(l - 1) as usize] {
                EdgeClass::None
            } else {
                c
            }
        })
        .collect();

    log::debug!(
        "edge filter: kept {} of {} components (min length {}, cap {})",
        keep.iter().filter(|&&k| k).count(),
        keep.len(),
        options.min_length,
        options.connected_pixels
    );
    Ok(EdgeClasses::new(
        classes.width(),
        classes.height(),
        data,
        *classes.transform(),
    )?)
}

/// Drop short edge components and return the surviving edges as a mask.
///
/// See [`filter_edge_classes`]. No-data cells stay no-data.
pub fn filter_edges(
    classes: &EdgeClasses,
    options: &EdgeFilterOptions,
) -> RegionResult<BinaryMask> {
    Ok(filter_edge_classes(classes, options)?.to_mask()?)
}
