//! edgeotsu-region - Edge filtering and buffering
//!
//! - [`label_components`] / [`find_connected_components`] - Union-Find
//!   connected component labeling
//! - [`filter_edges`] - Drop short edge components, keeping weak and strong
//!   edges apart
//! - [`euclidean_distance`] / [`barrier_distance`] - Distance transforms
//! - [`buffer_edges`] - Grow edges into the band sampled by the adaptive pass

pub mod buffer;
pub mod conncomp;
pub mod distance;
pub mod error;

pub use buffer::{NoDataDistance, buffer_edges, buffer_pixels};
pub use conncomp::{
    ConnectedComponent, ConnectivityType, EdgeFilterOptions, LabelMap, component_sizes,
    filter_edge_classes, filter_edges, find_connected_components, label_components,
    label_edge_classes,
};
pub use distance::{DistanceField, barrier_distance, euclidean_distance};
pub use error::{RegionError, RegionResult};
