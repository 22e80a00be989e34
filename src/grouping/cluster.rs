//! Tempo clustering: unsupervised 1-D k-means over track tempos
//!
//! Tracks partition by tempo proximity, independent of detected key.
//! Initialization is deterministic (quantiles of the sorted tempo values),
//! so a given input always clusters the same way. Clusters are emitted in
//! ascending center order; inside a cluster the original input order is
//! kept, since the stretch step normalizes every member to the cluster
//! target tempo anyway.

use crate::error::Result;
use crate::grouping::{reject_empty, GroupingStrategy};
use crate::types::{Group, Track};
use tracing::debug;

const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-4;

#[derive(Debug)]
pub struct TempoClustering {
    cluster_count: usize,
}

impl TempoClustering {
    pub fn new(cluster_count: usize) -> Self {
        Self {
            cluster_count: cluster_count.max(1),
        }
    }
}

impl GroupingStrategy for TempoClustering {
    fn group(&self, tracks: Vec<Track>) -> Result<Vec<Group>> {
        reject_empty(&tracks)?;

        let tempos: Vec<f64> = tracks.iter().map(|t| t.tempo).collect();
        let k = self.cluster_count.min(tracks.len());
        let assignment = kmeans_1d(&tempos, k);

        let mut members: Vec<Vec<Track>> = (0..k).map(|_| Vec::new()).collect();
        for (track, cluster) in tracks.into_iter().zip(assignment.labels) {
            members[cluster].push(track);
        }

        let groups = members
            .into_iter()
            .zip(assignment.centers)
            .enumerate()
            .filter(|(_, (tracks, _))| !tracks.is_empty())
            .map(|(index, (tracks, center))| {
                let target = center.round();
                debug!(
                    "Tempo cluster {index}: {} tracks, target {target} BPM",
                    tracks.len()
                );
                Group {
                    label: format!("cluster:{index}"),
                    tracks,
                    target_tempo: Some(target),
                }
            })
            .collect();

        Ok(groups)
    }

    fn name(&self) -> &'static str {
        "tempo-cluster"
    }
}

struct Clustering {
    /// Cluster index per input value, indices ordered by ascending center
    labels: Vec<usize>,
    /// Cluster centers, ascending
    centers: Vec<f64>,
}

/// Lloyd's algorithm over scalar values with quantile initialization
fn kmeans_1d(values: &[f64], k: usize) -> Clustering {
    debug_assert!(k >= 1 && k <= values.len());

    // Quantile seeds: evenly spaced picks from the sorted values. Keeps the
    // run deterministic and well-spread for 1-D data.
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut centers: Vec<f64> = if k == 1 {
        vec![sorted[sorted.len() / 2]]
    } else {
        (0..k)
            .map(|i| sorted[i * (sorted.len() - 1) / (k - 1)])
            .collect()
    };

    let mut labels = vec![0usize; values.len()];
    for _ in 0..MAX_ITERATIONS {
        // Assignment step
        for (label, &value) in labels.iter_mut().zip(values) {
            *label = nearest_center(&centers, value);
        }

        // Update step
        let mut sums = vec![0.0f64; k];
        let mut counts = vec![0usize; k];
        for (&label, &value) in labels.iter().zip(values) {
            sums[label] += value;
            counts[label] += 1;
        }
        let mut shift = 0.0f64;
        for i in 0..k {
            if counts[i] > 0 {
                let updated = sums[i] / counts[i] as f64;
                shift = shift.max((updated - centers[i]).abs());
                centers[i] = updated;
            }
        }
        if shift < TOLERANCE {
            break;
        }
    }

    // Re-index clusters by ascending center so iteration order is stable
    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| centers[a].total_cmp(&centers[b]));
    let mut rank = vec![0usize; k];
    for (new_index, &old_index) in order.iter().enumerate() {
        rank[old_index] = new_index;
    }

    Clustering {
        labels: labels.into_iter().map(|l| rank[l]).collect(),
        centers: order.into_iter().map(|i| centers[i]).collect(),
    }
}

fn nearest_center(centers: &[f64], value: f64) -> usize {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (i, &c) in centers.iter().enumerate() {
        let dist = (value - c).abs();
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}
