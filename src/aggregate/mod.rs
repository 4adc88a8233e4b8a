// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Detection-result aggregation
//!
//! Summarization rules applied uniformly over any back end's normalized
//! detections: per-label grouping with mean confidence, overall totals, and
//! a fixed four-bucket confidence histogram. Pure functions only; identical
//! input always yields identical output.

use serde::Serialize;

use crate::detector::Detection;

/// The four confidence ranges, highest first. Lower bound inclusive, upper
/// bound exclusive, except the top bucket which includes 1.0.
const BUCKET_NAMES: [&str; 4] = [
    "Very High (0.9-1.0)",
    "High (0.7-0.9)",
    "Medium (0.5-0.7)",
    "Low (0.0-0.5)",
];

/// Per-label breakdown of a detection list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelGroup {
    pub label: String,
    pub count: usize,
    pub scores: Vec<f32>,
    pub mean_score: f32,
}

/// Count for one confidence range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub range: &'static str,
    pub count: usize,
}

/// Summary statistics over a detection list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_objects: usize,
    pub unique_labels: usize,
    /// Groups in first-seen label order.
    pub labels: Vec<LabelGroup>,
    /// Always all four buckets, zero counts included.
    pub confidence_histogram: Vec<BucketCount>,
}

/// Index of the bucket a score falls into. Every score lands in exactly
/// one bucket; 1.0 belongs to the top range.
fn bucket_index(score: f32) -> usize {
    if score >= 0.9 {
        0
    } else if score >= 0.7 {
        1
    } else if score >= 0.5 {
        2
    } else {
        3
    }
}

/// Compute the summary for a detection list.
pub fn aggregate(detections: &[Detection]) -> Summary {
    let mut labels: Vec<LabelGroup> = Vec::new();
    let mut buckets = [0usize; 4];

    for det in detections {
        buckets[bucket_index(det.score)] += 1;
        match labels.iter_mut().find(|group| group.label == det.label) {
            Some(group) => {
                group.count += 1;
                group.scores.push(det.score);
            }
            None => labels.push(LabelGroup {
                label: det.label.clone(),
                count: 1,
                scores: vec![det.score],
                mean_score: 0.0,
            }),
        }
    }

    for group in &mut labels {
        group.mean_score = group.scores.iter().sum::<f32>() / group.scores.len() as f32;
    }

    Summary {
        total_objects: detections.len(),
        unique_labels: labels.len(),
        labels,
        confidence_histogram: BUCKET_NAMES
            .into_iter()
            .zip(buckets)
            .map(|(range, count)| BucketCount { range, count })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(label: &str, score: f32) -> Detection {
        Detection {
            bbox: [0.0, 0.0, 10.0, 10.0],
            score,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_empty_input() {
        let summary = aggregate(&[]);
        assert_eq!(summary.total_objects, 0);
        assert_eq!(summary.unique_labels, 0);
        assert!(summary.labels.is_empty());
        assert_eq!(summary.confidence_histogram.len(), 4);
        assert!(summary.confidence_histogram.iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_groups_by_label_preserving_first_seen_order() {
        let dets = vec![det("car", 0.8), det("person", 0.6), det("car", 0.9)];
        let summary = aggregate(&dets);
        assert_eq!(summary.total_objects, 3);
        assert_eq!(summary.unique_labels, 2);
        assert_eq!(summary.labels[0].label, "car");
        assert_eq!(summary.labels[0].count, 2);
        assert_eq!(summary.labels[0].scores, vec![0.8, 0.9]);
        assert!((summary.labels[0].mean_score - 0.85).abs() < 1e-6);
        assert_eq!(summary.labels[1].label, "person");
        assert_eq!(summary.labels[1].count, 1);
    }

    #[test]
    fn test_bucket_boundaries_land_in_exactly_one_bucket() {
        assert_eq!(bucket_index(1.0), 0);
        assert_eq!(bucket_index(0.9), 0);
        assert_eq!(bucket_index(0.7), 1);
        assert_eq!(bucket_index(0.5), 2);
        assert_eq!(bucket_index(0.0), 3);
        // Just under each boundary stays below
        assert_eq!(bucket_index(0.899), 1);
        assert_eq!(bucket_index(0.699), 2);
        assert_eq!(bucket_index(0.499), 3);
    }

    #[test]
    fn test_histogram_counts_partition_the_input() {
        let dets = vec![
            det("a", 0.95),
            det("b", 1.0),
            det("c", 0.7),
            det("d", 0.5),
            det("e", 0.3),
            det("f", 0.55),
        ];
        let summary = aggregate(&dets);
        let counts: Vec<usize> = summary
            .confidence_histogram
            .iter()
            .map(|b| b.count)
            .collect();
        assert_eq!(counts, vec![2, 1, 2, 1]);
        assert_eq!(counts.iter().sum::<usize>(), summary.total_objects);
    }

    #[test]
    fn test_pure_function_identical_output() {
        let dets = vec![det("person", 0.6), det("car", 0.4)];
        assert_eq!(aggregate(&dets), aggregate(&dets));
        assert_eq!(aggregate(&[]), aggregate(&[]));
    }
}
