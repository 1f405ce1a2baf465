//! Partitioned parallel aggregation.

use log::debug;
use rayon::prelude::*;

use crate::aggregate::interaction_set::InteractionSet;
use crate::codec::CodedRecord;

/// Sums coded records into an [`InteractionSet`].
///
/// The input is cut into `partition_count` contiguous chunks, each chunk is
/// folded into a partial set on the current rayon pool, and the partial sets
/// are merged.
#[derive(Debug, Clone)]
pub struct InteractionAggregator {
    partition_count: usize,
}

impl Default for InteractionAggregator {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl InteractionAggregator {
    /// Create an aggregator. A partition count of zero is treated as one.
    pub fn new(partition_count: usize) -> Self {
        InteractionAggregator {
            partition_count: partition_count.max(1),
        }
    }

    /// Number of partitions the input is split into.
    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    /// Aggregate all records.
    pub fn aggregate(&self, records: &[CodedRecord]) -> InteractionSet {
        if records.is_empty() {
            return InteractionSet::new();
        }

        let chunk_size = records.len().div_ceil(self.partition_count);
        debug!(
            "Aggregating {} records in {} partitions of up to {chunk_size}",
            records.len(),
            records.len().div_ceil(chunk_size)
        );

        records
            .par_chunks(chunk_size)
            .map(aggregate_partition)
            .reduce(InteractionSet::new, |mut merged, partial| {
                merged.merge(partial);
                merged
            })
    }

    /// Merge partial sets produced elsewhere, e.g. by independent workers.
    pub fn merge_partials<I>(&self, partials: I) -> InteractionSet
    where
        I: IntoIterator<Item = InteractionSet>,
    {
        partials
            .into_iter()
            .fold(InteractionSet::new(), |mut merged, partial| {
                merged.merge(partial);
                merged
            })
    }
}

/// Fold one partition sequentially.
pub fn aggregate_partition(records: &[CodedRecord]) -> InteractionSet {
    records.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<CodedRecord> {
        let mut records = Vec::new();
        for i in 0..200u32 {
            records.push(CodedRecord::occurrence(i64::from(i % 7), i % 5));
        }
        records
    }

    #[test]
    fn test_counts_occurrences() {
        // [(u1,a1),(u1,a1),(u2,a1)]
        let records = vec![
            CodedRecord::occurrence(1, 0),
            CodedRecord::occurrence(1, 0),
            CodedRecord::occurrence(2, 0),
        ];

        let set = InteractionAggregator::new(2).aggregate(&records);
        assert_eq!(set.len(), 2);
        assert_eq!(set.rating(1, 0), Some(2));
        assert_eq!(set.rating(2, 0), Some(1));
    }

    #[test]
    fn test_partition_count_does_not_change_result() {
        let records = sample_records();
        let reference = aggregate_partition(&records);

        for partitions in [1, 2, 3, 7, 64, 1000] {
            let set = InteractionAggregator::new(partitions).aggregate(&records);
            assert_eq!(set, reference, "partitions = {partitions}");
        }
    }

    #[test]
    fn test_every_grouping_of_three_records() {
        let records = [
            CodedRecord::occurrence(1, 0),
            CodedRecord::occurrence(1, 0),
            CodedRecord::occurrence(2, 0),
        ];
        let aggregator = InteractionAggregator::new(1);
        let expected = aggregator.aggregate(&records);

        let groupings: Vec<Vec<Vec<usize>>> = vec![
            vec![vec![0, 1, 2]],
            vec![vec![0], vec![1, 2]],
            vec![vec![0, 1], vec![2]],
            vec![vec![0, 2], vec![1]],
            vec![vec![2], vec![1], vec![0]],
        ];
        for grouping in groupings {
            let partials = grouping.iter().map(|group| {
                let part: Vec<CodedRecord> = group.iter().map(|&i| records[i]).collect();
                aggregate_partition(&part)
            });
            assert_eq!(aggregator.merge_partials(partials), expected);
        }
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let records = sample_records();
        let mut reversed = records.clone();
        reversed.reverse();

        let aggregator = InteractionAggregator::new(4);
        assert_eq!(aggregator.aggregate(&records), aggregator.aggregate(&reversed));
    }

    #[test]
    fn test_empty_input() {
        let set = InteractionAggregator::new(4).aggregate(&[]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_zero_partitions_is_one() {
        assert_eq!(InteractionAggregator::new(0).partition_count(), 1);
    }
}
