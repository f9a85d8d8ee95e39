//! Batch splitting.
//!
//! Pure function, no I/O: the full record sequence is partitioned exactly
//! once into contiguous, non-overlapping slices in source order.

/// Split `records` into batches of at most `size` elements.
///
/// Produces `ceil(records.len() / size)` slices; every batch except possibly
/// the last has exactly `size` elements.  An empty input yields zero batches.
///
/// # Panics
///
/// Panics if `size == 0` (enforced upstream by config validation).
pub fn split_into_batches<T>(records: &[T], size: usize) -> Vec<&[T]> {
    if records.is_empty() {
        return Vec::new();
    }
    records.chunks(size).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Concatenating the batches in order reproduces the input exactly, and
    /// every batch except possibly the last has the requested length.
    #[test]
    fn partition_property_holds_for_various_sizes() {
        let records: Vec<u32> = (0..23).collect();

        for size in 1..=25 {
            let batches = split_into_batches(&records, size);

            let expected = records.len().div_ceil(size);
            assert_eq!(batches.len(), expected, "size {size}");

            let concat: Vec<u32> = batches.iter().flat_map(|b| b.iter().copied()).collect();
            assert_eq!(concat, records, "size {size}");

            for batch in &batches[..batches.len() - 1] {
                assert_eq!(batch.len(), size, "size {size}");
            }
        }
    }

    #[test]
    fn empty_input_yields_zero_batches() {
        let records: Vec<u32> = Vec::new();
        assert!(split_into_batches(&records, 10).is_empty());
    }

    #[test]
    fn exact_division_has_no_short_tail() {
        let records: Vec<u32> = (0..20).collect();
        let batches = split_into_batches(&records, 10);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 10);
        assert_eq!(batches[1].len(), 10);
    }

    #[test]
    fn final_batch_may_be_smaller() {
        let records: Vec<u32> = (0..25).collect();
        let batches = split_into_batches(&records, 10);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2].len(), 5);
    }

    #[test]
    fn batch_larger_than_input_yields_single_batch() {
        let records: Vec<u32> = (0..3).collect();
        let batches = split_into_batches(&records, 10);

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
    }
}
