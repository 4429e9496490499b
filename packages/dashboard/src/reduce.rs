//! Down-sampling of the filtered samples for display.

use signal_map_signal_models::Stride;

/// Returns every `stride`-th item, starting with the first.
///
/// A stride of one is the identity. The result has
/// `ceil(items.len() / stride)` elements in the original order.
#[must_use]
pub fn reduce<T: Clone>(items: &[T], stride: Stride) -> Vec<T> {
    items.iter().step_by(stride.get()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_one_is_identity() {
        let items: Vec<u32> = (0..17).collect();
        assert_eq!(reduce(&items, Stride::ONE), items);
    }

    #[test]
    fn length_is_ceiling_of_len_over_stride() {
        let items: Vec<u32> = (0..95).collect();
        for k in [1, 2, 7, 10, 20, 95, 200] {
            let reduced = reduce(&items, Stride::new(k).unwrap());
            assert_eq!(reduced.len(), items.len().div_ceil(k), "stride {k}");
            assert_eq!(reduced[0], 0, "stride {k}");
        }
    }

    #[test]
    fn keeps_every_kth_in_order() {
        let items = vec!['a', 'b', 'c', 'd', 'e', 'f', 'g'];
        assert_eq!(reduce(&items, Stride::new(3).unwrap()), vec!['a', 'd', 'g']);
    }

    #[test]
    fn empty_input_stays_empty() {
        let items: Vec<u32> = Vec::new();
        assert!(reduce(&items, Stride::new(10).unwrap()).is_empty());
    }
}
