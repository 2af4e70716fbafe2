/// Returns the `n` records with the highest `key`, in descending key order.
///
/// The sort is stable, so records with equal keys keep their input order.
/// Truncation happens after sorting.
pub fn top_n<T, F>(mut records: Vec<T>, key: F, n: usize) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    records.sort_by(|a, b| key(b).total_cmp(&key(a)));
    records.truncate(n);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ties_keep_input_order() {
        let courts = vec![("A", 5.0), ("B", 9.0), ("C", 9.0)];
        let top = top_n(courts, |c| c.1, 2);
        assert_eq!(top, vec![("B", 9.0), ("C", 9.0)]);
    }

    #[test]
    fn test_truncates_after_sorting() {
        let top = top_n(vec![1.0, 2.0, 3.0], |v| *v, 1);
        assert_eq!(top, vec![3.0]);
    }

    #[test]
    fn test_n_larger_than_input() {
        let top = top_n(vec![1.0, 3.0], |v| *v, 10);
        assert_eq!(top, vec![3.0, 1.0]);
    }

    proptest! {
        #[test]
        fn prop_top_n_shape(keys in prop::collection::vec(0u8..5, 0..40), n in 0usize..50) {
            // Small key range forces plenty of equal keys.
            let records: Vec<(usize, u8)> = keys.into_iter().enumerate().collect();
            let top = top_n(records.clone(), |r| r.1 as f64, n);

            prop_assert_eq!(top.len(), n.min(records.len()));
            for pair in top.windows(2) {
                prop_assert!(pair[0].1 >= pair[1].1);
                if pair[0].1 == pair[1].1 {
                    prop_assert!(pair[0].0 < pair[1].0);
                }
            }
            prop_assert_eq!(top_n(top.clone(), |r| r.1 as f64, n), top);
        }
    }
}
