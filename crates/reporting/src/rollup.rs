use std::collections::BTreeMap;

/// Sum `value` per `key`. Keys come back in ascending order.
pub(crate) fn sum_by<'a, T, K, I>(
    rows: I,
    key: impl Fn(&T) -> K,
    value: impl Fn(&T) -> f64,
) -> BTreeMap<K, f64>
where
    T: 'a,
    K: Ord,
    I: IntoIterator<Item = &'a T>,
{
    let mut sums = BTreeMap::new();
    for row in rows {
        *sums.entry(key(row)).or_insert(0.0) += value(row);
    }
    sums
}

/// Sum integer `value` per `key`, saturating at `u64::MAX`.
pub(crate) fn count_by<'a, T, K, I>(
    rows: I,
    key: impl Fn(&T) -> K,
    value: impl Fn(&T) -> u64,
) -> BTreeMap<K, u64>
where
    T: 'a,
    K: Ord,
    I: IntoIterator<Item = &'a T>,
{
    let mut counts: BTreeMap<K, u64> = BTreeMap::new();
    for row in rows {
        let entry = counts.entry(key(row)).or_insert(0);
        *entry = entry.saturating_add(value(row));
    }
    counts
}

/// Saturating total of a stream of counts.
pub(crate) fn total_count(counts: impl IntoIterator<Item = u64>) -> u64 {
    counts.into_iter().fold(0, u64::saturating_add)
}

/// Descending by `value`, keeping input order among ties.
pub(crate) fn rank_desc<T>(rows: &mut [T], value: impl Fn(&T) -> f64) {
    rows.sort_by(|a, b| value(b).total_cmp(&value(a)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_by_groups_and_orders_keys() {
        let rows = [("b", 1.0), ("a", 2.0), ("b", 3.5)];
        let sums = sum_by(rows.iter(), |r| r.0, |r| r.1);
        assert_eq!(sums.into_iter().collect::<Vec<_>>(), vec![("a", 2.0), ("b", 4.5)]);
    }

    #[test]
    fn test_counts_saturate() {
        let rows = [(1, u64::MAX), (2, 4), (1, 7)];
        let counts = count_by(rows.iter(), |r| r.0, |r| r.1);
        assert_eq!(counts[&1], u64::MAX);
        assert_eq!(counts[&2], 4);
        assert_eq!(total_count([u64::MAX - 1, 5]), u64::MAX);
        assert_eq!(total_count([2, 3]), 5);
    }

    #[test]
    fn test_rank_desc_is_stable() {
        let mut rows = vec![(1, 5.0), (2, 9.0), (3, 5.0)];
        rank_desc(&mut rows, |r| r.1);
        assert_eq!(rows, vec![(2, 9.0), (1, 5.0), (3, 5.0)]);
    }
}
