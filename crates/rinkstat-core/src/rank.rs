//! Competitive ranking.
//!
//! Each metric is ranked independently. Ranks are 1..N with no gaps and no
//! shared ranks: ties keep the order the records arrived in, which is
//! ascending human id.

use crate::{
  metric::{Direction, Metric, SubjectKind},
  record::AccumulatorRecord,
};

/// Rank `records` by `metric`. Record order is left unchanged; only the
/// metric's rank and `total_in_rank` are written.
pub fn rank(records: &mut [AccumulatorRecord], metric: Metric, direction: Direction) {
  let mut order: Vec<(usize, f64)> = records
    .iter()
    .enumerate()
    .map(|(i, r)| (i, r.value(metric).unwrap_or(0.0)))
    .collect();

  // `sort_by` is stable
  order.sort_by(|(_, a), (_, b)| match direction {
    Direction::Descending => b.total_cmp(a),
    Direction::Ascending => a.total_cmp(b),
  });

  let total = records.len() as u32;
  for (position, (index, _)) in order.into_iter().enumerate() {
    let record = &mut records[index];
    record.set_rank(metric, position as u32 + 1);
    record.total_in_rank = total;
  }
}

/// Rank every metric of `kind`.
pub fn rank_all(records: &mut [AccumulatorRecord], kind: SubjectKind) {
  for &metric in kind.metrics() {
    rank(records, metric, metric.direction());
  }
}

#[cfg(test)]
mod tests {
  use rstest::rstest;

  use super::*;
  use crate::record::MetricValue;

  fn record(human_id: i64, goals: f64, allowed: f64) -> AccumulatorRecord {
    AccumulatorRecord {
      human_id,
      games: 1,
      metrics: vec![
        MetricValue { metric: Metric::Goals, value: goals, rank: 0 },
        MetricValue { metric: Metric::GoalsAllowed, value: allowed, rank: 0 },
      ],
      total_in_rank: 0,
      first_game_id: None,
      last_game_id: None,
    }
  }

  fn ranks(records: &[AccumulatorRecord], metric: Metric) -> Vec<u32> {
    records.iter().map(|r| r.rank(metric).unwrap()).collect()
  }

  #[rstest]
  #[case::descending(Metric::Goals, Direction::Descending, vec![3, 1, 2])]
  #[case::ascending(Metric::GoalsAllowed, Direction::Ascending, vec![2, 3, 1])]
  fn ranks_by_direction(
    #[case] metric: Metric,
    #[case] direction: Direction,
    #[case] expected: Vec<u32>,
  ) {
    let mut records = vec![record(1, 1.0, 2.0), record(2, 5.0, 3.0), record(3, 2.0, 0.5)];
    rank(&mut records, metric, direction);
    assert_eq!(ranks(&records, metric), expected);
    assert!(records.iter().all(|r| r.total_in_rank == 3));
  }

  #[test]
  fn ties_keep_input_order() {
    let mut records = vec![record(1, 2.0, 0.0), record(2, 2.0, 0.0), record(3, 2.0, 0.0)];
    rank(&mut records, Metric::Goals, Direction::Descending);
    assert_eq!(ranks(&records, Metric::Goals), vec![1, 2, 3]);
  }

  #[test]
  fn ranks_are_a_permutation() {
    let mut records: Vec<_> = (0..25)
      .map(|i| record(i, f64::from((i * 7 % 5) as u32), f64::from((i % 3) as u32)))
      .collect();
    rank(&mut records, Metric::Goals, Direction::Descending);
    rank(&mut records, Metric::GoalsAllowed, Direction::Ascending);

    for metric in [Metric::Goals, Metric::GoalsAllowed] {
      let mut seen = ranks(&records, metric);
      seen.sort_unstable();
      assert_eq!(seen, (1..=25).collect::<Vec<u32>>());
    }
  }

  #[test]
  fn empty_input_is_a_no_op() {
    let mut records: Vec<AccumulatorRecord> = Vec::new();
    rank_all(&mut records, SubjectKind::Goalie);
    assert!(records.is_empty());
  }
}
