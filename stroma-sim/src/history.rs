use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::SteadyState;

/// One sample of the rolling history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    /// Simulated time, in seconds.
    pub time: f64,
    pub fixation: f64,
    pub regeneration: f64,
    pub net_rate: f64,
    pub energy: f64,
    pub precursor: f64,
    /// Event label attached to this sample, if any.
    pub marker: Option<String>,
}

impl HistoryRow {
    /// Creates a row from a time, a set of pools, and an optional marker.
    #[must_use]
    pub fn new(time: f64, pools: SteadyState, marker: Option<String>) -> Self {
        let SteadyState {
            fixation,
            regeneration,
            net_rate,
            energy,
            precursor,
        } = pools;
        Self {
            time,
            fixation,
            regeneration,
            net_rate,
            energy,
            precursor,
            marker,
        }
    }

    /// Returns the pools recorded in this row.
    #[must_use]
    pub fn pools(&self) -> SteadyState {
        SteadyState {
            fixation: self.fixation,
            regeneration: self.regeneration,
            net_rate: self.net_rate,
            energy: self.energy,
            precursor: self.precursor,
        }
    }

    /// Returns the value of one numeric column.
    #[must_use]
    pub fn value(&self, series: Series) -> f64 {
        match series {
            Series::Time => self.time,
            Series::Fixation => self.fixation,
            Series::Regeneration => self.regeneration,
            Series::NetRate => self.net_rate,
            Series::Energy => self.energy,
            Series::Precursor => self.precursor,
        }
    }
}

/// The numeric columns of the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
    Time,
    Fixation,
    Regeneration,
    NetRate,
    Energy,
    Precursor,
}

impl Series {
    /// Returns the chart label of this column.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Time => "Time (s)",
            Self::Fixation => "C3",
            Self::Regeneration => "C5",
            Self::NetRate => "P total",
            Self::Energy => "ATP + NADPH",
            Self::Precursor => "ADP + NADP⁺",
        }
    }
}

/// A fixed-capacity rolling window of [`HistoryRow`]s.
///
/// Rows live in a circular buffer: appending overwrites the oldest slot and
/// moves the cursor, so no allocation happens after construction. Reads
/// always see rows in chronological order, oldest first, and the length
/// never changes.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use stroma_sim::{HistoryBuffer, HistoryRow};
///
/// let capacity = NonZeroUsize::new(3).unwrap();
/// let mut history = HistoryBuffer::new(capacity, HistoryRow::default());
///
/// for time in [1.0, 2.0, 3.0, 4.0] {
///     history.append(HistoryRow { time, ..HistoryRow::default() });
/// }
///
/// let times: Vec<f64> = history.iter().map(|row| row.time).collect();
/// assert_eq!(times, [2.0, 3.0, 4.0]);
/// assert_eq!(history.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    rows: Vec<HistoryRow>,
    /// Slot holding the oldest row, which the next append overwrites.
    head: usize,
}

impl HistoryBuffer {
    /// Creates a buffer with every slot set to `initial`, without its marker.
    #[must_use]
    pub fn new(capacity: NonZeroUsize, initial: HistoryRow) -> Self {
        let initial = HistoryRow {
            marker: None,
            ..initial
        };
        Self {
            rows: vec![initial; capacity.get()],
            head: 0,
        }
    }

    /// Evicts the oldest row and appends `row` as the newest.
    pub fn append(&mut self, row: HistoryRow) {
        self.rows[self.head] = row;
        self.head = (self.head + 1) % self.rows.len();
    }

    /// Replaces every slot with `row`, without its marker.
    pub fn reset(&mut self, row: HistoryRow) {
        let row = HistoryRow { marker: None, ..row };
        self.rows.fill(row);
        self.head = 0;
    }

    /// Returns the number of rows, which always equals the capacity.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false`; a history holds at least one row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.rows.len()).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the row at chronological `index`, where 0 is the oldest.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HistoryRow> {
        if index < self.rows.len() {
            Some(&self.rows[(self.head + index) % self.rows.len()])
        } else {
            None
        }
    }

    /// Returns the most recently appended row.
    #[must_use]
    pub fn latest(&self) -> &HistoryRow {
        let index = (self.head + self.rows.len() - 1) % self.rows.len();
        &self.rows[index]
    }

    /// Iterates over the rows from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryRow> {
        let (newer, older) = self.rows.split_at(self.head);
        older.iter().chain(newer)
    }

    /// Iterates over one numeric column from oldest to newest.
    pub fn column(&self, series: Series) -> impl DoubleEndedIterator<Item = f64> + '_ {
        self.iter().map(move |row| row.value(series))
    }

    /// Iterates over `(index, label)` for every row carrying a marker.
    pub fn markers(&self) -> impl Iterator<Item = (usize, &str)> {
        self.iter()
            .enumerate()
            .filter_map(|(index, row)| row.marker.as_deref().map(|label| (index, label)))
    }

    /// Copies the window into parallel, chronologically ordered sequences.
    #[must_use]
    pub fn snapshot(&self) -> HistorySeries {
        HistorySeries::from_rows(self.iter())
    }
}

/// An owned copy of the history as parallel sequences.
///
/// Consumers on other threads, charts, and exporters read this instead of
/// borrowing the live buffer. All sequences have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySeries {
    pub time: Vec<f64>,
    pub fixation: Vec<f64>,
    pub regeneration: Vec<f64>,
    pub net_rate: Vec<f64>,
    pub energy: Vec<f64>,
    pub precursor: Vec<f64>,
    pub markers: Vec<Option<String>>,
}

impl HistorySeries {
    /// Collects rows into parallel sequences, preserving their order.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a HistoryRow>) -> Self {
        let mut series = Self::default();
        for row in rows {
            series.time.push(row.time);
            series.fixation.push(row.fixation);
            series.regeneration.push(row.regeneration);
            series.net_rate.push(row.net_rate);
            series.energy.push(row.energy);
            series.precursor.push(row.precursor);
            series.markers.push(row.marker.clone());
        }
        series
    }

    #[must_use]
    pub fn len(&self) -> usize {
        debug_assert!(
            [
                self.fixation.len(),
                self.regeneration.len(),
                self.net_rate.len(),
                self.energy.len(),
                self.precursor.len(),
                self.markers.len(),
            ]
            .iter()
            .all(|&len| len == self.time.len()),
            "history sequences have mismatched lengths"
        );
        self.time.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns one numeric column.
    #[must_use]
    pub fn values(&self, series: Series) -> &[f64] {
        match series {
            Series::Time => &self.time,
            Series::Fixation => &self.fixation,
            Series::Regeneration => &self.regeneration,
            Series::NetRate => &self.net_rate,
            Series::Energy => &self.energy,
            Series::Precursor => &self.precursor,
        }
    }

    /// Returns `[time, value]` pairs of one column, ready for plotting.
    #[must_use]
    pub fn points(&self, series: Series) -> Vec<[f64; 2]> {
        self.time
            .iter()
            .zip(self.values(series))
            .map(|(&time, &value)| [time, value])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn row_at(time: f64) -> HistoryRow {
        HistoryRow {
            time,
            fixation: time * 2.0,
            ..HistoryRow::default()
        }
    }

    fn times(history: &HistoryBuffer) -> Vec<f64> {
        history.column(Series::Time).collect()
    }

    #[test]
    fn new_fills_every_slot() {
        let initial = row_at(7.0);
        let history = HistoryBuffer::new(capacity(4), initial.clone());

        assert_eq!(history.len(), 4);
        assert!(history.iter().all(|row| *row == initial));
    }

    #[test]
    fn initial_marker_is_dropped() {
        let initial = HistoryRow {
            marker: Some("stale".into()),
            ..row_at(0.0)
        };
        let history = HistoryBuffer::new(capacity(2), initial);

        assert_eq!(history.markers().count(), 0);
    }

    #[test]
    fn append_evicts_oldest_and_keeps_order() {
        let mut history = HistoryBuffer::new(capacity(3), row_at(0.0));

        history.append(row_at(1.0));
        assert_eq!(times(&history), [0.0, 0.0, 1.0]);

        history.append(row_at(2.0));
        history.append(row_at(3.0));
        assert_eq!(times(&history), [1.0, 2.0, 3.0]);

        history.append(row_at(4.0));
        assert_eq!(times(&history), [2.0, 3.0, 4.0]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn order_survives_many_wraparounds() {
        let mut history = HistoryBuffer::new(capacity(5), row_at(0.0));
        for step in 1..=23 {
            history.append(row_at(f64::from(step)));
        }

        assert_eq!(times(&history), [19.0, 20.0, 21.0, 22.0, 23.0]);
        assert_eq!(history.latest().time, 23.0);
        assert_eq!(history.get(0).map(|row| row.time), Some(19.0));
        assert_eq!(history.get(4).map(|row| row.time), Some(23.0));
        assert_eq!(history.get(5), None);
    }

    #[test]
    fn reverse_iteration_is_newest_first() {
        let mut history = HistoryBuffer::new(capacity(3), row_at(0.0));
        for step in 1..=4 {
            history.append(row_at(f64::from(step)));
        }

        let newest_first: Vec<f64> = history.column(Series::Time).rev().collect();
        assert_eq!(newest_first, [4.0, 3.0, 2.0]);
    }

    #[test]
    fn capacity_of_one_holds_latest_row() {
        let mut history = HistoryBuffer::new(capacity(1), row_at(0.0));
        history.append(row_at(1.0));
        history.append(row_at(2.0));

        assert_eq!(times(&history), [2.0]);
        assert_eq!(history.latest().time, 2.0);
    }

    #[test]
    fn reset_replaces_every_slot_and_clears_markers() {
        let mut history = HistoryBuffer::new(capacity(4), row_at(0.0));
        history.append(HistoryRow {
            marker: Some("on".into()),
            ..row_at(1.0)
        });
        history.append(row_at(2.0));

        let steady = HistoryRow {
            marker: Some("ignored".into()),
            ..row_at(9.0)
        };
        history.reset(steady);

        assert_eq!(history.len(), 4);
        assert!(history.iter().all(|row| row.time == 9.0 && row.marker.is_none()));

        history.append(row_at(10.0));
        assert_eq!(times(&history), [9.0, 9.0, 9.0, 10.0]);
    }

    #[test]
    fn markers_report_chronological_indices() {
        let mut history = HistoryBuffer::new(capacity(4), row_at(0.0));
        history.append(HistoryRow {
            marker: Some("a".into()),
            ..row_at(1.0)
        });
        history.append(row_at(2.0));
        history.append(HistoryRow {
            marker: Some("b".into()),
            ..row_at(3.0)
        });

        let markers: Vec<_> = history.markers().collect();
        assert_eq!(markers, [(1, "a"), (3, "b")]);
    }

    #[test]
    fn snapshot_has_parallel_sequences_in_order() {
        let mut history = HistoryBuffer::new(capacity(3), row_at(0.0));
        for step in 1..=4 {
            history.append(row_at(f64::from(step)));
        }

        let series = history.snapshot();
        assert_eq!(series.len(), 3);
        assert_eq!(series.time, [2.0, 3.0, 4.0]);
        assert_eq!(series.fixation, [4.0, 6.0, 8.0]);
        assert_eq!(series.markers, [None, None, None]);
        assert_eq!(
            series.points(Series::Fixation),
            [[2.0, 4.0], [3.0, 6.0], [4.0, 8.0]]
        );
    }

    #[test]
    fn row_round_trips_its_pools() {
        let pools = SteadyState {
            fixation: 1.0,
            regeneration: 2.0,
            net_rate: 3.0,
            energy: 4.0,
            precursor: 5.0,
        };
        let row = HistoryRow::new(0.5, pools, None);

        assert_eq!(row.pools(), pools);
        assert_eq!(row.value(Series::NetRate), 3.0);
    }
}
