use std::ops::Range;

use stroma_sim::{HistorySeries, Series};

/// Number of most recent samples shown in [`ChartMode::Follow`].
pub const FOLLOW_POINTS: usize = 300;

/// The series drawn on the chart, in legend order.
pub const CHARTED: [Series; 3] = [Series::NetRate, Series::Fixation, Series::Regeneration];

/// How much of the history the chart shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartMode {
    /// Only the most recent [`FOLLOW_POINTS`] samples.
    #[default]
    Follow,
    /// The whole history window.
    Global,
}

/// Returns the index range of a history of length `len` shown in `mode`.
#[must_use]
pub fn visible_range(len: usize, mode: ChartMode) -> Range<usize> {
    match mode {
        ChartMode::Follow => len.saturating_sub(FOLLOW_POINTS)..len,
        ChartMode::Global => 0..len,
    }
}

/// The plottable part of a history snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartWindow {
    /// `[time, value]` points per charted series.
    pub lines: Vec<(Series, Vec<[f64; 2]>)>,
    /// Time and label of every marker in view.
    pub markers: Vec<(f64, String)>,
}

impl ChartWindow {
    /// Cuts the visible part out of a snapshot.
    #[must_use]
    pub fn new(history: &HistorySeries, mode: ChartMode) -> Self {
        let range = visible_range(history.len(), mode);
        let time = &history.time[range.clone()];

        let lines = CHARTED
            .iter()
            .map(|&series| {
                let points = time
                    .iter()
                    .zip(&history.values(series)[range.clone()])
                    .map(|(&time, &value)| [time, value])
                    .collect();
                (series, points)
            })
            .collect();

        let markers = time
            .iter()
            .zip(&history.markers[range])
            .filter_map(|(&time, marker)| marker.as_ref().map(|label| (time, label.clone())))
            .collect();

        Self { lines, markers }
    }
}
