//! Signal Detector
//!
//! Band-crossing state machine over the spread:
//!
//! ```text
//!   Flat ──(v <= -1)──► LowExtremeOpen ──(v > 0)──► Flat
//!   Flat ──(v >= 1)───► HighExtremeOpen ──(v < 0)──► Flat
//! ```
//!
//! Each transition out of `Flat` emits an Entry carrying the spread value,
//! each transition back emits an Exit. Undefined values (warm-up `None` or
//! NaN) never move the machine in either direction, for both exit branches
//! alike.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::signal::{Extreme, SignalEvent, SignalKind, EXIT_LEVEL};
use crate::domain::{SpreadPoint, SpreadSeries};

/// Internal state of the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorState {
    #[default]
    Flat,
    /// Entered on a value <= -1, waiting for the spread to rise above zero
    LowExtremeOpen,
    /// Entered on a value >= 1, waiting for the spread to fall below zero
    HighExtremeOpen,
}

/// Streaming band-crossing detector
#[derive(Debug, Clone, Default)]
pub struct SignalDetector {
    state: DetectorState,
}

impl SignalDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = DetectorState::Flat;
    }

    /// Feed one observation; returns the event emitted at this date, if any
    pub fn step(&mut self, date: NaiveDate, value: Option<f64>) -> Option<SignalEvent> {
        let value = value.filter(|v| !v.is_nan())?;

        let (next, event) = match self.state {
            DetectorState::Flat => match Extreme::classify(value)? {
                Extreme::Low => (DetectorState::LowExtremeOpen, SignalEvent::entry(date, value)),
                Extreme::High => (DetectorState::HighExtremeOpen, SignalEvent::entry(date, value)),
            },
            DetectorState::LowExtremeOpen if value > EXIT_LEVEL => {
                (DetectorState::Flat, SignalEvent::exit(date, value))
            }
            DetectorState::HighExtremeOpen if value < EXIT_LEVEL => {
                (DetectorState::Flat, SignalEvent::exit(date, value))
            }
            _ => return None,
        };

        debug!(%date, value, from = ?self.state, to = ?next, "band transition");
        self.state = next;
        Some(event)
    }

    /// Lazily run a fresh detector over any sequence of spread points
    pub fn scan<I>(points: I) -> Detections<I::IntoIter>
    where
        I: IntoIterator<Item = SpreadPoint>,
    {
        Detections {
            inner: points.into_iter(),
            detector: SignalDetector::new(),
        }
    }

    /// Run a fresh detector over a whole series
    pub fn detect(series: &SpreadSeries) -> SignalSeries {
        let mut out = SignalSeries::with_capacity(series.len());
        for (point, event) in Self::scan(series.iter().copied()) {
            out.dates.push(point.date);
            let (entry, exit) = match event.map(|e| (e.kind, e.value)) {
                Some((SignalKind::Entry, v)) => (Some(v), None),
                Some((SignalKind::Exit, v)) => (None, Some(v)),
                None => (None, None),
            };
            out.entries.push(entry);
            out.exits.push(exit);
        }
        out
    }
}

/// Iterator adapter pairing each spread point with the event it produced
#[derive(Debug, Clone)]
pub struct Detections<I> {
    inner: I,
    detector: SignalDetector,
}

impl<I> Detections<I> {
    pub fn state(&self) -> DetectorState {
        self.detector.state()
    }
}

impl<I> Iterator for Detections<I>
where
    I: Iterator<Item = SpreadPoint>,
{
    type Item = (SpreadPoint, Option<SignalEvent>);

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.inner.next()?;
        let event = self.detector.step(point.date, point.value);
        Some((point, event))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Entry and exit columns aligned with the spread's dates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalSeries {
    pub dates: Vec<NaiveDate>,
    pub entries: Vec<Option<f64>>,
    pub exits: Vec<Option<f64>>,
}

impl SignalSeries {
    fn with_capacity(n: usize) -> Self {
        Self {
            dates: Vec::with_capacity(n),
            entries: Vec::with_capacity(n),
            exits: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn entry_events(&self) -> impl Iterator<Item = SignalEvent> + '_ {
        self.dates
            .iter()
            .zip(&self.entries)
            .filter_map(|(&d, v)| v.map(|v| SignalEvent::entry(d, v)))
    }

    pub fn exit_events(&self) -> impl Iterator<Item = SignalEvent> + '_ {
        self.dates
            .iter()
            .zip(&self.exits)
            .filter_map(|(&d, v)| v.map(|v| SignalEvent::exit(d, v)))
    }

    /// Entries and exits merged in ascending date order
    pub fn events(&self) -> Vec<SignalEvent> {
        self.dates
            .iter()
            .zip(self.entries.iter().zip(&self.exits))
            .flat_map(|(&date, (entry, exit))| {
                let entry = entry.map(|v| SignalEvent::entry(date, v));
                let exit = exit.map(|v| SignalEvent::exit(date, v));
                entry.into_iter().chain(exit)
            })
            .collect()
    }

    /// Number of entries at the given extreme
    pub fn entry_count(&self, extreme: Extreme) -> usize {
        self.entry_events()
            .filter(|e| e.extreme() == Some(extreme))
            .count()
    }

    pub fn total_entries(&self) -> usize {
        self.entries.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::TimeDelta::days(n)
    }

    fn spread(values: &[Option<f64>]) -> SpreadSeries {
        let dates: Vec<_> = (0..values.len() as i64).map(day).collect();
        SpreadSeries::from_parts(&dates, values).unwrap()
    }

    #[test]
    fn test_reference_scenario() {
        let series = spread(&[None, Some(0.2), Some(1.3), Some(0.5), Some(-0.1), Some(-1.4), Some(0.3)]);
        let signals = SignalDetector::detect(&series);

        assert_eq!(signals.entries, vec![None, None, Some(1.3), None, None, Some(-1.4), None]);
        assert_eq!(signals.exits, vec![None, None, None, None, Some(-0.1), None, Some(0.3)]);
        assert_eq!(
            signals.events(),
            vec![
                SignalEvent::entry(day(2), 1.3),
                SignalEvent::exit(day(4), -0.1),
                SignalEvent::entry(day(5), -1.4),
                SignalEvent::exit(day(6), 0.3),
            ]
        );
    }

    #[test]
    fn test_band_edges_are_extreme() {
        let mut detector = SignalDetector::new();
        assert!(detector.step(day(0), Some(-1.0)).is_some());
        assert_eq!(detector.state(), DetectorState::LowExtremeOpen);

        let mut detector = SignalDetector::new();
        assert!(detector.step(day(0), Some(1.0)).is_some());
        assert_eq!(detector.state(), DetectorState::HighExtremeOpen);
    }

    #[test]
    fn test_exit_requires_crossing_zero() {
        let mut detector = SignalDetector::new();
        detector.step(day(0), Some(-1.5));
        assert!(detector.step(day(1), Some(-0.3)).is_none());
        assert!(detector.step(day(2), Some(0.0)).is_none());
        assert_eq!(detector.state(), DetectorState::LowExtremeOpen);

        let exit = detector.step(day(3), Some(0.01)).unwrap();
        assert_eq!(exit.kind, SignalKind::Exit);
        assert_eq!(detector.state(), DetectorState::Flat);
    }

    #[test]
    fn test_no_reentry_while_open() {
        let mut detector = SignalDetector::new();
        detector.step(day(0), Some(1.2));
        assert!(detector.step(day(1), Some(2.5)).is_none());
        assert!(detector.step(day(2), Some(1.0)).is_none());
        assert_eq!(detector.state(), DetectorState::HighExtremeOpen);
    }

    #[test]
    fn test_exit_can_land_beyond_opposite_band() {
        let mut detector = SignalDetector::new();
        detector.step(day(0), Some(1.2));
        let exit = detector.step(day(1), Some(-1.6)).unwrap();
        assert_eq!(exit, SignalEvent::exit(day(1), -1.6));
        // the next extreme observation opens a fresh entry
        let entry = detector.step(day(2), Some(-1.7)).unwrap();
        assert_eq!(entry.kind, SignalKind::Entry);
    }

    #[test]
    fn test_undefined_values_never_transition() {
        for state_value in [-1.5, 1.5] {
            let mut detector = SignalDetector::new();
            detector.step(day(0), Some(state_value));
            let before = detector.state();
            assert!(detector.step(day(1), None).is_none());
            assert!(detector.step(day(2), Some(f64::NAN)).is_none());
            assert_eq!(detector.state(), before);
        }

        let mut detector = SignalDetector::new();
        assert!(detector.step(day(0), Some(f64::NAN)).is_none());
        assert_eq!(detector.state(), DetectorState::Flat);
    }

    #[test]
    fn test_scan_is_lazy_and_restartable() {
        let series = spread(&[Some(1.1), Some(-0.2), Some(1.1)]);
        let mut scan = SignalDetector::scan(series.iter().copied());
        let (_, first) = scan.next().unwrap();
        assert!(first.is_some());
        assert_eq!(scan.state(), DetectorState::HighExtremeOpen);

        let again: Vec<_> = SignalDetector::scan(series.iter().copied())
            .filter_map(|(_, e)| e)
            .collect();
        assert_eq!(again.len(), 3);
    }

    #[test]
    fn test_outputs_are_aligned() {
        let series = spread(&[None, None, Some(0.4), Some(-2.0), Some(0.9)]);
        let signals = SignalDetector::detect(&series);
        assert_eq!(signals.len(), series.len());
        assert_eq!(signals.entries.len(), signals.exits.len());
        assert_eq!(signals.entry_count(Extreme::Low), 1);
        assert_eq!(signals.entry_count(Extreme::High), 0);
        assert_eq!(signals.total_entries(), 1);
    }

    #[test]
    fn test_events_with_ragged_columns() {
        let signals = SignalSeries {
            dates: vec![day(0), day(1), day(2)],
            entries: vec![Some(1.2)],
            exits: vec![None, Some(-0.1), None, Some(0.5)],
        };
        // only rows present in every column are read
        assert_eq!(signals.events(), vec![SignalEvent::entry(day(0), 1.2)]);
    }
}
