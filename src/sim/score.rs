//! Score and combo bookkeeping
//!
//! Combo has two reset paths:
//! - a cut arriving after the timeout restarts the chain at 1
//! - `update` with no cut for longer than the timeout decays it to 0

use serde::{Deserialize, Serialize};

use super::rope::TreasureKind;
use crate::settings::ScoreConfig;

/// One successful cut, as reported to the scoring/visual layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub points: u64,
    pub treasure: TreasureKind,
    pub combo: u32,
    /// Session time of the cut (seconds)
    pub timestamp: f64,
}

/// Snapshot of the running totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreState {
    pub current: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub total_treasures: u32,
}

/// Points for a cut at combo `combo` (1 = no bonus)
pub fn combo_points(base: u64, combo: u32, bonus_rate: f32) -> u64 {
    let multiplier = 1.0 + combo.saturating_sub(1) as f64 * bonus_rate as f64;
    let raw = base as f64 * multiplier;
    // Absorb binary rounding so e.g. 100 * 2.3 floors to 230, not 229
    (raw + 1e-6).floor() as u64
}

#[derive(Debug, Clone)]
pub struct ScoreLedger {
    config: ScoreConfig,
    state: ScoreState,
    last_cut_at: Option<f64>,
    history: Vec<ScoreEvent>,
}

impl ScoreLedger {
    pub fn new(config: ScoreConfig) -> Self {
        Self {
            config,
            state: ScoreState::default(),
            last_cut_at: None,
            history: Vec::new(),
        }
    }

    /// Forget everything from the previous session
    pub fn reset(&mut self) {
        self.state = ScoreState::default();
        self.last_cut_at = None;
        self.history.clear();
    }

    fn timeout(&self) -> f64 {
        self.config.combo_timeout_secs as f64
    }

    /// Record a successful cut at session time `now`
    pub fn add_score(&mut self, treasure: TreasureKind, now: f64) -> ScoreEvent {
        let chained = self
            .last_cut_at
            .is_some_and(|last| now - last <= self.timeout());
        self.state.combo = if chained { self.state.combo + 1 } else { 1 };

        let points = combo_points(treasure.base_score(), self.state.combo, self.config.combo_bonus_rate);
        self.state.current += points;
        self.state.max_combo = self.state.max_combo.max(self.state.combo);
        self.state.total_treasures += 1;
        self.last_cut_at = Some(now);

        let event = ScoreEvent {
            points,
            treasure,
            combo: self.state.combo,
            timestamp: now,
        };
        self.history.push(event);
        event
    }

    /// Per-frame decay check: drop an expired combo to 0
    pub fn update(&mut self, now: f64) {
        if self.state.combo == 0 {
            return;
        }
        if let Some(last) = self.last_cut_at {
            if now - last > self.timeout() {
                log::debug!("Combo x{} expired", self.state.combo);
                self.state.combo = 0;
            }
        }
    }

    pub fn state(&self) -> ScoreState {
        self.state
    }

    pub fn history(&self) -> &[ScoreEvent] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-3;

    fn ledger() -> ScoreLedger {
        ScoreLedger::new(ScoreConfig::default())
    }

    #[test]
    fn test_points_formula() {
        assert_eq!(combo_points(100, 3, 0.1), 120);
        assert_eq!(combo_points(100, 1, 0.1), 100);
        assert_eq!(combo_points(100, 14, 0.1), 230);
        assert_eq!(combo_points(250, 2, 0.1), 275);
        assert_eq!(combo_points(500, 4, 0.15), 725);
    }

    #[test]
    fn test_first_cut_starts_combo_at_one() {
        let mut l = ledger();
        let e = l.add_score(TreasureKind::Bronze, 5.0);
        assert_eq!(e.combo, 1);
        assert_eq!(e.points, 100);
        assert_eq!(e.timestamp, 5.0);
        assert_eq!(
            l.state(),
            ScoreState {
                current: 100,
                combo: 1,
                max_combo: 1,
                total_treasures: 1
            }
        );
    }

    #[test]
    fn test_chained_cuts_build_combo() {
        let mut l = ledger();
        l.add_score(TreasureKind::Bronze, 0.0);
        l.add_score(TreasureKind::Bronze, 1.0);
        let e = l.add_score(TreasureKind::Bronze, 3.9);
        assert_eq!(e.combo, 3);
        assert_eq!(e.points, 120);
        assert_eq!(l.state().current, 100 + 110 + 120);
        assert_eq!(l.state().max_combo, 3);
    }

    #[test]
    fn test_cut_exactly_at_timeout_still_chains() {
        let mut l = ledger();
        l.add_score(TreasureKind::Bronze, 1.0);
        let e = l.add_score(TreasureKind::Bronze, 4.0);
        assert_eq!(e.combo, 2);
    }

    #[test]
    fn test_late_cut_restarts_at_one() {
        let mut l = ledger();
        l.add_score(TreasureKind::Bronze, 0.0);
        l.add_score(TreasureKind::Bronze, 1.0);
        l.add_score(TreasureKind::Bronze, 2.0);
        // No update() calls in between: the late cut itself resets to 1
        let e = l.add_score(TreasureKind::Gold, 2.0 + 3.0 + EPS);
        assert_eq!(e.combo, 1);
        assert_eq!(e.points, 500);
        assert_eq!(l.state().max_combo, 3);
    }

    #[test]
    fn test_update_decays_to_zero_after_timeout() {
        let mut l = ledger();
        l.add_score(TreasureKind::Silver, 10.0);
        l.add_score(TreasureKind::Silver, 11.0);

        l.update(11.0 + 3.0 - EPS);
        assert_eq!(l.state().combo, 2);

        l.update(11.0 + 3.0 + EPS);
        assert_eq!(l.state().combo, 0);
        // Decay never touches the total
        assert_eq!(l.state().current, 250 + 275);
    }

    #[test]
    fn test_cut_after_decay_restarts_at_one() {
        let mut l = ledger();
        l.add_score(TreasureKind::Bronze, 0.0);
        l.update(3.5);
        assert_eq!(l.state().combo, 0);
        let e = l.add_score(TreasureKind::Bronze, 3.6);
        assert_eq!(e.combo, 1);
    }

    #[test]
    fn test_update_without_cuts_is_noop() {
        let mut l = ledger();
        l.update(100.0);
        assert_eq!(l.state(), ScoreState::default());
    }

    #[test]
    fn test_history_and_reset() {
        let mut l = ledger();
        l.add_score(TreasureKind::Bronze, 0.0);
        l.add_score(TreasureKind::Gold, 0.5);
        assert_eq!(l.history().len(), 2);
        assert_eq!(l.history()[1].treasure, TreasureKind::Gold);

        l.reset();
        assert!(l.history().is_empty());
        assert_eq!(l.state(), ScoreState::default());
        // A fresh session does not chain onto the previous one
        assert_eq!(l.add_score(TreasureKind::Bronze, 0.6).combo, 1);
    }

    proptest! {
        #[test]
        fn prop_combo_law(
            prior in 1usize..6,
            gap in 0.0f64..10.0,
        ) {
            let mut l = ledger();
            let mut t = 0.0;
            for _ in 0..prior {
                l.add_score(TreasureKind::Bronze, t);
                t += 0.5;
            }
            let t0 = t - 0.5;
            let before = l.state().combo;
            let t1 = t0 + gap;
            let e = l.add_score(TreasureKind::Bronze, t1);
            if t1 - t0 <= 3.0 {
                prop_assert_eq!(e.combo, before + 1);
            } else {
                prop_assert_eq!(e.combo, 1);
            }
        }

        #[test]
        fn prop_total_never_decreases(
            times in proptest::collection::vec(0.0f64..5.0, 1..20),
        ) {
            let mut l = ledger();
            let mut now = 0.0;
            let mut last_total = 0;
            for dt in times {
                now += dt;
                l.update(now);
                l.add_score(TreasureKind::Silver, now);
                prop_assert!(l.state().current >= last_total);
                last_total = l.state().current;
            }
        }
    }
}
