//! Match resolution: ordered selection, exact-sum check, removal and scoring.

use crate::EngineConfig;
use crate::virus::{Virus, VirusId};

/// Only exact sums of 10 or 20 clear a selection.
pub fn is_match(sum: u32) -> bool {
    sum == 10 || sum == 20
}

/// Sum of the selected tokens' values. Ids no longer on the board contribute nothing.
pub fn selection_sum(board: &[Virus], selection: &[VirusId]) -> u32 {
    selection
        .iter()
        .filter_map(|id| board.iter().find(|v| v.id == *id))
        .map(|v| u32::from(v.value))
        .sum()
}

/// `score_per_token × count × (1 + combo × combo_bonus)`, then × `special_bonus` when a
/// special token was part of the match.
pub fn match_score(count: usize, combo: u32, any_special: bool, config: &EngineConfig) -> u64 {
    let mut score = config.score_per_token as f64
        * count as f64
        * (1.0 + f64::from(combo) * config.combo_bonus);
    if any_special {
        score *= config.special_bonus;
    }
    score.round().max(0.0) as u64
}

#[derive(Debug, Clone, PartialEq)]
pub struct Matched {
    /// Removed tokens, in selection order.
    pub removed: Vec<Virus>,
    pub points: u64,
    /// Earliest-selected special token among `removed`; the only one whose effect fires.
    pub trigger: Option<Virus>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    /// Unknown id or already selected; nothing changed.
    Ignored,
    /// Token added to the selection; no match yet.
    Pending { sum: u32 },
    Matched(Matched),
}

/// Append `id` to the selection and resolve the new sum.
///
/// On a match every selected token leaves the board and the selection empties. Otherwise the
/// token is flagged selected and kept. Combo bookkeeping is left to the caller.
pub fn select(
    board: &mut Vec<Virus>,
    selection: &mut Vec<VirusId>,
    id: VirusId,
    combo: u32,
    config: &EngineConfig,
) -> SelectOutcome {
    let Some(idx) = board.iter().position(|v| v.id == id) else {
        return SelectOutcome::Ignored;
    };
    if selection.contains(&id) {
        return SelectOutcome::Ignored;
    }
    selection.push(id);
    let sum = selection_sum(board, selection);

    if !is_match(sum) {
        board[idx].selected = true;
        return SelectOutcome::Pending { sum };
    }

    let removed: Vec<Virus> = selection
        .iter()
        .filter_map(|sid| board.iter().find(|v| v.id == *sid))
        .map(|v| Virus {
            selected: false,
            ..v.clone()
        })
        .collect();
    board.retain(|v| !selection.contains(&v.id));
    for v in board.iter_mut() {
        v.selected = false;
    }
    selection.clear();

    let trigger = removed.iter().find(|v| v.is_special()).cloned();
    let points = match_score(removed.len(), combo, trigger.is_some(), config);
    SelectOutcome::Matched(Matched {
        removed,
        points,
        trigger,
    })
}

/// Drop `id` from the selection. Returns false when it was not selected.
pub fn deselect(board: &mut [Virus], selection: &mut Vec<VirusId>, id: VirusId) -> bool {
    let before = selection.len();
    selection.retain(|s| *s != id);
    if selection.len() == before {
        return false;
    }
    if let Some(v) = board.iter_mut().find(|v| v.id == id) {
        v.selected = false;
    }
    true
}

pub fn clear_selection(board: &mut [Virus], selection: &mut Vec<VirusId>) {
    selection.clear();
    for v in board.iter_mut() {
        v.selected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virus::SuperKind;
    use proptest::prelude::*;

    fn board(values: &[u8]) -> Vec<Virus> {
        values
            .iter()
            .enumerate()
            .map(|(i, &n)| Virus::new(VirusId(i as u64), n, i as f64 * 60.0, 0.0, 0.01))
            .collect()
    }

    #[test]
    fn four_and_six_match() {
        let config = EngineConfig::default();
        let mut b = board(&[4, 6, 9]);
        let mut sel = Vec::new();
        assert_eq!(
            select(&mut b, &mut sel, VirusId(0), 0, &config),
            SelectOutcome::Pending { sum: 4 }
        );
        let SelectOutcome::Matched(m) = select(&mut b, &mut sel, VirusId(1), 2, &config) else {
            panic!("expected a match");
        };
        assert_eq!(m.removed.len(), 2);
        assert_eq!(m.points, 40); // 10 × 2 × (1 + 2 × 0.5)
        assert!(m.trigger.is_none());
        assert!(sel.is_empty());
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].id, VirusId(2));
    }

    #[test]
    fn three_and_four_stay_selected() {
        let config = EngineConfig::default();
        let mut b = board(&[3, 4]);
        let mut sel = Vec::new();
        select(&mut b, &mut sel, VirusId(0), 0, &config);
        let out = select(&mut b, &mut sel, VirusId(1), 0, &config);
        assert_eq!(out, SelectOutcome::Pending { sum: 7 });
        assert!(b.iter().all(|v| v.selected));
        assert_eq!(sel, vec![VirusId(0), VirusId(1)]);
    }

    #[test]
    fn twenty_with_many_tokens_matches() {
        let config = EngineConfig::default();
        let mut b = board(&[5, 5, 5, 5]);
        let mut sel = Vec::new();
        for i in 0..3 {
            select(&mut b, &mut sel, VirusId(i), 0, &config);
        }
        assert!(matches!(
            select(&mut b, &mut sel, VirusId(3), 0, &config),
            SelectOutcome::Matched(_)
        ));
        assert!(b.is_empty());
    }

    #[test]
    fn unknown_or_repeated_ids_are_ignored() {
        let config = EngineConfig::default();
        let mut b = board(&[2]);
        let mut sel = Vec::new();
        assert_eq!(select(&mut b, &mut sel, VirusId(9), 0, &config), SelectOutcome::Ignored);
        select(&mut b, &mut sel, VirusId(0), 0, &config);
        assert_eq!(select(&mut b, &mut sel, VirusId(0), 0, &config), SelectOutcome::Ignored);
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn earliest_selected_special_triggers() {
        let config = EngineConfig::default();
        let mut b = board(&[3, 3, 4]);
        b[2].special = Some(SuperKind::Heal);
        b[0].special = Some(SuperKind::AreaClear);
        let mut sel = Vec::new();
        // select the heal token first, then the bomb
        select(&mut b, &mut sel, VirusId(2), 0, &config);
        select(&mut b, &mut sel, VirusId(0), 0, &config);
        let SelectOutcome::Matched(m) = select(&mut b, &mut sel, VirusId(1), 0, &config) else {
            panic!("expected a match");
        };
        assert_eq!(m.trigger.map(|v| v.special), Some(Some(SuperKind::Heal)));
        assert_eq!(m.points, 36); // 10 × 3 × 1.2
    }

    #[test]
    fn deselect_only_touches_selected() {
        let config = EngineConfig::default();
        let mut b = board(&[3, 4]);
        let mut sel = Vec::new();
        select(&mut b, &mut sel, VirusId(0), 0, &config);
        assert!(!deselect(&mut b, &mut sel, VirusId(1)));
        assert!(deselect(&mut b, &mut sel, VirusId(0)));
        assert!(sel.is_empty());
        assert!(!b[0].selected);
    }

    #[test]
    fn clear_selection_unflags_everything() {
        let config = EngineConfig::default();
        let mut b = board(&[1, 2]);
        let mut sel = Vec::new();
        select(&mut b, &mut sel, VirusId(0), 0, &config);
        select(&mut b, &mut sel, VirusId(1), 0, &config);
        clear_selection(&mut b, &mut sel);
        assert!(sel.is_empty());
        assert!(b.iter().all(|v| !v.selected));
    }

    proptest! {
        #[test]
        fn only_ten_and_twenty_match(sum in 0u32..200) {
            prop_assert_eq!(is_match(sum), sum == 10 || sum == 20);
        }

        #[test]
        fn score_grows_with_combo(count in 1usize..8, combo in 0u32..20) {
            let config = EngineConfig::default();
            let next = match_score(count, combo + 1, false, &config);
            prop_assert!(next > match_score(count, combo, false, &config));
        }
    }
}
