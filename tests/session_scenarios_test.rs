//! End-to-end session scenarios driven through the public API.

use number_match::core::{find_matchable_pair, is_valid_match, GameSession, Timings};
use number_match::types::{CellId, CoreEvent, GameAction, GameStatus, HintPair, LEVELS};

/// Clear the board by always taking the first matchable pair.
fn play_out(session: &mut GameSession) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Some(pair) = find_matchable_pair(session.board()) {
        assert!(session.select_cell(pair.first));
        assert!(session.select_cell(pair.second));
        events.extend(session.take_events());
    }
    events
}

/// Two eligible cells that do not match, if the board has any.
fn mismatched_pair(session: &GameSession) -> Option<(CellId, CellId)> {
    let cells: Vec<_> = session.board().eligible_cells().copied().collect();
    for (i, a) in cells.iter().enumerate() {
        for b in &cells[i + 1..] {
            if !is_valid_match(a.value?, b.value?) {
                return Some((a.id, b.id));
            }
        }
    }
    None
}

#[test]
fn test_easy_level_layout() {
    let mut session = GameSession::new(2024);
    assert!(session.start_level(0));

    let board = session.board();
    assert_eq!(board.len(), 20);
    assert_eq!(board.filled_count(), 8);
    assert_eq!(board.cells().iter().filter(|c| c.value.is_none()).count(), 12);
    assert!(board.cells()[8..].iter().all(|c| c.value.is_none() && !c.matched));
}

#[test]
fn test_every_level_is_clearable_and_wins_once() {
    for (index, level) in LEVELS.iter().enumerate() {
        let mut session = GameSession::new(index as u32 + 100);
        session.start_level(index);
        session.take_events();

        let events = play_out(&mut session);
        let matches = events
            .iter()
            .filter(|e| matches!(e, CoreEvent::MatchSuccess { .. }))
            .count();
        assert_eq!(matches, level.initial_cells() / 2, "{}", level.name);
        assert_eq!(events.last(), Some(&CoreEvent::BoardCleared));

        assert!(session.is_win_pending());
        assert_eq!(session.status(), GameStatus::Playing);

        session.advance(499);
        assert_eq!(session.status(), GameStatus::Playing);
        session.advance(1);
        assert_eq!(session.status(), GameStatus::Won);

        session.advance(60_000);
        let won = session
            .take_events()
            .into_iter()
            .filter(|e| *e == CoreEvent::StatusChanged(GameStatus::Won))
            .count();
        assert_eq!(won, 1);
        assert_eq!(session.next_deadline_ms(), None);
    }
}

#[test]
fn test_success_and_failure_signals() {
    // Find a seed whose first board has a mismatching pair.
    let (mut session, (a, b)) = (0..1_000)
        .find_map(|seed| {
            let mut s = GameSession::new(seed);
            s.start_level(0);
            mismatched_pair(&s).map(|pair| (s, pair))
        })
        .unwrap();
    session.take_events();

    session.select_cell(a);
    session.select_cell(b);
    assert_eq!(session.selected(), None);
    assert!(!session.board().cell(a).unwrap().matched);
    assert!(!session.board().cell(b).unwrap().matched);
    assert_eq!(
        session.take_events(),
        vec![CoreEvent::MatchFailure { first: a, second: b }]
    );

    let HintPair { first, second } = find_matchable_pair(session.board()).unwrap();
    session.select_cell(first);
    session.select_cell(second);
    assert_eq!(session.selected(), None);
    assert!(session.board().cell(first).unwrap().matched);
    assert!(session.board().cell(second).unwrap().matched);
    assert_eq!(
        session.take_events()[0],
        CoreEvent::MatchSuccess { first, second }
    );
}

#[test]
fn test_countdown_to_loss() {
    let mut session = GameSession::new(8);
    session.start_level(0);

    for _ in 0..119 {
        assert!(session.tick());
    }
    assert_eq!(session.time_remaining(), 1);
    assert!(session.tick());
    assert_eq!(session.time_remaining(), 0);
    assert_eq!(session.status(), GameStatus::Lost);

    // No resurrection, no further decrements.
    assert!(!session.tick());
    assert!(!session.add_row());
    assert!(!session.select_cell(CellId(1)));
    assert_eq!(session.next_deadline_ms(), None);
}

#[test]
fn test_add_row_allowance() {
    for (index, level) in LEVELS.iter().enumerate() {
        let mut session = GameSession::new(31);
        session.start_level(index);

        for n in 0..level.max_extra_rows {
            assert!(session.add_row());
            assert_eq!(session.extra_rows_added(), n + 1);
        }
        assert!(!session.add_row());
        assert_eq!(session.extra_rows_added(), level.max_extra_rows);
        assert_eq!(session.extra_rows_remaining(), 0);

        let filled_rows = (level.initial_filled_rows + level.max_extra_rows).min(level.rows);
        assert_eq!(
            session.board().filled_count(),
            filled_rows as usize * level.cols as usize
        );
    }
}

#[test]
fn test_restart_and_advance_through_levels() {
    let mut session = GameSession::new(77);
    session.apply_action(GameAction::StartLevel(0));
    session.apply_action(GameAction::AddRow);
    session.advance(10_000);

    assert!(session.apply_action(GameAction::Restart));
    assert_eq!(session.level_index(), 0);
    assert_eq!(session.extra_rows_added(), 0);
    assert_eq!(session.time_remaining(), 120);
    assert_eq!(session.episode_id(), 2);

    assert!(session.apply_action(GameAction::AdvanceLevel));
    assert_eq!(session.level().name, "Medium");
    assert!(session.apply_action(GameAction::AdvanceLevel));
    assert_eq!(session.level().name, "Hard");

    // Past the last level the session goes back to the menu.
    assert!(!session.apply_action(GameAction::AdvanceLevel));
    assert_eq!(session.status(), GameStatus::Idle);
    assert_eq!(session.next_deadline_ms(), None);
}

#[test]
fn test_restart_during_win_delay_cancels_win() {
    let mut session = GameSession::new(5);
    session.start_level(0);
    play_out(&mut session);
    assert!(session.is_win_pending());

    session.advance(200);
    session.restart();
    session.advance(10_000);

    assert_eq!(session.status(), GameStatus::Playing);
    assert_eq!(session.time_remaining(), 110);
}

#[test]
fn test_hint_cycle_on_virtual_clock() {
    let timings = Timings {
        hint_idle_ms: 5_000,
        hint_display_ms: 3_000,
        ..Timings::default()
    };
    let mut session = GameSession::with_timings(12, timings);
    session.start_level(0);
    session.take_events();

    session.advance(4_999);
    assert_eq!(session.hint(), None);
    session.advance(1);
    let pair = session.hint().unwrap();
    assert_eq!(Some(pair), find_matchable_pair(session.board()));
    assert_eq!(session.take_events(), vec![CoreEvent::HintShown(pair)]);

    session.advance(3_000);
    assert_eq!(session.hint(), None);
    assert_eq!(session.last_interaction_ms(), 8_000);

    // The next wait starts from the moment the hint was cleared.
    session.advance(5_000);
    assert!(session.hint().is_some());

    // Interaction hides it at once.
    assert!(session.add_row());
    assert_eq!(session.hint(), None);
}
