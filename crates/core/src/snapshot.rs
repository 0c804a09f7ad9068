use crate::types::{format_time, CellId, CellValue, GameStatus, HintPair, Level, LEVELS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellSnapshot {
    pub id: CellId,
    pub row: u8,
    pub col: u8,
    pub value: CellValue,
    pub matched: bool,
    pub selected: bool,
    pub hinted: bool,
}

/// Read-only view of a session, refreshed after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    pub level_index: usize,
    pub level: Level,
    pub status: GameStatus,
    pub rows: u8,
    pub cols: u8,
    pub cells: Vec<CellSnapshot>,
    pub selected: Option<CellId>,
    pub time_remaining: u32,
    pub extra_rows_added: u8,
    pub hint: Option<HintPair>,
    pub win_pending: bool,
    pub episode_id: u32,
}

impl GameSnapshot {
    /// Reset to the empty idle view, keeping the cell buffer's allocation.
    pub fn clear(&mut self) {
        let cells = std::mem::take(&mut self.cells);
        *self = Self::default();
        self.cells = cells;
        self.cells.clear();
    }

    pub fn playable(&self) -> bool {
        self.status == GameStatus::Playing && !self.win_pending
    }

    /// Remaining time as `MM:SS`
    pub fn time_display(&self) -> String {
        format_time(self.time_remaining)
    }

    pub fn extra_rows_remaining(&self) -> u8 {
        self.level.max_extra_rows.saturating_sub(self.extra_rows_added)
    }

    /// Cells still available for matching
    pub fn remaining_cells(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.value.is_some() && !c.matched)
            .count()
    }

    pub fn cell(&self, id: CellId) -> Option<&CellSnapshot> {
        self.cells.iter().find(|c| c.id == id)
    }
}

impl Default for GameSnapshot {
    /// Nothing on screen yet: no grid and no time on the clock.
    fn default() -> Self {
        Self {
            level_index: 0,
            level: LEVELS[0],
            status: GameStatus::Idle,
            rows: 0,
            cols: 0,
            cells: Vec::new(),
            selected: None,
            time_remaining: 0,
            extra_rows_added: 0,
            hint: None,
            win_pending: false,
            episode_id: 0,
        }
    }
}
