//! Grid maze with walls, breakable blocks and one exit.

use serde::{Deserialize, Serialize};
use wildlern_agents::{MazeAgentConfig, MazeObservation};
use wildlern_core::Direction;

use crate::error::{Result, SimError};

/// `0` free, `1` breakable, `2` wall, `3` goal; row 0 first.
pub const DEFAULT_LAYOUT: [&str; 8] = [
    "02010200", "02020010", "00022020", "22120000", "00021222", "02220000", "00020020",
    "02000023",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    Free,
    Breakable,
    Wall,
    Goal,
}

impl Cell {
    fn parse(c: char) -> Option<Self> {
        match c {
            '0' => Some(Cell::Free),
            '1' => Some(Cell::Breakable),
            '2' => Some(Cell::Wall),
            '3' => Some(Cell::Goal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeRewards {
    pub walk: f32,
    pub break_block: f32,
    pub hit_wall: f32,
    pub hit_limit: f32,
    pub goal: f32,
}

impl Default for MazeRewards {
    fn default() -> Self {
        Self {
            walk: -0.05,
            break_block: -0.5,
            hit_wall: -1.0,
            hit_limit: -1.0,
            goal: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub reward: f32,
    pub moved: bool,
    pub broke_block: bool,
    pub goal_reached: bool,
}

#[derive(Debug, Clone)]
pub struct MazeBoard {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    /// Board positions of the breakable cells, row-major.
    breakable_cells: Vec<usize>,
    intact: Vec<bool>,
    agent: (usize, usize),
    goal_reached: bool,
    rewards: MazeRewards,
}

impl MazeBoard {
    pub fn from_layout<S: AsRef<str>>(layout: &[S]) -> Result<Self> {
        let rows = layout.len();
        let cols = layout.first().map_or(0, |r| r.as_ref().chars().count());
        if rows == 0 || cols == 0 {
            return Err(SimError::InvalidLayout("layout is empty".into()));
        }
        let mut cells = Vec::with_capacity(rows * cols);
        for (r, line) in layout.iter().enumerate() {
            let line = line.as_ref();
            if line.chars().count() != cols {
                return Err(SimError::InvalidLayout(format!(
                    "row {r} has {} cells, expected {cols}",
                    line.chars().count()
                )));
            }
            for c in line.chars() {
                let cell = Cell::parse(c).ok_or_else(|| {
                    SimError::InvalidLayout(format!("unknown cell '{c}' in row {r}"))
                })?;
                cells.push(cell);
            }
        }
        if !cells.contains(&Cell::Goal) {
            return Err(SimError::InvalidLayout("layout has no goal".into()));
        }
        if cells[0] != Cell::Free {
            return Err(SimError::InvalidLayout(
                "start cell (0, 0) must be free".into(),
            ));
        }
        let breakable_cells: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter(|(_, &cell)| cell == Cell::Breakable)
            .map(|(idx, _)| idx)
            .collect();
        let intact = vec![true; breakable_cells.len()];
        Ok(Self {
            rows,
            cols,
            cells,
            breakable_cells,
            intact,
            agent: (0, 0),
            goal_reached: false,
            rewards: MazeRewards::default(),
        })
    }

    pub fn with_rewards(mut self, rewards: MazeRewards) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn breakables(&self) -> usize {
        self.breakable_cells.len()
    }

    pub fn agent_position(&self) -> (usize, usize) {
        self.agent
    }

    pub fn goal_reached(&self) -> bool {
        self.goal_reached
    }

    /// Agent config sized for this board, other fields from `base`.
    pub fn agent_config(&self, base: MazeAgentConfig) -> MazeAgentConfig {
        MazeAgentConfig {
            rows: self.rows,
            cols: self.cols,
            breakables: self.breakables(),
            ..base
        }
    }

    /// Agent back to the start, every block restored.
    pub fn reset(&mut self) {
        self.agent = (0, 0);
        self.goal_reached = false;
        self.intact.iter_mut().for_each(|cell| *cell = true);
    }

    pub fn observation(&self) -> MazeObservation {
        MazeObservation {
            row: self.agent.0,
            col: self.agent.1,
            intact: self.intact.clone(),
        }
    }

    pub fn step(&mut self, dir: Direction) -> MoveOutcome {
        let (dr, dc) = dir.delta();
        let target = (
            self.agent.0.checked_add_signed(dr).filter(|&r| r < self.rows),
            self.agent.1.checked_add_signed(dc).filter(|&c| c < self.cols),
        );
        let (row, col) = match target {
            (Some(row), Some(col)) => (row, col),
            _ => return self.stay(self.rewards.hit_limit),
        };
        let idx = row * self.cols + col;
        match self.cells[idx] {
            Cell::Wall => self.stay(self.rewards.hit_wall),
            Cell::Free => self.enter(row, col, self.rewards.walk, false),
            Cell::Goal => {
                self.goal_reached = true;
                self.enter(row, col, self.rewards.goal, false)
            }
            Cell::Breakable => {
                let slot = self.breakable_cells.iter().position(|&b| b == idx);
                match slot {
                    Some(slot) if self.intact[slot] => {
                        self.intact[slot] = false;
                        self.enter(row, col, self.rewards.break_block, true)
                    }
                    _ => self.enter(row, col, self.rewards.walk, false),
                }
            }
        }
    }

    fn stay(&self, reward: f32) -> MoveOutcome {
        MoveOutcome {
            reward,
            moved: false,
            broke_block: false,
            goal_reached: self.goal_reached,
        }
    }

    fn enter(&mut self, row: usize, col: usize, reward: f32, broke_block: bool) -> MoveOutcome {
        self.agent = (row, col);
        MoveOutcome {
            reward,
            moved: true,
            broke_block,
            goal_reached: self.goal_reached,
        }
    }
}

impl Default for MazeBoard {
    fn default() -> Self {
        match Self::from_layout(&DEFAULT_LAYOUT) {
            Ok(board) => board,
            Err(e) => unreachable!("default layout is valid: {e}"),
        }
    }
}
