use thiserror::Error;

use crate::constants::{HALF_TILE, TILE_SIZE};
use crate::types::{Tile, Vec2};

/// Maze used when no layout file is supplied. `P` marks the player spawn,
/// `G` an adversary spawn; both are pellet-free floor.
pub const DEFAULT_LAYOUT: [&str; 10] = [
    "###############",
    "#P...........G#",
    "#.###.###.###.#",
    "#.............#",
    "#.###.#.#.###.#",
    "#......G......#",
    "#.###.###.###.#",
    "#G...........G#",
    "#.###########.#",
    "###############",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map layout has no rows")]
    Empty,
    #[error("row {row} has {actual} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown tile glyph {glyph:?} at row {row}, column {col}")]
    UnknownGlyph { glyph: char, row: usize, col: usize },
    #[error("map must be at least 3x3 to have an interior, got {rows}x{cols}")]
    TooSmall { rows: usize, cols: usize },
    #[error("map has no player spawn marker")]
    MissingPlayerSpawn,
    #[error("map has more than one player spawn marker")]
    DuplicatePlayerSpawn,
    #[error("map has no adversary spawn marker")]
    MissingAdversarySpawn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn center(self) -> Vec2 {
        Vec2::new(
            self.col as f32 * TILE_SIZE + HALF_TILE,
            self.row as f32 * TILE_SIZE + HALF_TILE,
        )
    }
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Tile>,
    initial: Vec<Tile>,
}

impl TileGrid {
    pub fn from_tiles(rows: usize, cols: usize, cells: Vec<Tile>) -> Self {
        debug_assert_eq!(rows * cols, cells.len());
        Self {
            rows,
            cols,
            initial: cells.clone(),
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn tile(&self, row: usize, col: usize) -> Option<Tile> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col).copied()
    }

    /// Signed lookup; anything outside the grid reads as `None`.
    pub fn tile_at(&self, row: i32, col: i32) -> Option<Tile> {
        if row < 0 || col < 0 {
            return None;
        }
        self.tile(row as usize, col as usize)
    }

    pub fn is_blocked(&self, row: i32, col: i32) -> bool {
        !matches!(self.tile_at(row, col), Some(Tile::Pellet | Tile::Empty))
    }

    pub fn is_blocked_at(&self, pos: Vec2) -> bool {
        let (row, col) = tile_coords(pos);
        self.is_blocked(row, col)
    }

    pub fn cell_at(&self, pos: Vec2) -> Option<Cell> {
        let (row, col) = tile_coords(pos);
        self.tile_at(row, col)?;
        Some(Cell {
            row: row as usize,
            col: col as usize,
        })
    }

    /// Turns a pellet into floor; returns whether one was there.
    pub fn take_pellet(&mut self, row: usize, col: usize) -> bool {
        if row >= self.rows || col >= self.cols {
            return false;
        }
        let idx = row * self.cols + col;
        if self.cells[idx] != Tile::Pellet {
            return false;
        }
        self.cells[idx] = Tile::Empty;
        true
    }

    pub fn pellets_left(&self) -> usize {
        self.cells.iter().filter(|t| **t == Tile::Pellet).count()
    }

    pub fn restore(&mut self) {
        self.cells.clone_from(&self.initial);
    }
}

/// Tile `(row, col)` containing `pos`; negative coordinates stay negative.
pub fn tile_coords(pos: Vec2) -> (i32, i32) {
    (
        (pos.y / TILE_SIZE).floor() as i32,
        (pos.x / TILE_SIZE).floor() as i32,
    )
}

#[derive(Clone, Debug)]
pub struct Level {
    pub grid: TileGrid,
    pub player_spawn: Cell,
    pub adversary_spawns: Vec<Cell>,
}

pub fn parse_layout<S: AsRef<str>>(lines: &[S]) -> Result<Level, MapError> {
    let rows: Vec<&str> = lines
        .iter()
        .map(|line| line.as_ref().trim_end_matches(['\r', '\n']))
        .filter(|line| !line.is_empty())
        .collect();
    let Some(first) = rows.first() else {
        return Err(MapError::Empty);
    };
    let cols = first.chars().count();
    if rows.len() < 3 || cols < 3 {
        return Err(MapError::TooSmall {
            rows: rows.len(),
            cols,
        });
    }

    let mut cells = Vec::with_capacity(rows.len() * cols);
    let mut player_spawn = None;
    let mut adversary_spawns = Vec::new();
    for (row, line) in rows.iter().enumerate() {
        let actual = line.chars().count();
        if actual != cols {
            return Err(MapError::RaggedRow {
                row,
                expected: cols,
                actual,
            });
        }
        for (col, glyph) in line.chars().enumerate() {
            let tile = match glyph {
                '#' => Tile::Wall,
                '.' => Tile::Pellet,
                ' ' => Tile::Empty,
                'P' => {
                    if player_spawn.replace(Cell { row, col }).is_some() {
                        return Err(MapError::DuplicatePlayerSpawn);
                    }
                    Tile::Empty
                }
                'G' => {
                    adversary_spawns.push(Cell { row, col });
                    Tile::Empty
                }
                _ => return Err(MapError::UnknownGlyph { glyph, row, col }),
            };
            cells.push(tile);
        }
    }

    let player_spawn = player_spawn.ok_or(MapError::MissingPlayerSpawn)?;
    if adversary_spawns.is_empty() {
        return Err(MapError::MissingAdversarySpawn);
    }
    Ok(Level {
        grid: TileGrid::from_tiles(rows.len(), cols, cells),
        player_spawn,
        adversary_spawns,
    })
}

pub fn default_level() -> Result<Level, MapError> {
    parse_layout(&DEFAULT_LAYOUT)
}
