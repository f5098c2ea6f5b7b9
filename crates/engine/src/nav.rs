//! Tile grid navigation used as the built-in pathfinding service.

use thiserror::Error;
use tracing::debug;

use crate::geometry::{Vec2, Vec3};
use crate::services::Pathfinder;

pub const NAV_BLOCKED_TILE_ID: u16 = 2;

/// Tilemap origin convention:
/// - `origin` is the world position of tile (0,0) bottom-left corner.
/// - The center of tile (x,y) is `origin + (x + 0.5, y + 0.5)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    origin: Vec2,
    tiles: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tilemap must be at least 1x1, got {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[error("row {row}, column {column} is not a tile id")]
    InvalidTile { row: usize, column: usize },
}

impl Tilemap {
    pub fn new(
        width: u32,
        height: u32,
        origin: Vec2,
        tiles: Vec<u16>,
    ) -> Result<Self, TilemapError> {
        if width == 0 || height == 0 {
            return Err(TilemapError::Empty { width, height });
        }
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            origin,
            tiles,
        })
    }

    /// Parses rows of tile ids, top row first, e.g. `["0 0 2", "0 0 0"]`.
    pub fn from_rows<S: AsRef<str>>(origin: Vec2, rows: &[S]) -> Result<Self, TilemapError> {
        let height = rows.len() as u32;
        let mut width = 0u32;
        let mut tiles = Vec::new();
        for (row_index, row) in rows.iter().enumerate().rev() {
            let parsed = row
                .as_ref()
                .split_whitespace()
                .enumerate()
                .map(|(column, cell)| {
                    cell.parse::<u16>().map_err(|_| TilemapError::InvalidTile {
                        row: row_index,
                        column,
                    })
                })
                .collect::<Result<Vec<u16>, _>>()?;
            width = width.max(parsed.len() as u32);
            tiles.extend(parsed);
        }
        Self::new(width, height, origin, tiles)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TileCoord {
    x: u32,
    y: u32,
}

/// Deterministic 4-neighbour A* over a snapshot of a tilemap's passability.
/// Paths run on the world xy plane; the target's z is carried onto every
/// waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPathfinder {
    width: u32,
    height: u32,
    origin: Vec2,
    walkable: Vec<bool>,
}

impl GridPathfinder {
    pub fn new(tilemap: &Tilemap) -> Self {
        let mut walkable = Vec::with_capacity(tilemap.width() as usize * tilemap.height() as usize);
        for y in 0..tilemap.height() {
            for x in 0..tilemap.width() {
                let tile_id = tilemap.tile_at(x, y).unwrap_or(0);
                walkable.push(tile_id != NAV_BLOCKED_TILE_ID);
            }
        }
        Self {
            width: tilemap.width(),
            height: tilemap.height(),
            origin: tilemap.origin(),
            walkable,
        }
    }

    pub fn is_walkable_world(&self, world: Vec2) -> bool {
        self.world_to_tile(world)
            .map(|tile| self.is_walkable(tile))
            .unwrap_or(false)
    }

    fn world_to_tile(&self, world: Vec2) -> Option<TileCoord> {
        let tile_x = (world.x - self.origin.x).floor();
        let tile_y = (world.y - self.origin.y).floor();
        if tile_x < 0.0 || tile_y < 0.0 {
            return None;
        }
        let tile = TileCoord {
            x: tile_x as u32,
            y: tile_y as u32,
        };
        if tile.x >= self.width || tile.y >= self.height {
            return None;
        }
        Some(tile)
    }

    fn tile_center_world(&self, tile: TileCoord, z: f32) -> Vec3 {
        Vec3::new(
            self.origin.x + tile.x as f32 + 0.5,
            self.origin.y + tile.y as f32 + 0.5,
            z,
        )
    }

    fn is_walkable(&self, tile: TileCoord) -> bool {
        self.index_of(tile)
            .and_then(|index| self.walkable.get(index))
            .copied()
            .unwrap_or(false)
    }

    fn index_of(&self, tile: TileCoord) -> Option<usize> {
        if tile.x >= self.width || tile.y >= self.height {
            return None;
        }
        Some(tile.y as usize * self.width as usize + tile.x as usize)
    }

    fn find_path_tiles(&self, start: TileCoord, goal: TileCoord) -> Option<Vec<TileCoord>> {
        let start_index = self.index_of(start)?;
        let goal_index = self.index_of(goal)?;
        if !self.is_walkable(start) || !self.is_walkable(goal) {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        let node_count = self.walkable.len();
        let mut closed = vec![false; node_count];
        let mut best_g = vec![u32::MAX; node_count];
        let mut parent = vec![None::<usize>; node_count];
        let mut open = Vec::new();
        let mut next_insertion = 0u64;

        let start_h = manhattan_distance(start, goal);
        open.push(OpenNode {
            coord: start,
            h_cost: start_h,
            f_cost: start_h,
            insertion_order: next_insertion,
        });
        next_insertion += 1;
        best_g[start_index] = 0;

        while !open.is_empty() {
            let current = open.swap_remove(pick_best_open_node_index(&open));
            let Some(current_index) = self.index_of(current.coord) else {
                continue;
            };
            if closed[current_index] {
                continue;
            }
            closed[current_index] = true;

            if current_index == goal_index {
                return reconstruct_tile_path(&parent, self.width, start_index, goal_index);
            }

            let current_g = best_g[current_index];
            for neighbor in self.neighbors(current.coord).into_iter().flatten() {
                let Some(neighbor_index) = self.index_of(neighbor) else {
                    continue;
                };
                if closed[neighbor_index] || !self.is_walkable(neighbor) {
                    continue;
                }
                let tentative_g = current_g.saturating_add(1);
                if tentative_g >= best_g[neighbor_index] {
                    continue;
                }
                best_g[neighbor_index] = tentative_g;
                parent[neighbor_index] = Some(current_index);
                let h_cost = manhattan_distance(neighbor, goal);
                open.push(OpenNode {
                    coord: neighbor,
                    h_cost,
                    f_cost: tentative_g.saturating_add(h_cost),
                    insertion_order: next_insertion,
                });
                next_insertion += 1;
            }
        }

        None
    }

    fn neighbors(&self, coord: TileCoord) -> [Option<TileCoord>; 4] {
        let north = (coord.y + 1 < self.height).then(|| TileCoord {
            x: coord.x,
            y: coord.y + 1,
        });
        let east = (coord.x + 1 < self.width).then(|| TileCoord {
            x: coord.x + 1,
            y: coord.y,
        });
        let south = coord.y.checked_sub(1).map(|y| TileCoord { x: coord.x, y });
        let west = coord.x.checked_sub(1).map(|x| TileCoord { x, y: coord.y });
        [north, east, south, west]
    }
}

impl Pathfinder for GridPathfinder {
    fn compute_path(&self, from: Vec3, to: Vec3) -> Vec<Vec3> {
        let (Some(start), Some(goal)) = (
            self.world_to_tile(from.truncate()),
            self.world_to_tile(to.truncate()),
        ) else {
            debug!(
                from_x = from.x,
                from_y = from.y,
                to_x = to.x,
                to_y = to.y,
                "grid_path_outside_tilemap"
            );
            return Vec::new();
        };
        let Some(tiles) = self.find_path_tiles(start, goal) else {
            debug!(
                start_x = start.x,
                start_y = start.y,
                goal_x = goal.x,
                goal_y = goal.y,
                "grid_path_not_found"
            );
            return Vec::new();
        };

        // Interior waypoints are tile centres; the walk ends on the exact target.
        let mut waypoints: Vec<Vec3> = tiles
            .iter()
            .skip(1)
            .take(tiles.len().saturating_sub(2))
            .map(|tile| self.tile_center_world(*tile, to.z))
            .collect();
        waypoints.push(to);
        waypoints
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    coord: TileCoord,
    h_cost: u32,
    f_cost: u32,
    insertion_order: u64,
}

fn pick_best_open_node_index(open: &[OpenNode]) -> usize {
    let mut best_index = 0usize;
    for (index, node) in open.iter().enumerate().skip(1) {
        if open_node_order_key(*node) < open_node_order_key(open[best_index]) {
            best_index = index;
        }
    }
    best_index
}

fn open_node_order_key(node: OpenNode) -> (u32, u32, u32, u32, u64) {
    (
        node.f_cost,
        node.h_cost,
        node.coord.y,
        node.coord.x,
        node.insertion_order,
    )
}

fn reconstruct_tile_path(
    parent: &[Option<usize>],
    width: u32,
    start_index: usize,
    goal_index: usize,
) -> Option<Vec<TileCoord>> {
    let mut cursor = goal_index;
    let mut indices = vec![cursor];
    while cursor != start_index {
        cursor = parent.get(cursor).and_then(|value| *value)?;
        indices.push(cursor);
    }
    indices.reverse();
    Some(
        indices
            .into_iter()
            .map(|index| TileCoord {
                x: (index as u32) % width,
                y: (index as u32) / width,
            })
            .collect(),
    )
}

fn manhattan_distance(a: TileCoord, b: TileCoord) -> u32 {
    a.x.abs_diff(b.x).saturating_add(a.y.abs_diff(b.y))
}
