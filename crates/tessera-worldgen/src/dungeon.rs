//! Room-and-corridor dungeon tiles.
//!
//! Rooms grow from a jittered lattice anchored in world cells. A candidate
//! survives unless its padded occupancy overlaps a room already accepted at
//! an earlier lattice point in world scan order, so whether a room exists
//! never depends on which tile asked first.
//! The lattice is grouped into square sectors; each sector is connected by
//! a nearest-neighbour graph with a spanning backbone plus hashed loops, and
//! neighbouring sectors are joined through their closest pair of rooms.
//!
//! A tile plans every sector that could reach it and then carves rooms,
//! corridors and doors clipped to its own rectangle. Doors take precedence
//! over floor, so carve order never shows in the output.

use glam::I64Vec2;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::noise::hash_01;
use crate::tile::{CellTile, DungeonCell, DungeonTile};

/// Dungeon layout configuration, in cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// Extra planning distance around a tile. Default: 32.
    pub margin: u32,
    /// Lattice spacing between room candidates. Default: 18.
    pub room_step: u32,
    /// Probability that a lattice candidate becomes a room. Default: 0.60.
    pub room_probability: f64,
    /// Smallest room side. Default: 7.
    pub room_min: u32,
    /// Largest room side. Default: 13.
    pub room_max: u32,
    /// Padding kept clear around each room. Default: 2.
    pub keepout: u32,
    /// Lattice points per sector along each axis. Default: 8.
    pub sector_size: u32,
    /// Nearest neighbours linked per room. Default: 3.
    pub neighbours: u32,
    /// Probability that a non-backbone neighbour link is carved. Default: 0.25.
    pub extra_loop_probability: f64,
    /// Corridor half width; corridors are `2 * half + 1` wide. Default: 1.
    pub corridor_half_width: u32,
    /// Probability of a door where a corridor meets a room. Default: 0.85.
    pub door_chance: f64,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            margin: 32,
            room_step: 18,
            room_probability: 0.60,
            room_min: 7,
            room_max: 13,
            keepout: 2,
            sector_size: 8,
            neighbours: 3,
            extra_loop_probability: 0.25,
            corridor_half_width: 1,
            door_chance: 0.85,
        }
    }
}

const SALT_JITTER_X: i64 = 1001;
const SALT_JITTER_Y: i64 = 1002;
const SALT_ROOM: i64 = 1003;
const SALT_WIDTH: i64 = 1004;
const SALT_HEIGHT: i64 = 1005;
const SALT_LOOP: i64 = 6001;
const SALT_BEND: i64 = 7001;
const SALT_ELBOW: i64 = 7002;
const SALT_ELBOW_Y: i64 = 7003;
const SALT_ELBOW_X: i64 = 7004;
const SALT_DOOR_A: i64 = 8001;
const SALT_DOOR_B: i64 = 8002;

/// Room centres move within this fraction of the lattice step, centred.
const JITTER_SPREAD: f64 = 0.6;
const ELBOW_JITTER_CHANCE: f64 = 0.35;
const ELBOW_JITTER_SPAN: f64 = 6.0;
/// log2 of the occupancy bucket side.
const BUCKET_SHIFT: u32 = 2;

#[inline]
fn roll(seed: i64, p: I64Vec2, salt: i64) -> f64 {
    hash_01(p.x, p.y, seed.wrapping_add(salt))
}

/// An axis-aligned room with odd sides and inclusive bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Room {
    pub center: I64Vec2,
    pub min: I64Vec2,
    pub max: I64Vec2,
}

impl Room {
    fn new(center: I64Vec2, size: I64Vec2) -> Self {
        let half = I64Vec2::new(size.x / 2, size.y / 2);
        Self {
            center,
            min: center - half,
            max: center + half,
        }
    }

    fn dist2(&self, other: &Room) -> i64 {
        let d = self.center - other.center;
        d.x * d.x + d.y * d.y
    }

    /// Occupancy buckets covered by the padded room, inclusive.
    fn buckets(&self, keepout: i64) -> (I64Vec2, I64Vec2) {
        let lo = self.min - I64Vec2::splat(keepout);
        let hi = self.max + I64Vec2::splat(keepout);
        (
            I64Vec2::new(lo.x >> BUCKET_SHIFT, lo.y >> BUCKET_SHIFT),
            I64Vec2::new(hi.x >> BUCKET_SHIFT, hi.y >> BUCKET_SHIFT),
        )
    }

    fn contains(&self, p: I64Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether `p` lies on the room's outermost ring of cells.
    pub fn on_boundary(&self, p: I64Vec2) -> bool {
        self.contains(p)
            && (p.x == self.min.x || p.x == self.max.x || p.y == self.min.y || p.y == self.max.y)
    }

    /// The boundary cell a corridor toward `target` leaves from.
    ///
    /// The target is clamped into the room and pushed to the nearest edge,
    /// preferring left, right, top, bottom on ties.
    fn door_toward(&self, target: I64Vec2) -> I64Vec2 {
        let mut p = target.clamp(self.min, self.max);
        let distances = [
            p.x - self.min.x,
            self.max.x - p.x,
            p.y - self.min.y,
            self.max.y - p.y,
        ];
        let mut edge = 0;
        for (i, &d) in distances.iter().enumerate().skip(1) {
            if d < distances[edge] {
                edge = i;
            }
        }
        match edge {
            0 => p.x = self.min.x,
            1 => p.x = self.max.x,
            2 => p.y = self.min.y,
            _ => p.y = self.max.y,
        }
        p
    }
}

fn boxes_intersect(a: (I64Vec2, I64Vec2), b: (I64Vec2, I64Vec2)) -> bool {
    a.0.x <= b.1.x && b.0.x <= a.1.x && a.0.y <= b.1.y && b.0.y <= a.1.y
}

/// Rooms and the room pairs joined by corridors.
#[derive(Debug, Default)]
pub(crate) struct DungeonPlan {
    pub rooms: Vec<Room>,
    pub connections: Vec<(Room, Room)>,
}

#[derive(Clone, Copy)]
struct Edge {
    a: usize,
    b: usize,
    dist2: i64,
    key: u64,
}

impl Edge {
    fn new(i: usize, j: usize, dist2: i64) -> Self {
        let (a, b) = if i < j { (i, j) } else { (j, i) };
        Self {
            a,
            b,
            dist2,
            key: ((a as u64) << 32) | b as u64,
        }
    }
}

/// Union-find with path halving and union by rank.
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; returns `false` if already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.rank[ra] < self.rank[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        if self.rank[ra] == self.rank[rb] {
            self.rank[ra] += 1;
        }
        true
    }
}

/// Kruskal over `edges` (already sorted by weight), continuing the forest
/// in `sets` and recording accepted edge keys.
fn kruskal(edges: &[Edge], sets: &mut DisjointSet, accepted: &mut HashSet<u64>) {
    for e in edges {
        if sets.union(e.a, e.b) {
            accepted.insert(e.key);
        }
    }
}

/// Closest pair of rooms between two sectors.
fn bridge(a: &[Room], b: &[Room]) -> Option<(Room, Room)> {
    let mut best: Option<(i64, Room, Room)> = None;
    for ra in a {
        for rb in b {
            let d = ra.dist2(rb);
            if best.is_none_or(|(bd, _, _)| d < bd) {
                best = Some((d, *ra, *rb));
            }
        }
    }
    best.map(|(_, ra, rb)| (ra, rb))
}

/// Room lattice evaluation for one seed, with per-sector caching.
struct Planner<'a> {
    config: &'a DungeonConfig,
    seed: i64,
    step: i64,
    /// World cell of lattice point `(0, 0)` on each axis.
    phase: i64,
    /// Sector side in cells.
    span: i64,
    /// Lattice radius within which two padded rooms can overlap.
    reach: i64,
    /// Decided lattice points; `None` means no room.
    accepted: HashMap<I64Vec2, Option<Room>>,
    sectors: HashMap<I64Vec2, Vec<Room>>,
}

/// Outcome of one acceptance check.
enum Verdict {
    Decided(Option<Room>),
    /// An overlapping earlier candidate must be decided first.
    Blocked(I64Vec2),
}

impl<'a> Planner<'a> {
    fn new(config: &'a DungeonConfig, seed: i64) -> Self {
        let step = i64::from(config.room_step);
        // Lattice phase so that a tile at the world origin sees the lattice
        // starting `margin` cells before it.
        let phase = (-i64::from(config.margin)).rem_euclid(step);
        let max_jitter = (step as f64 * JITTER_SPREAD * 0.5).ceil() as i64;
        let half_room = i64::from(config.room_max.max(config.room_min)) / 2 + 1;
        let extent = max_jitter + half_room + i64::from(config.keepout);
        Self {
            config,
            seed,
            step,
            phase,
            span: step * i64::from(config.sector_size),
            reach: (2 * extent + (1 << BUCKET_SHIFT)) / step + 1,
            accepted: HashMap::new(),
            sectors: HashMap::new(),
        }
    }

    fn sector_of_cell(&self, cell: I64Vec2) -> I64Vec2 {
        I64Vec2::new(
            (cell.x - self.phase).div_euclid(self.span),
            (cell.y - self.phase).div_euclid(self.span),
        )
    }

    fn roll_range(&self, p: I64Vec2, salt: i64, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        let r = roll(self.seed, p, salt);
        (lo + (r * (hi - lo + 1) as f64).floor() as i64).min(hi)
    }

    /// The room a lattice point proposes, before overlap rejection.
    fn candidate(&self, lattice: I64Vec2) -> Option<Room> {
        let cfg = self.config;
        let anchor = lattice * self.step + I64Vec2::splat(self.phase);
        let step = self.step as f64;
        let jitter =
            |salt| ((roll(self.seed, anchor, salt) - 0.5) * step * JITTER_SPREAD).round() as i64;
        let center = anchor + I64Vec2::new(jitter(SALT_JITTER_X), jitter(SALT_JITTER_Y));

        if roll(self.seed, center, SALT_ROOM) > cfg.room_probability {
            return None;
        }

        let (lo, hi) = (i64::from(cfg.room_min), i64::from(cfg.room_max));
        let mut size = I64Vec2::new(
            self.roll_range(center, SALT_WIDTH, lo, hi),
            self.roll_range(center, SALT_HEIGHT, lo, hi),
        );
        // Odd sides keep the centre cell in the middle.
        if size.x % 2 == 0 {
            size.x += 1;
        }
        if size.y % 2 == 0 {
            size.y += 1;
        }
        Some(Room::new(center, size))
    }

    /// Lattice points within reach that precede `lattice` in world scan order.
    fn earlier_neighbours(&self, lattice: I64Vec2) -> impl Iterator<Item = I64Vec2> {
        let reach = self.reach;
        (-reach..=0)
            .flat_map(move |dy| (-reach..=reach).map(move |dx| I64Vec2::new(dx, dy)))
            .filter(|d| d.y < 0 || d.x < 0)
            .map(move |d| lattice + d)
    }

    fn verdict(&self, lattice: I64Vec2) -> Verdict {
        let Some(room) = self.candidate(lattice) else {
            return Verdict::Decided(None);
        };
        let keepout = i64::from(self.config.keepout);
        let own = room.buckets(keepout);

        let mut blocked = None;
        for earlier in self.earlier_neighbours(lattice) {
            let Some(other) = self.candidate(earlier) else {
                continue;
            };
            if !boxes_intersect(own, other.buckets(keepout)) {
                continue;
            }
            match self.accepted.get(&earlier) {
                Some(Some(_)) => return Verdict::Decided(None),
                Some(None) => {}
                None => blocked = blocked.or(Some(earlier)),
            }
        }
        match blocked {
            Some(earlier) => Verdict::Blocked(earlier),
            None => Verdict::Decided(Some(room)),
        }
    }

    /// The room at a lattice point, if its candidate overlaps no room
    /// accepted at an earlier lattice point.
    ///
    /// Dependencies only point backwards in scan order, so the worklist
    /// always terminates; decisions are memoised.
    fn room_at(&mut self, lattice: I64Vec2) -> Option<Room> {
        let mut pending = vec![lattice];
        while let Some(&point) = pending.last() {
            if self.accepted.contains_key(&point) {
                pending.pop();
                continue;
            }
            match self.verdict(point) {
                Verdict::Decided(room) => {
                    self.accepted.insert(point, room);
                    pending.pop();
                }
                Verdict::Blocked(earlier) => pending.push(earlier),
            }
        }
        self.accepted.get(&lattice).copied().flatten()
    }

    fn ensure_sector(&mut self, sector: I64Vec2) {
        if self.sectors.contains_key(&sector) {
            return;
        }
        let n = i64::from(self.config.sector_size);
        let base = sector * n;
        let mut rooms = Vec::new();
        for j in 0..n {
            for i in 0..n {
                if let Some(room) = self.room_at(base + I64Vec2::new(i, j)) {
                    rooms.push(room);
                }
            }
        }
        self.sectors.insert(sector, rooms);
    }

    fn rooms(&self, sector: I64Vec2) -> &[Room] {
        self.sectors.get(&sector).map_or(&[], Vec::as_slice)
    }

    /// Backbone and loop corridors inside one sector.
    fn sector_connections(&self, rooms: &[Room]) -> Vec<(Room, Room)> {
        let n = rooms.len();
        if n < 2 {
            return Vec::new();
        }
        let k = self.config.neighbours as usize;

        let mut edges = Vec::with_capacity(n * k);
        for (i, room) in rooms.iter().enumerate() {
            let mut near: Vec<(i64, usize)> = rooms
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, other)| (room.dist2(other), j))
                .collect();
            near.sort_unstable();
            edges.extend(near.iter().take(k).map(|&(d, j)| Edge::new(i, j, d)));
        }
        edges.sort_unstable_by_key(|e| e.key);
        edges.dedup_by_key(|e| e.key);

        let mut by_length = edges.clone();
        by_length.sort_unstable_by_key(|e| (e.dist2, e.key));

        let mut sets = DisjointSet::new(n);
        let mut backbone = HashSet::new();
        kruskal(&by_length, &mut sets, &mut backbone);

        // The neighbour graph can split into clusters; finish the spanning
        // tree over all pairs so every room in the sector is reachable.
        if backbone.len() + 1 < n {
            let mut all: Vec<Edge> = (0..n)
                .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
                .map(|(a, b)| Edge::new(a, b, rooms[a].dist2(&rooms[b])))
                .collect();
            all.sort_unstable_by_key(|e| (e.dist2, e.key));
            kruskal(&all, &mut sets, &mut backbone);
        }

        let mut keys: Vec<u64> = backbone.iter().copied().collect();
        keys.sort_unstable();
        let mut connections: Vec<(Room, Room)> = keys
            .into_iter()
            .map(|key| (rooms[(key >> 32) as usize], rooms[(key & 0xFFFF_FFFF) as usize]))
            .collect();

        for e in &edges {
            if backbone.contains(&e.key) {
                continue;
            }
            let (a, b) = (rooms[e.a], rooms[e.b]);
            let mixed = I64Vec2::new(a.center.x ^ b.center.x, a.center.y ^ b.center.y);
            if roll(self.seed, mixed, SALT_LOOP) < self.config.extra_loop_probability {
                connections.push((a, b));
            }
        }
        connections
    }
}

/// Clipped writes into a tile addressed in world cells.
struct Canvas {
    origin: I64Vec2,
    last: I64Vec2,
    grid: DungeonTile,
}

impl Canvas {
    fn new(tile: &CellTile, last: I64Vec2) -> Self {
        Self {
            origin: tile.origin,
            last,
            grid: DungeonTile::filled(tile.width, tile.height, DungeonCell::Wall),
        }
    }

    /// Raise the cell at `p` to `cell`; lower classes never overwrite higher.
    fn put(&mut self, p: I64Vec2, cell: DungeonCell) {
        if p.x < self.origin.x || p.y < self.origin.y || p.x > self.last.x || p.y > self.last.y {
            return;
        }
        let local = p - self.origin;
        let (x, y) = (local.x as usize, local.y as usize);
        if cell > self.grid.get(x, y) {
            self.grid.set(x, y, cell);
        }
    }

    /// Fill the inclusive rectangle spanned by two corners.
    fn fill(&mut self, a: I64Vec2, b: I64Vec2, cell: DungeonCell) {
        let lo = a.min(b).max(self.origin);
        let hi = a.max(b).min(self.last);
        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                self.put(I64Vec2::new(x, y), cell);
            }
        }
    }

    /// An axis-aligned corridor segment widened by `half` on the cross axis.
    fn segment(&mut self, from: I64Vec2, to: I64Vec2, half: i64) {
        let pad = if from.x == to.x {
            I64Vec2::new(half, 0)
        } else {
            I64Vec2::new(0, half)
        };
        self.fill(from.min(to) - pad, from.max(to) + pad, DungeonCell::Floor);
    }
}

/// Generates dungeon tiles.
#[derive(Clone, Debug, Default)]
pub struct DungeonGenerator {
    config: DungeonConfig,
}

impl DungeonGenerator {
    /// Create a generator for `config`.
    pub fn new(config: DungeonConfig) -> Self {
        Self { config }
    }

    /// Returns the layout configuration.
    pub fn config(&self) -> &DungeonConfig {
        &self.config
    }

    fn is_usable(&self) -> bool {
        let cfg = &self.config;
        cfg.room_step > 0 && cfg.sector_size > 0 && cfg.room_min > 0
    }

    /// Generate a tile of wall, floor and door cells.
    pub fn generate(&self, tile: CellTile) -> DungeonTile {
        let Some((first, last)) = tile.world_bounds() else {
            return DungeonTile::filled(tile.width, tile.height, DungeonCell::Wall);
        };
        if !self.is_usable() {
            tracing::warn!(
                "dungeon room step {} or sector size {} is zero, emitting solid rock",
                self.config.room_step,
                self.config.sector_size
            );
            return DungeonTile::filled(tile.width, tile.height, DungeonCell::Wall);
        }

        let plan = self.plan(tile.seed, first, last);
        let mut canvas = Canvas::new(&tile, last);

        for room in &plan.rooms {
            canvas.fill(room.min, room.max, DungeonCell::Floor);
        }
        for (a, b) in &plan.connections {
            self.carve_corridor(&mut canvas, tile.seed, a, b);
        }

        tracing::debug!(
            rooms = plan.rooms.len(),
            corridors = plan.connections.len(),
            "planned dungeon tile at ({}, {})",
            tile.origin.x,
            tile.origin.y
        );
        canvas.grid
    }

    /// Rooms and corridors of every sector whose margin-grown rectangle
    /// touches the cells `first..=last`.
    pub(crate) fn plan(&self, seed: i64, first: I64Vec2, last: I64Vec2) -> DungeonPlan {
        let mut planner = Planner::new(&self.config, seed);
        let margin = I64Vec2::splat(i64::from(self.config.margin));
        let lo = planner.sector_of_cell(first - margin);
        let hi = planner.sector_of_cell(last + margin);

        let sectors: Vec<I64Vec2> = (lo.y..=hi.y)
            .flat_map(|y| (lo.x..=hi.x).map(move |x| I64Vec2::new(x, y)))
            .collect();
        for &s in &sectors {
            for n in [s, s - I64Vec2::X, s + I64Vec2::X, s - I64Vec2::Y, s + I64Vec2::Y] {
                planner.ensure_sector(n);
            }
        }

        let mut plan = DungeonPlan::default();
        for &s in &sectors {
            let rooms = planner.rooms(s);
            plan.rooms.extend_from_slice(rooms);
            plan.connections.extend(planner.sector_connections(rooms));
        }

        let mut bridged = HashSet::new();
        for &s in &sectors {
            let pairs = [
                (s, s + I64Vec2::X),
                (s, s + I64Vec2::Y),
                (s - I64Vec2::X, s),
                (s - I64Vec2::Y, s),
            ];
            for (a, b) in pairs {
                if bridged.insert((a, b))
                    && let Some(pair) = bridge(planner.rooms(a), planner.rooms(b))
                {
                    plan.connections.push(pair);
                }
            }
        }
        plan
    }

    fn carve_corridor(&self, canvas: &mut Canvas, seed: i64, a: &Room, b: &Room) {
        let half = i64::from(self.config.corridor_half_width);
        let door_a = a.door_toward(b.center);
        let door_b = b.door_toward(a.center);

        let mixed = I64Vec2::new(door_a.x ^ door_b.x, door_a.y ^ door_b.y);
        let x_first = roll(seed, mixed, SALT_BEND) < 0.5;

        let mut elbow = if x_first {
            I64Vec2::new(door_b.x, door_a.y)
        } else {
            I64Vec2::new(door_a.x, door_b.y)
        };
        if roll(seed, elbow, SALT_ELBOW) < ELBOW_JITTER_CHANCE {
            let salt = if x_first { SALT_ELBOW_Y } else { SALT_ELBOW_X };
            let shift = ((roll(seed, elbow, salt) - 0.5) * ELBOW_JITTER_SPAN).round() as i64;
            if x_first {
                elbow.y += shift;
            } else {
                elbow.x += shift;
            }
        }

        let path = [
            door_a,
            I64Vec2::new(elbow.x, door_a.y),
            elbow,
            I64Vec2::new(door_b.x, elbow.y),
            door_b,
        ];
        for leg in path.windows(2) {
            canvas.segment(leg[0], leg[1], half);
        }

        if roll(seed, door_a, SALT_DOOR_A) < self.config.door_chance {
            canvas.put(door_a, DungeonCell::Door);
        }
        if roll(seed, door_b, SALT_DOOR_B) < self.config.door_chance {
            canvas.put(door_b, DungeonCell::Door);
        }
    }
}
