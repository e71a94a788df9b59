use crate::agent::{Agent, Holdings};
use crate::sensors::{wrap_unsigned_angle, Action, Move};
use rand::Rng;
use shared::{AgentConfig, EngineConfig, PuzzleConfig, PuzzleProgress, WorldConfig};
use tracing::debug;

/// Tile coordinates, `(x, y)`
pub type TilePos = (usize, usize);

/// Attempts at finding a free tile before giving up
const OPEN_TILE_ATTEMPTS: usize = 200;

/// Longest stretch of a move between two collision samples, in tiles
const SWEEP_STEP: f64 = 0.5;

const SMALL_FORTRESS: usize = 5;
const LARGE_FORTRESS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColor {
    Red,
    Gold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorKind {
    /// Small fortress, opened with the red key
    Wood,
    /// Large fortress, opened with the gold key once the wood door is open
    Iron,
}

/// Types of tiles in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tile {
    Empty,
    Wall,
    /// Cuttable obstacle: falls after `hits_left` axe hits
    Tree { hits_left: u32 },
    /// Penalizing terrain: slows movement, drains energy and fitness
    Water,
    /// Consumable resource: doesn't regrow
    Food { amount: u32 },
    /// Renewable resource: regrows food over time
    Plant {
        current_food: u32,
        max_food: u32,
        regrowth_timer: u32,
    },
    Key(KeyColor),
    Axe,
    Door {
        kind: DoorKind,
        hits_left: u32,
        open: bool,
    },
    Chest { open: bool },
}

impl Tile {
    /// Whether movement into this tile is refused
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Tile::Wall | Tile::Tree { .. } | Tile::Door { open: false, .. } | Tile::Chest { .. }
        )
    }

    /// Food available on this tile
    pub fn food(&self) -> u32 {
        match self {
            Tile::Plant { current_food, .. } => *current_food,
            Tile::Food { amount } => *amount,
            _ => 0,
        }
    }
}

/// Where a puzzle item currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSpot {
    Absent,
    /// Reserved spot, waiting for its spawn generation
    Pending(TilePos),
    OnMap(TilePos),
    Taken,
}

impl ItemSpot {
    pub fn on_map(&self) -> Option<TilePos> {
        match self {
            ItemSpot::OnMap(pos) => Some(*pos),
            _ => None,
        }
    }
}

/// Restorative area that wanders the map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pond {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Pond {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (x - self.x).hypot(y - self.y) <= self.radius
    }
}

/// One-time puzzle milestones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleEvent {
    AxePicked,
    RedKeyPicked,
    GoldKeyPicked,
    TreeFelled,
    WoodDoorOpened,
    IronDoorOpened,
    ChestOpened,
}

impl PuzzleEvent {
    pub fn reward(self, config: &PuzzleConfig) -> f64 {
        match self {
            PuzzleEvent::AxePicked => config.axe_reward,
            PuzzleEvent::RedKeyPicked => config.red_key_reward,
            PuzzleEvent::GoldKeyPicked => config.gold_key_reward,
            PuzzleEvent::TreeFelled => config.tree_cut_reward,
            PuzzleEvent::WoodDoorOpened => config.wood_door_reward,
            PuzzleEvent::IronDoorOpened => config.iron_door_reward,
            PuzzleEvent::ChestOpened => config.chest_reward,
        }
    }

    /// Count this milestone in a progress tally
    pub fn tally(self, progress: &mut PuzzleProgress) {
        match self {
            PuzzleEvent::AxePicked => progress.axes_collected += 1,
            PuzzleEvent::RedKeyPicked => progress.red_keys_collected += 1,
            PuzzleEvent::GoldKeyPicked => progress.gold_keys_collected += 1,
            PuzzleEvent::TreeFelled => progress.trees_cut += 1,
            PuzzleEvent::WoodDoorOpened | PuzzleEvent::IronDoorOpened => {
                progress.doors_opened += 1
            }
            PuzzleEvent::ChestOpened => progress.chests_opened += 1,
        }
    }
}

/// Outcome of one agent's action in one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    /// Distance actually moved
    pub moved: f64,
    pub collided: bool,
    pub food_eaten: u32,
    pub energy_gained: f64,
    pub energy_spent: f64,
    /// Sum of puzzle rewards earned this tick
    pub reward: f64,
    pub on_water: bool,
    pub water_penalty: f64,
    pub events: Vec<PuzzleEvent>,
}

/// Axis-aligned tile rectangle kept free of clutter
#[derive(Debug, Clone, Copy)]
struct Rect {
    x: usize,
    y: usize,
    size: usize,
}

impl Rect {
    /// Inside the rectangle or its one-tile margin
    fn guards(&self, x: usize, y: usize) -> bool {
        x + 1 >= self.x && x <= self.x + self.size && y + 1 >= self.y && y <= self.y + self.size
    }
}

/// 2D grid world. Agents move in continuous coordinates on top of it; the
/// tile under an agent is `(floor(x), floor(y))`.
#[derive(Debug, Clone)]
pub struct World {
    pub width: usize,
    pub height: usize,
    grid: Vec<Vec<Tile>>,
    generation: u32,
    tick: u32,
    pond: Option<Pond>,
    axe: ItemSpot,
    red_key: ItemSpot,
    gold_key: ItemSpot,
    wood_door: Option<TilePos>,
    iron_door: Option<TilePos>,
    chest: Option<TilePos>,
    keep_out: Vec<Rect>,
    config: WorldConfig,
    agent_config: AgentConfig,
    puzzle_config: PuzzleConfig,
}

impl World {
    /// An empty map with no terrain, items or pond
    pub fn blank(config: &EngineConfig, generation: u32) -> Self {
        let width = config.world.width;
        let height = config.world.height;
        World {
            width,
            height,
            grid: vec![vec![Tile::Empty; width]; height],
            generation,
            tick: 0,
            pond: None,
            axe: ItemSpot::Absent,
            red_key: ItemSpot::Absent,
            gold_key: ItemSpot::Absent,
            wood_door: None,
            iron_door: None,
            chest: None,
            keep_out: Vec::new(),
            config: config.world.clone(),
            agent_config: config.agent.clone(),
            puzzle_config: config.puzzle.clone(),
        }
    }

    /// Build a fresh procedural map for a generation
    pub fn generate<R: Rng + ?Sized>(config: &EngineConfig, generation: u32, rng: &mut R) -> Self {
        let mut world = Self::blank(config, generation);
        world.build_fortresses(rng);
        world.scatter_walls(rng);

        let tree = Tile::Tree {
            hits_left: world.config.tree_hits,
        };
        world.scatter_clusters(rng, world.config.tree_clusters, 2.0, tree);
        world.scatter_clusters(rng, world.config.water_clusters, 2.5, Tile::Water);

        world.scatter(rng, world.config.food_count, Tile::Food { amount: 1 });
        let plants = (world.width * world.height) as f64 * world.config.plant_density;
        let plant = Tile::Plant {
            current_food: world.config.plant_max_food,
            max_food: world.config.plant_max_food,
            regrowth_timer: 0,
        };
        world.scatter(rng, plants as usize, plant);

        if let Some(pos) = world.random_open_tile(rng) {
            world.place(pos, Tile::Axe);
        }
        if let Some(pos) = world.random_open_tile(rng) {
            world.red_key = ItemSpot::Pending(pos);
        }
        world.pond = world.random_open_tile(rng).map(|(x, y)| Pond {
            x: x as f64 + 0.5,
            y: y as f64 + 0.5,
            radius: world.config.pond_radius,
        });
        world.spawn_due_keys();

        world
    }

    /// Put a tile on the map, registering puzzle entities
    pub fn place(&mut self, (x, y): TilePos, tile: Tile) {
        match tile {
            Tile::Axe => self.axe = ItemSpot::OnMap((x, y)),
            Tile::Key(KeyColor::Red) => self.red_key = ItemSpot::OnMap((x, y)),
            Tile::Key(KeyColor::Gold) => self.gold_key = ItemSpot::OnMap((x, y)),
            Tile::Door {
                kind: DoorKind::Wood,
                ..
            } => self.wood_door = Some((x, y)),
            Tile::Door {
                kind: DoorKind::Iron,
                ..
            } => self.iron_door = Some((x, y)),
            Tile::Chest { .. } => self.chest = Some((x, y)),
            _ => {}
        }
        self.grid[y][x] = tile;
    }

    /// Get tile at position (returns None if out of bounds)
    pub fn get_tile(&self, x: usize, y: usize) -> Option<&Tile> {
        if x < self.width && y < self.height {
            Some(&self.grid[y][x])
        } else {
            None
        }
    }

    /// Rows of tiles, top to bottom
    pub fn rows(&self) -> &[Vec<Tile>] {
        &self.grid
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of `step` calls so far
    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn pond(&self) -> Option<Pond> {
        self.pond
    }

    /// Tile under a continuous position, if inside the map
    pub fn tile_at(&self, x: f64, y: f64) -> Option<TilePos> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (tx, ty) = (x.floor() as usize, y.floor() as usize);
        (tx < self.width && ty < self.height).then_some((tx, ty))
    }

    pub fn is_water_at(&self, x: f64, y: f64) -> bool {
        self.tile_at(x, y)
            .map_or(false, |(tx, ty)| self.grid[ty][tx] == Tile::Water)
    }

    fn is_passable(&self, x: f64, y: f64) -> bool {
        self.tile_at(x, y)
            .map_or(false, |(tx, ty)| !self.grid[ty][tx].is_blocking())
    }

    /// Every sample along the segment is passable, so fast movers cannot
    /// skip over a one-tile wall
    fn is_path_clear(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> bool {
        let length = (x1 - x0).hypot(y1 - y0);
        let samples = ((length / SWEEP_STEP).ceil() as usize).max(1);
        (1..=samples).all(|i| {
            let t = i as f64 / samples as f64;
            self.is_passable(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t)
        })
    }

    pub fn door_open(&self, kind: DoorKind) -> bool {
        let pos = match kind {
            DoorKind::Wood => self.wood_door,
            DoorKind::Iron => self.iron_door,
        };
        pos.map_or(false, |(x, y)| {
            matches!(self.grid[y][x], Tile::Door { open: true, .. })
        })
    }

    /// Global win condition
    pub fn chest_open(&self) -> bool {
        self.chest
            .map_or(false, |(x, y)| self.grid[y][x] == Tile::Chest { open: true })
    }

    /// Next step of the unlock chain for an agent with these holdings
    pub fn puzzle_target(&self, holdings: &Holdings) -> Option<TilePos> {
        if !holdings.axe {
            if let Some(pos) = self.axe.on_map() {
                return Some(pos);
            }
        }
        if !self.door_open(DoorKind::Wood) {
            return if holdings.red_key {
                self.wood_door
            } else {
                self.red_key.on_map()
            };
        }
        if !self.door_open(DoorKind::Iron) {
            return if holdings.gold_key {
                self.iron_door
            } else {
                self.gold_key.on_map()
            };
        }
        if !self.chest_open() {
            return self.chest;
        }
        None
    }

    /// A free spawn position at a tile centre. Falls back to the first
    /// passable tile in row order when sampling finds nothing.
    pub fn spawn_point<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let (x, y) = self
            .random_open_tile(rng)
            .or_else(|| self.first_passable_tile())
            .unwrap_or((self.width / 2, self.height / 2));
        (x as f64 + 0.5, y as f64 + 0.5)
    }

    fn first_passable_tile(&self) -> Option<TilePos> {
        self.grid.iter().enumerate().find_map(|(y, row)| {
            row.iter()
                .position(|tile| !tile.is_blocking())
                .map(|x| (x, y))
        })
    }

    /// Advance environmental state that does not depend on agents
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.tick += 1;
        self.tick_plants();

        if self.apple_count() < self.config.food_regen_threshold {
            self.scatter(rng, self.config.food_regen_amount, Tile::Food { amount: 1 });
        }

        let interval = self.config.pond_relocate_interval;
        if interval > 0 && self.tick % interval == 0 {
            if let Some((x, y)) = self.random_open_tile(rng) {
                if let Some(pond) = &mut self.pond {
                    pond.x = x as f64 + 0.5;
                    pond.y = y as f64 + 0.5;
                }
            }
        }
    }

    /// Apply one agent's action: movement with collision, terrain, pond,
    /// pickups, eating and hitting. The agent's position, heading, holdings
    /// and hit cooldown are updated in place; everything else is reported in
    /// the returned effects.
    ///
    /// # Panics
    ///
    /// Panics if the agent is dead.
    pub fn resolve_interaction(&mut self, agent: &mut Agent, action: &Action, tick: u32) -> Effects {
        assert!(agent.is_alive(), "dead agent {} cannot act", agent.index);

        let cfg = &self.agent_config;
        let mut effects = Effects {
            energy_spent: cfg.base_cost,
            ..Default::default()
        };

        match action.movement {
            Move::TurnLeft => {
                agent.heading = wrap_unsigned_angle(agent.heading - cfg.turn_angle);
                effects.energy_spent += cfg.turn_cost;
            }
            Move::TurnRight => {
                agent.heading = wrap_unsigned_angle(agent.heading + cfg.turn_angle);
                effects.energy_spent += cfg.turn_cost;
            }
            Move::Advance => {
                effects.energy_spent += cfg.move_cost;
                let mut speed = cfg.speed;
                if self.is_water_at(agent.x, agent.y) {
                    speed *= self.config.water_speed_multiplier;
                }
                let nx = agent.x + agent.heading.cos() * speed;
                let ny = agent.y + agent.heading.sin() * speed;
                if self.is_path_clear(agent.x, agent.y, nx, ny) {
                    effects.moved = (nx - agent.x).hypot(ny - agent.y);
                    agent.x = nx;
                    agent.y = ny;
                } else {
                    effects.collided = true;
                }
            }
        }

        if self.is_water_at(agent.x, agent.y) {
            effects.on_water = true;
            effects.energy_spent += self.config.water_energy_drain;
            effects.water_penalty = self.config.water_fitness_penalty;
        }
        if self.pond.map_or(false, |p| p.contains(agent.x, agent.y)) {
            effects.energy_gained += self.config.pond_energy_restore;
        }

        self.pick_up(agent, &mut effects);

        if action.eat {
            if let Some(pos) = self.tile_at(agent.x, agent.y) {
                let eaten = self.consume_food(pos, 1);
                effects.food_eaten += eaten;
                effects.energy_gained += eaten as f64 * self.agent_config.food_energy;
            }
        }

        if action.hit {
            self.hit(agent, tick, &mut effects);
        }

        effects.reward = effects
            .events
            .iter()
            .map(|e| e.reward(&self.puzzle_config))
            .sum();
        for event in &effects.events {
            debug!(agent = agent.index, tick, ?event, "puzzle event");
        }
        effects
    }

    fn pick_up(&mut self, agent: &mut Agent, effects: &mut Effects) {
        let Some((x, y)) = self.tile_at(agent.x, agent.y) else {
            return;
        };
        let event = match self.grid[y][x] {
            Tile::Axe if !agent.holdings.axe => {
                agent.holdings.axe = true;
                self.axe = ItemSpot::Taken;
                PuzzleEvent::AxePicked
            }
            Tile::Key(KeyColor::Red) if !agent.holdings.red_key => {
                agent.holdings.red_key = true;
                self.red_key = ItemSpot::Taken;
                PuzzleEvent::RedKeyPicked
            }
            Tile::Key(KeyColor::Gold) if !agent.holdings.gold_key => {
                agent.holdings.gold_key = true;
                self.gold_key = ItemSpot::Taken;
                PuzzleEvent::GoldKeyPicked
            }
            _ => return,
        };
        self.grid[y][x] = Tile::Empty;
        effects.events.push(event);
    }

    /// Hit the facing tile. Hits out of unlock order, on nothing hittable or
    /// during the cooldown change nothing and cost nothing.
    fn hit(&mut self, agent: &mut Agent, tick: u32, effects: &mut Effects) {
        if let Some(last) = agent.last_hit {
            if tick < last.saturating_add(self.agent_config.hit_cooldown_ticks) {
                return;
            }
        }
        let Some((x, y)) = self.facing_tile(agent) else {
            return;
        };

        let wood_open = self.door_open(DoorKind::Wood);
        let iron_open = self.door_open(DoorKind::Iron);
        let holdings = agent.holdings;

        // None: the hit is refused. Some(None): it landed without finishing anything.
        let landed = match &mut self.grid[y][x] {
            Tile::Tree { hits_left } if holdings.axe => {
                Some(strike(hits_left).then_some(PuzzleEvent::TreeFelled))
            }
            Tile::Door {
                kind: DoorKind::Wood,
                hits_left,
                open,
            } if !*open && holdings.red_key => {
                *open = strike(hits_left);
                Some((*open).then_some(PuzzleEvent::WoodDoorOpened))
            }
            Tile::Door {
                kind: DoorKind::Iron,
                hits_left,
                open,
            } if !*open && holdings.gold_key && wood_open => {
                *open = strike(hits_left);
                Some((*open).then_some(PuzzleEvent::IronDoorOpened))
            }
            Tile::Chest { open } if !*open && wood_open && iron_open => {
                *open = true;
                Some(Some(PuzzleEvent::ChestOpened))
            }
            _ => None,
        };
        let Some(event) = landed else {
            return;
        };

        agent.last_hit = Some(tick);
        effects.energy_spent += self.agent_config.hit_cost;
        if let Some(event) = event {
            if event == PuzzleEvent::TreeFelled {
                let drop = self.config.tree_food_drop;
                self.grid[y][x] = if drop > 0 {
                    Tile::Food { amount: drop }
                } else {
                    Tile::Empty
                };
            }
            effects.events.push(event);
        }
    }

    /// First tile ahead of the agent that is not the one it stands on
    pub fn facing_tile(&self, agent: &Agent) -> Option<TilePos> {
        let here = self.tile_at(agent.x, agent.y);
        let (dx, dy) = (agent.heading.cos(), agent.heading.sin());
        for reach in [0.5, 1.0, 1.5] {
            let ahead = self.tile_at(agent.x + dx * reach, agent.y + dy * reach)?;
            if Some(ahead) != here {
                return Some(ahead);
            }
        }
        None
    }

    /// Consume food from a tile
    /// Returns the amount actually consumed
    pub fn consume_food(&mut self, (x, y): TilePos, amount_requested: u32) -> u32 {
        let regrowth_ticks = self.config.plant_regrowth_ticks;
        let Some(tile) = self.grid.get_mut(y).and_then(|row| row.get_mut(x)) else {
            return 0;
        };
        match tile {
            Tile::Plant {
                current_food,
                regrowth_timer,
                ..
            } => {
                let consumed = (*current_food).min(amount_requested);
                *current_food -= consumed;
                if consumed > 0 && *regrowth_timer == 0 {
                    *regrowth_timer = regrowth_ticks;
                }
                consumed
            }
            Tile::Food { amount } => {
                let consumed = (*amount).min(amount_requested);
                *amount -= consumed;
                if *amount == 0 {
                    *tile = Tile::Empty;
                }
                consumed
            }
            _ => 0,
        }
    }

    /// Update all plants - regrow one unit each time the timer runs out
    fn tick_plants(&mut self) {
        let regrowth_ticks = self.config.plant_regrowth_ticks.max(1);
        for tile in self.grid.iter_mut().flatten() {
            if let Tile::Plant {
                current_food,
                max_food,
                regrowth_timer,
            } = tile
            {
                if *current_food >= *max_food {
                    *regrowth_timer = 0;
                    continue;
                }
                *regrowth_timer = regrowth_timer.saturating_sub(1);
                if *regrowth_timer == 0 {
                    *current_food += 1;
                    if *current_food < *max_food {
                        *regrowth_timer = regrowth_ticks;
                    }
                }
            }
        }
    }

    /// Get total food available in the world
    pub fn total_food(&self) -> u32 {
        self.grid.iter().flatten().map(Tile::food).sum()
    }

    /// Loose apples on the map, plants excluded
    fn apple_count(&self) -> usize {
        self.grid
            .iter()
            .flatten()
            .map(|t| match t {
                Tile::Food { amount } => *amount as usize,
                _ => 0,
            })
            .sum()
    }

    fn spawn_due_keys(&mut self) {
        if self.generation >= self.puzzle_config.red_key_spawn_generation {
            if let ItemSpot::Pending(pos) = self.red_key {
                self.spawn_key(pos, KeyColor::Red);
            }
        }
        if self.generation >= self.puzzle_config.gold_key_spawn_generation {
            if let ItemSpot::Pending(pos) = self.gold_key {
                self.spawn_key(pos, KeyColor::Gold);
            }
        }
    }

    fn spawn_key(&mut self, (x, y): TilePos, color: KeyColor) {
        if self.grid[y][x] == Tile::Empty {
            self.place((x, y), Tile::Key(color));
            debug!(generation = self.generation, ?color, x, y, "key spawned");
        }
    }

    fn is_open(&self, x: usize, y: usize) -> bool {
        self.grid[y][x] == Tile::Empty && !self.keep_out.iter().any(|r| r.guards(x, y))
    }

    fn random_open_tile<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<TilePos> {
        (0..OPEN_TILE_ATTEMPTS).find_map(|_| {
            let x = rng.gen_range(0..self.width);
            let y = rng.gen_range(0..self.height);
            self.is_open(x, y).then_some((x, y))
        })
    }

    fn scatter<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize, tile: Tile) {
        for _ in 0..count {
            if let Some(pos) = self.random_open_tile(rng) {
                self.place(pos, tile);
            }
        }
    }

    /// Small fortress on the left half, large fortress on the right half.
    /// Doors sit in the middle of the bottom wall.
    fn build_fortresses<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let half = self.width / 2;

        let x = rng.gen_range(1..=half - SMALL_FORTRESS - 1);
        let y = rng.gen_range(1..=self.height - SMALL_FORTRESS - 2);
        let door = Tile::Door {
            kind: DoorKind::Wood,
            hits_left: self.puzzle_config.wood_door_hits,
            open: false,
        };
        self.build_fortress(x, y, SMALL_FORTRESS, door);
        let centre = SMALL_FORTRESS / 2;
        self.gold_key = ItemSpot::Pending((x + centre, y + centre));

        let x = rng.gen_range(half + 1..=self.width - LARGE_FORTRESS - 1);
        let y = rng.gen_range(1..=self.height - LARGE_FORTRESS - 2);
        let door = Tile::Door {
            kind: DoorKind::Iron,
            hits_left: self.puzzle_config.iron_door_hits,
            open: false,
        };
        self.build_fortress(x, y, LARGE_FORTRESS, door);
        let centre = LARGE_FORTRESS / 2;
        self.place((x + centre, y + centre), Tile::Chest { open: false });
    }

    fn build_fortress(&mut self, x0: usize, y0: usize, size: usize, door: Tile) {
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                let ring = x == x0 || y == y0 || x == x0 + size - 1 || y == y0 + size - 1;
                self.grid[y][x] = if ring { Tile::Wall } else { Tile::Empty };
            }
        }
        self.place((x0 + size / 2, y0 + size - 1), door);
        self.keep_out.push(Rect { x: x0, y: y0, size });
    }

    fn scatter_walls<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for _ in 0..self.config.wall_segments {
            let Some((x, y)) = self.random_open_tile(rng) else {
                continue;
            };
            let length = rng.gen_range(3..=8);
            let horizontal = rng.gen_bool(0.5);
            for i in 0..length {
                let (wx, wy) = if horizontal { (x + i, y) } else { (x, y + i) };
                if wx >= self.width || wy >= self.height || !self.is_open(wx, wy) {
                    break;
                }
                self.grid[wy][wx] = Tile::Wall;
            }
        }
    }

    fn scatter_clusters<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize, radius: f64, tile: Tile) {
        let reach = radius.ceil() as usize;
        for _ in 0..count {
            let Some((cx, cy)) = self.random_open_tile(rng) else {
                continue;
            };
            for y in cy.saturating_sub(reach)..=(cy + reach).min(self.height - 1) {
                for x in cx.saturating_sub(reach)..=(cx + reach).min(self.width - 1) {
                    let dx = x as f64 - cx as f64;
                    let dy = y as f64 - cy as f64;
                    // Ragged edges
                    if dx.hypot(dy) <= radius && self.is_open(x, y) && rng.gen_bool(0.7) {
                        self.grid[y][x] = tile;
                    }
                }
            }
        }
    }
}

/// Land one hit on a counter; true once it reaches zero
fn strike(hits_left: &mut u32) -> bool {
    *hits_left = hits_left.saturating_sub(1);
    *hits_left == 0
}
