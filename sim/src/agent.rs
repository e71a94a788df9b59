use crate::brain::Brain;
use crate::world::Effects;
use shared::{AgentConfig, AgentStats, Genome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Alive,
    /// Terminal: a dead agent never perceives or acts again this generation
    Dead,
}

/// Puzzle items an agent carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Holdings {
    pub red_key: bool,
    pub gold_key: bool,
    pub axe: bool,
}

#[derive(Debug, Clone)]
pub struct Agent {
    /// Stable index within the generation's population
    pub index: usize,
    pub x: f64,
    pub y: f64,
    /// Radians, 0 points along +x
    pub heading: f64,
    pub holdings: Holdings,
    /// Tick of the last hit that landed, for the cooldown
    pub last_hit: Option<u32>,
    spawn: (f64, f64),
    energy: f64,
    state: AgentState,
    brain: Brain,
    stats: AgentStats,
}

impl Agent {
    /// Create a new agent owning its own copy of a genome
    pub fn new(index: usize, genome: Genome, x: f64, y: f64, heading: f64, energy: f64) -> Self {
        Self {
            index,
            x,
            y,
            heading,
            holdings: Holdings::default(),
            last_hit: None,
            spawn: (x, y),
            energy,
            state: AgentState::Alive,
            brain: Brain::new(genome),
            stats: AgentStats::default(),
        }
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state == AgentState::Alive
    }

    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Fold one tick's effects into the statistics and energy.
    ///
    /// # Panics
    ///
    /// Panics if the agent is already dead.
    pub fn absorb(&mut self, effects: &Effects, config: &AgentConfig) {
        assert!(self.is_alive(), "dead agent {} cannot act", self.index);

        self.stats.age += 1;
        if effects.moved > 0.0 {
            self.stats.distance_travelled += effects.moved;
            self.stats.moves += 1;
        }
        if effects.collided {
            self.stats.collisions += 1;
        }
        self.stats.net_displacement = (self.x - self.spawn.0).hypot(self.y - self.spawn.1);
        self.stats.food_eaten += effects.food_eaten;
        self.stats.puzzle_reward += effects.reward;
        for event in &effects.events {
            event.tally(&mut self.stats.puzzle);
        }
        if effects.on_water {
            self.stats.water_ticks += 1;
            self.stats.water_penalty += effects.water_penalty;
        }

        self.apply_energy(effects.energy_gained, effects.energy_spent, config.energy_max);
    }

    /// Gains are capped at `energy_max` before costs are paid. Reaching zero
    /// kills the agent with energy clamped to exactly 0.
    fn apply_energy(&mut self, gained: f64, spent: f64, energy_max: f64) {
        self.energy = (self.energy + gained).min(energy_max) - spent;
        if self.energy <= 0.0 {
            self.energy = 0.0;
            self.state = AgentState::Dead;
        }
    }
}
