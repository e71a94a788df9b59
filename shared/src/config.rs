//! Engine configuration.
//!
//! Built once by an external loader and passed by reference into every
//! component. Every section carries `#[serde(default)]` so a partial JSON
//! document only needs to name the values it overrides.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of values in a perception vector. The network input layer must
/// match it exactly.
pub const PERCEPTION_SIZE: usize = 17;

/// Number of brain outputs: advance, turn left, turn right, eat, hit.
pub const ACTION_SIZE: usize = 5;

/// Smallest map that still fits both fortresses side by side.
pub const MIN_WORLD_WIDTH: usize = 24;
pub const MIN_WORLD_HEIGHT: usize = 12;

/// Configuration errors are fatal: the engine refuses to start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population size must be at least 1")]
    EmptyPopulation,

    #[error("max_generations must be at least 1")]
    NoGenerations,

    #[error("base tick budget must be at least 1")]
    NoTicks,

    #[error("tick increment interval must be at least 1 generation")]
    ZeroIncrementInterval,

    #[error("world is {width}x{height}, minimum is {min_width}x{min_height}")]
    WorldTooSmall {
        width: usize,
        height: usize,
        min_width: usize,
        min_height: usize,
    },

    #[error("network input size is {actual}, perception vector has {expected} values")]
    InputSizeMismatch { expected: usize, actual: usize },

    #[error("network output size is {actual}, action vector has {expected} values")]
    OutputSizeMismatch { expected: usize, actual: usize },

    #[error("hidden layer {index} has zero neurons")]
    EmptyHiddenLayer { index: usize },

    #[error("elitism count {elitism} exceeds population size {population}")]
    ElitismTooLarge { elitism: usize, population: usize },

    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },

    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("initial energy {initial} exceeds energy_max {max}")]
    InitialEnergyAboveMax { initial: f64, max: f64 },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
}

/// What happens to a generation interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Partial statistics are thrown away, no record is produced.
    #[default]
    Discard,
    /// The partial generation is scored and recorded, but never bred from.
    Record,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the single random stream of the run
    pub seed: u64,
    pub population_size: usize,
    pub max_generations: u32,
    pub cancel_policy: CancelPolicy,
    pub ticks: TickSchedule,
    pub world: WorldConfig,
    pub agent: AgentConfig,
    pub network: NetworkConfig,
    pub genetic: GeneticConfig,
    pub puzzle: PuzzleConfig,
    pub fitness: FitnessConfig,
    pub metrics: MetricsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            population_size: 30,
            max_generations: 50,
            cancel_policy: CancelPolicy::default(),
            ticks: TickSchedule::default(),
            world: WorldConfig::default(),
            agent: AgentConfig::default(),
            network: NetworkConfig::default(),
            genetic: GeneticConfig::default(),
            puzzle: PuzzleConfig::default(),
            fitness: FitnessConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Per-generation tick budget, optionally growing every few generations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickSchedule {
    pub base_ticks: u32,
    pub adaptive: bool,
    /// Ticks added each time the schedule steps up
    pub increment: u32,
    /// Generations between step-ups
    pub increment_every: u32,
}

impl Default for TickSchedule {
    fn default() -> Self {
        Self {
            base_ticks: 600,
            adaptive: true,
            increment: 100,
            increment_every: 5,
        }
    }
}

impl TickSchedule {
    /// Tick budget for a 1-based generation index
    pub fn budget_for(&self, generation: u32) -> u32 {
        if !self.adaptive {
            return self.base_ticks;
        }
        let steps = generation.saturating_sub(1) / self.increment_every.max(1);
        self.base_ticks
            .saturating_add(self.increment.saturating_mul(steps))
    }
}

/// Map size, densities and terrain constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: usize,
    pub height: usize,
    /// Apples placed at generation start
    pub food_count: usize,
    /// Apple stock below which the world respawns apples
    pub food_regen_threshold: usize,
    /// Apples respawned per regeneration
    pub food_regen_amount: usize,
    /// Fraction of tiles that become regrowing plants
    pub plant_density: f64,
    pub plant_max_food: u32,
    /// Ticks for a plant to regrow one unit
    pub plant_regrowth_ticks: u32,
    pub wall_segments: usize,
    pub tree_clusters: usize,
    pub water_clusters: usize,
    /// Hits needed to fell a tree
    pub tree_hits: u32,
    /// Apples left behind by a felled tree
    pub tree_food_drop: u32,
    pub water_speed_multiplier: f64,
    pub water_energy_drain: f64,
    pub water_fitness_penalty: f64,
    pub pond_radius: f64,
    pub pond_energy_restore: f64,
    pub pond_relocate_interval: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 60,
            height: 40,
            food_count: 40,
            food_regen_threshold: 10,
            food_regen_amount: 5,
            plant_density: 0.01,
            plant_max_food: 5,
            plant_regrowth_ticks: 30,
            wall_segments: 6,
            tree_clusters: 5,
            water_clusters: 3,
            tree_hits: 3,
            tree_food_drop: 3,
            water_speed_multiplier: 0.5,
            water_energy_drain: 0.5,
            water_fitness_penalty: 0.05,
            pond_radius: 1.5,
            pond_energy_restore: 1.0,
            pond_relocate_interval: 200,
        }
    }
}

/// Body, energy and action-interpretation constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub energy_max: f64,
    pub initial_energy: f64,
    /// Energy spent every tick regardless of action
    pub base_cost: f64,
    pub move_cost: f64,
    pub turn_cost: f64,
    pub hit_cost: f64,
    /// Energy gained per food unit eaten
    pub food_energy: f64,
    /// Tiles moved per advance on open ground
    pub speed: f64,
    /// Radians turned per turn action
    pub turn_angle: f64,
    /// Vision range in tiles
    pub vision_range: f64,
    /// Brain output above which the agent eats
    pub eat_threshold: f64,
    /// Brain output above which the agent hits
    pub hit_threshold: f64,
    /// Minimum ticks between two effective hits by the same agent
    pub hit_cooldown_ticks: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            energy_max: 100.0,
            initial_energy: 100.0,
            base_cost: 0.1,
            move_cost: 0.05,
            turn_cost: 0.02,
            hit_cost: 0.5,
            food_energy: 30.0,
            speed: 0.5,
            turn_angle: std::f64::consts::FRAC_PI_4,
            vision_range: 8.0,
            eat_threshold: 0.5,
            hit_threshold: 0.5,
            hit_cooldown_ticks: 10,
        }
    }
}

/// Brain topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub input_size: usize,
    pub hidden_sizes: Vec<usize>,
    pub output_size: usize,
    /// Standard deviation of initial weights
    pub init_scale: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            input_size: PERCEPTION_SIZE,
            hidden_sizes: vec![12],
            output_size: ACTION_SIZE,
            init_scale: 0.5,
        }
    }
}

impl NetworkConfig {
    /// Layer sizes from input to output, e.g. `[17, 12, 5]`
    pub fn topology(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_sizes.len() + 2);
        sizes.push(self.input_size);
        sizes.extend(&self.hidden_sizes);
        sizes.push(self.output_size);
        sizes
    }
}

/// Genetic algorithm parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub mutation_rate: f64,
    pub mutation_magnitude: f64,
    pub crossover_rate: f64,
    pub elitism_count: usize,
    /// Top fraction of the ranking eligible as parents
    pub meeting_pool_fraction: f64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.1,
            mutation_magnitude: 0.2,
            crossover_rate: 0.8,
            elitism_count: 1,
            meeting_pool_fraction: 0.5,
        }
    }
}

/// Puzzle rewards and spawn schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleConfig {
    /// First generation in which the red key appears
    pub red_key_spawn_generation: u32,
    /// First generation in which the gold key appears
    pub gold_key_spawn_generation: u32,
    pub wood_door_hits: u32,
    pub iron_door_hits: u32,
    pub axe_reward: f64,
    pub tree_cut_reward: f64,
    pub red_key_reward: f64,
    pub gold_key_reward: f64,
    pub wood_door_reward: f64,
    pub iron_door_reward: f64,
    pub chest_reward: f64,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            red_key_spawn_generation: 1,
            gold_key_spawn_generation: 1,
            wood_door_hits: 3,
            iron_door_hits: 5,
            axe_reward: 2.0,
            tree_cut_reward: 10.0,
            red_key_reward: 15.0,
            gold_key_reward: 25.0,
            wood_door_reward: 20.0,
            iron_door_reward: 35.0,
            chest_reward: 100.0,
        }
    }
}

/// Weights and caps of the fitness terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    pub survival_per_tick: f64,
    pub survival_cap: f64,
    pub food_weight: f64,
    pub exploration_weight: f64,
    pub exploration_cap: f64,
    pub collision_penalty: f64,
    pub straightness_bonus: f64,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            survival_per_tick: 0.008,
            survival_cap: 15.0,
            food_weight: 5.0,
            exploration_weight: 1.5,
            exploration_cap: 6.0,
            collision_penalty: 0.05,
            straightness_bonus: 3.0,
        }
    }
}

/// What the metrics record carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MetricsConfig {
    /// Attach every genome to the per-generation metrics for checkpointing
    pub include_genomes: bool,
}

impl EngineConfig {
    /// Check every parameter the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.max_generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        if self.ticks.base_ticks == 0 {
            return Err(ConfigError::NoTicks);
        }
        if self.ticks.adaptive && self.ticks.increment_every == 0 {
            return Err(ConfigError::ZeroIncrementInterval);
        }
        if self.world.width < MIN_WORLD_WIDTH || self.world.height < MIN_WORLD_HEIGHT {
            return Err(ConfigError::WorldTooSmall {
                width: self.world.width,
                height: self.world.height,
                min_width: MIN_WORLD_WIDTH,
                min_height: MIN_WORLD_HEIGHT,
            });
        }

        self.validate_network()?;
        self.validate_genetic()?;

        unit_range("world.plant_density", self.world.plant_density)?;
        unit_range(
            "world.water_speed_multiplier",
            self.world.water_speed_multiplier,
        )?;
        for (name, value) in [
            ("world.water_energy_drain", self.world.water_energy_drain),
            ("world.water_fitness_penalty", self.world.water_fitness_penalty),
            ("world.pond_energy_restore", self.world.pond_energy_restore),
            ("world.pond_radius", self.world.pond_radius),
            ("agent.base_cost", self.agent.base_cost),
            ("agent.move_cost", self.agent.move_cost),
            ("agent.turn_cost", self.agent.turn_cost),
            ("agent.hit_cost", self.agent.hit_cost),
            ("agent.food_energy", self.agent.food_energy),
            ("agent.turn_angle", self.agent.turn_angle),
            ("network.init_scale", self.network.init_scale),
        ] {
            non_negative(name, value)?;
        }
        for (name, value) in [
            ("agent.energy_max", self.agent.energy_max),
            ("agent.initial_energy", self.agent.initial_energy),
            ("agent.speed", self.agent.speed),
            ("agent.vision_range", self.agent.vision_range),
        ] {
            positive(name, value)?;
        }
        if self.agent.initial_energy > self.agent.energy_max {
            return Err(ConfigError::InitialEnergyAboveMax {
                initial: self.agent.initial_energy,
                max: self.agent.energy_max,
            });
        }

        Ok(())
    }

    fn validate_network(&self) -> Result<(), ConfigError> {
        if self.network.input_size != PERCEPTION_SIZE {
            return Err(ConfigError::InputSizeMismatch {
                expected: PERCEPTION_SIZE,
                actual: self.network.input_size,
            });
        }
        if self.network.output_size != ACTION_SIZE {
            return Err(ConfigError::OutputSizeMismatch {
                expected: ACTION_SIZE,
                actual: self.network.output_size,
            });
        }
        if let Some(index) = self.network.hidden_sizes.iter().position(|&n| n == 0) {
            return Err(ConfigError::EmptyHiddenLayer { index });
        }
        Ok(())
    }

    fn validate_genetic(&self) -> Result<(), ConfigError> {
        let genetic = &self.genetic;
        unit_range("genetic.mutation_rate", genetic.mutation_rate)?;
        unit_range("genetic.crossover_rate", genetic.crossover_rate)?;
        unit_range("genetic.meeting_pool_fraction", genetic.meeting_pool_fraction)?;
        non_negative("genetic.mutation_magnitude", genetic.mutation_magnitude)?;

        if genetic.elitism_count > self.population_size {
            return Err(ConfigError::ElitismTooLarge {
                elitism: genetic.elitism_count,
                population: self.population_size,
            });
        }
        Ok(())
    }
}

fn unit_range(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_empty_population_rejected() {
        let config = EngineConfig {
            population_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyPopulation));
    }

    #[test]
    fn test_mismatched_network_rejected() {
        let mut config = EngineConfig::default();
        config.network.input_size = 8;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InputSizeMismatch {
                expected: PERCEPTION_SIZE,
                actual: 8
            })
        );

        let mut config = EngineConfig::default();
        config.network.hidden_sizes = vec![10, 0];
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyHiddenLayer { index: 1 })
        );
    }

    #[test]
    fn test_rates_outside_unit_range_rejected() {
        let mut config = EngineConfig::default();
        config.genetic.crossover_rate = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange {
                name: "genetic.crossover_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_elitism_larger_than_population_rejected() {
        let mut config = EngineConfig {
            population_size: 3,
            ..Default::default()
        };
        config.genetic.elitism_count = 4;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ElitismTooLarge { .. })
        ));
    }

    #[test]
    fn test_small_world_rejected() {
        let mut config = EngineConfig::default();
        config.world.width = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WorldTooSmall { .. })
        ));
    }

    #[test]
    fn test_adaptive_tick_budget() {
        let schedule = TickSchedule {
            base_ticks: 100,
            adaptive: true,
            increment: 50,
            increment_every: 3,
        };
        assert_eq!(schedule.budget_for(1), 100);
        assert_eq!(schedule.budget_for(3), 100);
        assert_eq!(schedule.budget_for(4), 150);
        assert_eq!(schedule.budget_for(7), 200);

        let fixed = TickSchedule {
            adaptive: false,
            ..schedule
        };
        assert_eq!(fixed.budget_for(7), 100);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "seed": 7, "genetic": { "elitism_count": 2 } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.genetic.elitism_count, 2);
        assert_eq!(config.genetic.crossover_rate, 0.8);
        assert_eq!(config.population_size, 30);
        assert_eq!(config.cancel_policy, CancelPolicy::Discard);
    }
}
