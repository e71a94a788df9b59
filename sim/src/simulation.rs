use crate::agent::Agent;
use crate::error::SimError;
use crate::fitness::fitness;
use crate::genetic::evolve;
use crate::sensors::{perceive, Action};
use crate::world::World;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shared::{
    AgentRecord, CancelPolicy, EngineConfig, GenerationMetrics, GenerationRecord, Genome,
    Termination,
};
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for `begin_generation`
    Initializing,
    Running,
    /// Ticks are over, waiting for `complete_generation`
    GenerationComplete,
    Finished,
}

/// Why a generation stopped ticking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    Continue,
    BudgetExhausted,
    Extinct,
    /// The chest was opened
    Win,
    Cancelled,
}

/// External stop signal, checked every tick and at generation boundaries
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Read-only view of the current tick for renderers
#[derive(Debug, Clone, Copy)]
pub struct RenderSnapshot<'a> {
    pub generation: u32,
    pub tick: u32,
    pub world: &'a World,
    pub agents: &'a [Agent],
}

/// Hooks for hosts that render or persist a run. The engine never depends on
/// what an observer does.
pub trait Observer {
    fn on_tick(&mut self, _snapshot: &RenderSnapshot<'_>) {}

    fn on_generation(&mut self, _metrics: &GenerationMetrics) {}
}

/// No-op observer
#[derive(Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// Scored generation and its summary
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub record: GenerationRecord,
    pub metrics: GenerationMetrics,
}

/// Result of a whole run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub termination: Termination,
    /// Best fitness seen over the run
    pub best_fitness: Option<f64>,
    pub best_genome: Option<Genome>,
}

pub struct Simulation {
    config: EngineConfig,
    rng: ChaCha8Rng,
    phase: Phase,
    /// 1-based index of the current generation
    generation: u32,
    genomes: Vec<Genome>,
    world: Option<World>,
    agents: Vec<Agent>,
    tick: u32,
    budget: u32,
    cancelled: bool,
    cancel: CancelToken,
    completed: u32,
    win: bool,
    best: Option<(f64, Genome)>,
}

impl Simulation {
    /// Validate the configuration and seed the first population
    pub fn new(config: EngineConfig) -> Result<Self, SimError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let topology = config.network.topology();
        let genomes = (0..config.population_size)
            .map(|_| Genome::random(&topology, config.network.init_scale, &mut rng))
            .collect();

        info!(
            seed = config.seed,
            population = config.population_size,
            ?topology,
            "simulation created"
        );

        Ok(Self {
            config,
            rng,
            phase: Phase::Initializing,
            generation: 1,
            genomes,
            world: None,
            agents: Vec::new(),
            tick: 0,
            budget: 0,
            cancelled: false,
            cancel: CancelToken::default(),
            completed: 0,
            win: false,
            best: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Ticks run so far in the current generation
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Genomes of the current population, by index
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Tick budget of a 1-based generation
    pub fn tick_budget(&self, generation: u32) -> u32 {
        self.config.ticks.budget_for(generation)
    }

    pub fn termination(&self) -> Termination {
        Termination {
            win: self.win,
            generations: self.completed,
            cancelled: self.cancelled,
        }
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), SimError> {
        match self.phase {
            Phase::Finished if expected != Phase::Finished => Err(SimError::Finished),
            actual if actual != expected => Err(SimError::WrongPhase { expected, actual }),
            _ => Ok(()),
        }
    }

    /// Build a fresh world and population for the current generation
    pub fn begin_generation(&mut self) -> Result<(), SimError> {
        self.expect_phase(Phase::Initializing)?;
        if self.cancel.is_cancelled() {
            self.finish_cancelled();
            return Err(SimError::Finished);
        }

        let world = World::generate(&self.config, self.generation, &mut self.rng);
        let energy = self.config.agent.initial_energy;
        self.agents = self
            .genomes
            .iter()
            .enumerate()
            .map(|(index, genome)| {
                let (x, y) = world.spawn_point(&mut self.rng);
                let heading = self.rng.gen_range(0.0..TAU);
                Agent::new(index, genome.clone(), x, y, heading, energy)
            })
            .collect();
        self.world = Some(world);
        self.tick = 0;
        self.budget = self.tick_budget(self.generation);
        self.phase = Phase::Running;

        info!(
            generation = self.generation,
            budget = self.budget,
            "generation started"
        );
        Ok(())
    }

    /// Advance one tick: every live agent perceives the same world state,
    /// then actions apply in index order, then the world steps.
    pub fn step_tick(&mut self) -> Result<TickStatus, SimError> {
        self.expect_phase(Phase::Running)?;
        let Some(world) = self.world.as_mut() else {
            return Err(SimError::WrongPhase {
                expected: Phase::Running,
                actual: Phase::Initializing,
            });
        };

        if self.cancel.is_cancelled() {
            return Ok(self.interrupt());
        }

        let agent_config = &self.config.agent;
        let snapshot: &World = world;
        let actions: Vec<Option<Action>> = self
            .agents
            .iter()
            .map(|agent| {
                agent.is_alive().then(|| {
                    let perception = perceive(agent, snapshot, agent_config);
                    Action::from_outputs(&agent.brain().decide(&perception), agent_config)
                })
            })
            .collect();

        for (agent, action) in self.agents.iter_mut().zip(&actions) {
            let Some(action) = action else {
                continue;
            };
            let effects = world.resolve_interaction(agent, action, self.tick);
            agent.absorb(&effects, agent_config);
            if !agent.is_alive() {
                debug!(agent = agent.index, tick = self.tick, "agent died");
            }
        }

        world.step(&mut self.rng);
        self.tick += 1;

        let status = if world.chest_open() {
            TickStatus::Win
        } else if self.agents.iter().all(|a| !a.is_alive()) {
            TickStatus::Extinct
        } else if self.tick >= self.budget {
            TickStatus::BudgetExhausted
        } else {
            TickStatus::Continue
        };

        match status {
            TickStatus::Continue => {}
            TickStatus::Win => {
                info!(generation = self.generation, tick = self.tick, "chest opened");
                self.phase = Phase::GenerationComplete;
            }
            TickStatus::Extinct => {
                info!(generation = self.generation, tick = self.tick, "population extinct");
                self.phase = Phase::GenerationComplete;
            }
            _ => self.phase = Phase::GenerationComplete,
        }
        Ok(status)
    }

    fn interrupt(&mut self) -> TickStatus {
        match self.config.cancel_policy {
            CancelPolicy::Discard => {
                warn!(
                    generation = self.generation,
                    tick = self.tick,
                    "cancelled, partial generation discarded"
                );
                self.finish_cancelled();
            }
            CancelPolicy::Record => {
                warn!(
                    generation = self.generation,
                    tick = self.tick,
                    "cancelled, partial generation will be recorded"
                );
                self.cancelled = true;
                self.phase = Phase::GenerationComplete;
            }
        }
        TickStatus::Cancelled
    }

    fn finish_cancelled(&mut self) {
        self.cancelled = true;
        self.world = None;
        self.agents.clear();
        self.phase = Phase::Finished;
    }

    /// Score the population, then breed the next one unless the run is over
    pub fn complete_generation(&mut self) -> Result<GenerationOutcome, SimError> {
        self.expect_phase(Phase::GenerationComplete)?;

        let win = self.world.as_ref().map_or(false, World::chest_open);
        let records = self
            .agents
            .iter()
            .map(|agent| AgentRecord {
                index: agent.index,
                fitness: fitness(agent.stats(), &self.config.fitness),
                alive: agent.is_alive(),
                stats: agent.stats().clone(),
            })
            .collect();
        let record = GenerationRecord::new(self.generation, self.tick, win, self.cancelled, records);
        let metrics = GenerationMetrics::from_record(
            &record,
            &self.genomes,
            self.config.metrics.include_genomes,
        );

        if let Some(best) = record.best() {
            if self.best.as_ref().map_or(true, |(f, _)| best.fitness > *f) {
                self.best = Some((best.fitness, self.genomes[best.index].clone()));
            }
        }

        info!(
            generation = self.generation,
            ticks = self.tick,
            best = metrics.fitness.max,
            mean = metrics.fitness.mean,
            survivors = metrics.survivors,
            "generation complete"
        );

        self.world = None;
        self.agents.clear();
        self.win = win;
        if self.cancelled {
            self.phase = Phase::Finished;
            return Ok(GenerationOutcome { record, metrics });
        }

        self.completed = self.generation;
        if win || self.generation >= self.config.max_generations {
            self.phase = Phase::Finished;
            info!(win, generations = self.completed, "run finished");
        } else {
            self.genomes = evolve(
                &record,
                &self.genomes,
                &self.config.genetic,
                self.config.population_size,
                &mut self.rng,
            );
            self.generation += 1;
            self.phase = Phase::Initializing;
        }

        Ok(GenerationOutcome { record, metrics })
    }

    /// Run one generation to completion, reporting to the observer. Returns
    /// `None` when cancellation discarded the generation.
    pub fn run_generation<O: Observer + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<Option<GenerationOutcome>, SimError> {
        if self.phase == Phase::Initializing {
            if self.cancel.is_cancelled() {
                self.finish_cancelled();
                return Ok(None);
            }
            self.begin_generation()?;
        }

        while self.phase == Phase::Running {
            let status = self.step_tick()?;
            if status == TickStatus::Cancelled && self.phase == Phase::Finished {
                return Ok(None);
            }
            if let Some(world) = &self.world {
                observer.on_tick(&RenderSnapshot {
                    generation: self.generation,
                    tick: self.tick,
                    world,
                    agents: &self.agents,
                });
            }
        }

        let outcome = self.complete_generation()?;
        observer.on_generation(&outcome.metrics);
        Ok(Some(outcome))
    }

    /// Run generations until the chest opens, the generation limit is hit or
    /// the run is cancelled
    pub fn run<O: Observer + ?Sized>(&mut self, observer: &mut O) -> Result<RunSummary, SimError> {
        while self.phase != Phase::Finished {
            self.run_generation(observer)?;
        }

        let (best_fitness, best_genome) = match &self.best {
            Some((f, g)) => (Some(*f), Some(g.clone())),
            None => (None, None),
        };
        Ok(RunSummary {
            termination: self.termination(),
            best_fitness,
            best_genome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ConfigError;

    fn small_config() -> EngineConfig {
        let mut config = EngineConfig {
            seed: 7,
            population_size: 6,
            max_generations: 3,
            ..Default::default()
        };
        config.world.width = 30;
        config.world.height = 20;
        config.ticks.base_ticks = 20;
        config.ticks.increment = 5;
        config.ticks.increment_every = 1;
        config
    }

    #[derive(Default)]
    struct Recorder {
        ticks: u32,
        generations: Vec<GenerationMetrics>,
    }

    impl Observer for Recorder {
        fn on_tick(&mut self, snapshot: &RenderSnapshot<'_>) {
            assert_eq!(snapshot.agents.len(), 6);
            self.ticks += 1;
        }

        fn on_generation(&mut self, metrics: &GenerationMetrics) {
            self.generations.push(metrics.clone());
        }
    }

    #[test]
    fn test_invalid_config_refused() {
        let config = EngineConfig {
            population_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(SimError::Config(ConfigError::EmptyPopulation))
        ));
    }

    #[test]
    fn test_phase_misuse_is_an_error() {
        let mut sim = Simulation::new(small_config()).unwrap();
        assert_eq!(sim.phase(), Phase::Initializing);

        assert_eq!(
            sim.step_tick(),
            Err(SimError::WrongPhase {
                expected: Phase::Running,
                actual: Phase::Initializing
            })
        );
        assert!(sim.complete_generation().is_err());

        sim.begin_generation().unwrap();
        assert_eq!(sim.phase(), Phase::Running);
        assert!(sim.begin_generation().is_err());
    }

    #[test]
    fn test_budget_exhaustion_advances_generation() {
        let mut config = small_config();
        config.agent.initial_energy = 100.0;
        let mut sim = Simulation::new(config).unwrap();
        assert_eq!(sim.tick_budget(1), 20);

        let outcome = sim.run_generation(&mut NullObserver).unwrap().unwrap();

        assert_eq!(outcome.record.ticks, 20);
        assert!(!outcome.record.win);
        assert_eq!(outcome.record.survivors(), 6);
        assert_eq!(sim.phase(), Phase::Initializing);
        assert_eq!(sim.generation(), 2);
        assert_eq!(sim.tick_budget(sim.generation()), 25);

        let outcome = sim.run_generation(&mut NullObserver).unwrap().unwrap();
        assert_eq!(outcome.record.ticks, 25);
    }

    #[test]
    fn test_population_size_constant() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let mut recorder = Recorder::default();

        let summary = sim.run(&mut recorder).unwrap();

        assert_eq!(summary.termination.generations, 3);
        assert!(!summary.termination.win);
        assert_eq!(recorder.generations.len(), 3);
        assert!(recorder.generations.iter().all(|m| m.population == 6));
        assert_eq!(recorder.ticks, 20 + 25 + 30);
        assert_eq!(sim.genomes().len(), 6);
        assert_eq!(sim.phase(), Phase::Finished);
        assert!(summary.best_genome.is_some());
        assert!(matches!(sim.run_generation(&mut NullObserver), Err(SimError::Finished)));
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let run = || {
            let mut sim = Simulation::new(small_config()).unwrap();
            let mut records = Vec::new();
            while sim.phase() != Phase::Finished {
                if let Some(outcome) = sim.run_generation(&mut NullObserver).unwrap() {
                    records.push(outcome.record);
                }
            }
            (records, sim.genomes().to_vec())
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_extinction_ends_generation_early() {
        let mut config = small_config();
        config.agent.initial_energy = 0.25;
        config.agent.base_cost = 0.1;
        config.world.pond_energy_restore = 0.0;
        config.world.food_count = 0;
        config.world.plant_density = 0.0;
        config.world.food_regen_threshold = 0;
        let mut sim = Simulation::new(config).unwrap();

        let outcome = sim.run_generation(&mut NullObserver).unwrap().unwrap();

        assert!(outcome.record.ticks < 20);
        assert_eq!(outcome.record.survivors(), 0);
        assert!(outcome.record.ranking.iter().all(|r| r.stats.age <= 3));
    }

    #[test]
    fn test_energy_never_rises_without_food_or_pond() {
        let mut config = small_config();
        config.agent.initial_energy = 3.0;
        config.world.pond_energy_restore = 0.0;
        config.world.food_count = 0;
        config.world.plant_density = 0.0;
        config.world.food_regen_threshold = 0;
        config.world.tree_food_drop = 0;
        let mut sim = Simulation::new(config).unwrap();
        sim.begin_generation().unwrap();

        let mut previous: Vec<f64> = sim.agents().iter().map(Agent::energy).collect();
        while sim.step_tick().unwrap() == TickStatus::Continue {
            for (agent, before) in sim.agents().iter().zip(&previous) {
                assert!(agent.energy() <= *before);
                assert!(agent.energy() >= 0.0);
                if !agent.is_alive() {
                    assert_eq!(agent.energy(), 0.0);
                }
            }
            previous = sim.agents().iter().map(Agent::energy).collect();
        }
    }

    #[test]
    fn test_cancel_discards_partial_generation() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.begin_generation().unwrap();
        sim.step_tick().unwrap();

        sim.cancel_token().cancel();
        assert_eq!(sim.step_tick(), Ok(TickStatus::Cancelled));
        assert_eq!(sim.phase(), Phase::Finished);
        assert_eq!(sim.termination().generations, 0);
        assert!(sim.termination().cancelled);
    }

    #[test]
    fn test_cancel_record_policy_scores_but_does_not_breed() {
        let mut config = small_config();
        config.cancel_policy = CancelPolicy::Record;
        let mut sim = Simulation::new(config).unwrap();
        let before = sim.genomes().to_vec();
        sim.begin_generation().unwrap();
        sim.step_tick().unwrap();
        sim.step_tick().unwrap();

        sim.cancel_token().cancel();
        let outcome = sim.run_generation(&mut NullObserver).unwrap().unwrap();

        assert!(outcome.record.cancelled);
        assert_eq!(outcome.record.ticks, 2);
        assert_eq!(sim.phase(), Phase::Finished);
        assert_eq!(sim.genomes(), before.as_slice());
        assert_eq!(sim.termination().generations, 0);
    }

    #[test]
    fn test_cancel_before_start_finishes() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.cancel_token().cancel();

        let summary = sim.run(&mut NullObserver).unwrap();
        assert!(summary.termination.cancelled);
        assert_eq!(summary.termination.generations, 0);
        assert!(summary.best_genome.is_none());
    }
}
