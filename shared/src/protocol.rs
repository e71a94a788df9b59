use crate::Genome;
use serde::{Deserialize, Serialize};

/// Statistics an agent accumulates over one generation.
///
/// Fitness is computed from this record alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    /// Ticks spent alive
    pub age: u32,
    /// Path length actually walked, in tiles
    pub distance_travelled: f64,
    /// Straight-line distance from spawn point to final position
    pub net_displacement: f64,
    /// Number of successful advances
    pub moves: u32,
    /// Food units eaten
    pub food_eaten: u32,
    /// Sum of one-time puzzle rewards (keys, doors, trees, chest)
    pub puzzle_reward: f64,
    /// Advances cancelled by a blocking tile or the map edge
    pub collisions: u32,
    pub water_ticks: u32,
    /// Fitness lost to water, accumulated every tick spent on water
    pub water_penalty: f64,
    #[serde(default)]
    pub puzzle: PuzzleProgress,
}

/// Puzzle milestones reached, one count per event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleProgress {
    pub axes_collected: u32,
    pub trees_cut: u32,
    pub red_keys_collected: u32,
    pub gold_keys_collected: u32,
    /// Wood and iron doors together
    pub doors_opened: u32,
    pub chests_opened: u32,
}

impl PuzzleProgress {
    pub fn merge(&mut self, other: &PuzzleProgress) {
        self.axes_collected += other.axes_collected;
        self.trees_cut += other.trees_cut;
        self.red_keys_collected += other.red_keys_collected;
        self.gold_keys_collected += other.gold_keys_collected;
        self.doors_opened += other.doors_opened;
        self.chests_opened += other.chests_opened;
    }
}

/// One agent's line in a generation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Index of the agent in its generation's population
    pub index: usize,
    pub fitness: f64,
    pub alive: bool,
    pub stats: AgentStats,
}

/// Fitness-ranked snapshot of a finished generation.
///
/// `ranking` is ordered by descending fitness, ties broken by ascending
/// population index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: u32,
    pub ticks: u32,
    pub win: bool,
    /// The generation was interrupted before its tick budget ran out
    pub cancelled: bool,
    pub ranking: Vec<AgentRecord>,
}

impl GenerationRecord {
    /// Rank agent records by descending fitness, ties by index
    pub fn new(
        generation: u32,
        ticks: u32,
        win: bool,
        cancelled: bool,
        mut records: Vec<AgentRecord>,
    ) -> Self {
        records.sort_by(|a, b| b.fitness.total_cmp(&a.fitness).then(a.index.cmp(&b.index)));
        Self {
            generation,
            ticks,
            win,
            cancelled,
            ranking: records,
        }
    }

    /// Population indices from best to worst
    pub fn ranked_indices(&self) -> Vec<usize> {
        self.ranking.iter().map(|r| r.index).collect()
    }

    pub fn best(&self) -> Option<&AgentRecord> {
        self.ranking.first()
    }

    pub fn survivors(&self) -> usize {
        self.ranking.iter().filter(|r| r.alive).count()
    }
}

/// Fitness distribution of one generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessSummary {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl FitnessSummary {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Some(Self {
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            mean,
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_dev: variance.sqrt(),
        })
    }
}

/// Per-generation aggregate handed to analytics and persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetrics {
    pub generation: u32,
    pub ticks: u32,
    pub fitness: FitnessSummary,
    pub survivors: usize,
    pub population: usize,
    pub total_food: u32,
    /// Most food eaten by a single agent
    pub max_food: u32,
    pub mean_age: f64,
    pub total_distance: f64,
    pub total_puzzle_reward: f64,
    /// Milestones summed over the population
    pub puzzle: PuzzleProgress,
    pub win: bool,
    /// Mean distance of the genomes to their centroid
    pub genome_diversity: f64,
    /// Genomes of the scored population, when checkpointing is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genomes: Option<Vec<Genome>>,
}

impl GenerationMetrics {
    /// Summarize a record. `genomes` are the genomes that produced it,
    /// indexed by population index.
    pub fn from_record(record: &GenerationRecord, genomes: &[Genome], include_genomes: bool) -> Self {
        let fitness = FitnessSummary::from_values(record.ranking.iter().map(|r| r.fitness))
            .unwrap_or(FitnessSummary {
                min: 0.0,
                mean: 0.0,
                max: 0.0,
                std_dev: 0.0,
            });
        let population = record.ranking.len();
        let mean_age = if population == 0 {
            0.0
        } else {
            record.ranking.iter().map(|r| r.stats.age as f64).sum::<f64>() / population as f64
        };
        let mut puzzle = PuzzleProgress::default();
        for r in &record.ranking {
            puzzle.merge(&r.stats.puzzle);
        }

        Self {
            generation: record.generation,
            ticks: record.ticks,
            fitness,
            survivors: record.survivors(),
            population,
            total_food: record.ranking.iter().map(|r| r.stats.food_eaten).sum(),
            max_food: record
                .ranking
                .iter()
                .map(|r| r.stats.food_eaten)
                .max()
                .unwrap_or(0),
            mean_age,
            total_distance: record
                .ranking
                .iter()
                .map(|r| r.stats.distance_travelled)
                .sum(),
            total_puzzle_reward: record.ranking.iter().map(|r| r.stats.puzzle_reward).sum(),
            puzzle,
            win: record.win,
            genome_diversity: genome_diversity(genomes),
            genomes: include_genomes.then(|| genomes.to_vec()),
        }
    }
}

/// Mean Euclidean distance of each genome to the population centroid
pub fn genome_diversity(genomes: &[Genome]) -> f64 {
    let Some(first) = genomes.first() else {
        return 0.0;
    };

    let mut centroid = vec![0.0; first.len()];
    for genome in genomes {
        for (c, v) in centroid.iter_mut().zip(genome.values()) {
            *c += v;
        }
    }
    let n = genomes.len() as f64;
    for c in &mut centroid {
        *c /= n;
    }

    genomes
        .iter()
        .map(|g| {
            g.values()
                .zip(&centroid)
                .map(|(v, c)| (v - c) * (v - c))
                .sum::<f64>()
                .sqrt()
        })
        .sum::<f64>()
        / n
}

/// Whether the run should continue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    /// The chest was opened
    pub win: bool,
    /// Generations fully simulated
    pub generations: u32,
    pub cancelled: bool,
}

/// One line of the metrics log written by drivers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsLine {
    pub run_id: String,
    pub format_version: u32,
    pub metrics: GenerationMetrics,
}

impl MetricsLine {
    pub fn new(run_id: impl Into<String>, metrics: GenerationMetrics) -> Self {
        Self {
            run_id: run_id.into(),
            format_version: crate::RECORD_FORMAT_VERSION,
            metrics,
        }
    }

    /// Serialize as a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn record(index: usize, fitness: f64, alive: bool) -> AgentRecord {
        AgentRecord {
            index,
            fitness,
            alive,
            stats: AgentStats {
                age: 10 * (index as u32 + 1),
                food_eaten: index as u32,
                distance_travelled: 1.5,
                puzzle: PuzzleProgress {
                    trees_cut: 1,
                    red_keys_collected: (index == 2) as u32,
                    doors_opened: (index == 2) as u32,
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_ranking_descending_with_index_ties() {
        let rec = GenerationRecord::new(
            1,
            100,
            false,
            false,
            vec![
                record(0, 10.0, true),
                record(1, 100.0, false),
                record(2, 10.0, true),
                record(3, 10.0, false),
            ],
        );

        assert_eq!(rec.ranked_indices(), vec![1, 0, 2, 3]);
        assert_eq!(rec.best().map(|r| r.index), Some(1));
        assert_eq!(rec.survivors(), 2);
    }

    #[test]
    fn test_fitness_summary() {
        let summary = FitnessSummary::from_values([1.0, 2.0, 6.0]).unwrap();
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.mean, 3.0);
        assert_eq!(summary.max, 6.0);
        assert!((summary.std_dev - (14.0f64 / 3.0).sqrt()).abs() < 1e-12);

        assert!(FitnessSummary::from_values(std::iter::empty()).is_none());
    }

    #[test]
    fn test_metrics_from_record() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let genomes: Vec<Genome> = (0..3).map(|_| Genome::random(&[2, 2], 1.0, &mut rng)).collect();
        let rec = GenerationRecord::new(
            4,
            50,
            false,
            false,
            vec![record(0, 1.0, true), record(1, 2.0, true), record(2, 3.0, false)],
        );

        let metrics = GenerationMetrics::from_record(&rec, &genomes, false);
        assert_eq!(metrics.generation, 4);
        assert_eq!(metrics.survivors, 2);
        assert_eq!(metrics.total_food, 3);
        assert_eq!(metrics.max_food, 2);
        assert_eq!(metrics.mean_age, 20.0);
        assert_eq!(metrics.total_distance, 4.5);
        assert_eq!(metrics.puzzle.trees_cut, 3);
        assert_eq!(metrics.puzzle.red_keys_collected, 1);
        assert_eq!(metrics.puzzle.doors_opened, 1);
        assert_eq!(metrics.puzzle.chests_opened, 0);
        assert!((metrics.fitness.std_dev - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(metrics.genome_diversity > 0.0);
        assert!(metrics.genomes.is_none());

        let with_genomes = GenerationMetrics::from_record(&rec, &genomes, true);
        assert_eq!(with_genomes.genomes.as_deref(), Some(genomes.as_slice()));
    }

    #[test]
    fn test_identical_genomes_have_zero_diversity() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let genome = Genome::random(&[3, 2], 1.0, &mut rng);
        let genomes = vec![genome.clone(), genome.clone(), genome];

        assert!(genome_diversity(&genomes).abs() < 1e-12);
        assert_eq!(genome_diversity(&[]), 0.0);
    }

    #[test]
    fn test_metrics_line_serialization() {
        let rec = GenerationRecord::new(1, 10, true, false, vec![record(0, 5.0, true)]);
        let metrics = GenerationMetrics::from_record(&rec, &[], false);
        let line = MetricsLine::new("run-1", metrics);

        let json = line.to_json_line().unwrap();
        assert!(!json.contains('\n'));
        let decoded: MetricsLine = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.run_id, "run-1");
        assert_eq!(decoded.format_version, crate::RECORD_FORMAT_VERSION);
        assert!(decoded.metrics.win);
    }
}
