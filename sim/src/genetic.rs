use rand::Rng;
use shared::{GenerationRecord, GeneticConfig, Genome};

/// Size of the meeting pool for a ranking of `ranked` agents
pub fn pool_size(ranked: usize, fraction: f64) -> usize {
    ((ranked as f64 * fraction).round() as usize).clamp(1, ranked.max(1))
}

/// Breed the next population from a ranked generation.
///
/// The top `elitism_count` genomes are copied unchanged. Every other slot is
/// filled from the meeting pool: two parents are drawn with replacement,
/// crossed over with probability `crossover_rate` (otherwise one of them is
/// cloned) and the child is always mutated.
///
/// `genomes` is indexed by population index, matching the record.
///
/// # Panics
///
/// Panics if the record is empty or refers to a missing genome.
pub fn evolve<R: Rng + ?Sized>(
    record: &GenerationRecord,
    genomes: &[Genome],
    config: &GeneticConfig,
    population_size: usize,
    rng: &mut R,
) -> Vec<Genome> {
    let ranked = record.ranked_indices();
    assert!(!ranked.is_empty(), "cannot breed from an empty generation");

    let mut next = Vec::with_capacity(population_size);
    next.extend(
        ranked
            .iter()
            .take(config.elitism_count.min(population_size))
            .map(|&i| genomes[i].clone()),
    );

    let pool = &ranked[..pool_size(ranked.len(), config.meeting_pool_fraction)];
    while next.len() < population_size {
        let a = &genomes[pool[rng.gen_range(0..pool.len())]];
        let b = &genomes[pool[rng.gen_range(0..pool.len())]];

        let child = if rng.gen::<f64>() < config.crossover_rate {
            a.crossover(b, rng)
        } else if rng.gen_bool(0.5) {
            a.clone()
        } else {
            b.clone()
        };
        next.push(child.mutated(config.mutation_rate, config.mutation_magnitude, rng));
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use shared::{AgentRecord, AgentStats};

    fn record(fitness: &[f64]) -> GenerationRecord {
        let records = fitness
            .iter()
            .enumerate()
            .map(|(index, &fitness)| AgentRecord {
                index,
                fitness,
                alive: true,
                stats: AgentStats::default(),
            })
            .collect();
        GenerationRecord::new(1, 10, false, false, records)
    }

    fn genomes(n: usize, rng: &mut ChaCha8Rng) -> Vec<Genome> {
        (0..n).map(|_| Genome::random(&[3, 2], 1.0, rng)).collect()
    }

    #[test]
    fn test_pool_size() {
        assert_eq!(pool_size(4, 0.5), 2);
        assert_eq!(pool_size(10, 0.25), 3);
        assert_eq!(pool_size(10, 0.0), 1);
        assert_eq!(pool_size(3, 1.0), 3);
    }

    #[test]
    fn test_four_agent_elitism_and_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let parents = genomes(4, &mut rng);
        let rec = record(&[10.0, 100.0, 10.0, 10.0]);
        let config = GeneticConfig {
            mutation_rate: 0.0,
            mutation_magnitude: 0.5,
            crossover_rate: 0.0,
            elitism_count: 1,
            meeting_pool_fraction: 0.5,
        };

        let next = evolve(&rec, &parents, &config, 4, &mut rng);

        assert_eq!(next.len(), 4);
        assert_eq!(next[0], parents[1]);
        // Pool of two: the best agent and index 0, which wins the tie at 10
        for child in &next[1..] {
            assert!(*child == parents[1] || *child == parents[0]);
            assert_ne!(*child, parents[2]);
            assert_ne!(*child, parents[3]);
        }
    }

    #[test]
    fn test_population_size_preserved() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let parents = genomes(5, &mut rng);
        let rec = record(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let config = GeneticConfig::default();

        for size in [1, 5, 9] {
            let next = evolve(&rec, &parents, &config, size, &mut rng);
            assert_eq!(next.len(), size);
            assert!(next.iter().all(|g| g.shape() == parents[0].shape()));
        }
    }

    #[test]
    fn test_elites_are_copied_unchanged() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let parents = genomes(6, &mut rng);
        let rec = record(&[0.0, 6.0, 1.0, 5.0, 2.0, 4.0]);
        let config = GeneticConfig {
            mutation_rate: 1.0,
            elitism_count: 3,
            ..Default::default()
        };

        let next = evolve(&rec, &parents, &config, 6, &mut rng);

        assert_eq!(&next[..3], &[parents[1].clone(), parents[3].clone(), parents[5].clone()]);
        for child in &next[3..] {
            assert!(!parents.contains(child));
        }
    }

    #[test]
    fn test_same_seed_same_offspring() {
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let parents = genomes(5, &mut rng);
        let rec = record(&[3.0, 1.0, 4.0, 1.0, 5.0]);
        let config = GeneticConfig::default();

        let a = evolve(&rec, &parents, &config, 5, &mut ChaCha8Rng::seed_from_u64(99));
        let b = evolve(&rec, &parents, &config, 5, &mut ChaCha8Rng::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
