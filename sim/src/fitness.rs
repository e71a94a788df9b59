use shared::{AgentStats, FitnessConfig};

/// Score one agent's generation. Pure: depends only on the statistics and
/// the weights. Not floored, so penalties can push it below zero.
pub fn fitness(stats: &AgentStats, config: &FitnessConfig) -> f64 {
    let survival = (stats.age as f64 * config.survival_per_tick).min(config.survival_cap);
    let food = (stats.food_eaten as f64).sqrt() * config.food_weight;
    let exploration = (stats.distance_travelled.ln_1p() * config.exploration_weight)
        .min(config.exploration_cap);
    let collisions = stats.collisions as f64 * config.collision_penalty;
    let straightness = if stats.distance_travelled > 0.0 {
        (stats.net_displacement / stats.distance_travelled).clamp(0.0, 1.0)
    } else {
        0.0
    };

    survival + food + exploration - collisions + config.straightness_bonus * straightness
        + stats.puzzle_reward
        - stats.water_penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_idle_agent_scores_survival_only() {
        let config = FitnessConfig::default();
        let stats = AgentStats {
            age: 100,
            ..Default::default()
        };

        assert!((fitness(&stats, &config) - 100.0 * config.survival_per_tick).abs() < 1e-12);
    }

    #[test]
    fn test_caps_apply() {
        let config = FitnessConfig::default();
        let stats = AgentStats {
            age: 1_000_000,
            distance_travelled: 1e9,
            net_displacement: 1e9,
            ..Default::default()
        };

        let expected = config.survival_cap + config.exploration_cap + config.straightness_bonus;
        assert!((fitness(&stats, &config) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_water_penalty_is_uncapped() {
        let config = FitnessConfig::default();
        let stats = AgentStats {
            water_ticks: 10_000,
            water_penalty: 500.0,
            ..Default::default()
        };

        assert_eq!(fitness(&stats, &config), -500.0);
    }

    #[test]
    fn test_puzzle_reward_and_food() {
        let config = FitnessConfig::default();
        let stats = AgentStats {
            food_eaten: 4,
            puzzle_reward: 35.0,
            ..Default::default()
        };

        assert_eq!(fitness(&stats, &config), 2.0 * config.food_weight + 35.0);
    }

    proptest! {
        #[test]
        fn fitness_is_pure(
            age in 0u32..10_000,
            distance in 0.0f64..500.0,
            net in 0.0f64..500.0,
            food in 0u32..100,
            collisions in 0u32..1000,
            reward in 0.0f64..300.0,
            water in 0.0f64..50.0,
        ) {
            let config = FitnessConfig::default();
            let stats = AgentStats {
                age,
                distance_travelled: distance,
                net_displacement: net,
                food_eaten: food,
                collisions,
                puzzle_reward: reward,
                water_penalty: water,
                ..Default::default()
            };

            let first = fitness(&stats, &config);
            prop_assert!(first.is_finite());
            prop_assert_eq!(first, fitness(&stats.clone(), &config));
        }
    }
}
