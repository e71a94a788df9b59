use shared::Genome;

/// Fixed-topology feed-forward network driven by a genome.
///
/// Every layer is affine followed by `tanh`, so all outputs lie in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Brain {
    genome: Genome,
}

impl Brain {
    pub fn new(genome: Genome) -> Self {
        Self { genome }
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Forward pass. Pure: the same perception always yields the same outputs.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` does not match the network input size.
    pub fn decide(&self, inputs: &[f64]) -> Vec<f64> {
        assert_eq!(
            inputs.len(),
            self.genome.input_size(),
            "perception length does not match network input size"
        );

        let mut activations = inputs.to_vec();
        for layer in &self.genome.layers {
            activations = (0..layer.outputs)
                .map(|o| {
                    let row = &layer.weights[o * layer.inputs..(o + 1) * layer.inputs];
                    let sum: f64 = row.iter().zip(&activations).map(|(w, x)| w * x).sum();
                    (sum + layer.biases[o]).tanh()
                })
                .collect();
        }
        activations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use shared::Layer;

    #[test]
    fn test_outputs_bounded_and_sized() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let brain = Brain::new(Genome::random(&[4, 6, 3], 3.0, &mut rng));

        let outputs = brain.decide(&[1.0, -1.0, 0.5, 20.0]);
        assert_eq!(outputs.len(), 3);
        assert!(outputs.iter().all(|o| (-1.0..=1.0).contains(o)));
    }

    #[test]
    fn test_known_weights() {
        let genome = Genome {
            layers: vec![Layer {
                inputs: 2,
                outputs: 2,
                weights: vec![1.0, 0.0, 0.0, -1.0],
                biases: vec![0.0, 0.5],
            }],
        };
        let brain = Brain::new(genome);

        let outputs = brain.decide(&[0.3, 0.5]);
        assert!((outputs[0] - 0.3f64.tanh()).abs() < 1e-12);
        assert!((outputs[1] - 0.0f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_decide_is_pure() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let brain = Brain::new(Genome::random(&[3, 2], 1.0, &mut rng));

        assert_eq!(brain.decide(&[0.1, 0.2, 0.3]), brain.decide(&[0.1, 0.2, 0.3]));
    }

    #[test]
    #[should_panic(expected = "input size")]
    fn test_wrong_input_length_panics() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let brain = Brain::new(Genome::random(&[3, 2], 1.0, &mut rng));
        brain.decide(&[0.0; 2]);
    }
}
