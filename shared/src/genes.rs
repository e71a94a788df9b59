use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// One fully connected layer of a brain.
///
/// Weights are stored row-major, `outputs` rows of `inputs` columns, so the
/// weight feeding input `i` into output `o` lives at `o * inputs + i`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    pub inputs: usize,
    pub outputs: usize,
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl Layer {
    /// Create a layer with normally distributed weights and biases
    pub fn random<R: Rng + ?Sized>(inputs: usize, outputs: usize, scale: f64, rng: &mut R) -> Self {
        let weights = (0..inputs * outputs)
            .map(|_| sample_normal(rng) * scale)
            .collect();
        let biases = (0..outputs)
            .map(|_| sample_normal(rng) * scale * BIAS_SCALE)
            .collect();

        Self {
            inputs,
            outputs,
            weights,
            biases,
        }
    }

    /// Weight connecting input `input` to output `output`
    pub fn weight(&self, output: usize, input: usize) -> f64 {
        self.weights[output * self.inputs + input]
    }

    fn shape(&self) -> (usize, usize) {
        (self.inputs, self.outputs)
    }
}

/// Biases start smaller than weights.
const BIAS_SCALE: f64 = 0.2;

/// A genome is the full weight/bias set of a fixed-topology brain.
///
/// Genomes are plain data: reproduction copies them, it never shares them.
/// All genetic operators take the random source explicitly so a seeded run
/// replays exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genome {
    pub layers: Vec<Layer>,
}

impl Genome {
    /// Create a random genome for a topology such as `[17, 12, 5]`
    pub fn random<R: Rng + ?Sized>(topology: &[usize], scale: f64, rng: &mut R) -> Self {
        let layers = topology
            .windows(2)
            .map(|pair| Layer::random(pair[0], pair[1], scale, rng))
            .collect();

        Self { layers }
    }

    /// `(inputs, outputs)` per layer
    pub fn shape(&self) -> Vec<(usize, usize)> {
        self.layers.iter().map(Layer::shape).collect()
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.inputs).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.outputs).unwrap_or(0)
    }

    /// Total number of weights and biases
    pub fn len(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.biases.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every weight and bias in a fixed order
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.layers
            .iter()
            .flat_map(|l| l.weights.iter().chain(l.biases.iter()).copied())
    }

    /// Return a mutated copy of this genome.
    ///
    /// Each element independently receives `N(0, 1) * magnitude` with
    /// probability `rate`. The receiver is left untouched.
    pub fn mutated<R: Rng + ?Sized>(&self, rate: f64, magnitude: f64, rng: &mut R) -> Genome {
        let mut child = self.clone();
        for layer in &mut child.layers {
            for value in layer.weights.iter_mut().chain(layer.biases.iter_mut()) {
                if rng.gen::<f64>() < rate {
                    *value += sample_normal(rng) * magnitude;
                }
            }
        }
        child
    }

    /// Uniform crossover: every element comes from `self` or `other` with
    /// equal probability.
    ///
    /// # Panics
    ///
    /// Panics if the two genomes do not have the same shape.
    pub fn crossover<R: Rng + ?Sized>(&self, other: &Genome, rng: &mut R) -> Genome {
        assert_eq!(
            self.shape(),
            other.shape(),
            "crossover between genomes of different shape"
        );

        let layers = self
            .layers
            .iter()
            .zip(&other.layers)
            .map(|(a, b)| Layer {
                inputs: a.inputs,
                outputs: a.outputs,
                weights: pick_uniform(&a.weights, &b.weights, rng),
                biases: pick_uniform(&a.biases, &b.biases, rng),
            })
            .collect();

        Genome { layers }
    }

    /// Euclidean distance between two genomes of the same shape
    pub fn distance(&self, other: &Genome) -> f64 {
        assert_eq!(
            self.shape(),
            other.shape(),
            "distance between genomes of different shape"
        );

        self.values()
            .zip(other.values())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

fn pick_uniform<R: Rng + ?Sized>(a: &[f64], b: &[f64], rng: &mut R) -> Vec<f64> {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| if rng.gen_bool(0.5) { x } else { y })
        .collect()
}

fn sample_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}
