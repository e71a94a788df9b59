//! Perception and action interpretation.
//!
//! Perception layout (`PERCEPTION_SIZE` values):
//!
//! | idx    | signal                                   |
//! |--------|------------------------------------------|
//! | 0      | energy / energy_max                      |
//! | 1, 2   | nearest food: distance, bearing          |
//! | 3, 4   | nearest blocking tile                    |
//! | 5, 6   | nearest uncut tree                       |
//! | 7, 8   | nearest water                            |
//! | 9, 10  | pond centre                              |
//! | 11, 12 | current puzzle target for this agent     |
//! | 13..16 | holds red key, gold key, axe; on water   |
//!
//! Distances are normalized by the vision range and capped at 1. Bearings are
//! the signed angle from the heading, divided by π. Anything out of range
//! reads as distance 1, bearing 0.

use crate::agent::Agent;
use crate::world::{Tile, World};
use shared::{AgentConfig, ACTION_SIZE, PERCEPTION_SIZE};
use std::f64::consts::{PI, TAU};

/// Discrete movement chosen each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Advance,
    TurnLeft,
    TurnRight,
}

/// One tick's decision. Eat and hit are independent triggers and may both
/// fire in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub movement: Move,
    pub eat: bool,
    pub hit: bool,
}

impl Action {
    /// Interpret raw brain outputs. The strongest of outputs 0..3 picks the
    /// movement, ties going to the lowest index.
    pub fn from_outputs(outputs: &[f64], config: &AgentConfig) -> Self {
        assert!(
            outputs.len() >= ACTION_SIZE,
            "brain produced {} outputs, need {}",
            outputs.len(),
            ACTION_SIZE
        );

        let mut strongest = 0;
        for i in 1..3 {
            if outputs[i] > outputs[strongest] {
                strongest = i;
            }
        }
        let movement = match strongest {
            0 => Move::Advance,
            1 => Move::TurnLeft,
            _ => Move::TurnRight,
        };

        Self {
            movement,
            eat: outputs[3] > config.eat_threshold,
            hit: outputs[4] > config.hit_threshold,
        }
    }
}

/// Closest point of interest seen so far in a scan
#[derive(Debug, Clone, Copy)]
struct Sighting {
    distance: f64,
    x: f64,
    y: f64,
}

#[derive(Debug, Default)]
struct Nearest(Option<Sighting>);

impl Nearest {
    fn offer(&mut self, distance: f64, x: f64, y: f64) {
        if self.0.map_or(true, |s| distance < s.distance) {
            self.0 = Some(Sighting { distance, x, y });
        }
    }
}

/// Build the perception vector for one agent
pub fn perceive(agent: &Agent, world: &World, config: &AgentConfig) -> [f64; PERCEPTION_SIZE] {
    let range = config.vision_range;
    let mut food = Nearest::default();
    let mut obstacle = Nearest::default();
    let mut tree = Nearest::default();
    let mut water = Nearest::default();

    let min_x = (agent.x - range).floor().max(0.0) as usize;
    let min_y = (agent.y - range).floor().max(0.0) as usize;
    let max_x = ((agent.x + range).ceil().max(0.0) as usize).min(world.width - 1);
    let max_y = ((agent.y + range).ceil().max(0.0) as usize).min(world.height - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let Some(tile) = world.get_tile(x, y) else {
                continue;
            };
            let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
            let distance = (cx - agent.x).hypot(cy - agent.y);
            if distance > range {
                continue;
            }

            if tile.food() > 0 {
                food.offer(distance, cx, cy);
            }
            if tile.is_blocking() {
                obstacle.offer(distance, cx, cy);
            }
            if matches!(tile, Tile::Tree { .. }) {
                tree.offer(distance, cx, cy);
            }
            if matches!(tile, Tile::Water) {
                water.offer(distance, cx, cy);
            }
        }
    }

    let mut pond = Nearest::default();
    if let Some(p) = world.pond() {
        let distance = (p.x - agent.x).hypot(p.y - agent.y);
        if distance <= range {
            pond.offer(distance, p.x, p.y);
        }
    }

    let mut target = Nearest::default();
    if let Some((tx, ty)) = world.puzzle_target(&agent.holdings) {
        let (cx, cy) = (tx as f64 + 0.5, ty as f64 + 0.5);
        let distance = (cx - agent.x).hypot(cy - agent.y);
        if distance <= range {
            target.offer(distance, cx, cy);
        }
    }

    let mut perception = [0.0; PERCEPTION_SIZE];
    perception[0] = agent.energy() / config.energy_max;
    for (slot, nearest) in [food, obstacle, tree, water, pond, target].iter().enumerate() {
        let (distance, bearing) = encode(agent, nearest, range);
        perception[1 + slot * 2] = distance;
        perception[2 + slot * 2] = bearing;
    }
    perception[13] = flag(agent.holdings.red_key);
    perception[14] = flag(agent.holdings.gold_key);
    perception[15] = flag(agent.holdings.axe);
    perception[16] = flag(world.is_water_at(agent.x, agent.y));
    perception
}

fn encode(agent: &Agent, nearest: &Nearest, range: f64) -> (f64, f64) {
    match nearest.0 {
        None => (1.0, 0.0),
        Some(s) => {
            let distance = (s.distance / range).min(1.0);
            if s.distance < f64::EPSILON {
                return (distance, 0.0);
            }
            let angle = (s.y - agent.y).atan2(s.x - agent.x);
            (distance, wrap_signed_angle(angle - agent.heading) / PI)
        }
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Wrap an angle into `(-π, π]`
pub(crate) fn wrap_signed_angle(angle: f64) -> f64 {
    if angle.is_nan() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Wrap an angle into `[0, 2π)`
pub(crate) fn wrap_unsigned_angle(angle: f64) -> f64 {
    if angle.is_nan() {
        return 0.0;
    }
    angle.rem_euclid(TAU)
}
