//! Collaborators the simulation drives but does not own: movement, animation and audio.

use std::collections::HashMap;
use std::time::Duration;

use dungeon_shared::{AnimationCue, AudioCue};
use log::{debug, trace};

/// Moves monster bodies. Pathfinding, if any, lives behind this trait.
pub trait MovementDriver: Send {
    /// Register a body at `position` moving at `speed` units per second
    fn place(&mut self, monster: u64, position: [f32; 3], speed: f32);
    fn remove(&mut self, monster: u64);
    fn position(&self, monster: u64) -> Option<[f32; 3]>;

    fn move_toward(&mut self, monster: u64, target: [f32; 3]);
    fn stop(&mut self, monster: u64);
    fn face(&mut self, monster: u64, target: [f32; 3]);
    fn set_collision(&mut self, monster: u64, enabled: bool);

    /// Advance all bodies by `delta`
    fn step(&mut self, delta: Duration);
}

pub trait AnimationSink: Send {
    fn trigger(&mut self, monster: u64, cue: AnimationCue);
}

pub trait AudioSink: Send {
    fn play(&mut self, monster: u64, cue: AudioCue);
}

#[derive(Debug, Clone)]
struct Body {
    position: [f32; 3],
    speed: f32,
    destination: Option<[f32; 3]>,
    rotation: f32,
    collision: bool,
}

/// Straight-line mover on the XZ plane
#[derive(Debug, Default)]
pub struct KinematicDriver {
    bodies: HashMap<u64, Body>,
}

/// Stop moving once this close to the destination
const ARRIVE_DISTANCE: f32 = 0.1;

impl KinematicDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rotation(&self, monster: u64) -> Option<f32> {
        self.bodies.get(&monster).map(|body| body.rotation)
    }

    pub fn has_collision(&self, monster: u64) -> Option<bool> {
        self.bodies.get(&monster).map(|body| body.collision)
    }

    pub fn is_moving(&self, monster: u64) -> bool {
        self.bodies
            .get(&monster)
            .is_some_and(|body| body.destination.is_some())
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl MovementDriver for KinematicDriver {
    fn place(&mut self, monster: u64, position: [f32; 3], speed: f32) {
        self.bodies.insert(
            monster,
            Body {
                position,
                speed,
                destination: None,
                rotation: 0.0,
                collision: true,
            },
        );
    }

    fn remove(&mut self, monster: u64) {
        self.bodies.remove(&monster);
    }

    fn position(&self, monster: u64) -> Option<[f32; 3]> {
        self.bodies.get(&monster).map(|body| body.position)
    }

    fn move_toward(&mut self, monster: u64, target: [f32; 3]) {
        if let Some(body) = self.bodies.get_mut(&monster) {
            body.destination = Some(target);
        }
    }

    fn stop(&mut self, monster: u64) {
        if let Some(body) = self.bodies.get_mut(&monster) {
            body.destination = None;
        }
    }

    fn face(&mut self, monster: u64, target: [f32; 3]) {
        if let Some(body) = self.bodies.get_mut(&monster) {
            let dx = target[0] - body.position[0];
            let dz = target[2] - body.position[2];
            if dx != 0.0 || dz != 0.0 {
                body.rotation = dz.atan2(dx);
            }
        }
    }

    fn set_collision(&mut self, monster: u64, enabled: bool) {
        if let Some(body) = self.bodies.get_mut(&monster) {
            body.collision = enabled;
        }
    }

    fn step(&mut self, delta: Duration) {
        let delta = delta.as_secs_f32();
        for body in self.bodies.values_mut() {
            let Some(target) = body.destination else {
                continue;
            };

            let dx = target[0] - body.position[0];
            let dz = target[2] - body.position[2];
            let dist = (dx * dx + dz * dz).sqrt();

            if dist > ARRIVE_DISTANCE {
                let move_dist = body.speed * delta;
                let ratio = (move_dist / dist).min(1.0);

                body.position[0] += dx * ratio;
                body.position[2] += dz * ratio;
                body.rotation = dz.atan2(dx);
            } else {
                body.destination = None;
            }
        }
    }
}

/// Cue sink that only logs, for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCues;

impl AnimationSink for LogCues {
    fn trigger(&mut self, monster: u64, cue: AnimationCue) {
        trace!("monster {} animation {:?}", monster, cue);
    }
}

impl AudioSink for LogCues {
    fn play(&mut self, monster: u64, cue: AudioCue) {
        debug!("monster {} audio {:?}", monster, cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moves_at_speed_on_xz() {
        let mut driver = KinematicDriver::new();
        driver.place(1, [0.0, 3.0, 0.0], 2.0);
        driver.move_toward(1, [10.0, 0.0, 0.0]);

        driver.step(Duration::from_millis(500));
        let position = driver.position(1).unwrap();
        assert!((position[0] - 1.0).abs() < 1e-4);
        assert_eq!(position[1], 3.0);
        assert_eq!(position[2], 0.0);
    }

    #[test]
    fn test_does_not_overshoot() {
        let mut driver = KinematicDriver::new();
        driver.place(1, [0.0, 0.0, 0.0], 100.0);
        driver.move_toward(1, [3.0, 0.0, 4.0]);
        driver.step(Duration::from_secs(1));
        let position = driver.position(1).unwrap();
        assert!((position[0] - 3.0).abs() < 1e-4);
        assert!((position[2] - 4.0).abs() < 1e-4);

        driver.step(Duration::from_secs(1));
        assert!(!driver.is_moving(1));
    }

    #[test]
    fn test_stop_and_collision() {
        let mut driver = KinematicDriver::new();
        driver.place(7, [0.0, 0.0, 0.0], 1.0);
        driver.move_toward(7, [5.0, 0.0, 0.0]);
        driver.stop(7);
        driver.step(Duration::from_secs(1));
        assert_eq!(driver.position(7), Some([0.0, 0.0, 0.0]));

        assert_eq!(driver.has_collision(7), Some(true));
        driver.set_collision(7, false);
        assert_eq!(driver.has_collision(7), Some(false));

        driver.remove(7);
        assert_eq!(driver.position(7), None);
        assert!(driver.is_empty());
    }

    #[test]
    fn test_face_target() {
        let mut driver = KinematicDriver::new();
        driver.place(1, [0.0, 0.0, 0.0], 1.0);
        driver.face(1, [0.0, 0.0, 2.0]);
        let rotation = driver.rotation(1).unwrap();
        assert!((rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }
}
