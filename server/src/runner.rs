//! Headless session: a scripted player fighting and looting in a fixed-rate world.

use std::collections::HashSet;
use std::time::Duration;

use dungeon_shared::{WorldEvent, LOOT_REACH};
use log::{debug, info};

use crate::world::{distance_xz, GameWorld};

const HEALTH_POTION: u32 = 1;
const POTION_HEAL: u32 = 50;
/// Drink below this fraction of max health
const POTION_THRESHOLD: f32 = 0.4;
const REVIVE_DELAY: Duration = Duration::from_secs(5);

/// Walks to the nearest loot or monster, loots or attacks it
#[derive(Debug, Default)]
pub struct ScriptedPlayer {
    dead_since: Option<Duration>,
    /// Containers that could not be fully claimed
    abandoned: HashSet<u64>,
}

impl ScriptedPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn act(&mut self, world: &mut GameWorld, now: Duration, delta: Duration) {
        let player = world.player();
        if !player.is_alive() {
            let since = *self.dead_since.get_or_insert(now);
            if now.saturating_sub(since) >= REVIVE_DELAY {
                world.revive_player();
                self.dead_since = None;
            }
            return;
        }

        let health = player.combat.health() as f32 / player.combat.max_health() as f32;
        if health < POTION_THRESHOLD && player.inventory.count(HEALTH_POTION) > 0 {
            world.player_use_item(HEALTH_POTION, POTION_HEAL);
        }

        if world.active_loot().is_some() {
            return;
        }

        let position = world.player().position;
        let step = world.player().combat.stats().move_speed * delta.as_secs_f32();

        let nearest_loot = world
            .loot_containers()
            .filter(|c| !self.abandoned.contains(&c.id))
            .map(|c| (c.id, c.position))
            .min_by(|a, b| distance_xz(position, a.1).total_cmp(&distance_xz(position, b.1)));
        if let Some((id, target)) = nearest_loot {
            if distance_xz(position, target) <= LOOT_REACH * 0.8 {
                if !world.begin_loot(id, now) {
                    self.abandoned.insert(id);
                }
            } else {
                world.set_player_position(step_toward(position, target, step));
            }
            return;
        }

        let nearest_monster = world
            .monsters()
            .filter(|m| m.is_alive())
            .filter_map(|m| world.monster_position(m.id).map(|p| (m.id, p)))
            .min_by(|a, b| distance_xz(position, a.1).total_cmp(&distance_xz(position, b.1)));
        if let Some((id, target)) = nearest_monster {
            let reach = world.player().combat.stats().attack_range * 0.8;
            if distance_xz(position, target) <= reach {
                world.player_attack(id, now);
            } else {
                world.set_player_position(step_toward(position, target, step));
            }
        }
    }

    /// Forget containers that no longer exist or were partially claimed
    pub fn observe(&mut self, events: &[WorldEvent]) {
        for event in events {
            match event {
                WorldEvent::LootClaimed {
                    loot,
                    complete: false,
                    ..
                } => {
                    debug!("Inventory full, leaving container {}", loot);
                    self.abandoned.insert(*loot);
                }
                WorldEvent::LootExpired { loot } => {
                    self.abandoned.remove(loot);
                }
                _ => {}
            }
        }
    }
}

fn step_toward(from: [f32; 3], to: [f32; 3], step: f32) -> [f32; 3] {
    let dist = distance_xz(from, to);
    if dist <= step || dist == 0.0 {
        return [to[0], from[1], to[2]];
    }
    let ratio = step / dist;
    [
        from[0] + (to[0] - from[0]) * ratio,
        from[1],
        from[2] + (to[2] - from[2]) * ratio,
    ]
}

/// Counters collected from world events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub spawns: u64,
    pub kills: u64,
    pub hits_taken: u64,
    pub player_deaths: u64,
    pub loot_dropped: u64,
    pub loot_claimed: u64,
    pub loot_expired: u64,
    pub gold: u64,
    pub spawns_skipped: u64,
}

impl RunStats {
    pub fn record(&mut self, events: &[WorldEvent]) {
        for event in events {
            match event {
                WorldEvent::MonsterSpawned { .. } => self.spawns += 1,
                WorldEvent::MonsterDied { .. } => self.kills += 1,
                WorldEvent::MonsterAttacked { .. } => self.hits_taken += 1,
                WorldEvent::PlayerDied => self.player_deaths += 1,
                WorldEvent::LootDropped { .. } => self.loot_dropped += 1,
                WorldEvent::LootClaimed { .. } => self.loot_claimed += 1,
                WorldEvent::LootExpired { .. } => self.loot_expired += 1,
                WorldEvent::GoldAwarded { amount, .. } => self.gold += *amount as u64,
                WorldEvent::SpawnSkipped { .. } => self.spawns_skipped += 1,
                WorldEvent::MonsterDamaged { .. } | WorldEvent::MonsterDespawned { .. } => {}
            }
        }
    }
}

/// Drives a world one fixed tick at a time
#[derive(Debug)]
pub struct Runner {
    world: GameWorld,
    player: ScriptedPlayer,
    stats: RunStats,
    tick_duration: Duration,
}

impl Runner {
    pub fn new(world: GameWorld, tick_rate: u32) -> Self {
        Self {
            world,
            player: ScriptedPlayer::new(),
            stats: RunStats::default(),
            tick_duration: Duration::from_secs(1) / tick_rate.max(1),
        }
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Simulated time of the last completed tick
    pub fn now(&self) -> Duration {
        let nanos = self.tick_duration.as_nanos().saturating_mul(self.stats.ticks as u128);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Advance one tick: the player acts, then the world updates
    pub fn step(&mut self) -> Vec<WorldEvent> {
        self.stats.ticks += 1;
        let now = self.now();

        self.player.act(&mut self.world, now, self.tick_duration);
        let events = self.world.update(now);

        self.player.observe(&events);
        self.stats.record(&events);
        for event in &events {
            if matches!(event, WorldEvent::MonsterDied { .. } | WorldEvent::PlayerDied) {
                info!("{:?}", event);
            }
        }
        events
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldContent;
    use dungeon_shared::{DEFAULT_POOL_SIZE, SIM_TICK_RATE};

    #[test]
    fn test_step_toward() {
        let next = step_toward([0.0, 1.0, 0.0], [10.0, 0.0, 0.0], 2.0);
        assert_eq!(next, [2.0, 1.0, 0.0]);
        let arrived = step_toward([0.0, 1.0, 0.0], [1.0, 0.0, 1.0], 5.0);
        assert_eq!(arrived, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_clock_past_u32_ticks() {
        let world = GameWorld::headless(WorldContent::with_defaults(), Some(3)).unwrap();
        let mut runner = Runner::new(world, SIM_TICK_RATE);
        let ticks = u32::MAX as u64 + 10;
        runner.stats.ticks = ticks;
        assert_eq!(runner.now(), Duration::from_millis(50 * ticks));
    }

    #[test]
    fn test_stats_record() {
        let mut stats = RunStats::default();
        stats.record(&[
            WorldEvent::MonsterDied { monster: 1, name: "slime".into() },
            WorldEvent::GoldAwarded { amount: 12, total: 12 },
            WorldEvent::GoldAwarded { amount: 3, total: 15 },
            WorldEvent::PlayerDied,
        ]);
        assert_eq!(stats.kills, 1);
        assert_eq!(stats.gold, 15);
        assert_eq!(stats.player_deaths, 1);
    }

    #[test]
    fn test_scripted_session_keeps_invariants() {
        let world = GameWorld::headless(WorldContent::with_defaults(), Some(1234)).unwrap();
        let mut runner = Runner::new(world, SIM_TICK_RATE);
        assert_eq!(runner.tick_duration(), Duration::from_millis(50));

        // Ten simulated minutes
        for _ in 0..(SIM_TICK_RATE * 600) {
            runner.step();
            let world = runner.world();
            for site in world.spawner().sites() {
                assert!(site.population() <= site.def.max_population);
            }
            assert!(world.spawner().pool().live() <= DEFAULT_POOL_SIZE);
            for container in world.loot_containers() {
                assert!(container.expires_at > runner.now());
            }
        }

        let stats = runner.stats();
        assert_eq!(stats.ticks, (SIM_TICK_RATE * 600) as u64);
        assert!(stats.kills > 0);
        assert!(stats.loot_claimed > 0);
        assert_eq!(runner.world().player().wallet.gold(), stats.gold);
        assert!(stats.loot_dropped >= stats.loot_expired);
    }
}
