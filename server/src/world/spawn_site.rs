//! Spawn sites, population tracking and monster pooling.
//!
//! Each site keeps its own population below `max_population`. Monsters come
//! out of a shared [`MonsterPool`]; a dead monster frees its site slot
//! immediately and goes back to the pool once its corpse is cleaned up.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use dungeon_shared::{MonsterTemplate, SpawnSiteDef};
use log::{debug, info, warn};

use super::content::MonsterCatalog;
use crate::entities::{Monster, Scaling};
use crate::rng::RandomSource;
use crate::secs;

/// A spawn site with its live population
#[derive(Debug, Clone)]
pub struct SpawnSite {
    pub def: SpawnSiteDef,
    population: u32,
}

impl SpawnSite {
    pub fn new(def: SpawnSiteDef) -> Self {
        Self { def, population: 0 }
    }

    pub fn population(&self) -> u32 {
        self.population
    }

    pub fn is_full(&self) -> bool {
        self.population >= self.def.max_population
    }

    pub fn respawn_delay(&self) -> Duration {
        secs(self.def.respawn_delay_secs)
    }

    /// Site position jittered on X/Z
    fn spawn_position(&self, rng: &mut dyn RandomSource) -> [f32; 3] {
        let [dx, dz] = rng.offset(self.def.spawn_jitter);
        let [x, y, z] = self.def.position;
        [x + dx, y, z + dz]
    }
}

/// Bounded set of monster instances, reused after despawn
#[derive(Debug)]
pub struct MonsterPool {
    capacity: usize,
    /// Instances handed out and not yet released
    live: usize,
    free: Vec<Monster>,
}

impl MonsterPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            live: 0,
            free: Vec::new(),
        }
    }

    /// Reuse a released instance or build a new one while under capacity
    fn acquire(
        &mut self,
        id: u64,
        template: &MonsterTemplate,
        scaling: Scaling,
        site: &str,
    ) -> Option<Monster> {
        let monster = match self.free.pop() {
            Some(mut monster) => {
                monster.reinitialize(id, template, scaling, Some(site));
                monster
            }
            None if self.live < self.capacity => {
                Monster::new(id, template, scaling).with_site(site)
            }
            None => return None,
        };
        self.live += 1;
        Some(monster)
    }

    fn release(&mut self, monster: Monster) {
        self.live = self.live.saturating_sub(1);
        if self.live + self.free.len() < self.capacity {
            self.free.push(monster);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn live(&self) -> usize {
        self.live
    }

    pub fn idle(&self) -> usize {
        self.free.len()
    }
}

/// Result of a spawn attempt
#[derive(Debug)]
pub enum SpawnOutcome {
    Spawned { monster: Box<Monster>, position: [f32; 3] },
    AtCapacity,
    PoolExhausted,
    UnknownSite,
    UnknownMonster,
}

/// Returned on a monster's first death notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespawnRequest {
    pub site: String,
    pub delay: Duration,
}

pub struct SpawnController {
    sites: BTreeMap<String, SpawnSite>,
    /// Live monster id -> owning site
    monster_sites: HashMap<u64, String>,
    pool: MonsterPool,
}

impl SpawnController {
    pub fn new(defs: impl IntoIterator<Item = SpawnSiteDef>, pool_capacity: usize) -> Self {
        let sites: BTreeMap<String, SpawnSite> = defs
            .into_iter()
            .map(|def| (def.id.clone(), SpawnSite::new(def)))
            .collect();
        info!("Loaded {} spawn sites (pool capacity {})", sites.len(), pool_capacity);
        Self {
            sites,
            monster_sites: HashMap::new(),
            pool: MonsterPool::new(pool_capacity),
        }
    }

    pub fn site(&self, id: &str) -> Option<&SpawnSite> {
        self.sites.get(id)
    }

    pub fn sites(&self) -> impl Iterator<Item = &SpawnSite> {
        self.sites.values()
    }

    pub fn site_ids(&self) -> Vec<String> {
        self.sites.keys().cloned().collect()
    }

    pub fn population(&self, site: &str) -> u32 {
        self.sites.get(site).map(SpawnSite::population).unwrap_or(0)
    }

    pub fn site_of(&self, monster: u64) -> Option<&str> {
        self.monster_sites.get(&monster).map(String::as_str)
    }

    pub fn pool(&self) -> &MonsterPool {
        &self.pool
    }

    /// Spawn one monster at `site` under `id` if the site has room
    pub fn try_spawn(
        &mut self,
        site_id: &str,
        id: u64,
        monsters: &MonsterCatalog,
        rng: &mut dyn RandomSource,
    ) -> SpawnOutcome {
        let Some(site) = self.sites.get_mut(site_id) else {
            warn!("Spawn requested for unknown site {}", site_id);
            return SpawnOutcome::UnknownSite;
        };
        if site.is_full() {
            debug!(
                "Site {} at max population {}, skipping spawn",
                site_id, site.def.max_population
            );
            return SpawnOutcome::AtCapacity;
        }
        let Some(template) = monsters.get(&site.def.monster) else {
            warn!("Site {} references unknown monster '{}'", site_id, site.def.monster);
            return SpawnOutcome::UnknownMonster;
        };

        let scaling = Scaling::from_site(&site.def);
        let Some(monster) = self.pool.acquire(id, template, scaling, site_id) else {
            warn!(
                "Monster pool exhausted ({} live), site {} skips this spawn",
                self.pool.live(),
                site_id
            );
            return SpawnOutcome::PoolExhausted;
        };

        site.population += 1;
        self.monster_sites.insert(id, site_id.to_owned());
        let position = site.spawn_position(rng);
        debug!(
            "Spawned {} #{} at site {} ({}/{})",
            monster.name, id, site_id, site.population, site.def.max_population
        );

        SpawnOutcome::Spawned {
            monster: Box::new(monster),
            position,
        }
    }

    /// Free the monster's population slot. Only the first notification per
    /// monster counts; later ones return `None`.
    pub fn on_death(&mut self, monster: u64) -> Option<RespawnRequest> {
        let site_id = self.monster_sites.remove(&monster)?;
        let site = self.sites.get_mut(&site_id)?;
        site.population = site.population.saturating_sub(1);

        let delay = site.respawn_delay();
        debug!(
            "Monster {} died at site {}, respawning in {:.1}s",
            monster,
            site_id,
            delay.as_secs_f32()
        );
        Some(RespawnRequest { site: site_id, delay })
    }

    /// Return a despawned monster to the pool
    pub fn release(&mut self, monster: Monster) {
        // A monster still registered never had its death reported
        if let Some(site_id) = self.monster_sites.remove(&monster.id) {
            if let Some(site) = self.sites.get_mut(&site_id) {
                site.population = site.population.saturating_sub(1);
            }
        }
        self.pool.release(monster);
    }
}

impl std::fmt::Debug for SpawnController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnController")
            .field("sites", &self.sites.keys().collect::<Vec<_>>())
            .field("tracked_monsters", &self.monster_sites.len())
            .field("pool", &self.pool)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;
    use dungeon_shared::CombatantStats;

    fn catalog() -> MonsterCatalog {
        MonsterCatalog::new(vec![MonsterTemplate::new("slime", CombatantStats::default())])
    }

    fn site(id: &str, max_population: u32) -> SpawnSiteDef {
        SpawnSiteDef {
            max_population,
            respawn_delay_secs: 12.0,
            ..SpawnSiteDef::new(id, "slime", [10.0, 0.0, 5.0])
        }
    }

    fn spawned(outcome: SpawnOutcome) -> (Box<Monster>, [f32; 3]) {
        match outcome {
            SpawnOutcome::Spawned { monster, position } => (monster, position),
            other => panic!("expected a spawn, got {:?}", other),
        }
    }

    #[test]
    fn test_population_capped() {
        let monsters = catalog();
        let mut rng = ScriptedSource::constant(0.5);
        let mut controller = SpawnController::new(vec![site("meadow", 2)], 20);

        let (first, position) = spawned(controller.try_spawn("meadow", 1, &monsters, &mut rng));
        assert_eq!(first.site.as_deref(), Some("meadow"));
        assert_eq!(position, [10.0, 0.0, 5.0]);
        spawned(controller.try_spawn("meadow", 2, &monsters, &mut rng));

        assert!(matches!(
            controller.try_spawn("meadow", 3, &monsters, &mut rng),
            SpawnOutcome::AtCapacity
        ));
        assert_eq!(controller.population("meadow"), 2);
        assert!(matches!(
            controller.try_spawn("nowhere", 4, &monsters, &mut rng),
            SpawnOutcome::UnknownSite
        ));
    }

    #[test]
    fn test_repeated_death_counts_once() {
        let monsters = catalog();
        let mut rng = ScriptedSource::constant(0.5);
        let mut controller = SpawnController::new(vec![site("meadow", 3)], 20);
        spawned(controller.try_spawn("meadow", 1, &monsters, &mut rng));
        spawned(controller.try_spawn("meadow", 2, &monsters, &mut rng));

        let request = controller.on_death(1).unwrap();
        assert_eq!(
            request,
            RespawnRequest {
                site: "meadow".into(),
                delay: Duration::from_secs(12)
            }
        );
        assert_eq!(controller.on_death(1), None);
        assert_eq!(controller.on_death(99), None);
        assert_eq!(controller.population("meadow"), 1);
    }

    #[test]
    fn test_pool_exhaustion_and_reuse() {
        let monsters = catalog();
        let mut rng = ScriptedSource::constant(0.5);
        let mut controller = SpawnController::new(vec![site("a", 2), site("b", 2)], 3);

        let (first, _) = spawned(controller.try_spawn("a", 1, &monsters, &mut rng));
        spawned(controller.try_spawn("a", 2, &monsters, &mut rng));
        spawned(controller.try_spawn("b", 3, &monsters, &mut rng));
        assert!(matches!(
            controller.try_spawn("b", 4, &monsters, &mut rng),
            SpawnOutcome::PoolExhausted
        ));
        assert_eq!(controller.population("b"), 1);

        // Death frees the slot but not the pool instance
        controller.on_death(1);
        assert!(matches!(
            controller.try_spawn("a", 5, &monsters, &mut rng),
            SpawnOutcome::PoolExhausted
        ));

        controller.release(*first);
        assert_eq!(controller.pool().idle(), 1);
        let (reused, _) = spawned(controller.try_spawn("b", 6, &monsters, &mut rng));
        assert_eq!(reused.id, 6);
        assert_eq!(reused.site.as_deref(), Some("b"));
        assert!(reused.is_alive());
        assert_eq!(controller.pool().idle(), 0);
        assert_eq!(controller.pool().live(), 3);
    }

    #[test]
    fn test_site_scaling_applied() {
        let monsters = catalog();
        let mut rng = ScriptedSource::constant(0.0);
        let mut def = site("crypt", 1);
        def.difficulty_level = 3;
        def.hp_multiplier = 2.0;
        let mut controller = SpawnController::new(vec![def], 5);

        let (monster, position) = spawned(controller.try_spawn("crypt", 1, &monsters, &mut rng));
        assert_eq!(monster.combat.max_health(), 600);
        assert_eq!(monster.combat.stats().attack_power, 30);
        // unit() = 0 maps to the far negative corner of the jitter square
        assert_eq!(position, [8.0, 0.0, 3.0]);
    }

    #[test]
    fn test_unknown_monster_skipped() {
        let mut rng = ScriptedSource::constant(0.5);
        let mut controller = SpawnController::new(
            vec![SpawnSiteDef::new("lair", "dragon", [0.0; 3])],
            5,
        );
        assert!(matches!(
            controller.try_spawn("lair", 1, &catalog(), &mut rng),
            SpawnOutcome::UnknownMonster
        ));
        assert_eq!(controller.population("lair"), 0);
    }
}
