//! Game world management.
//!
//! [`GameWorld`] owns every piece of simulation state and is driven by
//! [`GameWorld::update`] once per tick. Delayed effects go through the
//! [`Scheduler`]; everything observable comes out as [`WorldEvent`]s.

pub mod content;
pub mod drivers;
pub mod scheduler;
pub mod spawn_site;

pub use content::{MonsterCatalog, WorldContent};
pub use drivers::{AnimationSink, AudioSink, KinematicDriver, LogCues, MovementDriver};
pub use scheduler::{Owner, ScheduledAction, Scheduler, TimerId};
pub use spawn_site::{MonsterPool, RespawnRequest, SpawnController, SpawnOutcome, SpawnSite};

use std::collections::BTreeMap;
use std::time::Duration;

use dungeon_shared::{
    ConfigError, ItemCatalog, SpawnSkipReason, WorldEvent, LOOT_CHANNEL_SECS, LOOT_LIFETIME_SECS,
    LOOT_REACH,
};
use log::{debug, info, warn};

use crate::drops::LootResult;
use crate::entities::{
    BehaviorContext, ClaimStatus, DamageOutcome, LootContainer, Monster, Player, TargetObservation,
};
use crate::rng::{RandSource, RandomSource};
use crate::secs;

/// Distance on the XZ plane
pub fn distance_xz(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dx = b[0] - a[0];
    let dz = b[2] - a[2];
    (dx * dx + dz * dz).sqrt()
}

/// External collaborators handed to the world at construction
pub struct Drivers {
    pub movement: Box<dyn MovementDriver>,
    pub animation: Box<dyn AnimationSink>,
    pub audio: Box<dyn AudioSink>,
}

impl Drivers {
    /// Straight-line movement and log-only cues
    pub fn headless() -> Self {
        Self {
            movement: Box::new(KinematicDriver::new()),
            animation: Box::new(LogCues),
            audio: Box::new(LogCues),
        }
    }
}

/// Everything monsters reach through a [`BehaviorContext`]
struct Systems {
    rng: Box<dyn RandomSource>,
    drivers: Drivers,
    scheduler: Scheduler,
}

impl Systems {
    fn ctx(&mut self, now: Duration) -> BehaviorContext<'_> {
        BehaviorContext {
            now,
            rng: self.rng.as_mut(),
            movement: self.drivers.movement.as_mut(),
            animation: self.drivers.animation.as_mut(),
            audio: self.drivers.audio.as_mut(),
            scheduler: &mut self.scheduler,
        }
    }
}

/// Loot channel in progress
#[derive(Debug, Clone, Copy)]
struct ActiveLoot {
    loot: u64,
    timer: TimerId,
}

/// The game world containing all entities
pub struct GameWorld {
    items: ItemCatalog,
    monster_catalog: MonsterCatalog,
    player: Player,
    monsters: BTreeMap<u64, Monster>,
    loot: BTreeMap<u64, LootContainer>,
    spawner: SpawnController,
    systems: Systems,
    looting: Option<ActiveLoot>,
    events: Vec<WorldEvent>,
    next_monster_id: u64,
    next_loot_id: u64,
    last_update: Duration,
}

impl GameWorld {
    pub fn new(
        content: WorldContent,
        rng: Box<dyn RandomSource>,
        drivers: Drivers,
    ) -> Result<Self, ConfigError> {
        let mut content = content;
        content.validate()?;

        let mut world = Self {
            items: content.item_catalog(),
            monster_catalog: content.monster_catalog(),
            player: Player::new(&content.player)?,
            monsters: BTreeMap::new(),
            loot: BTreeMap::new(),
            spawner: SpawnController::new(content.spawn_sites, content.pool_size),
            systems: Systems {
                rng,
                drivers,
                scheduler: Scheduler::new(),
            },
            looting: None,
            events: Vec::new(),
            // Start ids high to keep monsters and loot apart in logs
            next_monster_id: 10000,
            next_loot_id: 20000,
            last_update: Duration::ZERO,
        };

        info!(
            "World ready: {} item definitions, {} monster templates",
            world.items.len(),
            world.monster_catalog.len()
        );
        if world.items.is_empty() {
            warn!("No item definitions loaded, monsters drop gold only");
        }
        if world.monster_catalog.is_empty() {
            warn!("No monster templates loaded, spawn sites stay empty");
        }

        world.populate_all_sites();
        Ok(world)
    }

    /// Headless world: kinematic movement, log-only cues, seeded or entropy randomness
    pub fn headless(content: WorldContent, seed: Option<u64>) -> Result<Self, ConfigError> {
        let rng: Box<dyn RandomSource> = match seed {
            Some(seed) => Box::new(RandSource::seeded(seed)),
            None => Box::new(RandSource::from_entropy()),
        };
        Self::new(content, rng, Drivers::headless())
    }

    /// Fill every spawn site up to its max population
    fn populate_all_sites(&mut self) {
        let mut total_spawned = 0;
        for site_id in self.spawner.site_ids() {
            let max_population = self
                .spawner
                .site(&site_id)
                .map(|site| site.def.max_population)
                .unwrap_or(0);
            for _ in 0..max_population {
                match self.spawn_at(&site_id, Duration::ZERO) {
                    Ok(()) => total_spawned += 1,
                    // Every missing slot keeps its own retry
                    Err(Some(SpawnSkipReason::PoolExhausted)) => {}
                    Err(_) => break,
                }
            }
        }
        info!("Spawned {} monsters across all sites", total_spawned);
    }

    /// One spawn attempt at `site_id`. Pool exhaustion schedules a retry.
    fn spawn_at(&mut self, site_id: &str, now: Duration) -> Result<(), Option<SpawnSkipReason>> {
        let id = self.next_monster_id;
        let outcome = self
            .spawner
            .try_spawn(site_id, id, &self.monster_catalog, self.systems.rng.as_mut());

        let reason = match outcome {
            SpawnOutcome::Spawned { monster, position } => {
                self.next_monster_id += 1;
                self.systems
                    .drivers
                    .movement
                    .place(id, position, monster.combat.stats().move_speed);
                debug!("{} #{} spawned at {:?}", monster.name, id, position);
                self.events.push(WorldEvent::MonsterSpawned {
                    monster: id,
                    site: site_id.to_owned(),
                    name: monster.name.clone(),
                    position,
                });
                self.monsters.insert(id, *monster);
                return Ok(());
            }
            SpawnOutcome::AtCapacity => SpawnSkipReason::AtCapacity,
            SpawnOutcome::UnknownMonster => SpawnSkipReason::UnknownMonster,
            SpawnOutcome::PoolExhausted => {
                if let Some(site) = self.spawner.site(site_id) {
                    let retry = now + site.respawn_delay();
                    self.systems.scheduler.schedule(
                        retry,
                        Owner::Site(site_id.to_owned()),
                        ScheduledAction::Respawn(site_id.to_owned()),
                    );
                }
                SpawnSkipReason::PoolExhausted
            }
            SpawnOutcome::UnknownSite => return Err(None),
        };

        self.events.push(WorldEvent::SpawnSkipped {
            site: site_id.to_owned(),
            reason,
        });
        Err(Some(reason))
    }

    /// Advance the world to `now` and return everything that happened since the last update
    pub fn update(&mut self, now: Duration) -> Vec<WorldEvent> {
        let delta = now.saturating_sub(self.last_update);
        self.last_update = now;
        self.systems.drivers.movement.step(delta);

        self.run_scheduled(now);
        self.check_loot_reach();
        self.tick_monsters(now);

        std::mem::take(&mut self.events)
    }

    fn run_scheduled(&mut self, now: Duration) {
        for action in self.systems.scheduler.drain_due(now) {
            match action {
                ScheduledAction::RecoverFromHit(id) => {
                    let observation = self.observe(id);
                    if let Some(monster) = self.monsters.get_mut(&id) {
                        monster.recover_from_hit(observation, &mut self.systems.ctx(now));
                    }
                }
                ScheduledAction::Despawn(id) => self.despawn(id),
                ScheduledAction::Respawn(site) => {
                    let _ = self.spawn_at(&site, now);
                }
                ScheduledAction::FinishLoot(id) => self.finish_loot(id),
                ScheduledAction::ExpireLoot(id) => self.expire_loot(id),
            }
        }
    }

    fn tick_monsters(&mut self, now: Duration) {
        let ids: Vec<u64> = self.monsters.keys().copied().collect();
        for id in ids {
            let observation = self.observe(id);
            let Some(monster) = self.monsters.get_mut(&id) else {
                continue;
            };
            let Some(intent) = monster.tick(observation, &mut self.systems.ctx(now)) else {
                continue;
            };

            if !self.player.is_alive() {
                continue;
            }
            let outcome = self.player.combat.apply_damage(intent.damage);
            self.events.push(WorldEvent::MonsterAttacked {
                monster: intent.monster,
                pattern: intent.pattern,
                damage: intent.damage,
                player_health: outcome.new_health,
            });
            if outcome.died {
                warn!("{} was killed by monster {}", self.player.name, intent.monster);
                self.interrupt_loot();
                self.events.push(WorldEvent::PlayerDied);
            }
        }
    }

    /// Player observation for one monster; a dead player cannot be tracked
    fn observe(&self, monster: u64) -> Option<TargetObservation> {
        if !self.player.is_alive() {
            return None;
        }
        let position = self.systems.drivers.movement.position(monster)?;
        Some(TargetObservation {
            position: self.player.position,
            distance: distance_xz(position, self.player.position),
        })
    }

    /// Apply damage to a monster. A killing blow resolves drops, drops a loot
    /// container, frees the spawn slot and schedules the respawn, in that order.
    pub fn damage_monster(&mut self, id: u64, amount: u32, now: Duration) -> Option<DamageOutcome> {
        let monster = self.monsters.get_mut(&id)?;
        let was_alive = monster.is_alive();
        let report = monster.apply_damage(amount, &mut self.systems.ctx(now));

        if was_alive {
            self.events.push(WorldEvent::MonsterDamaged {
                monster: id,
                amount,
                health: report.outcome.new_health,
            });
        }
        if let Some(loot) = report.loot {
            self.handle_death(id, loot, now);
        }
        Some(report.outcome)
    }

    /// Player melee attack, subject to range and cooldown
    pub fn player_attack(&mut self, id: u64, now: Duration) -> Option<DamageOutcome> {
        if !self.player.is_alive() || !self.player.combat.ready_to_attack(now) {
            return None;
        }
        let position = self.systems.drivers.movement.position(id)?;
        if distance_xz(position, self.player.position) > self.player.combat.stats().attack_range {
            return None;
        }
        if !self.monsters.get(&id).is_some_and(Monster::is_alive) {
            return None;
        }

        self.player.combat.record_attack(now);
        let damage = self.player.combat.stats().attack_power;
        self.damage_monster(id, damage, now)
    }

    fn handle_death(&mut self, id: u64, loot: LootResult, now: Duration) {
        let name = self.monsters.get(&id).map(|m| m.name.clone()).unwrap_or_default();
        info!("{} #{} died at site {}", name, id, self.spawner.site_of(id).unwrap_or("-"));
        self.events.push(WorldEvent::MonsterDied { monster: id, name });

        if !loot.is_empty() {
            let loot_id = self.next_loot_id;
            self.next_loot_id += 1;
            let position = self.systems.drivers.movement.position(id).unwrap_or_default();

            self.events.push(WorldEvent::LootDropped {
                loot: loot_id,
                monster: id,
                position,
                gold: loot.gold,
                items: loot.items.clone(),
            });
            let expires_at = now + secs(LOOT_LIFETIME_SECS);
            self.loot
                .insert(loot_id, LootContainer::new(loot_id, id, position, loot, expires_at));
            self.systems.scheduler.schedule(
                expires_at,
                Owner::Loot(loot_id),
                ScheduledAction::ExpireLoot(loot_id),
            );
        }

        if let Some(request) = self.spawner.on_death(id) {
            self.systems.scheduler.schedule(
                now + request.delay,
                Owner::Site(request.site.clone()),
                ScheduledAction::Respawn(request.site),
            );
        }
    }

    fn despawn(&mut self, id: u64) {
        let Some(monster) = self.monsters.remove(&id) else {
            return;
        };
        self.systems.scheduler.cancel_owner(&Owner::Monster(id));
        self.systems.drivers.movement.remove(id);
        self.spawner.release(monster);
        debug!("Monster {} despawned", id);
        self.events.push(WorldEvent::MonsterDespawned { monster: id });
    }

    /// Start looting a container within reach. Only one channel runs at a time.
    pub fn begin_loot(&mut self, id: u64, now: Duration) -> bool {
        if !self.player.is_alive() || self.looting.is_some() {
            return false;
        }
        let Some(container) = self.loot.get_mut(&id) else {
            return false;
        };
        if distance_xz(container.position, self.player.position) > LOOT_REACH {
            return false;
        }
        if !container.begin_loot() {
            return false;
        }

        let timer = self.systems.scheduler.schedule(
            now + secs(LOOT_CHANNEL_SECS),
            Owner::Loot(id),
            ScheduledAction::FinishLoot(id),
        );
        self.looting = Some(ActiveLoot { loot: id, timer });
        debug!("Looting container {}", id);
        true
    }

    /// Cancel the loot channel on `id`, if it is the active one
    pub fn cancel_loot(&mut self, id: u64) -> bool {
        if self.looting.is_some_and(|active| active.loot == id) {
            self.interrupt_loot();
            true
        } else {
            false
        }
    }

    fn interrupt_loot(&mut self) {
        if let Some(active) = self.looting.take() {
            self.systems.scheduler.cancel(active.timer);
            if let Some(container) = self.loot.get_mut(&active.loot) {
                container.cancel_loot();
            }
            debug!("Loot channel on {} cancelled", active.loot);
        }
    }

    fn check_loot_reach(&mut self) {
        let Some(active) = self.looting else {
            return;
        };
        let out_of_reach = self
            .loot
            .get(&active.loot)
            .map_or(true, |c| distance_xz(c.position, self.player.position) > LOOT_REACH);
        if out_of_reach {
            self.interrupt_loot();
        }
    }

    fn finish_loot(&mut self, id: u64) {
        if self.looting.is_some_and(|active| active.loot == id) {
            self.looting = None;
        }
        let Some(container) = self.loot.get_mut(&id) else {
            return;
        };

        let claim = container.complete_loot(
            &mut self.player.inventory,
            &mut self.player.wallet,
            &self.items,
        );
        if claim.gold > 0 {
            self.events.push(WorldEvent::GoldAwarded {
                amount: claim.gold,
                total: self.player.wallet.gold(),
            });
        }

        let complete = claim.status == ClaimStatus::Complete;
        self.events.push(WorldEvent::LootClaimed {
            loot: id,
            items: claim.items,
            complete,
        });

        if complete {
            self.loot.remove(&id);
            self.systems.scheduler.cancel_owner(&Owner::Loot(id));
            info!("Container {} emptied", id);
        } else {
            warn!("Inventory full, container {} keeps the rest", id);
        }
    }

    fn expire_loot(&mut self, id: u64) {
        if self.looting.is_some_and(|active| active.loot == id) {
            self.looting = None;
        }
        if self.loot.remove(&id).is_some() {
            self.systems.scheduler.cancel_owner(&Owner::Loot(id));
            debug!("Container {} expired", id);
            self.events.push(WorldEvent::LootExpired { loot: id });
        }
    }

    pub fn set_player_position(&mut self, position: [f32; 3]) {
        if self.player.is_alive() {
            self.player.position = position;
        }
    }

    pub fn revive_player(&mut self) {
        if !self.player.is_alive() {
            self.player.revive();
        }
    }

    /// Consume one unit of a healing item
    pub fn player_use_item(&mut self, item_id: u32, heal: u32) -> bool {
        self.player.use_potion(&self.items, item_id, heal)
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn monster(&self, id: u64) -> Option<&Monster> {
        self.monsters.get(&id)
    }

    pub fn monsters(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.values()
    }

    pub fn monster_position(&self, id: u64) -> Option<[f32; 3]> {
        self.systems.drivers.movement.position(id)
    }

    pub fn loot_container(&self, id: u64) -> Option<&LootContainer> {
        self.loot.get(&id)
    }

    pub fn loot_containers(&self) -> impl Iterator<Item = &LootContainer> {
        self.loot.values()
    }

    /// Container currently being channelled
    pub fn active_loot(&self) -> Option<u64> {
        self.looting.map(|active| active.loot)
    }

    pub fn spawner(&self) -> &SpawnController {
        &self.spawner
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.systems.scheduler
    }

    pub fn items(&self) -> &ItemCatalog {
        &self.items
    }
}

impl std::fmt::Debug for GameWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameWorld")
            .field("monsters", &self.monsters.len())
            .field("loot", &self.loot.len())
            .field("pending_actions", &self.systems.scheduler.len())
            .field("spawner", &self.spawner)
            .finish()
    }
}
