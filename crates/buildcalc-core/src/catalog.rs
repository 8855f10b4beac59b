//! Read-only catalog of everything a build order can produce.
//!
//! The catalog is assembled once through [`CatalogBuilder`], which resolves
//! name references (prerequisites, expended queues, yields, casters) into
//! [`ProductId`]s, and is frozen afterwards. Loading catalog data from files
//! is the caller's concern.

use crate::fixed::{Fixed64, f64_to_fixed64};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifies a product in the catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Race {
    Protoss,
    Terran,
    Zerg,
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Race::Protoss => "Protoss",
            Race::Terran => "Terran",
            Race::Zerg => "Zerg",
        };
        f.write_str(name)
    }
}

/// Classification flags carried by a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    Unit,
    Structure,
    Upgrade,
    Ability,
    /// Harvests resources once created.
    Worker,
    /// A resource base; adds a mineral site.
    Base,
    /// The base every game starts with.
    StartBase,
    /// A gas extractor; adds a gas site.
    Geyser,
    /// Transforms existing production queues.
    Morph,
    /// Has an energy pool.
    Spellcaster,
    /// Ability that accelerates a production queue.
    Booster,
    /// Ability that delivers a burst of larvae.
    SpawnLarvae,
    /// Ability that summons a temporary harvester.
    Mule,
    /// Queue type that completes its work after a short fixed delay.
    AcceleratedQueue,
    /// A worker sent away from mining; used as a proxy builder queue.
    ScoutingWorker,
    /// Present on the map at the start of the game.
    StartingUnit,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub race: Option<Race>,
    pub kinds: Vec<ProductKind>,
    /// Build time in seconds, or effect duration for abilities.
    pub time_cost: Fixed64,
    pub mineral_cost: u32,
    pub gas_cost: u32,
    pub supply_cost: i32,
    pub larva_cost: u32,
    pub energy_cost: u32,
    pub supply_capacity: i32,
    pub energy_start: u32,
    pub energy_max: u32,
    /// Caster type that pays the energy cost.
    pub spellcaster: Option<ProductId>,
    /// Queue types this product occupies while being produced.
    pub expends: Vec<ProductId>,
    /// Whether every type in `expends` is occupied (all-of) or just one (one-of).
    pub expends_all: bool,
    pub prerequisites: Vec<ProductId>,
    /// Products left behind by a morph.
    pub yields: Vec<ProductId>,
}

impl Product {
    #[inline]
    pub fn is(&self, kind: ProductKind) -> bool {
        self.kinds.contains(&kind)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate product name '{0}'")]
    DuplicateName(String),

    #[error("unresolved {field} reference '{name}' in product '{product}'")]
    UnresolvedRef {
        product: String,
        field: &'static str,
        name: String,
    },

    #[error("no {kind:?} product registered for {race}")]
    NoDesignated { race: Race, kind: ProductKind },
}

// ===========================================================================
// Definitions
// ===========================================================================

/// Registration form of a product; references other products by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDef {
    pub name: String,
    pub race: Option<Race>,
    pub kinds: Vec<ProductKind>,
    pub time: f64,
    pub minerals: u32,
    pub gas: u32,
    pub supply: i32,
    /// Defaults to 1 for Zerg units that are not structures.
    pub larva: Option<u32>,
    pub energy: u32,
    pub supply_capacity: i32,
    pub energy_start: u32,
    pub energy_max: u32,
    pub spellcaster: Option<String>,
    pub expends: Vec<String>,
    /// Defaults to true for morphs.
    pub expends_all: Option<bool>,
    pub prerequisites: Vec<String>,
    pub yields: Vec<String>,
}

impl ProductDef {
    pub fn new(name: &str, race: Option<Race>, kinds: &[ProductKind]) -> Self {
        Self {
            name: name.to_string(),
            race,
            kinds: kinds.to_vec(),
            ..Self::default()
        }
    }

    pub fn time(mut self, secs: f64) -> Self {
        self.time = secs;
        self
    }

    pub fn cost(mut self, minerals: u32, gas: u32) -> Self {
        self.minerals = minerals;
        self.gas = gas;
        self
    }

    pub fn supply(mut self, supply: i32) -> Self {
        self.supply = supply;
        self
    }

    pub fn larva(mut self, larva: u32) -> Self {
        self.larva = Some(larva);
        self
    }

    pub fn capacity(mut self, capacity: i32) -> Self {
        self.supply_capacity = capacity;
        self
    }

    pub fn energy_pool(mut self, start: u32, max: u32) -> Self {
        self.energy_start = start;
        self.energy_max = max;
        self
    }

    /// Energy cost paid by a caster of type `caster`.
    pub fn cast_by(mut self, caster: &str, energy: u32) -> Self {
        self.spellcaster = Some(caster.to_string());
        self.energy = energy;
        self
    }

    pub fn expends(mut self, queues: &[&str]) -> Self {
        self.expends = queues.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn expends_all(mut self, all: bool) -> Self {
        self.expends_all = Some(all);
        self
    }

    pub fn requires(mut self, prerequisites: &[&str]) -> Self {
        self.prerequisites = prerequisites.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn yields(mut self, products: &[&str]) -> Self {
        self.yields = products.iter().map(|s| s.to_string()).collect();
        self
    }
}

// ===========================================================================
// Builder
// ===========================================================================

/// Builder for constructing an immutable [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    defs: Vec<ProductDef>,
    name_to_id: HashMap<String, ProductId>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product. Returns its ID.
    pub fn register(&mut self, def: ProductDef) -> Result<ProductId, CatalogError> {
        let key = def.name.to_lowercase();
        if self.name_to_id.contains_key(&key) {
            return Err(CatalogError::DuplicateName(def.name));
        }
        let id = ProductId(self.defs.len() as u32);
        self.name_to_id.insert(key, id);
        self.defs.push(def);
        Ok(id)
    }

    fn resolve(
        &self,
        product: &str,
        field: &'static str,
        names: &[String],
    ) -> Result<Vec<ProductId>, CatalogError> {
        names
            .iter()
            .map(|name| {
                self.name_to_id
                    .get(&name.to_lowercase())
                    .copied()
                    .ok_or_else(|| CatalogError::UnresolvedRef {
                        product: product.to_string(),
                        field,
                        name: name.clone(),
                    })
            })
            .collect()
    }

    /// Resolve every name reference and freeze the catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut products = Vec::with_capacity(self.defs.len());
        for (index, def) in self.defs.iter().enumerate() {
            let morph = def.kinds.contains(&ProductKind::Morph);
            let zerg_unit = def.race == Some(Race::Zerg)
                && def.kinds.contains(&ProductKind::Unit)
                && !def.kinds.contains(&ProductKind::Structure);
            let spellcaster = match &def.spellcaster {
                Some(name) => self
                    .resolve(&def.name, "spellcaster", std::slice::from_ref(name))?
                    .first()
                    .copied(),
                None => None,
            };
            products.push(Product {
                id: ProductId(index as u32),
                name: def.name.clone(),
                race: def.race,
                kinds: def.kinds.clone(),
                time_cost: f64_to_fixed64(def.time),
                mineral_cost: def.minerals,
                gas_cost: def.gas,
                supply_cost: def.supply,
                larva_cost: def.larva.unwrap_or(if zerg_unit { 1 } else { 0 }),
                energy_cost: def.energy,
                supply_capacity: def.supply_capacity,
                energy_start: def.energy_start,
                energy_max: def.energy_max,
                spellcaster,
                expends: self.resolve(&def.name, "expends", &def.expends)?,
                expends_all: def.expends_all.unwrap_or(morph),
                prerequisites: self.resolve(&def.name, "prerequisite", &def.prerequisites)?,
                yields: self.resolve(&def.name, "yields", &def.yields)?,
            });
        }
        Ok(Catalog {
            products,
            name_to_id: self.name_to_id,
        })
    }
}

// ===========================================================================
// Catalog
// ===========================================================================

/// Immutable catalog. Frozen after build(). Thread-safe to share.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    name_to_id: HashMap<String, ProductId>,
}

impl Catalog {
    /// Look up a product by ID.
    ///
    /// IDs are only minted by the builder that produced this catalog, so an
    /// unknown ID is a caller bug.
    pub fn get(&self, id: ProductId) -> &Product {
        &self.products[id.0 as usize]
    }

    pub fn try_get(&self, id: ProductId) -> Option<&Product> {
        self.products.get(id.0 as usize)
    }

    /// Case-insensitive lookup by name.
    pub fn by_name(&self, name: &str) -> Option<&Product> {
        self.name_to_id
            .get(&name.to_lowercase())
            .map(|id| self.get(*id))
    }

    pub fn id(&self, name: &str) -> Option<ProductId> {
        self.name_to_id.get(&name.to_lowercase()).copied()
    }

    pub fn name(&self, id: ProductId) -> &str {
        &self.get(id).name
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// The first product of `race` carrying `kind`. Products without a race
    /// match every race.
    pub fn designated(&self, race: Race, kind: ProductKind) -> Result<&Product, CatalogError> {
        self.products
            .iter()
            .find(|p| p.is(kind) && p.race.is_none_or(|r| r == race))
            .ok_or(CatalogError::NoDesignated { race, kind })
    }
}
