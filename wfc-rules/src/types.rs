use crate::LoadError;
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Stable identity of a module inside a [`ModuleCatalog`].
///
/// Equal to the module's position in the catalog records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One catalog entry as it appears on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub module_name: String,
    pub sprite_name: String,
    #[serde(default)]
    pub neighbors: Vec<String>,
}

impl ModuleRecord {
    pub fn new(module_name: &str, sprite_name: &str, neighbors: &[&str]) -> Self {
        Self {
            module_name: module_name.to_owned(),
            sprite_name: sprite_name.to_owned(),
            neighbors: neighbors.iter().map(|n| (*n).to_owned()).collect(),
        }
    }
}

/// How declared adjacency is treated when the catalog is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymmetryPolicy {
    /// Rules are used exactly as declared; `A -> B` says nothing about `B -> A`.
    #[default]
    Directional,
    /// Every declared `A -> B` also adds `B -> A`.
    Symmetrize,
    /// A declared `A -> B` without `B -> A` is a load error.
    Strict,
}

impl fmt::Display for SymmetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Directional => "directional",
            Self::Symmetrize => "symmetrize",
            Self::Strict => "strict",
        })
    }
}

impl FromStr for SymmetryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "directional" => Ok(Self::Directional),
            "symmetrize" => Ok(Self::Symmetrize),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown symmetry policy '{other}': expected directional, symmetrize or strict"
            )),
        }
    }
}

/// A resolved tile type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    /// Opaque to the solver; only the renderer cares.
    pub sprite_name: String,
    /// Bit `i` is set when module `i` may be placed next to this one.
    pub neighbors: BitVec,
}

/// The immutable adjacency table, built once from [`ModuleRecord`]s.
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    modules: Vec<Module>,
    by_name: HashMap<String, ModuleId>,
}

impl ModuleCatalog {
    /// Builds a catalog with directional adjacency.
    ///
    /// # Errors
    ///
    /// See [`ModuleCatalog::load_with_policy`].
    pub fn load(records: &[ModuleRecord]) -> Result<Self, LoadError> {
        Self::load_with_policy(records, SymmetryPolicy::Directional)
    }

    /// Builds a catalog, resolving every neighbor name to its index.
    ///
    /// # Errors
    ///
    /// * `LoadError::EmptyCatalog` if `records` is empty.
    /// * `LoadError::DuplicateModule` if two records share a `module_name`.
    /// * `LoadError::UnknownModule` if a neighbor name matches no record.
    /// * `LoadError::AsymmetricAdjacency` under [`SymmetryPolicy::Strict`].
    pub fn load_with_policy(
        records: &[ModuleRecord],
        policy: SymmetryPolicy,
    ) -> Result<Self, LoadError> {
        let mut by_name = HashMap::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            if by_name
                .insert(record.module_name.clone(), ModuleId(index))
                .is_some()
            {
                return Err(LoadError::DuplicateModule(record.module_name.clone()));
            }
        }

        let count = records.len();
        let mut modules = Vec::with_capacity(count);
        for (index, record) in records.iter().enumerate() {
            let mut neighbors = bitvec![0; count];
            for neighbor in &record.neighbors {
                let id = by_name
                    .get(neighbor)
                    .ok_or_else(|| LoadError::UnknownModule {
                        module: record.module_name.clone(),
                        neighbor: neighbor.clone(),
                    })?;
                neighbors.set(id.0, true);
            }
            modules.push(Module {
                id: ModuleId(index),
                name: record.module_name.clone(),
                sprite_name: record.sprite_name.clone(),
                neighbors,
            });
        }

        let mut catalog = Self { modules, by_name };
        if catalog.is_empty() {
            return Err(LoadError::EmptyCatalog);
        }
        match policy {
            SymmetryPolicy::Directional => {}
            SymmetryPolicy::Symmetrize => catalog.symmetrize(),
            SymmetryPolicy::Strict => catalog.check_symmetry()?,
        }
        log::debug!(
            "Module catalog built: {} modules, {:?} adjacency",
            catalog.len(),
            policy
        );
        Ok(catalog)
    }

    fn symmetrize(&mut self) {
        let count = self.modules.len();
        for a in 0..count {
            for b in 0..count {
                if self.modules[a].neighbors[b] {
                    self.modules[b].neighbors.set(a, true);
                }
            }
        }
    }

    fn check_symmetry(&self) -> Result<(), LoadError> {
        for module in self.iter() {
            for other in module.neighbors.iter_ones() {
                if !self.modules[other].neighbors[module.id.0] {
                    return Err(LoadError::AsymmetricAdjacency {
                        from: module.name.clone(),
                        to: self.modules[other].name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Looks a module up by name.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::ModuleNotFound` when no module carries that name.
    pub fn resolve_index(&self, name: &str) -> Result<ModuleId, LoadError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::ModuleNotFound(name.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    /// Every module that may sit next to a cell whose possibilities are `domain`:
    /// the union of each candidate's neighbor set plus the candidate itself.
    pub fn allowed_neighbors(&self, domain: &BitSlice) -> BitVec {
        let mut allowed = bitvec![0; self.modules.len()];
        for index in domain.iter_ones() {
            if let Some(module) = self.modules.get(index) {
                allowed |= module.neighbors.as_bitslice();
                allowed.set(index, true);
            }
        }
        allowed
    }

    /// True if `b` is declared as a neighbor of `a`, or `a == b`.
    #[inline]
    pub fn is_compatible(&self, a: ModuleId, b: ModuleId) -> bool {
        a == b
            || self
                .modules
                .get(a.0)
                .is_some_and(|m| m.neighbors.get(b.0).is_some_and(|bit| *bit))
    }
}
