//! Two-pass script builder
//!
//! Pass one records lists, permutation marks and *selections*: opaque
//! handles naming a list and a post-permutation position. Pass two
//! (`resolve`) binds every selection to its slot and enumerates the
//! hypotheses.
//!
//! A permuted list of `n` distributions with `k` distinct selected
//! positions contributes n!/(n−k)! arrangements. Positions nobody selects
//! never distinguish two worlds, so the full n! orderings are never built.
//! Independent lists combine by Cartesian product.

use crate::combinatorics::{cartesian, k_permutations, permutation_count, product_count};
use crate::errors::{DslError, DslResult, GeneratorError, GeneratorResult};
use crate::generator::{GeneratorLimits, RawHypothesis};
use beliefflow_types::{Distribution, SlotId};
use std::collections::{BTreeMap, HashSet};

/// Handle to a list defined on a builder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListId(usize);

/// A chosen position in a list, resolved to a distribution per hypothesis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Selection {
    list: ListId,
    index: usize,
}

impl Selection {
    pub fn list(&self) -> ListId {
        self.list
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Clone, Debug)]
struct ScriptList {
    name: String,
    items: Vec<(String, Distribution)>,
    permuted: bool,
}

/// Accumulates list definitions and bucket bindings
#[derive(Clone, Debug, Default)]
pub struct ScriptBuilder {
    lists: Vec<ScriptList>,
    bindings: Vec<(SlotId, Selection)>,
    schedule: Vec<SlotId>,
}

/// Output of resolution: raw hypotheses plus the declared emission schedule
#[derive(Clone, Debug)]
pub struct ResolvedScript {
    pub hypotheses: Vec<RawHypothesis>,
    pub schedule: Vec<SlotId>,
}

/// Arrangements of one list: for each, the item index placed at every
/// selected position
struct ListArrangements {
    positions: Vec<usize>,
    arrangements: Vec<Vec<usize>>,
}

impl ListArrangements {
    fn item_at(&self, arrangement: usize, position: usize) -> Option<usize> {
        let slot = self.positions.iter().position(|&p| p == position)?;
        Some(self.arrangements[arrangement][slot])
    }
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a list of named distributions
    pub fn list(
        &mut self,
        name: impl Into<String>,
        items: Vec<(String, Distribution)>,
    ) -> DslResult<ListId> {
        let name = name.into();
        if self.lists.iter().any(|l| l.name == name) {
            return Err(DslError::DuplicateName(name));
        }
        if items.is_empty() {
            return Err(DslError::EmptyList(name));
        }
        self.lists.push(ScriptList {
            name,
            items,
            permuted: false,
        });
        Ok(ListId(self.lists.len() - 1))
    }

    /// Look up a list by name
    pub fn list_id(&self, name: &str) -> Option<ListId> {
        self.lists.iter().position(|l| l.name == name).map(ListId)
    }

    /// Mark a list as subject to permutation
    pub fn permute(&mut self, list: ListId) -> DslResult<()> {
        let entry = self
            .lists
            .get_mut(list.0)
            .ok_or_else(|| DslError::UnknownList(format!("#{}", list.0)))?;
        entry.permuted = true;
        Ok(())
    }

    /// Select a post-permutation position of a list
    pub fn select(&self, list: ListId, index: usize) -> DslResult<Selection> {
        let entry = self
            .lists
            .get(list.0)
            .ok_or_else(|| DslError::UnknownList(format!("#{}", list.0)))?;
        if index >= entry.items.len() {
            return Err(DslError::IndexOutOfRange {
                list: entry.name.clone(),
                index,
                len: entry.items.len(),
            });
        }
        Ok(Selection { list, index })
    }

    /// Bind a selection to a named slot (a bucket)
    pub fn bucket(&mut self, slot: impl Into<SlotId>, selection: Selection) -> DslResult<()> {
        let slot = slot.into();
        if self.bindings.iter().any(|(s, _)| *s == slot) {
            return Err(DslError::DuplicateName(slot.0));
        }
        self.bindings.push((slot, selection));
        Ok(())
    }

    /// Declare the order in which buckets emit tokens
    pub fn schedule(&mut self, slots: Vec<SlotId>) -> DslResult<()> {
        for slot in &slots {
            if !self.bindings.iter().any(|(s, _)| s == slot) {
                return Err(DslError::UnknownBucket(slot.0.clone()));
            }
        }
        self.schedule.extend(slots);
        Ok(())
    }

    /// Number of hypotheses `resolve` would produce, `None` on overflow
    pub fn hypothesis_count(&self) -> Option<usize> {
        let counts: Option<Vec<usize>> = self
            .selected_lists()
            .into_iter()
            .map(|(list, positions)| {
                if self.lists[list].permuted {
                    permutation_count(self.lists[list].items.len(), positions.len())
                } else {
                    Some(1)
                }
            })
            .collect();
        product_count(&counts?)
    }

    /// Second pass: enumerate every world consistent with the script
    pub fn resolve(&self, limits: &GeneratorLimits) -> GeneratorResult<ResolvedScript> {
        let count = self.hypothesis_count();
        if count.map_or(true, |c| c > limits.max_hypotheses) {
            return Err(GeneratorError::TooManyHypotheses {
                limit: limits.max_hypotheses,
            });
        }

        let selected = self.selected_lists();
        let per_list: Vec<(usize, ListArrangements)> = selected
            .into_iter()
            .map(|(list, positions)| {
                let entry = &self.lists[list];
                let arrangements = if entry.permuted {
                    k_permutations(entry.items.len(), positions.len())
                } else {
                    vec![positions.clone()]
                };
                (
                    list,
                    ListArrangements {
                        positions,
                        arrangements,
                    },
                )
            })
            .collect();

        let axes: Vec<usize> = per_list
            .iter()
            .map(|(_, a)| a.arrangements.len())
            .collect();

        let mut hypotheses = Vec::with_capacity(count.unwrap_or(0));
        for combo in cartesian(&axes) {
            let mut slots = BTreeMap::new();
            let mut label_parts = Vec::with_capacity(self.bindings.len());

            for (slot, selection) in &self.bindings {
                let axis = per_list
                    .iter()
                    .position(|(list, _)| *list == selection.list.0)
                    .ok_or_else(|| GeneratorError::InvalidSpec("unresolved selection".into()))?;
                let (list, arrangements) = &per_list[axis];
                let item = arrangements
                    .item_at(combo[axis], selection.index)
                    .ok_or_else(|| GeneratorError::InvalidSpec("unresolved selection".into()))?;
                let (item_name, distribution) = &self.lists[*list].items[item];

                label_parts.push(format!("{}={}", slot, item_name));
                slots.insert(slot.clone(), distribution.clone());
            }

            hypotheses.push(RawHypothesis {
                label: label_parts.join(", "),
                slots,
            });
        }

        tracing::debug!(
            lists = per_list.len(),
            hypotheses = hypotheses.len(),
            "Resolved hypothesis script"
        );

        Ok(ResolvedScript {
            hypotheses,
            schedule: self.schedule.clone(),
        })
    }

    /// Lists with at least one selection, in definition order, each with its
    /// distinct selected positions in ascending order
    fn selected_lists(&self) -> Vec<(usize, Vec<usize>)> {
        let mut out: Vec<(usize, Vec<usize>)> = Vec::new();
        for (list, _) in self.lists.iter().enumerate() {
            let positions: HashSet<usize> = self
                .bindings
                .iter()
                .filter(|(_, sel)| sel.list.0 == list)
                .map(|(_, sel)| sel.index)
                .collect();
            if positions.is_empty() {
                continue;
            }
            let mut positions: Vec<usize> = positions.into_iter().collect();
            positions.sort_unstable();
            out.push((list, positions));
        }
        out
    }
}
