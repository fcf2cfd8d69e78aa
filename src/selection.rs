//! Selection model: which bulbs and scores are selected, and which one is primary.
//!
//! Bulbs and scores have independent id spaces, so every selectable thing is
//! named by an [`EntityRef`] (kind + id). The two id lists keep insertion order
//! so "the first remaining selection" is well defined when the primary is
//! deselected.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

/// The two kinds of selectable, placed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Bulb,
    Score,
}

/// Composite key for a selectable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: u32,
}

impl EntityRef {
    #[must_use]
    pub const fn bulb(id: u32) -> Self {
        Self { kind: EntityKind::Bulb, id }
    }

    #[must_use]
    pub const fn score(id: u32) -> Self {
        Self { kind: EntityKind::Score, id }
    }
}

/// Selected bulb and score ids plus the primary selection.
///
/// Invariant: `primary` is `None` exactly when both lists are empty, and
/// otherwise names a member of one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    bulbs: Vec<u32>,
    scores: Vec<u32>,
    primary: Option<EntityRef>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bulbs(&self) -> &[u32] {
        &self.bulbs
    }

    #[must_use]
    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    #[must_use]
    pub fn primary(&self) -> Option<EntityRef> {
        self.primary
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bulbs.len() + self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bulbs.is_empty() && self.scores.is_empty()
    }

    #[must_use]
    pub fn is_selected(&self, target: EntityRef) -> bool {
        self.ids(target.kind).contains(&target.id)
    }

    /// Every selected entity, bulbs first, each list in selection order.
    pub fn iter(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.bulbs
            .iter()
            .map(|&id| EntityRef::bulb(id))
            .chain(self.scores.iter().map(|&id| EntityRef::score(id)))
    }

    /// Select `target`. Unless `additive`, everything else is deselected first.
    /// The target becomes primary either way.
    pub fn select(&mut self, target: EntityRef, additive: bool) {
        if !additive {
            self.bulbs.clear();
            self.scores.clear();
        }
        let ids = self.ids_mut(target.kind);
        if !ids.contains(&target.id) {
            ids.push(target.id);
        }
        self.primary = Some(target);
    }

    /// Remove `target`. Returns false if it was not selected.
    pub fn deselect(&mut self, target: EntityRef) -> bool {
        let ids = self.ids_mut(target.kind);
        let Some(pos) = ids.iter().position(|&id| id == target.id) else {
            return false;
        };
        ids.remove(pos);
        if self.primary == Some(target) {
            self.primary = self.first();
        }
        true
    }

    /// Flip `target` in or out of the selection, additively.
    pub fn toggle(&mut self, target: EntityRef) {
        if !self.deselect(target) {
            self.select(target, true);
        }
    }

    /// Deselect everything. Returns false if nothing was selected.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.is_empty();
        self.bulbs.clear();
        self.scores.clear();
        self.primary = None;
        had_any
    }

    /// Replace the selection wholesale.
    ///
    /// `primary` is kept only if it names a member; otherwise the first
    /// member is used.
    pub fn set(&mut self, bulbs: Vec<u32>, scores: Vec<u32>, primary: Option<EntityRef>) {
        self.bulbs = dedup_in_order(bulbs);
        self.scores = dedup_in_order(scores);
        self.primary = primary.filter(|p| self.is_selected(*p)).or_else(|| self.first());
    }

    /// Keep only entities for which `keep` returns true. Returns whether anything was removed.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityRef) -> bool) -> bool {
        let before = self.len();
        self.bulbs.retain(|&id| keep(EntityRef::bulb(id)));
        self.scores.retain(|&id| keep(EntityRef::score(id)));
        if self.primary.is_some_and(|p| !self.is_selected(p)) {
            self.primary = self.first();
        }
        before != self.len()
    }

    fn first(&self) -> Option<EntityRef> {
        self.bulbs
            .first()
            .map(|&id| EntityRef::bulb(id))
            .or_else(|| self.scores.first().map(|&id| EntityRef::score(id)))
    }

    fn ids(&self, kind: EntityKind) -> &Vec<u32> {
        match kind {
            EntityKind::Bulb => &self.bulbs,
            EntityKind::Score => &self.scores,
        }
    }

    fn ids_mut(&mut self, kind: EntityKind) -> &mut Vec<u32> {
        match kind {
            EntityKind::Bulb => &mut self.bulbs,
            EntityKind::Score => &mut self.scores,
        }
    }
}

fn dedup_in_order(ids: Vec<u32>) -> Vec<u32> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
