//! Protection, grievance and proxy edges between parts.
//!
//! The manager knows nothing about which parts are registered; the
//! simulation context checks ids against the model before delegating here.

use std::collections::BTreeSet;

use ifs_types::{Grievance, PartId, RelationshipState};

use crate::error::SimError;

/// Owner of the relationship graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipManager {
    state: RelationshipState,
}

impl RelationshipManager {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a graph from a serialized state.
    pub const fn from_state(state: RelationshipState) -> Self {
        Self { state }
    }

    /// Read-only view of the full graph.
    pub const fn state(&self) -> &RelationshipState {
        &self.state
    }

    /// Clone the full graph for recording.
    pub fn snapshot(&self) -> RelationshipState {
        self.state.clone()
    }

    // -----------------------------------------------------------------------
    // Protection
    // -----------------------------------------------------------------------

    /// Add a protector to protected edge.
    pub fn add_protection(&mut self, protector: &PartId, protected: &PartId) {
        self.state
            .protections
            .entry(protector.clone())
            .or_default()
            .insert(protected.clone());
    }

    /// Parts protected by `protector`, ordered by id.
    pub fn protected_by(&self, protector: &PartId) -> impl Iterator<Item = &PartId> {
        self.state
            .protections
            .get(protector)
            .into_iter()
            .flat_map(BTreeSet::iter)
    }

    /// Protectors of `part`, ordered by id.
    pub fn protectors_of<'a>(&'a self, part: &'a PartId) -> impl Iterator<Item = &'a PartId> {
        self.state
            .protections
            .iter()
            .filter(move |(_, protected)| protected.contains(part))
            .map(|(protector, _)| protector)
    }

    /// Whether `protector` protects `protected`.
    pub fn protects(&self, protector: &PartId, protected: &PartId) -> bool {
        self.state
            .protections
            .get(protector)
            .is_some_and(|set| set.contains(protected))
    }

    /// Every protector in the graph, ordered by id.
    pub fn protectors(&self) -> impl Iterator<Item = &PartId> {
        self.state
            .protections
            .iter()
            .filter(|(_, protected)| !protected.is_empty())
            .map(|(protector, _)| protector)
    }

    // -----------------------------------------------------------------------
    // Grievances
    // -----------------------------------------------------------------------

    /// Replace the grievance held by `holder`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::GrievanceWithoutTargets`] or
    /// [`SimError::EmptyGrievance`] if the grievance could never fire.
    pub fn set_grievance(
        &mut self,
        holder: &PartId,
        targets: BTreeSet<PartId>,
        lines: Vec<String>,
    ) -> Result<(), SimError> {
        if targets.is_empty() {
            return Err(SimError::GrievanceWithoutTargets {
                holder: holder.clone(),
            });
        }
        if lines.is_empty() {
            return Err(SimError::EmptyGrievance {
                holder: holder.clone(),
            });
        }
        self.state
            .grievances
            .insert(holder.clone(), Grievance { targets, lines });
        Ok(())
    }

    /// The grievance held by `holder`.
    pub fn grievance(&self, holder: &PartId) -> Option<&Grievance> {
        self.state.grievances.get(holder)
    }

    /// Every grievance, ordered by holder.
    pub fn grievances(&self) -> impl Iterator<Item = (&PartId, &Grievance)> {
        self.state.grievances.iter()
    }

    /// Whether `holder` has an outstanding grievance against `target`.
    pub fn has_grievance_against(&self, holder: &PartId, target: &PartId) -> bool {
        self.state
            .grievances
            .get(holder)
            .is_some_and(|g| g.targets.contains(target))
    }

    /// Drop one target from a grievance; the grievance goes away with its
    /// last target. Returns whether the target was present.
    pub fn resolve_grievance(&mut self, holder: &PartId, target: &PartId) -> bool {
        let Some(grievance) = self.state.grievances.get_mut(holder) else {
            return false;
        };
        let removed = grievance.targets.remove(target);
        if grievance.targets.is_empty() {
            self.state.grievances.remove(holder);
        }
        removed
    }

    /// Whether any grievance still has a target.
    pub fn has_outstanding_grievances(&self) -> bool {
        self.state.grievances.values().any(|g| !g.targets.is_empty())
    }

    // -----------------------------------------------------------------------
    // Proxies
    // -----------------------------------------------------------------------

    /// Add a proxy that stands in for the client when `part` looks.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::SelfProxy`] if `part == proxy`.
    pub fn add_proxy(&mut self, part: &PartId, proxy: &PartId) -> Result<(), SimError> {
        if part == proxy {
            return Err(SimError::SelfProxy(part.clone()));
        }
        self.state
            .proxies
            .entry(part.clone())
            .or_default()
            .insert(proxy.clone());
        Ok(())
    }

    /// The lowest-id proxy for `part`.
    pub fn first_proxy(&self, part: &PartId) -> Option<&PartId> {
        self.state.proxies.get(part).and_then(BTreeSet::first)
    }

    /// Remove one proxy edge. Returns whether it existed.
    pub fn remove_proxy(&mut self, part: &PartId, proxy: &PartId) -> bool {
        let Some(set) = self.state.proxies.get_mut(part) else {
            return false;
        };
        let removed = set.remove(proxy);
        if set.is_empty() {
            self.state.proxies.remove(part);
        }
        removed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(s: &str) -> PartId {
        PartId::from(s)
    }

    #[test]
    fn protection_queries() {
        let mut rel = RelationshipManager::new();
        rel.add_protection(&id("critic"), &id("exile"));
        rel.add_protection(&id("critic"), &id("child"));
        rel.add_protection(&id("manager"), &id("exile"));

        assert!(rel.protects(&id("critic"), &id("exile")));
        assert!(!rel.protects(&id("exile"), &id("critic")));
        let protected: Vec<_> = rel.protected_by(&id("critic")).collect();
        assert_eq!(protected, [&id("child"), &id("exile")]);
        let exile = id("exile");
        let protectors: Vec<_> = rel.protectors_of(&exile).collect();
        assert_eq!(protectors, [&id("critic"), &id("manager")]);
    }

    #[test]
    fn self_proxy_is_rejected() {
        let mut rel = RelationshipManager::new();
        assert!(matches!(
            rel.add_proxy(&id("a"), &id("a")),
            Err(SimError::SelfProxy(_))
        ));
        assert!(rel.state().proxies.is_empty());
    }

    #[test]
    fn proxies_are_consumed_lowest_first() {
        let mut rel = RelationshipManager::new();
        rel.add_proxy(&id("a"), &id("z")).unwrap();
        rel.add_proxy(&id("a"), &id("m")).unwrap();
        assert_eq!(rel.first_proxy(&id("a")), Some(&id("m")));
        assert!(rel.remove_proxy(&id("a"), &id("m")));
        assert_eq!(rel.first_proxy(&id("a")), Some(&id("z")));
        assert!(rel.remove_proxy(&id("a"), &id("z")));
        assert_eq!(rel.first_proxy(&id("a")), None);
        assert!(rel.state().proxies.is_empty());
    }

    #[test]
    fn grievance_without_lines_is_rejected() {
        let mut rel = RelationshipManager::new();
        let targets = BTreeSet::from([id("b")]);
        assert!(matches!(
            rel.set_grievance(&id("a"), targets, Vec::new()),
            Err(SimError::EmptyGrievance { .. })
        ));
    }

    #[test]
    fn resolving_last_target_removes_grievance() {
        let mut rel = RelationshipManager::new();
        rel.set_grievance(
            &id("a"),
            BTreeSet::from([id("b"), id("c")]),
            vec!["you again".to_owned()],
        )
        .unwrap();
        assert!(rel.has_outstanding_grievances());
        assert!(rel.resolve_grievance(&id("a"), &id("b")));
        assert!(rel.has_grievance_against(&id("a"), &id("c")));
        assert!(rel.resolve_grievance(&id("a"), &id("c")));
        assert!(rel.grievance(&id("a")).is_none());
        assert!(!rel.has_outstanding_grievances());
    }
}
