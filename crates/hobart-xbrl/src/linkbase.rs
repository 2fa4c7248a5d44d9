//! Read-only views over parsed linkbase networks.
//!
//! Exposes label resolution with preferred roles and deterministic
//! presentation-tree construction on top of [`XbrlLinkbases`]. Views are
//! side-effect free and safe to cache per document.

use crate::model::{XbrlLinkbases, XbrlPresentationArc};
use std::collections::{BTreeMap, BTreeSet};

/// Node in a presentation tree for one extended link role.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationNode {
    /// Concept QName represented by this node.
    pub concept: String,
    /// Child nodes in presentation order.
    pub children: Vec<PresentationNode>,
}

/// Read-only view over the linkbase networks of a single document.
#[derive(Debug, Clone)]
pub struct LinkbaseView<'a> {
    linkbases: &'a XbrlLinkbases,
    arcs_by_role: BTreeMap<&'a str, Vec<&'a XbrlPresentationArc>>,
}

impl<'a> LinkbaseView<'a> {
    /// Build a view over parsed linkbase networks.
    pub fn new(linkbases: &'a XbrlLinkbases) -> Self {
        let mut arcs_by_role: BTreeMap<&str, Vec<&XbrlPresentationArc>> = BTreeMap::new();
        for arc in &linkbases.presentation_arcs {
            arcs_by_role.entry(arc.role.as_str()).or_default().push(arc);
        }
        for arcs in arcs_by_role.values_mut() {
            arcs.sort_by(|a, b| {
                (a.parent.as_str(), a.order, a.child.as_str())
                    .partial_cmp(&(b.parent.as_str(), b.order, b.child.as_str()))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        Self {
            linkbases,
            arcs_by_role,
        }
    }

    /// Return the best label for a concept, preferring the given roles in order.
    ///
    /// When no preferred role matches, any available label is returned;
    /// concepts with no labels at all yield `None`.
    pub fn best_label(&self, concept: &str, preferred_roles: &[&str]) -> Option<&'a str> {
        let labels = self.linkbases.labels_by_concept.get(concept)?;
        if labels.is_empty() {
            return None;
        }

        for role in preferred_roles {
            if let Some(label) = labels.iter().find(|l| l.role == *role) {
                return Some(label.text.as_str());
            }
        }

        Some(labels[0].text.as_str())
    }

    /// Build the presentation tree for a given extended link role.
    ///
    /// Roots are parents that never appear as children, sorted
    /// lexicographically; children are ordered by arc order. The result is
    /// deterministic given the underlying arcs.
    pub fn presentation_tree(&self, role: &str) -> Vec<PresentationNode> {
        let Some(arcs) = self.arcs_by_role.get(role) else {
            return Vec::new();
        };

        let mut children_by_parent: BTreeMap<&str, Vec<&XbrlPresentationArc>> = BTreeMap::new();
        let mut parents: BTreeSet<&str> = BTreeSet::new();
        let mut children: BTreeSet<&str> = BTreeSet::new();

        for arc in arcs {
            parents.insert(arc.parent.as_str());
            children.insert(arc.child.as_str());
            children_by_parent
                .entry(arc.parent.as_str())
                .or_default()
                .push(arc);
        }

        for arcs_for_parent in children_by_parent.values_mut() {
            arcs_for_parent.sort_by(|a, b| {
                a.order
                    .partial_cmp(&b.order)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        fn build(concept: &str, children_by_parent: &BTreeMap<&str, Vec<&XbrlPresentationArc>>) -> PresentationNode {
            let children = children_by_parent
                .get(concept)
                .map(|arcs| {
                    arcs.iter()
                        .map(|arc| build(&arc.child, children_by_parent))
                        .collect()
                })
                .unwrap_or_default();
            PresentationNode {
                concept: concept.to_string(),
                children,
            }
        }

        parents
            .difference(&children)
            .map(|root| build(root, &children_by_parent))
            .collect()
    }
}
