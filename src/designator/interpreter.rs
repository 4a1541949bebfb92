use crate::designator::fragment_identifier::FragmentIdentifier;
use crate::designator::tools::{find_title_tree, is_identifier_bearing, to_implicit_identifier};
use crate::node_kind::NodeKind;
use crate::problem::Problem;
use crate::tree::SyntacticTree;
use crate::treepath::Treepath;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Resolves fragment identifiers of one document.
///
/// Construction makes one pre-order walk collecting two maps:
///
/// * pure identifiers, written explicitly as `\\name` under a node; a second definition of the
///   same identifier is a [`Problem`] and the first one wins;
/// * derived identifiers, computed from the title of levels having no explicit identifier; a
///   derived identifier appearing twice is dropped silently.
///
/// Then it rewrites the document into an "enriched" one where raw identifier nodes are replaced
/// by `_EXPLICIT_IDENTIFIER` and `_IMPLICIT_IDENTIFIER` first children. Lookups return treepaths
/// into the enriched document. The interpreter never changes after construction.
#[derive(Debug, Clone)]
pub struct DesignatorInterpreter {
    pure_identifiers: HashMap<FragmentIdentifier, Vec<usize>>,
    derived_identifiers: HashMap<FragmentIdentifier, Vec<usize>>,
    enriched: Treepath,
    problems: Vec<Problem>,
}

#[derive(Default)]
struct Collector {
    pure_identifiers: HashMap<FragmentIdentifier, Vec<usize>>,
    derived_identifiers: HashMap<FragmentIdentifier, Vec<usize>>,
    duplicate_derived_identifiers: HashSet<FragmentIdentifier>,
    problems: Vec<Problem>,
}

impl DesignatorInterpreter {
    pub fn new(treepath: &Treepath) -> Self {
        let root = treepath.tree_at_start();

        let mut collector = Collector::default();
        collect(&mut collector, root, &mut Vec::new());
        for duplicate in &collector.duplicate_derived_identifiers {
            collector.derived_identifiers.remove(duplicate);
        }

        let pure_by_indices = invert(&collector.pure_identifiers);
        let derived_by_indices = invert(&collector.derived_identifiers);
        let mut enrichment = Enrichment {
            pure_by_indices: &pure_by_indices,
            derived_by_indices: &derived_by_indices,
            pure_identifiers: HashMap::new(),
            derived_identifiers: HashMap::new(),
        };
        let enriched_root = enrichment.enrich(root, &mut Vec::new(), &mut Vec::new());

        debug!(
            "Created interpreter with {} pure and {} derived identifiers, {} problem(s)",
            enrichment.pure_identifiers.len(),
            enrichment.derived_identifiers.len(),
            collector.problems.len()
        );

        DesignatorInterpreter {
            pure_identifiers: enrichment.pure_identifiers,
            derived_identifiers: enrichment.derived_identifiers,
            enriched: Treepath::new(enriched_root),
            problems: collector.problems,
        }
    }

    /// Looks in pure identifiers first, then in derived ones.
    pub fn get(&self, identifier: &FragmentIdentifier) -> Option<Treepath> {
        self.pure_identifiers
            .get(identifier)
            .or_else(|| self.derived_identifiers.get(identifier))
            .and_then(|indices| self.enriched.descend(indices).ok())
    }

    pub fn pure_identifiers(&self) -> impl Iterator<Item = &FragmentIdentifier> {
        self.pure_identifiers.keys()
    }

    pub fn derived_identifiers(&self) -> impl Iterator<Item = &FragmentIdentifier> {
        self.derived_identifiers.keys()
    }

    pub fn enriched_treepath(&self) -> &Treepath {
        &self.enriched
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn has_problem(&self) -> bool {
        !self.problems.is_empty()
    }
}

fn collect(collector: &mut Collector, tree: &SyntacticTree, indices: &mut Vec<usize>) {
    if !is_identifier_bearing(tree) {
        return;
    }

    let explicit = tree
        .children()
        .iter()
        .find(|child| child.is(NodeKind::AbsoluteIdentifier));

    match explicit {
        Some(identifier_tree) => {
            match identifier_tree
                .text()
                .unwrap_or_default()
                .parse::<FragmentIdentifier>()
            {
                Ok(identifier) if collector.pure_identifiers.contains_key(&identifier) => {
                    let message = format!("Already defined: '{identifier}'");
                    collector.problems.push(located_problem(identifier_tree, message));
                }
                Ok(identifier) => {
                    collector.pure_identifiers.insert(identifier, indices.clone());
                }
                Err(error) => collector
                    .problems
                    .push(located_problem(identifier_tree, error.to_string())),
            }
        }
        None => {
            let segment = find_title_tree(tree)
                .map(to_implicit_identifier)
                .unwrap_or_default();
            if let Ok(identifier) = FragmentIdentifier::from_segment(segment) {
                if collector.derived_identifiers.contains_key(&identifier) {
                    collector.duplicate_derived_identifiers.insert(identifier);
                } else {
                    collector.derived_identifiers.insert(identifier, indices.clone());
                }
            }
        }
    }

    for (index, child) in tree.children().iter().enumerate() {
        indices.push(index);
        collect(collector, child, indices);
        indices.pop();
    }
}

fn located_problem(tree: &SyntacticTree, message: String) -> Problem {
    match tree.location() {
        Some(location) => Problem::at(location.clone(), message),
        None => Problem::new(message),
    }
}

fn invert(map: &HashMap<FragmentIdentifier, Vec<usize>>) -> HashMap<Vec<usize>, FragmentIdentifier> {
    map.iter()
        .map(|(identifier, indices)| (indices.clone(), identifier.clone()))
        .collect()
}

/// Rebuilds the tree, keeping track of where each identified node lands.
struct Enrichment<'a> {
    pure_by_indices: &'a HashMap<Vec<usize>, FragmentIdentifier>,
    derived_by_indices: &'a HashMap<Vec<usize>, FragmentIdentifier>,
    pure_identifiers: HashMap<FragmentIdentifier, Vec<usize>>,
    derived_identifiers: HashMap<FragmentIdentifier, Vec<usize>>,
}

impl Enrichment<'_> {
    fn enrich(
        &mut self,
        tree: &SyntacticTree,
        old_indices: &mut Vec<usize>,
        new_indices: &mut Vec<usize>,
    ) -> SyntacticTree {
        if !is_identifier_bearing(tree) {
            return tree.clone();
        }

        let mut children = Vec::with_capacity(tree.child_count() + 2);
        if let Some(identifier) = self.derived_by_indices.get(old_indices.as_slice()) {
            children.push(SyntacticTree::with_text(
                NodeKind::ImplicitIdentifier,
                identifier.absolute_representation(),
            ));
            self.derived_identifiers
                .insert(identifier.clone(), new_indices.clone());
        }
        if let Some(identifier) = self.pure_by_indices.get(old_indices.as_slice()) {
            children.push(SyntacticTree::with_text(
                NodeKind::ExplicitIdentifier,
                identifier.absolute_representation(),
            ));
            self.pure_identifiers
                .insert(identifier.clone(), new_indices.clone());
        }

        for (index, child) in tree.children().iter().enumerate() {
            if child.is_one_of(&[NodeKind::AbsoluteIdentifier, NodeKind::RelativeIdentifier]) {
                continue;
            }
            old_indices.push(index);
            new_indices.push(children.len());
            let enriched = self.enrich(child, old_indices, new_indices);
            children.push(enriched);
            old_indices.pop();
            new_indices.pop();
        }
        tree.adopt(children)
    }
}
