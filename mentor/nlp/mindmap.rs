use serde::{Deserialize, Serialize};

use crate::{comprehension::helper::rank_terms, config::MindMapSettings};

/// Node of a concept map. Level 0 is the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapNode {
    /// Unique id within the map.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Depth from the root.
    pub level: u8,
}

/// Directed parent-to-child link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapEdge {
    /// Parent node id.
    pub source: String,
    /// Child node id.
    pub target: String,
}

/// Concept hierarchy of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMap {
    /// All nodes, root first.
    pub nodes: Vec<MindMapNode>,
    /// Parent-to-child edges.
    pub edges: Vec<MindMapEdge>,
}

impl MindMap {
    /// Parses a model reply, tolerating prose or code fences around the JSON object.
    pub fn from_model_reply(reply: &str) -> Result<Self, serde_json::Error> {
        let start = reply.find('{').unwrap_or(0);
        let end = reply.rfind('}').map_or(reply.len(), |idx| idx + 1);
        let candidate = if start < end { &reply[start..end] } else { reply };
        serde_json::from_str(candidate)
    }

    /// True when every edge references known nodes and exactly one root exists.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let roots = self.nodes.iter().filter(|node| node.level == 0).count();
        let known = |id: &str| self.nodes.iter().any(|node| node.id == id);
        roots == 1
            && self
                .edges
                .iter()
                .all(|edge| known(&edge.source) && known(&edge.target))
    }

    fn push_node(&mut self, id: String, label: String, level: u8) {
        self.nodes.push(MindMapNode { id, label, level });
    }

    fn push_edge(&mut self, source: String, target: String) {
        self.edges.push(MindMapEdge { source, target });
    }
}

/// Builds a mind map from word frequencies alone.
///
/// The root is labelled with the opening words of the document. The most
/// frequent terms become level-1 concepts linked to the root; the next ones
/// become level-2 sub-concepts spread round-robin over the first
/// `parent_fanout` concepts.
#[must_use]
pub fn basic_mind_map(text: &str, settings: &MindMapSettings) -> MindMap {
    let mut map = MindMap::default();
    let title = text
        .split_whitespace()
        .take(settings.title_words)
        .collect::<Vec<_>>()
        .join(" ");
    map.push_node("main".into(), title, 0);

    let terms = rank_terms(
        text,
        settings.term_min_len,
        settings.concepts + settings.sub_concepts,
    );
    let split = terms.len().min(settings.concepts);
    let (concepts, subs) = terms.split_at(split);
    for (idx, term) in concepts.iter().enumerate() {
        let id = format!("concept_{idx}");
        map.push_node(id.clone(), term.clone(), 1);
        map.push_edge("main".into(), id);
    }
    // Sub-concepts only exist when every concept slot was filled, and need a
    // concept to hang from.
    if concepts.is_empty() {
        return map;
    }
    let fanout = settings.parent_fanout.clamp(1, concepts.len());
    for (idx, term) in subs.iter().enumerate() {
        let id = format!("sub_{idx}");
        map.push_node(id.clone(), term.clone(), 2);
        map.push_edge(format!("concept_{}", idx % fanout), id);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Rust ownership model explained. Ownership borrowing lifetimes traits generics \
closures iterators macros modules crates cargo testing tooling unsafe async futures. \
Ownership borrowing lifetimes traits generics closures iterators macros modules.";

    #[test]
    fn basic_map_has_root_concepts_and_subconcepts() {
        let map = basic_mind_map(TEXT, &MindMapSettings::default());
        assert_eq!(map.nodes[0].label, "Rust ownership model explained. Ownership");
        let level1 = map.nodes.iter().filter(|n| n.level == 1).count();
        let level2 = map.nodes.iter().filter(|n| n.level == 2).count();
        assert_eq!(level1, 6);
        assert_eq!(level2, 6);
        assert_eq!(map.nodes[1].label, "ownership");
        assert!(map.edges.contains(&MindMapEdge {
            source: "concept_1".into(),
            target: "sub_4".into(),
        }));
        assert!(map.is_well_formed());
    }

    #[test]
    fn sparse_text_yields_only_concepts() {
        let map = basic_mind_map("Short words only here.", &MindMapSettings::default());
        assert_eq!(map.nodes.len(), 3);
        assert_eq!(map.nodes[1].label, "short");
        assert!(map.nodes.iter().all(|n| n.level < 2));
        assert!(map.is_well_formed());
    }

    #[test]
    fn zero_concepts_leaves_no_dangling_sub_concepts() {
        let settings = MindMapSettings {
            concepts: 0,
            ..MindMapSettings::default()
        };
        let map = basic_mind_map(TEXT, &settings);
        assert_eq!(map.nodes.len(), 1);
        assert!(map.edges.is_empty());
        assert!(map.is_well_formed());
    }

    #[test]
    fn empty_text_still_has_a_root() {
        let map = basic_mind_map("", &MindMapSettings::default());
        assert_eq!(map.nodes.len(), 1);
        assert!(map.edges.is_empty());
    }

    #[test]
    fn model_reply_is_parsed_through_fences() {
        let reply = "```json\n{\"nodes\":[{\"id\":\"main\",\"label\":\"Rust\",\"level\":0}],\"edges\":[]}\n```";
        let map = MindMap::from_model_reply(reply).unwrap();
        assert_eq!(map.nodes[0].label, "Rust");
        assert!(MindMap::from_model_reply("no json here").is_err());
    }
}
