// In-memory node directory seeded from configuration
use crate::application::node_directory::NodeDirectory;
use crate::domain::node::NodeInfo;
use crate::domain::route_discovery::HopId;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Entries {
    /// Insertion order decides fuzzy-match ties
    nodes: Vec<NodeInfo>,
    by_num: HashMap<HopId, usize>,
}

#[derive(Debug, Default)]
pub struct InMemoryNodeDirectory {
    entries: RwLock<Entries>,
}

impl InMemoryNodeDirectory {
    pub fn new(nodes: impl IntoIterator<Item = NodeInfo>) -> Self {
        let directory = Self::default();
        for node in nodes {
            directory.upsert(node);
        }
        directory
    }

    /// Insert a node, or replace it in place if the number is already known.
    pub fn upsert(&self, node: NodeInfo) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match entries.by_num.get(&node.num).copied() {
            Some(idx) => entries.nodes[idx] = node,
            None => {
                let idx = entries.nodes.len();
                entries.by_num.insert(node.num, idx);
                entries.nodes.push(node);
            }
        }
    }

    pub fn get(&self, num: HopId) -> Option<NodeInfo> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.by_num.get(&num).map(|&idx| entries.nodes[idx].clone())
    }
}

impl NodeDirectory for InMemoryNodeDirectory {
    fn display_name(&self, num: HopId) -> String {
        self.get(num)
            .unwrap_or_else(|| NodeInfo::placeholder(num))
            .display_name()
    }

    /// A node matches when the text contains its long name or the long name
    /// contains the text. Blank long names never match.
    fn find_by_name_contains(&self, text: &str) -> Option<NodeInfo> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .nodes
            .iter()
            .find(|node| {
                let long_name = node.long_name.trim();
                !long_name.is_empty() && (text.contains(long_name) || long_name.contains(text))
            })
            .cloned()
    }

    fn list_nodes(&self) -> Vec<NodeInfo> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .nodes
            .clone()
    }
}
