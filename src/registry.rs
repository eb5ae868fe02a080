//! Registry of nodes discovered on the network
//!
//! Keyed by the raw long address. Discovery events insert or overwrite;
//! entries are never removed while the session lives, so a node that goes
//! quiet still appears in listings (requests to it will time out).

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::node::{Node, NodeAddress};

/// Thread-safe map of every node seen by discovery
pub struct NodeRegistry {
    nodes: Mutex<HashMap<NodeAddress, Node>>,
}

impl NodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a discovered node, replacing any previous entry for the
    /// same address
    ///
    /// Returns `true` when the address was not known before.
    pub fn register(&self, node: Node) -> bool {
        self.nodes.lock().insert(node.address, node).is_none()
    }

    /// Node currently registered under an address
    pub fn lookup(&self, address: NodeAddress) -> Option<Node> {
        self.nodes.lock().get(&address).cloned()
    }

    /// Snapshot of all known nodes, ordered by address for stable listings
    pub fn all(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.nodes.lock().values().cloned().collect();
        nodes.sort_by_key(|node| node.address);
        nodes
    }

    /// Number of known nodes
    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    /// Whether discovery has found anything yet
    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
