use tracing::debug;

use super::GraphRepository;
use crate::error::Result;
use crate::model::{Node, NodeId};
use crate::query::selector::Selector;

impl GraphRepository {
    /// Removes every node the selector resolves to, together with all
    /// incident edges, and returns the removed records. The records are
    /// plain nodes, not models: a deleted node's relations can no longer be
    /// traversed.
    pub fn delete<S: Into<Selector>>(&mut self, selector: S) -> Result<Vec<Node>> {
        let ids: Vec<NodeId> = self
            .find_nodes(&selector.into())?
            .into_iter()
            .map(|node| node.id.clone())
            .collect();

        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            let incident: Vec<String> = self
                .edges()
                .filter(|edge| edge.from == id || edge.to == id)
                .map(|edge| edge.key())
                .collect();
            for key in &incident {
                self.remove_edge(key);
            }
            // a duplicate id from a disjunctive selector is already gone
            if let Some(node) = self.take_node(&id) {
                debug!(id = %id, edges = incident.len(), "deleted node");
                removed.push(node);
            }
        }
        Ok(removed)
    }
}
