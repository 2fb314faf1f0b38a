use tracing::trace;

use super::GraphRepository;
use crate::error::Result;
use crate::model::Node;
use crate::schema::Direction;

impl GraphRepository {
    /// Resolves the nodes related to `id` through the named relation,
    /// failing with `NotFound` for unknown ids. An undeclared relation name
    /// resolves to an empty list.
    pub fn get_related_nodes(&self, id: &str, relation: &str) -> Result<Vec<&Node>> {
        let node = self.node(id)?;
        self.related_nodes(node, relation)
    }

    /// Scans the edge store for edges incident to `node` that satisfy the
    /// relation's direction and edge-kind filter, producing the node at the
    /// far end when its kind matches the relation's related kind. Results
    /// preserve edge-store insertion order, one entry per matching edge.
    pub(crate) fn related_nodes<'a>(
        &'a self,
        node: &Node,
        relation: &str,
    ) -> Result<Vec<&'a Node>> {
        let Some(rel) = self.schema().get_relation(&node.kind, relation) else {
            return Ok(Vec::new());
        };
        let rel = rel.parse()?;

        let mut related = Vec::new();
        for edge in self.edges() {
            if let Some(edge_kind) = &rel.edge_kind {
                if edge.kind != *edge_kind {
                    continue;
                }
            }
            let far_id = match rel.direction {
                Direction::Out => {
                    if edge.from != node.id {
                        continue;
                    }
                    &edge.to
                }
                Direction::In => {
                    if edge.to != node.id {
                        continue;
                    }
                    &edge.from
                }
            };
            if let Ok(far) = self.node(far_id) {
                if far.kind == rel.related_kind {
                    related.push(far);
                }
            }
        }

        trace!(
            node = %node.id,
            relation,
            count = related.len(),
            "resolved related nodes"
        );
        Ok(related)
    }
}
