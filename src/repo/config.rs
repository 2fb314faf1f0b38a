/// Tunable behaviour for a [`GraphRepository`](super::GraphRepository).
#[derive(Debug, Clone, Default)]
pub struct RepoOptions {
    /// Deduplicate disjunctive `find` results by node id, keeping the first
    /// occurrence. Off by default: a node matched by several query branches
    /// appears once per branch.
    pub dedup_disjunctive_finds: bool,
}
