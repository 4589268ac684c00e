//! Per-snapshot declaration factory.
//!
//! Memoize-or-create registry mapping declaration origins to arena nodes.
//! Same origin → same node within one snapshot; the cache is owned by its
//! snapshot exclusively and never shared across snapshots.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::base::DeclId;

use super::declaration::{DeclarationNode, DeclarationOrigin};

#[derive(Default)]
pub(crate) struct DeclarationFactory {
    nodes: RwLock<Vec<Arc<DeclarationNode>>>,
    by_origin: RwLock<FxHashMap<DeclarationOrigin, DeclId>>,
}

impl DeclarationFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the node for an origin, creating it on first access.
    ///
    /// Concurrent first-writes race on `make`; the loser's node is discarded
    /// and the winner's id is returned, so referential identity holds.
    pub fn get_or_create(
        &self,
        origin: &DeclarationOrigin,
        make: impl FnOnce() -> DeclarationNode,
    ) -> DeclId {
        if let Some(existing) = self.by_origin.read().get(origin) {
            return *existing;
        }

        // Construct outside the write lock; cheap because all node facts are
        // computed lazily.
        let node = Arc::new(make());

        let mut by_origin = self.by_origin.write();
        if let Some(existing) = by_origin.get(origin) {
            // Lost the race: discard our node, return the winner's.
            return *existing;
        }
        let mut nodes = self.nodes.write();
        let id = DeclId::new(nodes.len());
        nodes.push(node);
        by_origin.insert(origin.clone(), id);
        tracing::trace!(%id, "declaration node created");
        id
    }

    /// Look up an existing node id for an origin.
    pub fn lookup(&self, origin: &DeclarationOrigin) -> Option<DeclId> {
        self.by_origin.read().get(origin).copied()
    }

    /// Get a node by id. The id must come from this factory.
    pub fn node(&self, id: DeclId) -> Arc<DeclarationNode> {
        Arc::clone(&self.nodes.read()[id.index()])
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SymbolId;
    use crate::model::declaration::DeclarationKind;

    fn origin(n: usize) -> DeclarationOrigin {
        DeclarationOrigin::Symbol(SymbolId::new(n))
    }

    fn node(origin: DeclarationOrigin) -> DeclarationNode {
        DeclarationNode::new(DeclarationKind::Method, origin, None)
    }

    #[test]
    fn test_get_or_create_memoizes() {
        let factory = DeclarationFactory::new();
        let a = factory.get_or_create(&origin(1), || node(origin(1)));
        let b = factory.get_or_create(&origin(1), || node(origin(1)));
        assert_eq!(a, b);
        assert_eq!(factory.len(), 1);
    }

    #[test]
    fn test_distinct_origins_distinct_nodes() {
        let factory = DeclarationFactory::new();
        let a = factory.get_or_create(&origin(1), || node(origin(1)));
        let b = factory.get_or_create(&origin(2), || node(origin(2)));
        assert_ne!(a, b);
        assert_eq!(factory.len(), 2);
    }

    #[test]
    fn test_concurrent_get_or_create_single_identity() {
        use std::sync::Arc as StdArc;
        let factory = StdArc::new(DeclarationFactory::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let factory = StdArc::clone(&factory);
            handles.push(std::thread::spawn(move || {
                factory.get_or_create(&origin(7), || node(origin(7)))
            }));
        }
        let ids: Vec<DeclId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(factory.len(), 1);
    }
}
