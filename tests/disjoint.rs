//! Property tests for the disjoint set, plus a Kruskal run over a model.

use edgeloom::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #[test]
    fn prop_fresh_and_cleared_sets_are_singletons(
        capacity in 1usize..200,
        pairs in prop::collection::vec((0usize..200, 0usize..200), 0..100),
    ) {
        let mut set: DisjointSet<u32> = DisjointSet::new(capacity);
        for i in 0..capacity {
            prop_assert_eq!(set.find(i).unwrap(), i);
        }

        for (a, b) in pairs {
            if a < capacity && b < capacity {
                set.union(a, b).unwrap();
            }
        }
        set.clear();
        prop_assert_eq!(set.number_of_trees(), capacity);
        prop_assert_eq!(set.number_of_elements(), 0);
        for i in 0..capacity {
            prop_assert_eq!(set.find(i).unwrap(), i);
        }
    }

    #[test]
    fn prop_union_merges_and_counts(
        pairs in prop::collection::vec((0usize..64, 0usize..64), 1..200),
    ) {
        let mut set: DisjointSet<()> = DisjointSet::new(64);
        for (a, b) in pairs {
            let before = set.number_of_trees();
            let distinct = set.find(a).unwrap() != set.find(b).unwrap();
            let merged = set.union(a, b).unwrap();

            prop_assert_eq!(merged, distinct);
            prop_assert_eq!(set.find(a).unwrap(), set.find(b).unwrap());
            let expected = if distinct { before - 1 } else { before };
            prop_assert_eq!(set.number_of_trees(), expected);
        }
    }
}

#[test]
fn test_out_of_range_is_rejected() {
    let mut set: DisjointSet<&str> = DisjointSet::new(4);
    assert!(set.find(4).unwrap_err().is_argument_error());
    assert!(set.union(0, 9).is_err());
    assert!(set.set(7, Some("x")).is_err());
    assert_eq!(set.number_of_trees(), 4);
}

/// Minimum spanning forest of a model, using the heap to order edges by cost and
/// the disjoint set to reject cycles.
#[test]
fn test_kruskal_over_model() -> Result<()> {
    let factory = DefaultModelFactory::new();
    let model = factory.create_model();
    let vertices: Vec<_> = (0..5)
        .map(|i| factory.create_vertex(i * 100, 0, 0, 0.0))
        .collect();
    let links = [(0, 1, 4.0), (1, 2, 1.0), (0, 2, 3.0), (2, 3, 2.0), (3, 4, 7.0), (1, 4, 5.0)];

    model.start_transaction()?;
    for vertex in &vertices {
        model.add_vertex(Arc::clone(vertex))?;
    }
    for (source, target, cost) in links {
        let edge = factory.create_edge(
            Arc::clone(&vertices[source]),
            Arc::clone(&vertices[target]),
            false,
        );
        edge.set_cost(cost);
        model.add_edge(edge)?;
    }
    model.end_transaction()?;

    let mut queue = FibonacciHeap::new();
    for edge in model.edges() {
        let cost = edge.cost();
        queue.insert(edge, cost);
    }

    let mut forest: DisjointSet<Arc<Vertex>> = DisjointSet::new(model.vertex_count());
    for (index, vertex) in model.vertices().into_iter().enumerate() {
        forest.set(index, Some(vertex))?;
    }

    let mut total = 0.0;
    let mut chosen = 0;
    while let Some(edge) = queue.remove_min() {
        let (Some(source), Some(target)) =
            (model.index_of(edge.source()), model.index_of(edge.target()))
        else {
            continue;
        };
        if forest.union(source, target)? {
            total += edge.cost();
            chosen += 1;
        }
    }

    assert_eq!(chosen, 4);
    assert_eq!(total, 1.0 + 2.0 + 3.0 + 5.0);
    assert_eq!(forest.number_of_trees(), 1);
    assert_eq!(forest.number_of_elements(), 5);
    assert_eq!(forest.index_of(&vertices[3]), Some(3));
    Ok(())
}
