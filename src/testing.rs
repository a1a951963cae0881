/// Every graph should implement `GraphNodeOrder` and `GraphEdgeOrder`
macro_rules! test_graph_ops {
    ($env:ident, $graph:ident, ($($trait:ident),*)) => {
        #[cfg(test)]
        mod $env {
            use crate::{ops::*, repr::*, node::*, edge::*, testing::test_graph_ops};
            use rand::{Rng, SeedableRng};
            use rand_pcg::Pcg64Mcg;
            use itertools::Itertools;

            /// Creates a list of at most `m_ub` random normalized edges for nodes `0..n`
            fn random_edges<R: Rng>(rng: &mut R, n: NumNodes, m_ub: NumEdges) -> Vec<Edge> {
                let mut edges: Vec<Edge> = (0..m_ub).map(|_| {
                    let u = rng.random_range(0..n);
                    let v = rng.random_range(0..n);

                    Edge(u, v).normalized()
                }).collect_vec();
                edges.sort_unstable();
                edges.dedup();

                edges
            }

            $(
                test_graph_ops!($graph: $trait);
            )*
        }
    };
    ($graph:ident: GraphNew) => {
        #[test]
        fn graph_new() {
            for n in 1..50 {
                let graph = <$graph>::new(n);

                assert_eq!(graph.number_of_edges(), 0);
                assert_eq!(graph.number_of_nodes(), n);

                assert_eq!(graph.vertices_range().len(), n as usize);
                assert_eq!(graph.vertices().collect_vec(), (0..n).collect_vec());
            }
        }
    };
    ($graph:ident: AdjacencyList) => {
        #[test]
        fn test_adjacency_list() {
            let rng = &mut Pcg64Mcg::seed_from_u64(3);

            for n in [10 as NumNodes, 20, 50] {
                for m_ub in [n * 2, n * 5, n * 10] {
                    for _ in 0..10 {
                        let edges = random_edges(rng, n, m_ub as NumEdges);

                        let mut adj_matrix: Vec<NodeBitSet> = vec![NodeBitSet::new(n); n as usize];
                        for &Edge(u, v) in &edges {
                            adj_matrix[u as usize].set_bit(v);
                            adj_matrix[v as usize].set_bit(u);
                        }

                        let graph = <$graph>::from_edges(n, edges.clone().into_iter());

                        let m = edges.len() as NumEdges;

                        assert_eq!(graph.number_of_nodes(), n);
                        assert_eq!(graph.number_of_edges(), m);
                        assert_eq!(graph.vertices_range().len(), n as usize);
                        assert_eq!(graph.vertices().collect_vec(), (0..n).collect_vec());

                        assert_eq!(edges, graph.ordered_edges(true).collect_vec());

                        for u in 0..n {
                            let row = &adj_matrix[u as usize];
                            assert_eq!(graph.degree_of(u), row.cardinality());
                            assert!(graph.neighbors_of(u).all(|v| row.get_bit(v)));
                        }
                    }
                }
            }
        }
    };
    ($graph:ident: GraphEdgeEditing) => {
        #[test]
        fn test_graph_edge_editing() {
            let rng = &mut Pcg64Mcg::seed_from_u64(3);

            for n in [10 as NumNodes, 20, 50] {
                for m_ub in [n * 2, n * 5, n * 10] {
                    for _ in 0..10 {
                        let edges = random_edges(rng, n, m_ub as NumEdges).into_iter();

                        let mut graph = <$graph>::new(n);

                        let mut adj_matrix: Vec<NodeBitSet> = vec![NodeBitSet::new(n); n as usize];

                        edges.for_each(|e| {
                            let Edge(u, v) = e;
                            adj_matrix[u as usize].set_bit(v);
                            graph.try_add_edge(u, v);

                            if u != v {
                                adj_matrix[v as usize].set_bit(u);
                            }
                        });

                        let rng = &mut Pcg64Mcg::seed_from_u64(4);

                        let mut m = graph.number_of_edges();
                        for _ in 0..(m / 2) {
                            let u = rng.random_range(0..n);
                            let v = rng.random_range(0..n);

                            if adj_matrix[u as usize].clear_bit(v) {
                                assert!(graph.try_remove_edge(u, v));
                                m -= 1;

                                if u != v {
                                    assert!(adj_matrix[v as usize].clear_bit(u));
                                }
                            }

                            assert_eq!(m, graph.number_of_edges());
                        }

                        graph.remove_edges_at_nodes(0..n);
                        assert!(graph.is_singleton_graph());
                    }
                }
            }
        }
    };
    ($graph:ident: GraphVertexEditing) => {
        #[test]
        fn test_graph_vertex_editing() {
            let mut graph = <$graph>::from_edges(3, [(0, 1), (1, 2)]);

            let u = graph.add_node();
            assert_eq!(u, 3);
            assert_eq!(graph.number_of_nodes(), 4);
            assert_eq!(graph.degree_of(u), 0);

            graph.add_edge(u, 0);
            assert!(graph.has_edge(0, u));
            assert_eq!(graph.number_of_edges(), 3);
        }
    };
}

pub(crate) use test_graph_ops;
