// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use phloem_graph::intern::NameTable;
use phloem_graph::{DepGraph, DirtySet, Scratch, Topology};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn gen_range_usize(&mut self, upper_exclusive: usize) -> usize {
        if upper_exclusive == 0 {
            return 0;
        }
        (self.next_u32() as usize) % upper_exclusive
    }
}

fn build_dag(n: u32, edges_per_node: u32, seed: u64) -> DepGraph<u32> {
    let mut graph = DepGraph::new();
    let mut rng = Lcg::new(seed);

    // Ensure a DAG by only depending `from -> to` where `to < from`.
    let mut deps = Vec::new();
    for from in 1..n {
        deps.clear();
        let out = edges_per_node.min(from);
        for _ in 0..out {
            deps.push(rng.gen_range_usize(from as usize) as u32);
        }
        graph.insert(from, &deps);
    }

    graph
}

fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("phloem_graph");
    group.sample_size(50);

    for &(n, edges_per_node) in &[
        (256_u32, 1_u32),
        (256_u32, 4_u32),
        (4_096_u32, 1_u32),
        (4_096_u32, 4_u32),
    ] {
        group.bench_function(format!("mark_and_affect(n={n},e={edges_per_node})"), |b| {
            b.iter_batched(
                || build_dag(n, edges_per_node, 0xF10E_0000_0000_0001),
                |graph| {
                    let mut dirty = DirtySet::new();
                    dirty.mark(0_u32);
                    let affected = graph.affected(dirty.drain(), false);
                    black_box(affected);
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(
            format!("affect_with_scratch(n={n},e={edges_per_node})"),
            |b| {
                b.iter_batched(
                    || build_dag(n, edges_per_node, 0xF10E_0000_0000_0002),
                    |graph| {
                        let mut scratch = Scratch::with_capacity(n as usize / 2);
                        let mut out = Vec::with_capacity(n as usize / 2);
                        graph.affected_into([0_u32], false, &mut scratch, &mut out);
                        black_box(out);
                    },
                    BatchSize::LargeInput,
                );
            },
        );

        group.bench_function(format!("topology_build(n={n},e={edges_per_node})"), |b| {
            b.iter_batched(
                || build_dag(n, edges_per_node, 0xF10E_0000_0000_0003),
                |graph| {
                    let topo = Topology::build(&graph).expect("generated graphs are acyclic");
                    black_box(topo);
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(
            format!("affect_and_order(n={n},e={edges_per_node})"),
            |b| {
                b.iter_batched(
                    || {
                        let graph = build_dag(n, edges_per_node, 0xF10E_0000_0000_0004);
                        let topo =
                            Topology::build(&graph).expect("generated graphs are acyclic");
                        (graph, topo)
                    },
                    |(graph, topo)| {
                        let mut affected = graph.affected([0_u32], false);
                        topo.sort(&mut affected);
                        black_box(affected);
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_intern(c: &mut Criterion) {
    let mut group = c.benchmark_group("phloem_intern");
    group.sample_size(50);

    let names: Vec<String> = (0..1_024).map(|i| format!("node_{i}")).collect();

    group.bench_function("intern_fresh(n=1024)", |b| {
        b.iter_batched(
            NameTable::new,
            |mut table| {
                for name in &names {
                    black_box(table.intern(name));
                }
                black_box(table);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("intern_hit(n=1024)", |b| {
        let mut table = NameTable::new();
        for name in &names {
            table.intern(name);
        }
        b.iter(|| {
            for name in &names {
                black_box(table.lookup(name));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_graph, bench_intern);
criterion_main!(benches);
