// mgc — Model Graph Compiler
//
// Library root. Model graph, navigation and loading first, then the backend
// passes: artifact naming, dependency graphs, partitions and serialization.

pub mod bootstrap;
pub mod config;
pub mod depgraph;
pub mod dot;
pub mod id;
pub mod loader;
pub mod m3;
pub mod model;
pub mod naming;
pub mod navigation;
pub mod partition;
pub mod pass;
pub mod pipeline;
pub mod registry;
pub mod serialize;
pub mod walk;
