pub mod archive;
pub mod commands;
pub mod copy_plan;
pub mod graph;
pub mod package;
pub mod report;
pub mod resolver;
pub mod runtime;
