pub mod assembler;
pub mod indicators;
pub mod normalizer;
pub mod pipeline;
pub mod scheduler;
pub mod scores;
pub mod targets;
