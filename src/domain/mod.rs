// Domain layer - Series alignment, viewport state and chart models
pub mod aligner;
pub mod chart;
pub mod export;
pub mod series;
pub mod station;
pub mod viewport;
