// Presentation layer - Command line surface and output rendering
pub mod cli;
pub mod render;
