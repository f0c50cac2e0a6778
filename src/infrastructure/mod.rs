// Infrastructure layer - External dependencies and adapters
pub mod alerta_repository;
pub mod config;
