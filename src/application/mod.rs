// Application layer - Use cases over the forecast repository
pub mod forecast_repository;
pub mod hydrometric_service;
pub mod wind_service;
