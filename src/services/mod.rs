pub mod dashboard_service;
pub mod failure_cache;
pub mod listings_service;
pub mod price_service;
pub mod series_analytics;
