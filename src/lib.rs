//! Microgrid monitoring backend: CSV ingestion and cleaning, measurement
//! storage, KPI computation and the HTTP API feeding the dashboard.

pub mod api;
pub mod clock;
pub mod config;
pub mod domain;
pub mod forecast;
pub mod ingest;
pub mod kpi;
pub mod ml;
pub mod repo;
pub mod state;
pub mod telemetry;
