pub mod api;
pub mod config;
pub mod controller;
pub mod domain;
pub mod publish;
pub mod repo;
pub mod simulation;
pub mod telemetry;
