// Static tracked-object catalog
pub mod catalog;

// Configuration loading
pub mod config;

// Latest-state table and subscriber fan-out
pub mod state;

// Motion models and tick driver
pub mod simulation;

// HTTP, SSE and WebSocket APIs
pub mod api;

// WebSocket delivery sessions
pub mod subscription;
