pub mod db;
pub mod glucose;
pub mod insights;
pub mod models;
pub mod mood;
pub mod planner;
pub mod router;
pub mod seed;
pub mod service;
