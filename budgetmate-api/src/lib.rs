//! # BudgetMate API Server Library
//!
//! HTTP surface of BudgetMate: configuration, the router, session
//! authentication and the JSON handlers. Domain logic lives in
//! `budgetmate-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Form extraction with validation
//! - `middleware`: Session authentication and security headers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
