/// Route handlers, one module per resource
///
/// - `health`: liveness and database status
/// - `auth`: signup, login, demo login, logout
/// - `dashboard`: family overview
/// - `transactions`: transaction CRUD
/// - `budgets`: budget grid, limits, purchase requests and votes
/// - `goals`: savings goals
/// - `subscriptions`: recurring charges
/// - `notifications`: the caller's inbox
/// - `family`: members, invites and joining
/// - `settings`: profile and password
/// - `categorize`: category suggestions

pub mod auth;
pub mod budgets;
pub mod categorize;
pub mod dashboard;
pub mod family;
pub mod goals;
pub mod health;
pub mod notifications;
pub mod settings;
pub mod subscriptions;
pub mod transactions;
