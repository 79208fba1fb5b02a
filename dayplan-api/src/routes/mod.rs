/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, logout, refresh)
/// - `users`: Profile endpoints (me, profile, password, picture)
/// - `tasks`: Task scheduling and completion endpoints

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
