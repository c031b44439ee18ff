// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/*
// Middleware: JWT validation injects AuthUser; each handler checks roles.
pub mod grades;
