// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (JWT auth, role checked per handler)
pub mod protected; // Tier 2: JWT authentication required (/api/*)
pub mod public; // Tier 1: No authentication required
