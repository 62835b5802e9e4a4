// handlers/mod.rs - public system endpoints plus one module per admin resource.
//
// Public (no auth): / and /health
// Admin (session + admin role): /api/admin/{outlets,products,outlet-products}[/:id]
pub mod crud;
pub mod extract;
pub mod outlet_products;
pub mod outlets;
pub mod products;
pub mod system;
