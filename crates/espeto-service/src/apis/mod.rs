//! API handler modules.

/// Order endpoints for the operator dashboard.
pub mod pedidos;
