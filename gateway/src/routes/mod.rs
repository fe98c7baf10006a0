pub mod health;
pub mod mcp;
pub mod result;
pub mod zeopp;
