//! The reqwest-backed transport for the DAC platform API Client (component
//! B, spec §4.2). Implements `recon_core::DacApiClient` over a single HTTP
//! connection pool, with the three cross-cutting concerns as wrapping
//! layers rather than per-endpoint code: bearer auth from the shared
//! `TokenManager`, throttling through the shared `RateLimiter`, and
//! response interception (401 re-acquire-and-retry, 429/504/connection-reset
//! single retry, 400/404 mapped directly, other 5xx as `ServerError`).

mod transport;

pub use transport::HttpDacApiClient;
