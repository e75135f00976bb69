//! Configuration types. Channel/storage/sandbox configuration (Telegram,
//! Discord, Postgres, container/Wasm sandboxes) had no counterpart in this
//! agent and was trimmed; only the provider-dialect config remains.

pub mod provider;
