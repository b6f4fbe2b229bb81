/// Account and transfer record types shared by every store.
pub mod account;

/// Transfer requests and their validation into commands that [`engine`] executes.
pub mod command;

/// Applies transfer batches against a store, one store transaction per transfer.
pub mod engine;

/// Store interfaces plus "in memory" and SQLite implementations.
///
/// The engine only depends on [`store::TransferStore`], so it can run against
/// any backend, or a wrapper that injects failures in tests.
pub mod store;

/// Demonstration routines covering the whole store surface.
pub mod demo;

/// CSV input/output used by the binary. Lives in the library so integration
/// tests can drive it too.
pub mod bin_utils;
