//! Global allocator.
//!
//! The binary runs on mimalloc. Handlers allocate a request buffer, a
//! plaintext buffer and a few small strings per connection, and free them all
//! when the connection closes; mimalloc handles that churn across the tokio
//! worker threads better than the system allocator.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
