//! Route handlers. Each takes the raw query string or form body and returns
//! the fragment the page swaps in.

pub mod memory;
pub mod util;
