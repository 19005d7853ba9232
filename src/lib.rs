/// Use mimalloc as the global allocator for all binaries.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod base64;
pub mod common;
