//! In-process session store.

pub mod session_repository;

pub use session_repository::InMemorySessionRepository;
