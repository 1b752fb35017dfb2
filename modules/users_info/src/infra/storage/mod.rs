pub mod memory_repo;

pub use memory_repo::MemoryUsersRepository;
