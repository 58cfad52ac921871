pub mod cloudinary;
pub mod db;
pub mod memory;
pub mod sessions;

pub use cloudinary::CloudinaryUrlBuilder;
pub use db::DbAdapter;
pub use memory::MemoryStore;
pub use sessions::InMemorySessionStore;
