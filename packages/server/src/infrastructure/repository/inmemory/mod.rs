pub mod ephemeral_store;
pub mod room_directory;

pub use ephemeral_store::InMemoryEphemeralStore;
pub use room_directory::InMemoryRoomDirectory;
