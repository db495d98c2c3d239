mod inmemory;

pub use inmemory::InMemoryRoomStore;
