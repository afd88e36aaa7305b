//! Profile directory core: the profile store, its form validation, durable
//! storage backends, and the map overlay state driven by front ends.

mod error;
mod input;
mod overlay;
mod profile;
mod storage;
mod store;
mod validation;

pub use error::StoreError;
pub use input::{CreateInput, ProfileInput, UpdateInput};
pub use overlay::{MapDisplay, MapOverlay, MapTarget, OverlayState, MAP_REVEAL_DELAY};
pub use profile::{Address, Profile};
pub use storage::{MemoryStorage, SledStorage, Storage, StorageError};
pub use store::{ProfileStore, DEFAULT_STORAGE_KEY};
pub use validation::{
    parse_coordinate, parse_interests, validate, ValidatedProfile, ValidationError,
    ValidationPolicy,
};
