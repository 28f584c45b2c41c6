// Application layer - Use case interactors

pub mod container;
pub mod decrypt_interactor;
pub mod split_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use decrypt_interactor::DecryptInteractor;
pub use split_interactor::{SplitInteractor, SplitOptions, SplitResponse};
