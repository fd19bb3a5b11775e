pub mod use_cases;

pub use use_cases::auth::{AuthUseCase, LoginResult};
pub use use_cases::clean_file::{CleanFileUseCase, CleaningOutcome};
pub use use_cases::cleaning_pipeline::clean;
