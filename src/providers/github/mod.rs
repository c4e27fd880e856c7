mod client;
mod provider;
pub mod types;

pub use provider::GitHubProvider;
pub use types::ReleaseDto;
