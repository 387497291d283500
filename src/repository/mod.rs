//! Repository Layer
//!
//! Data access over the remote API or the local store.

mod local;
mod remote;
mod traits;

pub use local::LocalRepository;
pub use remote::RemoteRepository;
pub use traits::{RepoResult, Repository, RepositoryError};
