//! strongroom-vault: the vault engine
//!
//! Composes the crypto core and the blob store into the three externally
//! visible capabilities:
//!   - the wrapper builder (`create_wrapper` / `open_wrapper`): pure,
//!     synchronous record assembly and opening;
//!   - the async [`Vault`] service: upload/download/delete/list against a
//!     [`strongroom_storage::BlobStore`], with KDF work kept off the I/O
//!     runtime;
//!   - the [`Reconciler`]: the eventual-consistency sweep across the two
//!     blob namespaces.

pub mod reconcile;
pub mod service;
pub mod wrapper;

pub use reconcile::{Reconciler, SweepReport};
pub use service::{Unsealed, Vault};
pub use wrapper::{create_wrapper, open_wrapper, SealedObject, MIN_PASSWORD_LEN};

// Collaborator contract for the (external) credential-issuing layer.
pub use strongroom_crypto::generate_password;
