//! Auth-domain identifiers, user capabilities, and token models.

pub mod id;
pub mod token;
pub mod user;

pub use id::*;
pub use token::{record::*, secret::*};
pub use user::*;
