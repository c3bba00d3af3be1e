mod challenge;
mod credentials;
mod record;

pub use challenge::*;
pub use credentials::*;
pub use record::*;
