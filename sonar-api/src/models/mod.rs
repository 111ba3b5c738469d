pub mod issue;
pub mod search;
pub mod severity;

pub use issue::*;
pub use search::*;
pub use severity::*;
