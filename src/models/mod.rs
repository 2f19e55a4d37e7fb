pub mod finding;
pub mod history;

pub use finding::*;
pub use history::*;
