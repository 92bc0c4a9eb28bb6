pub mod pagination;
pub mod pii;

pub use pagination::{Page, PageRequest};
pub use pii::Masked;
