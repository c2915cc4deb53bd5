pub mod class_names;
pub mod mask;

pub use class_names::{cn, ClassList};
pub use mask::{mask_email, mask_id};
