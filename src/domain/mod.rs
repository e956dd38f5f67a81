pub mod content;
pub mod errors;
pub mod method;
pub mod value;
