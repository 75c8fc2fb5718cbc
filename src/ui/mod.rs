pub mod input;
pub mod status;
pub mod terminal;
