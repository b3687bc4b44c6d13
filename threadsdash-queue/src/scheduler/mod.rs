pub mod assign;
pub mod slots;
