pub mod poll;
pub mod uri;
