pub mod block;
pub mod entity;
pub mod layout;
pub mod rules;
