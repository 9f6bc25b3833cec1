pub mod controller;
pub mod event;
pub mod level;
pub mod session;
pub mod timer;
