pub mod api;
pub mod cli;
pub mod completion;
pub mod core;
pub mod pdf;
pub mod session;
pub mod view;
