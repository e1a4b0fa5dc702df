pub mod backend;
pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod normalizer;
pub mod time_window;
pub mod validator;
