pub mod math;
pub mod graphics;
pub mod framework;
pub mod window;
pub mod demos;
pub mod config;
