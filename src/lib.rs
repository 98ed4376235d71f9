pub mod clip;
pub mod logging;
