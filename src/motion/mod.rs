pub mod ease;
pub mod presets;
pub mod spec;
