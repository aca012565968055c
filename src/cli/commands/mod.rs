mod apply;
mod presets;
mod scan;
mod settings;

pub use apply::apply_preset;
pub use presets::list_presets;
pub use scan::scan;
pub use settings::show_settings;
