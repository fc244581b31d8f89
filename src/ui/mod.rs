pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    dim, emit_json, header, info, section, status, success, summary_row, warn, OutputMode,
};
pub use progress::Spinner;
pub use table::{edges_table, nodes_table, packages_table, stats_table, TableBuilder};
pub use theme::{theme, Theme};
