//! Analysis modules.
//!
//! Pure transformations over metric trees: averaging several records,
//! pruning leaves below a threshold, and building the filtered view.

pub mod aggregator;
pub mod presence;
pub mod threshold;
pub mod view;

pub use aggregator::average;
pub use presence::{is_empty, record_is_empty};
pub use threshold::collect_scalar_leaves;
pub use view::{build_view, title_case};
