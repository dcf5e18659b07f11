pub mod amount;

pub use amount::{
    apply_basis_points, format_amount, format_display, heuristic_fee, parse_amount, AmountError,
};
