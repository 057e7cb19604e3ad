//! The constraint families of the weekly problem.
//!
//! Each group is one function that iterates its entities and drives the
//! [`ConstraintBuilder`](crate::builder::ConstraintBuilder). The same code
//! runs for the sizing pass and the emission pass; only the builder mode
//! differs. Row numbers are recorded into the constraint tables (and names
//! tagged) only when the builder hands one back, i.e. in emission mode.
//!
//! [`run_constraint_groups`] fixes the canonical group order; every pass
//! of a week must use it so row numbers line up.

pub mod balance;
pub mod binding;
pub mod hydro;
pub mod reserves;
pub mod storage;
pub mod thermal;

use crate::builder::ConstraintBuilder;
use crate::context::EntityView;
use crate::indexing::ConstraintCorrespondence;
use crate::naming::NameTagger;

/// Run every constraint group in the canonical order.
pub fn run_constraint_groups(
    view: &EntityView,
    rows: &mut ConstraintCorrespondence,
    builder: &mut ConstraintBuilder,
    tagger: &mut NameTagger,
) {
    balance::add_all(view, rows, builder, tagger);
    thermal::add_all(view, rows, builder, tagger);
    hydro::add_all(view, rows, builder, tagger);
    storage::add_all(view, rows, builder, tagger);
    reserves::add_all(view, rows, builder, tagger);
    binding::add_all(view, rows, builder, tagger);
}
