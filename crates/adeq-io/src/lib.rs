//! # adeq-io: File Contracts of the Weekly Core
//!
//! Collaborator-facing loaders: the INI-like section reader used by cluster
//! catalogs, the short-term-storage additional-constraints loader (section
//! file plus `rhs_<block>.txt` side files), and the YAML run-parameters
//! loader.

pub mod constraints;
pub mod ini;
pub mod parameters;

pub use constraints::{load_additional_constraints, number_additional_constraints};
pub use ini::{IniFile, IniSection};
pub use parameters::{load_parameters, parse_parameters};
