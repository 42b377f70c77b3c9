//! Keyword families.
//!
//! Each module parses its keywords into [`crate::node::SchemaNode`] fields through a
//! `compile` function and checks them against instances through a `validate` function driven
//! by [`crate::vm::Vm`].
pub(crate) mod array;
pub(crate) mod combinators;
pub(crate) mod enum_;
pub(crate) mod helpers;
pub(crate) mod numeric;
pub(crate) mod object;
pub(crate) mod ref_;
pub(crate) mod string;
pub(crate) mod type_;
pub(crate) mod unique_items;
