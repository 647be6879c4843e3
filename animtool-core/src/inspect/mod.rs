//! Read-only queries over a decoded animation.

pub(crate) mod count;
pub(crate) mod info;
pub(crate) mod opacity;
