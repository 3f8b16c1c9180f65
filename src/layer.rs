pub(crate) mod arc_layer;
pub(crate) mod config;
