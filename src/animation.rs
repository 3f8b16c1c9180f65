pub(crate) mod driver;
pub(crate) mod interp;
pub(crate) mod schedule;
