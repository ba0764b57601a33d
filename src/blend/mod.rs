pub(crate) mod math;
pub(crate) mod mode;
