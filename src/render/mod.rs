pub(crate) mod batch;
pub(crate) mod composite;
pub(crate) mod flatten;
