pub(crate) mod doc;
pub(crate) mod layer;
pub(crate) mod patch;
pub(crate) mod record;
