pub(crate) mod psd;
