pub(crate) const BANNER: &str = "LEDGER NODE";
pub(crate) const DEFAULT_LISTEN: &str = "127.0.0.1:2000";
pub(crate) const DEFAULT_DATA_DIR: &str = "./data";
pub(crate) const RESET_COMPLETE: &str = "RESET COMPLETE";
