pub mod history_cache;
