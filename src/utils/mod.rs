pub mod cache;
pub mod db_utils;
