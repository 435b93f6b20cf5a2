pub mod db;
pub mod messaging;
