pub mod db;
pub mod rabbitmq;
