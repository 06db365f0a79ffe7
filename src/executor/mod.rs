pub mod apps;
pub mod coordinator;
pub mod dispatcher;
pub mod input;
pub mod safety;
