pub mod events;
pub mod host;
pub mod options;
pub mod run;
pub mod targets;
