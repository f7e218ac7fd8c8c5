pub mod backend_client;
pub mod bulk;
pub mod clock;
pub mod importer;
pub mod progress;
