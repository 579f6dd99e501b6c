pub mod agents;  // tenant provisioning endpoints
pub mod ask;     // question answering
pub mod health;  // liveness and version
pub mod pages;   // server-rendered tenant pages
