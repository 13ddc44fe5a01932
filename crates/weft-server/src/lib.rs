pub mod adapter;
pub mod routes;
pub mod rpc;
pub mod server;
pub mod state;

pub use adapter::Adapter;
pub use server::A2aServer;
pub use state::AppState;
