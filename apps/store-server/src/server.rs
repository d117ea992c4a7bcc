//! # Listener
//!
//! Binds the TCP listener and runs the accept loop: one spawned task
//! per connection, no connection cap. Accept errors are logged and the
//! loop continues; only a failed bind is fatal.
//!
//! Graceful shutdown (ctrl-c in the binary): stop accepting, clear the
//! session registry. In-flight connections are not drained; an abrupt
//! stop may leave a sale logged-but-unapplied or the reverse, which is
//! accepted.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use store_db::{CustomerStore, EmployeeDirectory, InventoryStore, LineStore};

use crate::audit::AuditSink;
use crate::auth::AuthService;
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::handle_connection;
use crate::session::SessionRegistry;

/// Shared application state, one instance per process.
pub struct AppState {
    pub inventory: InventoryStore,
    pub customers: CustomerStore,
    pub auth: AuthService,
    pub sessions: Arc<SessionRegistry>,
    pub audit: AuditSink,
}

/// Wires the stores, auth, and audit sink over the configured
/// directories. Spawns the audit writer task.
pub fn build_state(config: &ServerConfig) -> Arc<AppState> {
    let data = &config.data_dir;

    let inventory = InventoryStore::new(LineStore::new(data.join("products.txt")));
    let customers = CustomerStore::new(
        LineStore::new(data.join("customers.txt")),
        LineStore::new(data.join("customer_stats.txt")),
    );
    let employees = Arc::new(EmployeeDirectory::new(LineStore::new(
        data.join("employees.txt"),
    )));

    let sessions = Arc::new(SessionRegistry::new());
    let auth = AuthService::new(employees, sessions.clone());
    let audit = AuditSink::spawn(config.log_dir.clone());

    Arc::new(AppState {
        inventory,
        customers,
        auth,
        sessions,
        audit,
    })
}

/// Accept loop. Runs until the shutdown future resolves.
pub async fn serve(
    state: Arc<AppState>,
    listener: TcpListener,
    shutdown: impl Future<Output = ()>,
) -> ServerResult<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "listening for store clients");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(handle_connection(state.clone(), stream, peer));
                }
                Err(e) => {
                    warn!(error = %e, "accept failed, continuing");
                }
            },
            _ = &mut shutdown => break,
        }
    }

    state.sessions.clear().await;
    info!("server shutdown complete");
    Ok(())
}
