use crate::commands::Out;
use crate::{server, Config, Result};

/// Hosts the dashboard page and the sync API over HTTP until interrupted. The configured
/// side-state file backs the server's store, so browser edits survive restarts.
pub async fn serve(config: Config, port: u16) -> Result<Out<()>> {
    let store = Box::new(config.store());
    server::run(config, store, port).await?;
    Ok(Out::new_message("Server stopped"))
}
