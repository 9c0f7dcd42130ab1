//! Executable hook command

use tokio::sync::mpsc;
use tracing::info;

use super::Session;
use crate::error::Result;

/// Print execution requests from every node until the session is cancelled.
///
/// Each request is answered by the controller as it is read.
pub async fn hook(session: &Session, buffer: usize) -> Result<()> {
    let (inbound, mut requests) = mpsc::channel(buffer.max(1));
    session
        .controller
        .hook_executables(&session.cancel, inbound)
        .await?;

    info!(
        nodes = session.controller.registry().len(),
        "Hooked into all nodes, waiting for execute events"
    );

    let mut handled = 0usize;
    while let Some(request) = requests.recv().await {
        handled += 1;
        session.output.capability_request(&request);
    }

    info!(handled, "Executable hook finished");
    Ok(())
}
