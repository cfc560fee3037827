//! Application Runner
//!
//! Shows the connection dialog when no API key is stored, then mounts the
//! floating favorites toolbar and dispatches its events until shutdown.

use anyhow::Result;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::Duration;

use crate::api::ChartClient;
use crate::business::{default_catalog, Document};
use crate::data::{AppConfig, CredentialStore, SharedStore};
use crate::ui::connection_dialog::{ConnectionDialog, DialogEvent};
use crate::ui::console::{run_connection_dialog, StdinInput};
use crate::ui::floating_toolbar::{FloatingToolbar, ToolbarEvent};
#[cfg(not(target_os = "windows"))]
use crate::ui::overlay::HeadlessOverlay;
use crate::ui::overlay::{OverlayHost, OverlayInput};

/// Frame interval of the toolbar event loop
const FRAME: Duration = Duration::from_millis(16);

/// Run the application
pub async fn run_app(config: AppConfig, store: SharedStore, mut document: Document) -> Result<()> {
    let credentials = CredentialStore::new(store.clone(), config.connection.default_host.clone());
    let client = ChartClient::new(Duration::from_secs(config.connection.request_timeout_secs))?;

    if credentials.api_key().is_some() {
        tracing::info!("Using stored API key for {}", credentials.host_url());
    } else {
        let (dialog_tx, dialog_rx) = channel();
        let mut dialog = ConnectionDialog::new(credentials.clone(), dialog_tx);
        let mut input = StdinInput::new();
        run_connection_dialog(&mut dialog, &client, &mut input, &mut std::io::stdout()).await?;

        if !connected(&dialog_rx) {
            tracing::info!("Connection dialog closed without a key");
            return Ok(());
        }
        if !credentials.is_hydrated() {
            tracing::info!("Chart preferences will come from cloud sync");
        }
    }

    let palette = document.mount();
    if !config.floating_toolbar.enabled {
        tracing::info!("Floating toolbar disabled");
        tokio::signal::ctrl_c().await?;
        return Ok(());
    }

    let (toolbar_tx, toolbar_rx) = channel();

    #[cfg(target_os = "windows")]
    let (host, input_rx) = crate::ui::overlay_window::Win32Overlay::spawn();

    #[cfg(not(target_os = "windows"))]
    let (host, input_rx, _input_tx) = {
        let viewport = crate::business::Size::new(
            config.floating_toolbar.viewport_width,
            config.floating_toolbar.viewport_height,
        );
        let (input_tx, input_rx) = channel::<OverlayInput>();
        (HeadlessOverlay::new(viewport), input_rx, input_tx)
    };

    let mut toolbar = FloatingToolbar::new(store, host, palette, toolbar_tx);
    toolbar.set_catalog(default_catalog());
    toolbar.set_favorites(config.floating_toolbar.favorites.clone());
    toolbar.render();
    tracing::info!("Floating toolbar mounted at {:?}", toolbar.position());

    run_toolbar(&mut toolbar, input_rx, toolbar_rx).await?;

    tracing::info!("Application exiting");
    Ok(())
}

/// Whether the dialog reported a saved key
fn connected(events: &Receiver<DialogEvent>) -> bool {
    events.try_iter().any(|event| match event {
        DialogEvent::Saved { .. } => {
            tracing::info!("Connected with a validated API key");
            true
        }
        DialogEvent::Closed => false,
    })
}

/// Pump overlay input and toolbar events until Ctrl+C or the overlay goes away
async fn run_toolbar<H: OverlayHost>(
    toolbar: &mut FloatingToolbar<H>,
    input_rx: Receiver<OverlayInput>,
    toolbar_rx: Receiver<ToolbarEvent>,
) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut frames = tokio::time::interval(FRAME);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                tracing::info!("Shutdown requested");
                return Ok(());
            }
            _ = frames.tick() => {
                if !pump(toolbar, &input_rx, &toolbar_rx) {
                    tracing::info!("Overlay closed");
                    return Ok(());
                }
            }
        }
    }
}

/// Apply all queued input. Returns false once the overlay hung up.
fn pump<H: OverlayHost>(
    toolbar: &mut FloatingToolbar<H>,
    input_rx: &Receiver<OverlayInput>,
    toolbar_rx: &Receiver<ToolbarEvent>,
) -> bool {
    loop {
        match input_rx.try_recv() {
            Ok(input) => toolbar.handle(input),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => return false,
        }
    }

    for event in toolbar_rx.try_iter() {
        match event {
            ToolbarEvent::ToolSelected(tool_id) => {
                tracing::info!("Active drawing tool: {}", tool_id);
                toolbar.set_active_tool(Some(tool_id));
                toolbar.render();
            }
        }
    }
    true
}
