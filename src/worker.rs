//! Worker that owns one handler per event category and dispatches events.

use color_eyre::Result;
use std::sync::Arc;
use tracing::{error, warn};

use crate::event::{Event, EventHandler, FetchOutcome};
use crate::intercept::types::Intercepted;
use crate::intercept::InterceptService;
use crate::lifecycle::Lifecycle;
use crate::net::HttpClient;
use crate::notify::NotificationDispatcher;
use crate::platform::{NotificationSurface, WindowSurface};
use crate::queue::RecordQueue;
use crate::replay::{ReplayCoordinator, SyncTransport};
use crate::store::StoreBackend;

/// The worker: one interception service, one lifecycle manager, one
/// notification dispatcher and one replay coordinator, all registered at
/// construction. Each event runs on its own task, suspending only at its
/// own I/O boundaries.
pub struct Worker<S, N, W, Q, T>
where
  S: StoreBackend + 'static,
  N: NotificationSurface + 'static,
  W: WindowSurface + 'static,
  Q: RecordQueue + 'static,
  T: SyncTransport + 'static,
{
  service: Arc<InterceptService<S>>,
  lifecycle: Arc<Lifecycle<S, W>>,
  notifier: Arc<NotificationDispatcher<N, W>>,
  replay: Arc<ReplayCoordinator<Q, T>>,
  client: HttpClient,
}

impl<S, N, W, Q, T> Worker<S, N, W, Q, T>
where
  S: StoreBackend + 'static,
  N: NotificationSurface + 'static,
  W: WindowSurface + 'static,
  Q: RecordQueue + 'static,
  T: SyncTransport + 'static,
{
  pub fn new(
    service: Arc<InterceptService<S>>,
    lifecycle: Arc<Lifecycle<S, W>>,
    notifier: Arc<NotificationDispatcher<N, W>>,
    replay: Arc<ReplayCoordinator<Q, T>>,
    client: HttpClient,
  ) -> Self {
    Self {
      service,
      lifecycle,
      notifier,
      replay,
      client,
    }
  }

  /// Main loop: dispatch events until the channel closes.
  pub async fn run(&self, mut events: EventHandler) -> Result<()> {
    while let Some(event) = events.next().await {
      self.dispatch(event);
    }
    Ok(())
  }

  /// Dispatch one event onto its own task.
  pub fn dispatch(&self, event: Event) {
    match event {
      Event::Activate => {
        let lifecycle = Arc::clone(&self.lifecycle);
        let client = self.client.clone();

        tokio::spawn(async move {
          let result = lifecycle
            .activate(|url| {
              let client = client.clone();
              async move { client.fetch_shell(url).await }
            })
            .await;
          if let Err(e) = result {
            error!("version activation failed: {}", e);
          }
        });
      }

      Event::Fetch { request, reply } => {
        let service = Arc::clone(&self.service);

        tokio::spawn(async move {
          let outcome = match service.handle(&request).await {
            Ok(Intercepted::Handled(response)) => FetchOutcome::Handled(response),
            Ok(Intercepted::Passthrough) => FetchOutcome::Passthrough,
            Err(e) => FetchOutcome::Failed {
              error: e.to_string(),
            },
          };
          let _ = reply.send(outcome);
        });
      }

      Event::Push { payload } => {
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
          if let Err(e) = notifier.on_push(payload.as_deref()).await {
            warn!("failed to display push notification: {}", e);
          }
        });
      }

      Event::NotificationAction { action, tag, data } => {
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
          if let Err(e) = notifier.on_action(&action, &tag, &data).await {
            warn!("failed to route notification action: {}", e);
          }
        });
      }

      Event::Sync { tag } => {
        let replay = Arc::clone(&self.replay);

        tokio::spawn(async move {
          if let Err(e) = replay.on_sync(&tag).await {
            // The signal mechanism retries the whole replay later
            warn!("deferred replay failed: {}", e);
          }
        });
      }
    }
  }
}
