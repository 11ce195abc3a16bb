use std::time::Duration;

use browser::{LaunchOptions, Session};
use moorage_core::Trigger;
use moorage_waits::{WaitConfig, Waiter};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let session = Session::launch(LaunchOptions::default()).await?;
    let waiter = Waiter::new(WaitConfig::default());
    let cancel = CancellationToken::new();
    let timeout = Duration::from_secs(30);

    println!("navigating to example.com...");
    session
        .navigate(&waiter, &cancel, "https://example.com/", timeout)
        .await?;

    // Follow the first link and wait until the next document is actually
    // ready, not just requested.
    println!("following the first link...");
    let driver = session.driver();
    let triggers = [Trigger::Click {
        selector: "a".to_string(),
    }];
    waiter
        .await_response(&driver, &cancel, "https://www.iana.org/", timeout, &triggers)
        .await?;

    session.screenshot("/tmp/moorage-example.png").await?;
    println!("saved /tmp/moorage-example.png");

    session.close().await?;
    Ok(())
}
