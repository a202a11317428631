//! Sends a few fake new-document announcements through the configured
//! channels (log only when no channel is enabled).

use paperless_status::{NewDocumentEvent, NotifierMux};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();
    let mux = NotifierMux::from_env();
    tracing::info!(channels = ?mux.channel_names(), "notify-demo");

    // 1x1 transparent PNG
    let tiny_png = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    let docs = [
        (9001, "Demo invoice", Some(tiny_png)),
        (9002, "Demo letter without preview", None),
    ];

    for (id, title, preview) in docs {
        let ev = NewDocumentEvent {
            document_id: id,
            title: title.to_string(),
            created: Some(chrono::Utc::now().to_rfc3339()),
            preview: preview.map(str::to_string),
        };
        mux.announce(&ev).await;
        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    }

    println!("notify-demo done");
}
