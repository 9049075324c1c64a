#![allow(non_snake_case)]

mod anchors;
mod api;
#[cfg_attr(not(feature = "server"), allow(dead_code))]
mod codec;
mod components;
#[cfg(any(feature = "server", test))]
mod config;
#[cfg(feature = "server")]
mod db;
#[cfg(any(feature = "server", test))]
mod gist;
#[cfg(any(feature = "server", test))]
mod local;
mod log;
#[cfg(any(feature = "server", test))]
mod memory;
mod model;
#[cfg(any(feature = "server", test))]
mod store;

use dioxus::prelude::*;
use log::{app_logs_snapshot, LogEntry};

use api::server_logs;
use components::gallery::AssetGallery;
use components::history::HistoryViewer;
use components::videos::VideoGallery;

// ============================================================================
// Entry & root component
// ============================================================================

fn main() {
    #[cfg(feature = "server")]
    db::init();
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let mut logs_open = use_signal(|| false);
    let mut client_logs = use_signal(Vec::<LogEntry>::new);
    let mut remote_logs = use_signal(|| None::<Result<Vec<LogEntry>, String>>);

    let mut refresh_logs = move || {
        client_logs.set(app_logs_snapshot());
        remote_logs.set(None);
        spawn(async move {
            let fetched = server_logs().await.map_err(|e| e.to_string());
            remote_logs.set(Some(fetched));
        });
    };

    rsx! {
        document::Stylesheet { href: asset!("/assets/styles.css") }

        div { class: "bg-galaxy min-h-screen page-layout",
            nav { class: "nav-galaxy px-6 py-4",
                div { class: "container flex items-center justify-between flex-wrap gap-3",
                    h1 { class: "text-2xl font-bold text-star-white", "🖼️ Gist Gallery" }
                    button {
                        class: "btn-cosmic",
                        onclick: move |_| {
                            logs_open.set(true);
                            refresh_logs();
                        },
                        "📋 Logs"
                    }
                }
            }

            {if *logs_open.read() {
                rsx! {
                    div {
                        class: "fixed inset-0 z-50 flex items-center justify-center bg-black/60",
                        onclick: move |_| logs_open.set(false),
                        div {
                            class: "card-cosmic p-6 max-w-3xl w-full mx-4 max-h-[85vh] flex flex-col",
                            onclick: move |evt| { evt.stop_propagation(); },
                            h2 { class: "text-xl font-bold text-star-white mb-2", "📋 Logs" }
                            p { class: "text-stardust text-sm", "App and server activity. Re-open to refresh." }
                            div { class: "flex-1 overflow-y-auto font-mono text-xs bg-nebula-dark rounded-lg p-3 min-h-[200px] mt-3",
                                h3 { class: "text-moonlight font-semibold mb-1", "This page" }
                                LogLines { entries: client_logs.read().clone() }
                                h3 { class: "text-moonlight font-semibold mt-3 mb-1", "Server" }
                                {match remote_logs.read().as_ref() {
                                    None => rsx! { p { class: "text-stardust", "Loading..." } },
                                    Some(Ok(entries)) => rsx! { LogLines { entries: entries.clone() } },
                                    Some(Err(e)) => rsx! { p { class: "text-warning-red", "{e}" } },
                                }}
                            }
                            div { class: "flex gap-2 mt-4",
                                button {
                                    class: "btn-cosmic",
                                    onclick: move |_| refresh_logs(),
                                    "Refresh logs"
                                }
                                button {
                                    class: "btn-cosmic",
                                    onclick: move |_| logs_open.set(false),
                                    "Close"
                                }
                            }
                        }
                    }
                }
            } else {
                rsx! { }
            }}

            div { class: "container px-6 py-6",
                AssetGallery {}
                VideoGallery {}
                HistoryViewer {}
            }

            footer { class: "text-center text-stardust text-sm py-4",
                "Submissions are appended to a shared document log."
            }
        }
    }
}

#[component]
fn LogLines(entries: Vec<LogEntry>) -> Element {
    rsx! {
        for entry in entries.iter() {
            div { class: "log-line py-0.5",
                span { class: "text-stardust mr-2", "{entry.time}" }
                span { class: if entry.is_error() { "text-warning-red font-semibold" } else { "text-aurora-purple" }, "{entry.level}" }
                span { class: "text-moonlight ml-2", "{entry.message}" }
            }
        }
    }
}
