//! Asset gallery: paste a JSON payload, view it as tiles, and save it to the log.

use dioxus::prelude::*;
use serde_json::Value;
use tracing::Level;

use crate::api::append_record;
use crate::log;
use crate::model::{normalize_submission, tiles, AssetTile};

#[derive(Debug, Clone, PartialEq)]
enum SaveStatus {
    Saving,
    Saved { attempts: u32 },
    Failed(String),
}

#[component]
pub fn AssetGallery() -> Element {
    let mut json_input = use_signal(String::new);
    let mut title_input = use_signal(String::new);
    let mut submitted = use_signal(|| None::<Value>);
    let mut error = use_signal(|| None::<String>);
    let mut save_status = use_signal(|| None::<SaveStatus>);

    let current_tiles = use_memo(move || submitted.read().as_ref().map(tiles).unwrap_or_default());

    rsx! {
        section { class: "gallery-container card-cosmic p-6 mb-6",
            div { class: "gallery-header flex items-center justify-between mb-4",
                h2 { class: "text-xl font-bold text-star-white", "Asset Gallery" }
                if submitted.read().is_some() {
                    button {
                        class: "btn-cosmic",
                        onclick: move |_| {
                            submitted.set(None);
                            json_input.set(String::new());
                            error.set(None);
                            save_status.set(None);
                        },
                        "Load New Data"
                    }
                }
            }

            if submitted.read().is_none() {
                div { class: "input-section space-y-3",
                    textarea {
                        class: "json-textarea",
                        placeholder: "Paste your JSON here, e.g. [{{\"defaultImageURL\": \"https://example.com/image.jpg\", \"imageURLs\": [\"https://example.com/image.jpg\"]}}]",
                        value: "{json_input}",
                        oninput: move |evt| json_input.set(evt.value())
                    }
                    input {
                        class: "w-full",
                        placeholder: "Title",
                        value: "{title_input}",
                        oninput: move |evt| title_input.set(evt.value())
                    }
                    {error.read().as_ref().map(|msg| rsx! {
                        p { class: "error-message text-warning-red", "{msg}" }
                    })}
                    button {
                        class: "btn-nebula",
                        onclick: move |_| {
                            let text = json_input.read().clone();
                            let payload = match serde_json::from_str::<Value>(&text) {
                                Ok(value) => normalize_submission(value),
                                Err(e) => {
                                    error.set(Some(format!("Invalid JSON format. Please check your input. ({})", e)));
                                    return;
                                }
                            };
                            error.set(None);
                            submitted.set(Some(payload.clone()));
                            save_status.set(Some(SaveStatus::Saving));
                            let title = title_input.read().clone();
                            spawn(async move {
                                match append_record(title.clone(), payload).await {
                                    Ok(receipt) => {
                                        log::app_log(Level::INFO, format!("Saved {:?} to log", title));
                                        save_status.set(Some(SaveStatus::Saved { attempts: receipt.attempts }));
                                    }
                                    Err(e) => {
                                        log::app_log(Level::ERROR, format!("Save {:?} failed: {}", title, e));
                                        save_status.set(Some(SaveStatus::Failed(e.to_string())));
                                    }
                                }
                            });
                        },
                        "Load Gallery"
                    }
                }
            }

            {match save_status.read().as_ref() {
                Some(SaveStatus::Saving) => rsx! { p { class: "text-stardust text-sm mb-3", "Saving to log..." } },
                Some(SaveStatus::Saved { attempts }) => rsx! {
                    p { class: "text-alien-green text-sm mb-3",
                        if *attempts > 1 { "Saved to log after {attempts} attempts." } else { "Saved to log." }
                    }
                },
                Some(SaveStatus::Failed(msg)) => rsx! { p { class: "text-warning-red text-sm mb-3", "Save failed: {msg}" } },
                None => rsx! { },
            }}

            if submitted.read().is_some() {
                AssetGrid { tiles: current_tiles.read().clone() }
            }
        }
    }
}

#[component]
pub fn AssetGrid(tiles: Vec<AssetTile>) -> Element {
    if tiles.is_empty() {
        return rsx! {
            div { class: "empty-state p-8 text-center",
                p { class: "text-stardust", "No assets to display" }
            }
        };
    }
    rsx! {
        div { class: "gallery-grid",
            for (index, tile) in tiles.into_iter().enumerate() {
                AssetCard { key: "{index}", index, tile }
            }
        }
    }
}

#[component]
fn AssetCard(index: usize, tile: AssetTile) -> Element {
    let number = index + 1;
    rsx! {
        div { class: "gallery-card",
            div { class: "preview-container",
                {match tile.preview_url.as_deref() {
                    Some(url) => rsx! { img { class: "preview-image", src: "{url}", alt: "Asset {number}" } },
                    None => rsx! {
                        div { class: "preview-fallback",
                            span { class: "text-4xl", "📄" }
                            p { "PDF Document" }
                        }
                    },
                }}
            }
            div { class: "card-content",
                p { class: "file-name", title: "{tile.file_name}", "{tile.file_name}" }
                a {
                    class: "url-display",
                    href: "{tile.default_url}",
                    target: "_blank",
                    rel: "noopener noreferrer",
                    "{tile.default_url}"
                }
            }
        }
    }
}
