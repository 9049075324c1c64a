//! History of saved submissions, newest first.

use dioxus::prelude::*;
use tracing::Level;

use crate::api::load_history;
use crate::components::gallery::AssetGrid;
use crate::log;
use crate::model::{tiles, Payload, Record};

#[component]
pub fn HistoryViewer() -> Element {
    let mut entries = use_signal(Vec::<Record>::new);
    let mut loading = use_signal(|| false);
    let mut loaded = use_signal(|| false);
    let mut error = use_signal(|| None::<String>);
    let mut selected = use_signal(|| None::<usize>);

    let selected_record = use_memo(move || {
        let index = (*selected.read())?;
        entries.read().get(index).cloned()
    });

    rsx! {
        section { class: "card-cosmic p-6 mb-6",
            div { class: "flex items-center justify-between mb-4",
                h2 { class: "text-xl font-bold text-star-white", "Gallery History" }
                button {
                    class: "btn-nebula",
                    disabled: *loading.read(),
                    onclick: move |_| {
                        loading.set(true);
                        error.set(None);
                        selected.set(None);
                        spawn(async move {
                            match load_history().await {
                                Ok(mut records) => {
                                    log::app_log(Level::INFO, format!("History: {} records", records.len()));
                                    records.reverse();
                                    entries.set(records);
                                }
                                Err(e) => {
                                    log::app_log(Level::ERROR, format!("History load failed: {}", e));
                                    error.set(Some(format!("Failed to load data from log: {}", e)));
                                }
                            }
                            loaded.set(true);
                            loading.set(false);
                        });
                    },
                    if *loading.read() { "Loading..." } else { "Load Gallery from Log" }
                }
            }

            {error.read().as_ref().map(|msg| rsx! {
                p { class: "text-warning-red mb-3", "{msg}" }
            })}

            if *loaded.read() && entries.read().is_empty() && error.read().is_none() {
                div { class: "empty-state p-8 text-center",
                    p { class: "text-stardust", "No Data Found" }
                }
            }

            if !entries.read().is_empty() {
                div { class: "overflow-x-auto",
                    table { class: "table-cosmic",
                        thead {
                            tr {
                                th { "Timestamp" }
                                th { "Title" }
                                th { "Actions" }
                            }
                        }
                        tbody {
                            for (index, entry) in entries.read().clone().into_iter().enumerate() {
                                tr {
                                    key: "{index}",
                                    class: if *selected.read() == Some(index) { "row-selected" } else { "" },
                                    td { class: "td-nowrap text-stardust", title: "{entry.timestamp}", "{entry.display_timestamp()}" }
                                    td { class: "text-star-white", "{entry.title}" }
                                    td {
                                        button {
                                            class: "btn-cosmic text-sm",
                                            onclick: move |_| selected.set(Some(index)),
                                            "View"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            {selected_record.read().as_ref().map(|record| rsx! {
                RecordDetail { record: record.clone(), on_close: move |_| selected.set(None) }
            })}
        }
    }
}

#[component]
fn RecordDetail(record: Record, on_close: EventHandler<MouseEvent>) -> Element {
    let raw = record.payload.display_text();
    rsx! {
        div { class: "mt-6",
            div { class: "flex items-center justify-between mb-3",
                h3 { class: "text-lg font-semibold text-star-white", "{record.title}" }
                button {
                    class: "btn-cosmic text-sm",
                    onclick: move |evt| on_close.call(evt),
                    "Close"
                }
            }
            {match &record.payload {
                Payload::Json(value) => rsx! { AssetGrid { tiles: tiles(value) } },
                Payload::Unparsed(_) => rsx! {
                    p { class: "text-supernova-orange text-sm mb-2", "Stored payload is not valid JSON; showing raw text." }
                },
            }}
            pre { class: "json-display", "{raw}" }
        }
    }
}
