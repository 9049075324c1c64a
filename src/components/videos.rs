use dioxus::prelude::*;

use crate::anchors;
use crate::model::VideoItem;

#[component]
pub fn VideoGallery() -> Element {
    let mut html_input = use_signal(String::new);
    let mut videos = use_signal(|| None::<Vec<VideoItem>>);
    let mut error = use_signal(|| None::<String>);

    rsx! {
        section { class: "gallery-container card-cosmic p-6 mb-6",
            div { class: "gallery-header flex items-center justify-between mb-4",
                h2 { class: "text-xl font-bold text-star-white", "Video Gallery" }
                if videos.read().is_some() {
                    button {
                        class: "btn-cosmic",
                        onclick: move |_| {
                            videos.set(None);
                            html_input.set(String::new());
                            error.set(None);
                        },
                        "Load New Data"
                    }
                }
            }

            {match videos.read().as_ref() {
                None => rsx! {
                    div { class: "input-section space-y-3",
                        textarea {
                            class: "json-textarea",
                            placeholder: "Paste your <ul><li><a> HTML here",
                            value: "{html_input}",
                            oninput: move |evt| html_input.set(evt.value())
                        }
                        {error.read().as_ref().map(|msg| rsx! {
                            p { class: "error-message text-warning-red", "{msg}" }
                        })}
                        button {
                            class: "btn-nebula",
                            onclick: move |_| {
                                let parsed = anchors::parse(&html_input.read());
                                match parsed {
                                    Ok(items) => {
                                        error.set(None);
                                        videos.set(Some(items));
                                    }
                                    Err(e) => error.set(Some(format!("Invalid HTML input. Please check your input. ({})", e))),
                                }
                            },
                            "Load Gallery"
                        }
                    }
                },
                Some(items) if items.is_empty() => rsx! {
                    div { class: "empty-state p-8 text-center",
                        p { class: "text-stardust", "No videos to display" }
                    }
                },
                Some(items) => rsx! {
                    div { class: "overflow-x-auto",
                        table { class: "table-cosmic video-table",
                            thead {
                                tr {
                                    th { "#" }
                                    th { "Title" }
                                    th { "URL" }
                                }
                            }
                            tbody {
                                for (index, video) in items.iter().enumerate() {
                                    tr { key: "{index}",
                                        td { {(index + 1).to_string()} }
                                        td { class: "text-star-white", "{video.title}" }
                                        td {
                                            a {
                                                href: "{video.url}",
                                                target: "_blank",
                                                rel: "noopener noreferrer",
                                                "{video.url}"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
            }}
        }
    }
}
