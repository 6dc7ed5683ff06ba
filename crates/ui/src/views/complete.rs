use dioxus::prelude::*;

use super::rating::ProgressBar;

#[component]
pub fn CompletePanel() -> Element {
    rsx! {
        div { class: "complete",
            ProgressBar { percent: 100.0 }
            h2 { class: "complete__title", "All photos rated" }
            p { class: "complete__subtitle", "Thank you for taking part!" }
        }
    }
}

#[component]
pub fn NoImagesPanel() -> Element {
    rsx! {
        div { class: "empty",
            p { class: "empty__message", "No photos were found." }
        }
    }
}
