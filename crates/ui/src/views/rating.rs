use dioxus::prelude::*;
use survey_core::model::Rating;

#[component]
pub fn RatingPanel(
    src: String,
    filename: String,
    caption: String,
    fraction: f64,
    on_rate: EventHandler<Rating>,
) -> Element {
    let percent = (fraction.clamp(0.0, 1.0) * 100.0).round();

    rsx! {
        div { class: "rating",
            ProgressBar { percent }
            p { class: "rating__hint", "Rate how appealing this photo is, from 1 (low) to 5 (high)." }
            figure { class: "rating__figure",
                img { class: "rating__photo", src: "{src}", alt: "{filename}" }
                figcaption { class: "rating__caption", "{caption}" }
            }
            div { class: "rating__buttons",
                for rating in Rating::ALL {
                    button {
                        key: "{rating}",
                        class: "rating__button",
                        id: "rating-{rating}",
                        r#type: "button",
                        onclick: move |_| on_rate.call(rating),
                        "{rating}"
                    }
                }
            }
        }
    }
}

#[component]
pub fn ProgressBar(percent: f64) -> Element {
    rsx! {
        div {
            class: "progress",
            role: "progressbar",
            aria_valuemin: "0",
            aria_valuemax: "100",
            aria_valuenow: "{percent}",
            div { class: "progress__bar", style: "width: {percent}%;" }
        }
    }
}
