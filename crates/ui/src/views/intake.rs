use dioxus::prelude::*;

use crate::vm::{
    AGE_GROUP_PLACEHOLDER, GENDER_PLACEHOLDER, IntakeForm, UNSELECTED, age_group_options,
    gender_options,
};

#[component]
pub fn IntakePanel(warning: Option<String>, on_submit: EventHandler<IntakeForm>) -> Element {
    let mut name = use_signal(String::new);
    let mut age_group = use_signal(|| UNSELECTED.to_string());
    let mut gender = use_signal(|| UNSELECTED.to_string());

    rsx! {
        div { class: "intake",
            h2 { class: "intake__title", "Before we start" }
            p { class: "intake__hint", "Tell us a little about yourself. You will only be asked once." }

            label { class: "intake__label", r#for: "intake-name", "Name" }
            input {
                class: "intake__input",
                id: "intake-name",
                r#type: "text",
                value: "{name}",
                oninput: move |evt| name.set(evt.value()),
            }

            label { class: "intake__label", r#for: "intake-age", "Age group" }
            select {
                class: "intake__select",
                id: "intake-age",
                value: "{age_group}",
                onchange: move |evt| age_group.set(evt.value()),
                option { value: UNSELECTED, "{AGE_GROUP_PLACEHOLDER}" }
                for label in age_group_options() {
                    option { key: "{label}", value: label, "{label}" }
                }
            }

            label { class: "intake__label", r#for: "intake-gender", "Gender" }
            select {
                class: "intake__select",
                id: "intake-gender",
                value: "{gender}",
                onchange: move |evt| gender.set(evt.value()),
                option { value: UNSELECTED, "{GENDER_PLACEHOLDER}" }
                for label in gender_options() {
                    option { key: "{label}", value: label, "{label}" }
                }
            }

            if let Some(message) = warning {
                p { class: "intake__warning", role: "alert", "{message}" }
            }

            button {
                class: "btn btn-primary",
                id: "intake-submit",
                r#type: "button",
                onclick: move |_| {
                    on_submit.call(IntakeForm {
                        name: name(),
                        age_group: age_group(),
                        gender: gender(),
                    });
                },
                "Start"
            }
        }
    }
}
