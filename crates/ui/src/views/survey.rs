use dioxus::prelude::*;
use services::{SurveyPhase, WriteOutcome};
use survey_core::model::Rating;

use super::complete::{CompletePanel, NoImagesPanel};
use super::intake::IntakePanel;
use super::rating::RatingPanel;
use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{IntakeForm, IntakeOutcome, SurveyVm, open_survey};

/// Owned copy of what the current render needs from the view model.
#[derive(Clone, Debug, PartialEq)]
struct Snapshot {
    phase: SurveyPhase,
    caption: String,
    fraction: f64,
    image: Option<(String, String)>,
}

impl Snapshot {
    fn of(vm: &SurveyVm) -> Self {
        Self {
            phase: vm.phase(),
            caption: vm.caption().unwrap_or_default(),
            fraction: vm.progress().fraction,
            image: vm
                .shown()
                .map(|shown| (shown.filename.clone(), shown.src.clone())),
        }
    }
}

#[component]
pub fn SurveyView() -> Element {
    let ctx = use_context::<AppContext>();
    let survey = ctx.survey();
    let services = ctx.services();

    let vm = use_signal(|| None::<SurveyVm>);
    let warning = use_signal(|| None::<String>);
    let error = use_signal(|| None::<ViewError>);
    let write_errors = use_signal(Vec::<String>::new);

    let survey_for_resource = survey.clone();
    let resource = use_resource(move || {
        let survey = survey_for_resource.clone();
        let mut vm = vm;
        async move {
            let opened = open_survey(&survey).await?;
            vm.set(Some(opened));
            Ok::<_, ViewError>(())
        }
    });

    use_future(move || {
        let services = services.clone();
        let mut write_errors = write_errors;
        async move {
            while let Some(report) = services.next_report().await {
                if let WriteOutcome::Failed { message } = report.outcome {
                    write_errors.write().push(message);
                }
            }
        }
    });

    let on_intake = {
        let survey = survey.clone();
        use_callback(move |form: IntakeForm| {
            let survey = survey.clone();
            let mut vm = vm;
            let mut warning = warning;
            let mut error = error;
            spawn(async move {
                let Some(mut local) = vm.write().take() else {
                    return;
                };
                let result = local.submit_intake(&survey, &form.to_draft()).await;
                // Put the session back so the form stays usable after errors.
                vm.set(Some(local));
                match result {
                    Ok(IntakeOutcome::Accepted) => {
                        warning.set(None);
                        error.set(None);
                    }
                    Ok(IntakeOutcome::Warning(message)) => warning.set(Some(message)),
                    Err(err) => error.set(Some(err)),
                }
            });
        })
    };

    let on_rate = {
        let survey = survey.clone();
        use_callback(move |rating: Rating| {
            let mut vm = vm;
            let mut error = error;
            let result = vm.write().as_mut().map(|vm| vm.rate(&survey, rating));
            match result {
                Some(Err(err)) => error.set(Some(err)),
                Some(Ok(())) | None => error.set(None),
            }
        })
    };

    let on_retry = {
        let survey = survey.clone();
        use_callback(move |()| {
            let survey = survey.clone();
            let mut vm = vm;
            let mut error = error;
            let mut resource = resource;
            if vm.read().is_none() {
                resource.restart();
                return;
            }
            spawn(async move {
                let Some(mut local) = vm.write().take() else {
                    return;
                };
                let result = local.retry_resume(&survey).await;
                vm.set(Some(local));
                error.set(result.err());
            });
        })
    };

    let state = view_state_from_resource(&resource);
    let snapshot = vm.read().as_ref().map(Snapshot::of);
    let current_error = *error.read();
    let warning_text = warning.read().clone();
    let failed_writes = write_errors.read().clone();

    rsx! {
        div { class: "page survey-page",
            for (i, message) in failed_writes.iter().enumerate() {
                p { key: "{i}", class: "write-error", role: "alert",
                    "A rating could not be saved: {message}"
                }
            }
            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    p { class: "loading", "Loading..." }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "view-error", "{err.message()}" }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| on_retry.call(()),
                        "Retry"
                    }
                },
                ViewState::Ready(()) => rsx! {
                    if let Some(err) = current_error {
                        p { class: "view-error", "{err.message()}" }
                    }
                    match snapshot {
                        None => rsx! {
                            p { class: "loading", "Loading..." }
                        },
                        Some(Snapshot { phase: SurveyPhase::NoImages, .. }) => rsx! {
                            NoImagesPanel {}
                        },
                        Some(Snapshot { phase: SurveyPhase::Intake, .. }) => rsx! {
                            IntakePanel { warning: warning_text, on_submit: on_intake }
                        },
                        Some(Snapshot { phase: SurveyPhase::Resuming, .. }) => rsx! {
                            p { class: "loading", "Loading your progress..." }
                            if current_error.is_some() {
                                button {
                                    class: "btn btn-secondary",
                                    r#type: "button",
                                    onclick: move |_| on_retry.call(()),
                                    "Retry"
                                }
                            }
                        },
                        Some(Snapshot { phase: SurveyPhase::Rating, caption, fraction, image: Some((filename, src)) }) => rsx! {
                            RatingPanel { src, filename, caption, fraction, on_rate }
                        },
                        Some(Snapshot { phase: SurveyPhase::Rating, image: None, .. }) => rsx! {
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                onclick: move |_| on_retry.call(()),
                                "Retry"
                            }
                        },
                        Some(Snapshot { phase: SurveyPhase::Complete, .. }) => rsx! {
                            CompletePanel {}
                        },
                    }
                },
            }
        }
    }
}
