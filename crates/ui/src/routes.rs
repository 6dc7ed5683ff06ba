use dioxus::prelude::*;
use dioxus_router::{Outlet, Routable};

use crate::context::AppContext;
use crate::views::SurveyView;

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", SurveyView)] Survey {},
}

#[component]
fn Layout() -> Element {
    let ctx = use_context::<AppContext>();
    let title = ctx.title().to_string();
    rsx! {
        div { class: "app",
            header { class: "app-header",
                h1 { "{title}" }
            }
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}
