//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::{instrument, warn};

use crate::models::Product;
use crate::routes::pages::{HOW_IT_WORKS_STEPS, Step};
use crate::services::catalog::FEATURED_LIMIT;
use crate::state::AppState;

/// Steps previewed on the home page; the full list lives on How It Works.
const HOME_STEP_COUNT: usize = 3;

/// A headline figure in the hero.
pub struct HeroStat {
    pub value: &'static str,
    pub label: &'static str,
}

const HERO_STATS: &[HeroStat] = &[
    HeroStat {
        value: "10K+",
        label: "Bottles Saved",
    },
    HeroStat {
        value: "5K+",
        label: "Happy Builders",
    },
    HeroStat {
        value: "4.9★",
        label: "Customer Rating",
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured_products: Vec<Product>,
    pub stats: &'static [HeroStat],
    pub steps: &'static [Step],
}

/// Display the home page.
///
/// A failed catalog read leaves the shop preview empty.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> HomeTemplate {
    let featured_products = state
        .catalog()
        .featured(FEATURED_LIMIT)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Home page without featured products");
            Vec::new()
        });

    HomeTemplate {
        featured_products,
        stats: HERO_STATS,
        steps: HOW_IT_WORKS_STEPS
            .get(..HOME_STEP_COUNT)
            .unwrap_or(HOW_IT_WORKS_STEPS),
    }
}
