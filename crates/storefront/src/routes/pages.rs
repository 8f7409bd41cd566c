//! Static content page route handlers.
//!
//! About, FAQ and How It Works carry fixed copy; it lives here rather than in
//! the entity store.

use askama::Template;
use askama_web::WebTemplate;
use tracing::instrument;

/// A titled paragraph (company values, build steps).
pub struct Step {
    pub title: &'static str,
    pub description: &'static str,
}

/// A question and its answer.
pub struct Faq {
    pub question: &'static str,
    pub answer: &'static str,
}

pub const HOW_IT_WORKS_STEPS: &[Step] = &[
    Step {
        title: "Choose Your Bottle",
        description: "Clean and rinse an empty liquor bottle. Whiskey, wine, or vodka bottles all work great. Make sure it's completely dry before the next step.",
    },
    Step {
        title: "Cut & Prep",
        description: "Use our precision glass cutter to score the bottle where you want to cut. Then use the thermal shock method (hot and cold water) to cleanly separate the pieces. Sand the edges smooth.",
    },
    Step {
        title: "Add Hardware",
        description: "Insert the nano heater and air tubing. Apply silicone sealant around any openings. Our slim heater fits perfectly in standard bottles to keep your tank at the ideal temperature.",
    },
    Step {
        title: "Decorate",
        description: "Add aquarium gravel, plants, and decorations. Our kits include everything you need to create a beautiful underwater scene. Get creative with your layout!",
    },
    Step {
        title: "Extend It",
        description: "Ready for more? Use our Maze Extension Kit to connect multiple bottles with clear tunnels, or the Window Bridge Kit to create a shared wall between tanks. Build an empire!",
    },
];

const VALUES: &[Step] = &[
    Step {
        title: "Sustainability",
        description: "Every kit helps upcycle bottles that would otherwise end up in landfills. We're turning trash into treasure, one bottle at a time.",
    },
    Step {
        title: "Creativity",
        description: "We believe everyone has an inner artist. Our kits make it easy to express yourself and create something truly unique.",
    },
    Step {
        title: "Accessibility",
        description: "Aquariums shouldn't be intimidating or expensive. We're making the hobby fun, affordable, and approachable for everyone.",
    },
];

const STORY: &[&str] = &[
    "It all began in a college apartment with too many empty bottles and not enough shelf space. One late night, staring at a beautiful whiskey bottle, we thought: \"This is too pretty to throw away.\"",
    "What started as a fun weekend project quickly became an obsession. We learned to cut glass, figured out the perfect nano heating systems, and eventually connected multiple bottles into maze-like aquariums.",
    "Today, we're on a mission to help people upcycle their bottles into stunning living art pieces. It's eco-friendly, it's creative, and honestly? It's just really fun.",
];

const FAQS: &[Faq] = &[
    Faq {
        question: "Is this safe for real fish?",
        answer: "Yes! Our kits are designed with fish safety in mind. The nano heaters maintain proper temperatures, and the bubblers provide adequate oxygenation. However, bottle aquariums are best suited for small species like shrimp, snails, and nano fish. Always research the specific needs of any species before adding them.",
    },
    Faq {
        question: "What kind of fish or animals can I keep?",
        answer: "For single bottle tanks, we recommend small invertebrates like cherry shrimp, snails, or small shrimp colonies. For connected multi-bottle systems, you can keep nano fish like endlers or microrasboras. The key is providing adequate space and proper care for whatever you choose to keep.",
    },
    Faq {
        question: "Do I need my own bottle?",
        answer: "Yes! We don't include bottles because half the fun is choosing your own. Any glass liquor bottle with thick walls works great. Just make sure it's clean and dry before you start.",
    },
    Faq {
        question: "How long does setup take?",
        answer: "Most people complete their first Tipsy Tank in 2-3 hours. Let the silicone cure for 24 hours before adding water, and cycle the tank for 1-2 weeks before adding any living creatures.",
    },
    Faq {
        question: "Do you ship internationally?",
        answer: "We currently ship to the US and Canada. If you're outside our shipping zone, feel free to contact us and we'll see what we can do.",
    },
    Faq {
        question: "What if I mess up the cut?",
        answer: "Don't worry! Glass cutting takes a little practice. If your first cut doesn't come out perfectly, just grab another bottle and try again. Most people get it right by their second or third bottle.",
    },
    Faq {
        question: "Is the heater safe in such a small space?",
        answer: "Our nano heaters are designed for small aquariums. They're low-wattage, fully submersible, and have automatic shut-off safety features.",
    },
    Faq {
        question: "Can I connect bottles of different sizes?",
        answer: "Absolutely! Our Maze Extension Kit includes various connector sizes and flexible tubing that works with most bottle combinations. Keep in mind that fish need clear swimming paths, so plan your layout accordingly.",
    },
    Faq {
        question: "What's your return policy?",
        answer: "We offer a 30-day satisfaction guarantee on all unopened kits. Opened but unused kits can be returned within 14 days. If you received a defective item, contact us immediately and we'll make it right.",
    },
    Faq {
        question: "Do you offer replacement parts?",
        answer: "Yes! If you need extra grommets, tubing, silicone, or any other components, just reach out through our contact page.",
    },
];

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub story: &'static [&'static str],
    pub values: &'static [Step],
}

/// FAQ page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/faq.html")]
pub struct FaqTemplate {
    pub faqs: &'static [Faq],
}

/// How It Works page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/how_it_works.html")]
pub struct HowItWorksTemplate {
    pub steps: &'static [Step],
}

/// Display the About page.
#[instrument]
pub async fn about() -> AboutTemplate {
    AboutTemplate {
        story: STORY,
        values: VALUES,
    }
}

/// Display the FAQ page.
#[instrument]
pub async fn faq() -> FaqTemplate {
    FaqTemplate { faqs: FAQS }
}

/// Display the How It Works page.
#[instrument]
pub async fn how_it_works() -> HowItWorksTemplate {
    HowItWorksTemplate {
        steps: HOW_IT_WORKS_STEPS,
    }
}
