//! Built-in knowledge-base seed content.
//!
//! A condensed company corpus used by the reinitialize endpoint so a fresh
//! deployment can answer questions before anyone uploads documents.

use std::collections::BTreeMap;

pub struct SeedDocument {
    pub content: &'static str,
    pub source: &'static str,
    pub category: &'static str,
}

pub fn seed_documents() -> Vec<SeedDocument> {
    vec![
        SeedDocument {
            source: "company_overview",
            category: "company",
            content: "About Meridian Labs\n\n\
Meridian Labs is a custom AI solutions company. We design, build, and \
operate tailored machine-learning systems for businesses across healthcare, \
finance, manufacturing, retail, and logistics.\n\n\
Why teams choose us:\n\
- Custom solutions built around your data, not off-the-shelf products\n\
- An experienced team of AI engineers and data scientists\n\
- End-to-end delivery from strategy through deployment and support\n\
- Long-term partnerships with measurable, ROI-focused outcomes\n\n\
Ready to explore what a custom AI system could do for your business? \
Schedule a free consultation with our team.",
        },
        SeedDocument {
            source: "services",
            category: "services",
            content: "Our Services\n\n\
Core offerings:\n\
- Custom AI model development tailored to your business\n\
- Autonomous agent systems for hands-off operations\n\
- Natural language processing and document understanding\n\
- Predictive analytics and forecasting\n\
- Intelligent process automation\n\
- System integration with your existing tools\n\n\
Every engagement includes training for your team, ongoing monitoring, and \
continuous optimization. Interested in a specific capability? Book a demo \
and we will walk through it with your own use case.",
        },
        SeedDocument {
            source: "implementation_process",
            category: "process",
            content: "How We Deliver\n\n\
Our delivery process:\n\
- Discovery: we analyze your business needs and data readiness\n\
- Design: solution architecture and a concrete project plan\n\
- Build: custom development with weekly demos\n\
- Integrate: connection to your existing systems and workflows\n\
- Launch and support: deployment, team training, and monitoring\n\n\
Most projects complete in 8 to 12 weeks. You get a dedicated project \
manager, transparent pricing, and documented handover. Ready to start? \
Schedule a consultation to scope your project.",
        },
        SeedDocument {
            source: "business_value",
            category: "business_value",
            content: "Outcomes and ROI\n\n\
Typical results our clients report:\n\
- 30 to 50 percent reduction in operational costs through automation\n\
- 40 to 60 percent improvement in process efficiency\n\
- Significant reduction in manual errors and processing time\n\
- ROI reached within 6 to 12 months of launch\n\n\
We define success metrics with you up front and track them after launch: \
automation rates, error reduction, time to completion, and revenue impact. \
Want a realistic estimate for your use case? Our team can prepare one \
during a consultation.",
        },
        SeedDocument {
            source: "contact_information",
            category: "contact",
            content: "Getting in Touch\n\n\
Contact details:\n\
- Phone: +1 (555) 014-7788\n\
- Email: hello@meridianlabs.ai\n\n\
How to reach us:\n\
- Call or email for project inquiries and proposals\n\
- Use the scheduling form to book a free consultation\n\
- Our team confirms appointments within 24 hours\n\n\
Whether you are comparing approaches or ready to start, a short \
conversation with our engineers is the fastest way to get concrete answers.",
        },
    ]
}

pub fn seed_metadata(doc: &SeedDocument) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("source".to_string(), doc.source.to_string());
    metadata.insert("category".to_string(), doc.category.to_string());
    metadata
}
