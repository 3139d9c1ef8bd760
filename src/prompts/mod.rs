use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

// NOTE:
// Templates are compiled into the binary and registered without a file
// extension, so minijinja applies no auto-escaping: user fields land in the
// prompt verbatim.

pub const ROADMAP_TEMPLATE: &str = "roadmap";
pub const CODE_FEEDBACK_TEMPLATE: &str = "code_feedback";

macro_rules! template_file {
    ($name:literal) => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/templates/",
            $name,
            ".jinja"
        ))
    };
}

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(load_templates);

fn load_templates() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_template(ROADMAP_TEMPLATE, template_file!("roadmap"))
        .expect("invalid roadmap template");
    env.add_template(CODE_FEEDBACK_TEMPLATE, template_file!("code_feedback"))
        .expect("invalid code feedback template");
    env
}

pub fn render(name: &str, ctx: impl Serialize) -> Result<String, minijinja::Error> {
    TEMPLATES.get_template(name)?.render(ctx)
}
